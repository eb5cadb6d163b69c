//! Roteamento e estado dos workflows de ordens de serviço (OS).
//!
//! - [`routes`]: tabela de rotas por tipo de OS e resolução de URL.
//! - [`workflow`]: catálogos de etapas, responsáveis e o store da OS.
//! - [`steps`]: componentes de etapa (formulário e agendamento).
//! - [`calendar`]: integração com o calendário de agendamentos.
//! - [`page`]: página que conduz a etapa atual e gera os toasts.

pub mod calendar;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod notify;
pub mod page;
pub mod routes;
pub mod steps;
pub mod telemetry;
pub mod ui;
pub mod workflow;

pub use error::{FailureKind, RouteError, StepError, ValidationError, WorkflowError};
