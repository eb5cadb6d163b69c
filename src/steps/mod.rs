//! Componentes de etapa.
//!
//! Cada etapa do catálogo vira um [`WorkflowStep`]. O fluxo é sempre o mesmo:
//! `validate` monta o payload, `try_submit` valida, faz o trabalho remoto
//! quando houver e grava o resultado no [`WorkflowHandle`]. Um payload que
//! falhou na validação nunca chega ao store.

mod form;
mod scheduling;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

pub use form::{FieldFormat, FieldRule, FormStep, rules_for};
pub use scheduling::{Scheduler, SchedulingStep};

use scheduling::CommittedBooking;

use crate::calendar::{CalendarBackend, CalendarIntegration};
use crate::error::{StepError, ValidationError};
use crate::routes;
use crate::workflow::{
    SchedulingKind, ServiceOrder, StepDefinition, StepKind, StepResult, WorkflowDefinition,
    WorkflowHandle,
};

/// Contrato comum das etapas.
///
/// `try_submit` recebe `&mut self`: enquanto uma submissão está pendente a
/// mesma etapa não pode ser submetida de novo.
pub trait WorkflowStep {
    fn id(&self) -> &'static str;

    fn render(&self, order: &ServiceOrder) -> StepView;

    /// Payload que seria gravado, ou o primeiro erro de validação.
    fn validate(&self) -> Result<Value, ValidationError>;

    async fn try_submit(&mut self, handle: &WorkflowHandle) -> Result<StepResult, StepError>;

    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

/// O que a página mostra de uma etapa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub number: u32,
    pub step_id: &'static str,
    pub title: &'static str,
    pub kind: StepKind,
    pub status: StepStatus,
    /// Etapas anteriores e OS encerradas são só leitura.
    pub read_only: bool,
    /// Último payload gravado para a etapa.
    pub committed: Option<Value>,
    pub detail: Option<String>,
}

impl StepView {
    pub fn for_step(definition: &'static StepDefinition, order: &ServiceOrder) -> Self {
        let committed = order.latest_result(definition.number);
        let status = if definition.number == order.current_step && !order.status.is_closed() {
            StepStatus::Active
        } else if committed.is_some() {
            StepStatus::Completed
        } else {
            StepStatus::Pending
        };
        Self {
            number: definition.number,
            step_id: definition.id,
            title: definition.title,
            kind: definition.kind,
            status,
            read_only: order.status.is_closed() || definition.number < order.current_step,
            committed: committed.map(|r| r.payload.clone()),
            detail: None,
        }
    }
}

/// Uma etapa concreta do catálogo.
pub enum StepComponent<C> {
    Form(FormStep),
    Scheduling(SchedulingStep<C>),
}

impl<C: CalendarBackend> StepComponent<C> {
    pub fn as_form_mut(&mut self) -> Option<&mut FormStep> {
        match self {
            StepComponent::Form(step) => Some(step),
            StepComponent::Scheduling(_) => None,
        }
    }

    pub fn as_scheduling_mut(&mut self) -> Option<&mut SchedulingStep<C>> {
        match self {
            StepComponent::Scheduling(step) => Some(step),
            StepComponent::Form(_) => None,
        }
    }
}

impl<C: CalendarBackend> WorkflowStep for StepComponent<C> {
    fn id(&self) -> &'static str {
        match self {
            StepComponent::Form(s) => s.id(),
            StepComponent::Scheduling(s) => s.id(),
        }
    }

    fn render(&self, order: &ServiceOrder) -> StepView {
        match self {
            StepComponent::Form(s) => s.render(order),
            StepComponent::Scheduling(s) => s.render(order),
        }
    }

    fn validate(&self) -> Result<Value, ValidationError> {
        match self {
            StepComponent::Form(s) => s.validate(),
            StepComponent::Scheduling(s) => s.validate(),
        }
    }

    async fn try_submit(&mut self, handle: &WorkflowHandle) -> Result<StepResult, StepError> {
        match self {
            StepComponent::Form(s) => s.try_submit(handle).await,
            StepComponent::Scheduling(s) => s.try_submit(handle).await,
        }
    }

    fn reset(&mut self) {
        match self {
            StepComponent::Form(s) => s.reset(),
            StepComponent::Scheduling(s) => s.reset(),
        }
    }
}

/// Monta os componentes de todas as etapas de uma OS, na ordem do catálogo.
///
/// Apresentações exigem os dados de contato do solicitante. Etapas que já têm
/// resultado gravado voltam preenchidas: formulários com o último payload e
/// agendamentos com o agendamento confirmado, para que revisitar uma etapa
/// não crie um segundo agendamento.
pub fn build_steps<C: CalendarBackend>(
    order: &ServiceOrder,
    definition: &'static WorkflowDefinition,
    backend: Arc<C>,
    booking_timeout: Duration,
) -> Vec<StepComponent<C>> {
    let setor = routes::lookup_code(order.type_code)
        .map(|entry| entry.setor.slug())
        .unwrap_or_default();
    let steps: &'static [StepDefinition] = definition.steps;

    steps
        .iter()
        .map(|def| {
            let committed = order.latest_result(def.number).map(|r| &r.payload);
            match def.kind {
                StepKind::Scheduling(kind) => {
                    let mut calendar = CalendarIntegration::new(&order.id, kind.categoria(), setor);
                    if kind == SchedulingKind::Presentation {
                        calendar = calendar.requiring_contact();
                    }
                    let booked = committed.and_then(CommittedBooking::from_payload);
                    if let Some(b) = &booked {
                        calendar = calendar.with_existing(b.agendamento(kind.categoria(), setor, &order.id));
                    }
                    let mut step = SchedulingStep::new(
                        def,
                        kind,
                        calendar,
                        Arc::clone(&backend),
                        booking_timeout,
                    );
                    if let Some(s) = booked.and_then(|b| b.scheduler()) {
                        step.set_scheduler(s.id, s.nome);
                    }
                    StepComponent::Scheduling(step)
                }
                _ => {
                    let mut step = FormStep::new(def);
                    if let Some(payload) = committed {
                        step.fill(payload);
                    }
                    StepComponent::Form(step)
                }
            }
        })
        .collect()
}
