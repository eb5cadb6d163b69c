//! Interface de linha de comando baseada em clap.
//!
//! Subcomandos para inspecionar a tabela de rotas e os catálogos de etapas,
//! resolver URLs e rodar um workflow de demonstração.

use clap::{Parser, Subcommand};

/// Minerva OS: roteamento e estado dos workflows de ordens de serviço.
#[derive(Debug, Parser)]
#[command(name = "minerva", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Tempo máximo de uma chamada de agendamento, em milissegundos.
    #[arg(long, global = true)]
    pub booking_timeout_ms: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lista a tabela de rotas por tipo de OS.
    Routes,

    /// Mostra a rota configurada para um código (`type-07`, `OS-07`).
    Lookup { code: String },

    /// Lista as etapas, responsáveis e transferências de um tipo de OS.
    Steps { code: String },

    /// Resolve um caminho de URL para a página correspondente.
    Resolve { path: String },

    /// Percorre um workflow completo com dados de exemplo.
    Demo {
        /// Código do tipo de OS.
        #[arg(default_value = "type-07")]
        code: String,
    },
}
