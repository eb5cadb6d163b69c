use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use minerva_os::calendar::{InMemoryCalendar, RestCalendarClient};
use minerva_os::cli::{Cli, Command};
use minerva_os::config::AppConfig;
use minerva_os::demo::{self, DemoReport};
use minerva_os::ui::{self, ConsoleNotifier};
use minerva_os::workflow::{TypeCode, definition_for};
use minerva_os::{routes, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let mut config = AppConfig::load()?;
    if let Some(ms) = cli.booking_timeout_ms {
        config.booking_timeout_ms = ms;
    }
    debug!(remote = config.has_remote(), timeout_ms = config.booking_timeout_ms, "config loaded");

    match cli.command {
        Command::Routes => ui::print_routes(routes::entries()),
        Command::Lookup { code } => ui::print_route(routes::lookup(&code)?),
        Command::Steps { code } => {
            let type_code: TypeCode = code.parse()?;
            ui::print_steps(definition_for(type_code));
        }
        Command::Resolve { path } => ui::print_page(&routes::resolve(&path)?),
        Command::Demo { code } => {
            let type_code: TypeCode = code.parse()?;
            let report = run_demo(type_code, &config).await?;
            for path in &report.paths {
                println!("  {path}");
            }
            ui::print_summary(&report.summary);
        }
    }

    Ok(())
}

async fn run_demo(type_code: TypeCode, config: &AppConfig) -> Result<DemoReport> {
    let notifier = ConsoleNotifier::new();
    let timeout = config.booking_timeout();
    if config.has_remote() {
        let client = RestCalendarClient::new(&config.api_url, config.api_key.clone())?;
        demo::run(type_code, config.sequence_start, Arc::new(client), timeout, &notifier).await
    } else {
        let calendar = InMemoryCalendar::with_default_turnos();
        demo::run(type_code, config.sequence_start, Arc::new(calendar), timeout, &notifier).await
    }
}
