//! Interface de terminal: spinners, toasts coloridos e tabelas.
//!
//! Usa `indicatif` para o indicador de carregamento durante submissões e
//! `console` para as cores. O [`ConsoleNotifier`] é a implementação de
//! [`Notifier`] usada pela CLI.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::notify::{Notifier, Toast, ToastLevel};
use crate::routes::{Page, RouteConfigEntry};
use crate::workflow::{WorkflowDefinition, WorkflowSummary};

/// Notificações no terminal.
///
/// Toasts são impressos numa linha com ícone colorido; o carregamento mostra
/// um spinner até `end_loading`.
pub struct ConsoleNotifier {
    // Spinner ativo, se houver submissão em andamento.
    spinner: Mutex<Option<ProgressBar>>,
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    fn line(&self, toast: &Toast) -> String {
        let icon = match toast.level {
            ToastLevel::Success => self.green.apply_to("✓"),
            ToastLevel::Info => self.cyan.apply_to("→"),
            ToastLevel::Warning => self.yellow.apply_to("!"),
            ToastLevel::Error => self.red.apply_to("✗"),
        };
        format!("  {icon} {}", toast.message)
    }
}

impl Notifier for ConsoleNotifier {
    fn toast(&self, toast: Toast) {
        let line = self.line(&toast);
        match self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }

    fn begin_loading(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Some(old) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pb)
        {
            old.finish_and_clear();
        }
    }

    fn end_loading(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }
}

pub fn print_routes<'a>(entries: impl IntoIterator<Item = &'a RouteConfigEntry>) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("─── Route Table ───"));
    for entry in entries {
        println!(
            "  {:<8} {:<42} {}",
            entry.type_code.to_string(),
            entry.route_template,
            entry.label
        );
    }
}

pub fn print_route(entry: &RouteConfigEntry) {
    let green = Style::new().green().bold();
    println!("{} {}", green.apply_to(entry.type_code), entry.route_template);
    println!("  setor: {}", entry.setor);
    println!("  label: {}", entry.label);
}

/// Etapas com dono; handoffs aparecem logo abaixo da etapa de origem.
pub fn print_steps(definition: &WorkflowDefinition) {
    let bold = Style::new().bold();
    let cyan = Style::new().cyan();
    println!("{}", bold.apply_to(format!("─── {} ───", definition.name)));
    for step in definition.steps {
        println!(
            "  {:>2}. {:<28} {:<22} {}",
            step.number,
            step.id,
            step.owner.slug(),
            step.title
        );
        for h in definition.handoffs.iter().filter(|h| h.from_step == step.number) {
            println!(
                "      {} → {} ({}): {}",
                cyan.apply_to("handoff"),
                h.to_step,
                h.to_cargo,
                h.description
            );
        }
    }
}

pub fn print_page(page: &Page) {
    let visibility = if page.is_public() { "public" } else { "authenticated" };
    println!(
        "{} ({visibility})",
        serde_json::to_string_pretty(page).unwrap_or_default()
    );
}

/// Resumo final do workflow em JSON.
pub fn print_summary(summary: &WorkflowSummary) {
    let green = Style::new().green().bold();
    println!();
    println!("{}", green.apply_to("─── Workflow Summary ───"));
    println!(
        "{}",
        serde_json::to_string_pretty(summary).unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_lines_carry_message() {
        console::set_colors_enabled(false);
        let n = ConsoleNotifier::new();
        assert_eq!(
            n.line(&Toast::error("No vacancy left in this shift")),
            "  ✗ No vacancy left in this shift"
        );
        assert_eq!(n.line(&Toast::success("ok")), "  ✓ ok");
    }

    #[test]
    fn loading_is_cleared() {
        let n = ConsoleNotifier::new();
        n.begin_loading("Agendando");
        n.begin_loading("Agendando de novo");
        n.end_loading();
        assert!(n.spinner.lock().unwrap().is_none());
        n.end_loading();
    }
}
