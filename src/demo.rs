//! Demonstração: percorre todas as etapas de uma OS com dados de exemplo.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{Days, Local, NaiveDate, NaiveTime};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::calendar::{CalendarBackend, Slot};
use crate::notify::Notifier;
use crate::page::{PageOutcome, WorkflowPage};
use crate::steps::{FieldFormat, FieldRule, StepComponent};
use crate::workflow::{Cargo, ServiceOrder, TypeCode, WorkflowSummary};

/// Resultado de uma execução da demonstração.
#[derive(Debug)]
pub struct DemoReport {
    pub order: ServiceOrder,
    /// Caminhos visitados, na ordem.
    pub paths: Vec<String>,
    pub summary: WorkflowSummary,
}

/// Payload que satisfaz as regras de campo.
pub fn sample_payload(rules: &[FieldRule], today: NaiveDate) -> Value {
    let mut values = Map::new();
    for rule in rules {
        let value = match rule.format {
            FieldFormat::Email => json!("contato@condominio-exemplo.com.br"),
            FieldFormat::Date => json!(today),
            FieldFormat::Number => json!(1250.0),
            FieldFormat::Accepted => json!(true),
            FieldFormat::List => json!(["documento.pdf"]),
            FieldFormat::Text => {
                let min = rule.min_len.unwrap_or(0);
                let mut text = format!("Exemplo para {}", rule.field);
                while text.chars().count() < min {
                    text.push_str(" (detalhado)");
                }
                json!(text)
            }
        };
        values.insert(rule.field.to_string(), value);
    }
    Value::Object(values)
}

/// Roda o workflow do tipo `code` do começo ao fim.
///
/// Cada etapa de agendamento reserva a manhã de um dia diferente, a partir
/// de uma semana depois de hoje. Propostas são aprovadas pela Coordenação
/// Administrativa.
pub async fn run<C: CalendarBackend, N: Notifier>(
    code: TypeCode,
    sequence: u32,
    backend: Arc<C>,
    booking_timeout: Duration,
    notifier: N,
) -> Result<DemoReport> {
    let order = ServiceOrder::new(code, sequence);
    info!(order = %order.codigo, "starting demo workflow");
    let mut page = WorkflowPage::open(order, backend, booking_timeout, notifier);
    let today = Local::now().date_naive();
    let mut paths = vec![page.route()?.path];
    let mut visit_day = 7;

    loop {
        let Some(step) = page.current_step_mut() else {
            bail!("workflow has no current step");
        };
        match step {
            StepComponent::Form(form) => {
                let payload = sample_payload(form.rules(), today);
                form.fill(&payload);
            }
            StepComponent::Scheduling(scheduling) => {
                let data = today
                    .checked_add_days(Days::new(visit_day))
                    .unwrap_or(today);
                visit_day += 1;
                scheduling.select(Slot {
                    turno_id: "turno-manha".into(),
                    data,
                    horario_inicio: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
                    horario_fim: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN),
                });
                scheduling.set_contact("Síndico Exemplo", "(61) 3000-0000");
                scheduling.set_scheduler("demo", "Usuário Demo");
            }
        }

        let mut outcome = page.submit_current().await;
        if matches!(outcome, PageOutcome::AwaitingApproval) {
            outcome = page.approve(Cargo::CoordAdministrativo);
        }
        match outcome {
            PageOutcome::Advanced(route) => paths.push(route.path),
            PageOutcome::Completed => break,
            PageOutcome::Stayed(err) => bail!("step {} failed: {err}", page.handle().current_step().id),
            PageOutcome::Discarded => bail!("submission discarded"),
            PageOutcome::AwaitingApproval => bail!("step approval did not go through"),
        }
    }

    let order = page.handle().current_order();
    let summary = WorkflowSummary::from_order(&order, page.handle().definition().steps.len());
    Ok(DemoReport {
        order,
        paths,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InMemoryCalendar;
    use crate::notify::MemoryNotifier;
    use crate::steps::{WorkflowStep, rules_for};
    use crate::workflow::{ApprovalStatus, OrderStatus, definition_for};

    #[test]
    fn sample_payload_passes_every_catalogue_rule() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        for code in TypeCode::all() {
            for def in definition_for(code).steps {
                let mut step = crate::steps::FormStep::new(def);
                step.fill(&sample_payload(rules_for(def), today));
                assert!(step.validate().is_ok(), "{} {}", code, def.id);
            }
        }
    }

    #[tokio::test]
    async fn demo_completes_type_07() {
        let notifier = MemoryNotifier::new();
        let report = run(
            TypeCode::new(7).unwrap(),
            1,
            Arc::new(InMemoryCalendar::with_default_turnos()),
            Duration::from_secs(1),
            &notifier,
        )
        .await
        .unwrap();

        assert_eq!(report.order.status, OrderStatus::Completed);
        assert_eq!(report.paths.len(), 5);
        assert!(report.paths[0].starts_with("/os/assessoria/type-07/"));
        assert_eq!(report.summary.completed_steps, 5);
        assert_eq!(report.order.codigo, "OS-07-0001");
    }

    #[tokio::test]
    async fn demo_approves_the_proposal_of_type_05() {
        let notifier = MemoryNotifier::new();
        let report = run(
            TypeCode::new(5).unwrap(),
            3,
            Arc::new(InMemoryCalendar::with_default_turnos()),
            Duration::from_secs(1),
            &notifier,
        )
        .await
        .unwrap();

        assert_eq!(report.order.status, OrderStatus::Completed);
        let approval = report.order.latest_approval(6).unwrap();
        assert_eq!(approval.status, ApprovalStatus::Aprovada);
        assert_eq!(approval.by, Some(Cargo::CoordAdministrativo.to_string()));
        assert!(
            notifier
                .toasts()
                .iter()
                .any(|t| t.message.starts_with("Approval requested"))
        );
    }

    #[tokio::test]
    async fn demo_completes_type_13_with_two_bookings() {
        let backend = Arc::new(InMemoryCalendar::with_default_turnos());
        let notifier = MemoryNotifier::new();
        let report = run(
            TypeCode::new(13).unwrap(),
            42,
            Arc::clone(&backend),
            Duration::from_secs(1),
            &notifier,
        )
        .await
        .unwrap();

        assert_eq!(report.order.status, OrderStatus::Completed);
        assert_eq!(report.order.step_results.len(), 17);
        assert_eq!(backend.agendamentos().len(), 2);
        let final_visit = report.order.latest_result(16).unwrap();
        assert_eq!(final_visit.payload["categoria"], "Visita Final");
        assert_eq!(report.summary.transitions.len(), 16);
    }
}
