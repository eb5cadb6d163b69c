use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{StepView, WorkflowStep};
use crate::calendar::{Agendamento, AgendamentoStatus, CalendarBackend, CalendarIntegration, Slot};
use crate::error::{StepError, ValidationError, WorkflowError};
use crate::workflow::{SchedulingKind, ServiceOrder, StepDefinition, StepResult, WorkflowHandle};

/// Who is booking; recorded in the step payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler {
    pub id: String,
    pub nome: String,
}

/// Booking reference as written by a committed scheduling step.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommittedBooking {
    agendamento_id: String,
    data_agendamento: NaiveDate,
    horario_inicio: NaiveTime,
    horario_fim: NaiveTime,
    turno_id: String,
    agendado_por_id: Option<String>,
    agendado_por_nome: Option<String>,
}

impl CommittedBooking {
    /// `None` when the payload carries no booking (e.g. an older result).
    pub(super) fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }

    pub(super) fn agendamento(&self, categoria: &str, setor: &str, os_id: &str) -> Agendamento {
        Agendamento {
            id: self.agendamento_id.clone(),
            turno_id: self.turno_id.clone(),
            data: self.data_agendamento,
            horario_inicio: self.horario_inicio,
            horario_fim: self.horario_fim,
            duracao_horas: (self.horario_fim - self.horario_inicio).num_minutes() as f64 / 60.0,
            categoria: categoria.to_string(),
            setor: setor.to_string(),
            os_id: Some(os_id.to_string()),
            solicitante_nome: None,
            solicitante_contato: None,
            status: AgendamentoStatus::Confirmado,
            criado_em: None,
        }
    }

    pub(super) fn scheduler(&self) -> Option<Scheduler> {
        match (&self.agendado_por_id, &self.agendado_por_nome) {
            (Some(id), Some(nome)) => Some(Scheduler {
                id: id.clone(),
                nome: nome.clone(),
            }),
            _ => None,
        }
    }
}

/// Calendar step: pick a slot, book it, commit the booking reference.
///
/// A booking is never retried. If the store navigated while the booking was
/// in flight, the result is dropped and the order is left untouched.
pub struct SchedulingStep<C> {
    definition: &'static StepDefinition,
    kind: SchedulingKind,
    backend: Arc<C>,
    calendar: CalendarIntegration,
    timeout: Duration,
    scheduler: Option<Scheduler>,
}

impl<C: CalendarBackend> SchedulingStep<C> {
    pub fn new(
        definition: &'static StepDefinition,
        kind: SchedulingKind,
        calendar: CalendarIntegration,
        backend: Arc<C>,
        timeout: Duration,
    ) -> Self {
        Self {
            definition,
            kind,
            backend,
            calendar,
            timeout,
            scheduler: None,
        }
    }

    pub fn kind(&self) -> SchedulingKind {
        self.kind
    }

    pub fn select(&mut self, slot: Slot) {
        self.calendar.select(slot);
    }

    pub fn set_contact(&mut self, nome: &str, contato: &str) {
        self.calendar.set_contact(nome, contato);
    }

    pub fn set_scheduler(&mut self, id: impl Into<String>, nome: impl Into<String>) {
        self.scheduler = Some(Scheduler {
            id: id.into(),
            nome: nome.into(),
        });
    }

    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    pub fn calendar(&self) -> &CalendarIntegration {
        &self.calendar
    }

    fn booked_payload(&self) -> Value {
        let mut payload = json!({
            "categoria": self.kind.categoria(),
            "agendadoEm": Utc::now(),
        });
        if let Some(ag) = self.calendar.agendamento() {
            payload["agendamentoId"] = json!(ag.id);
            payload["dataAgendamento"] = json!(ag.data);
            payload["horarioInicio"] = json!(ag.horario_inicio);
            payload["horarioFim"] = json!(ag.horario_fim);
            payload["turnoId"] = json!(ag.turno_id);
        }
        if let Some(s) = &self.scheduler {
            payload["agendadoPorId"] = json!(s.id);
            payload["agendadoPorNome"] = json!(s.nome);
        }
        payload
    }
}

impl<C: CalendarBackend> WorkflowStep for SchedulingStep<C> {
    fn id(&self) -> &'static str {
        self.definition.id
    }

    fn render(&self, order: &ServiceOrder) -> StepView {
        let mut view = StepView::for_step(self.definition, order);
        view.detail = self
            .calendar
            .selected()
            .map(|s| format!("{} {}-{} ({})", s.data, s.horario_inicio, s.horario_fim, s.turno_id));
        view
    }

    fn validate(&self) -> Result<Value, ValidationError> {
        let slot = self.calendar.pre_validate()?;
        Ok(json!({
            "turnoId": slot.turno_id,
            "data": slot.data,
            "horarioInicio": slot.horario_inicio,
            "horarioFim": slot.horario_fim,
        }))
    }

    async fn try_submit(&mut self, handle: &WorkflowHandle) -> Result<StepResult, StepError> {
        let ticket = handle.ticket();
        if ticket.step_id != self.id() {
            return Err(ValidationError::WrongStep {
                given: self.id().to_string(),
                current: ticket.step_id.to_string(),
            }
            .into());
        }
        self.validate()?;

        let agendamento = self
            .calendar
            .submit_booking(self.backend.as_ref(), self.timeout)
            .await?;

        match handle.commit(&ticket, self.booked_payload()) {
            Ok(result) => {
                info!(step = self.id(), agendamento = %agendamento.id, "scheduling step committed");
                Ok(result)
            }
            Err(err) => {
                warn!(
                    step = self.id(),
                    agendamento = %agendamento.id,
                    error = %err,
                    "booking result discarded"
                );
                if matches!(err, WorkflowError::Stale { .. }) {
                    // The order never referenced this booking; let the user pick again.
                    self.calendar.release();
                    debug!(step = self.id(), "stale booking released");
                }
                Err(err.into())
            }
        }
    }

    fn reset(&mut self) {
        self.calendar.reset();
    }
}
