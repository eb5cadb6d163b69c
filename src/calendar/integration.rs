//! Componente de integração com o calendário.
//!
//! Cada etapa de agendamento guarda uma instância: o usuário escolhe um horário
//! com [`CalendarIntegration::select`], a etapa valida com
//! [`CalendarIntegration::pre_validate`] e só então cria o agendamento.
//! Depois de confirmado, o agendamento não muda até `reset`.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use super::client::CalendarBackend;
use super::error::BookingError;
use super::types::{Agendamento, AgendamentoData, NovoAgendamento, Slot};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub nome: String,
    pub contato: String,
}

#[derive(Debug, Clone)]
pub struct CalendarIntegration {
    os_id: String,
    categoria: String,
    setor: String,
    require_contact: bool,
    contact: Option<Contact>,
    selected: Option<Slot>,
    confirmed: Option<Agendamento>,
}

impl CalendarIntegration {
    pub fn new(os_id: impl Into<String>, categoria: impl Into<String>, setor: impl Into<String>) -> Self {
        Self {
            os_id: os_id.into(),
            categoria: categoria.into(),
            setor: setor.into(),
            require_contact: false,
            contact: None,
            selected: None,
            confirmed: None,
        }
    }

    /// Reabre a etapa com um agendamento já gravado na OS.
    ///
    /// O horário fica selecionado e confirmado; submeter de novo reaproveita o
    /// agendamento sem outra chamada ao backend.
    pub fn with_existing(mut self, agendamento: Agendamento) -> Self {
        self.selected = Some(Slot {
            turno_id: agendamento.turno_id.clone(),
            data: agendamento.data,
            horario_inicio: agendamento.horario_inicio,
            horario_fim: agendamento.horario_fim,
        });
        self.confirmed = Some(agendamento);
        self
    }

    /// Exige nome e contato do solicitante antes de agendar.
    pub fn requiring_contact(mut self) -> Self {
        self.require_contact = true;
        self
    }

    pub fn set_contact(&mut self, nome: impl Into<String>, contato: impl Into<String>) {
        self.contact = Some(Contact {
            nome: nome.into(),
            contato: contato.into(),
        });
    }

    /// Seleciona um horário. Ignorado quando já existe agendamento confirmado.
    pub fn select(&mut self, slot: Slot) {
        if self.confirmed.is_some() {
            debug!(os_id = %self.os_id, "slot selection ignored, booking already confirmed");
            return;
        }
        self.selected = Some(slot);
    }

    pub fn selected(&self) -> Option<&Slot> {
        self.selected.as_ref()
    }

    pub fn agendamento(&self) -> Option<&Agendamento> {
        self.confirmed.as_ref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed.is_some()
    }

    pub fn agendamento_data(&self) -> AgendamentoData {
        AgendamentoData {
            agendamento_id: self.confirmed.as_ref().map(|a| a.id.clone()),
            data_agendamento: self.confirmed.as_ref().map(|a| a.data),
        }
    }

    pub fn pre_validate(&self) -> Result<&Slot, ValidationError> {
        self.pre_validate_on(Local::now().date_naive())
    }

    /// Valida a seleção contra uma data de referência.
    ///
    /// Um agendamento confirmado já passou por aqui e não é revalidado, mesmo
    /// que a data tenha ficado no passado.
    pub fn pre_validate_on(&self, today: NaiveDate) -> Result<&Slot, ValidationError> {
        let slot = self.selected.as_ref().ok_or(ValidationError::NoSlotSelected)?;
        if self.confirmed.is_some() {
            return Ok(slot);
        }
        if slot.data < today {
            return Err(ValidationError::DateInPast { date: slot.data });
        }
        if slot.horario_fim <= slot.horario_inicio {
            return Err(ValidationError::InvalidField {
                field: "horario_fim".into(),
                message: "must be after horario_inicio".into(),
            });
        }
        if self.require_contact {
            match &self.contact {
                Some(c) if !c.nome.trim().is_empty() && !c.contato.trim().is_empty() => {}
                _ => return Err(ValidationError::MissingContact),
            }
        }
        Ok(slot)
    }

    fn novo_agendamento(&self, slot: &Slot) -> NovoAgendamento {
        NovoAgendamento {
            turno_id: slot.turno_id.clone(),
            data: slot.data,
            horario_inicio: slot.horario_inicio,
            horario_fim: slot.horario_fim,
            duracao_horas: slot.duracao_horas(),
            categoria: self.categoria.clone(),
            setor: self.setor.clone(),
            os_id: Some(self.os_id.clone()),
            solicitante_nome: self.contact.as_ref().map(|c| c.nome.clone()),
            solicitante_contato: self.contact.as_ref().map(|c| c.contato.clone()),
        }
    }

    /// Cria o agendamento do horário selecionado.
    ///
    /// Chame `pre_validate` antes. Um agendamento já confirmado é devolvido
    /// sem nova chamada ao backend. Estourar o `timeout` vira
    /// [`BookingError::Timeout`]; nada é retentado.
    pub async fn submit_booking<C: CalendarBackend>(
        &mut self,
        backend: &C,
        timeout: Duration,
    ) -> Result<Agendamento, BookingError> {
        if let Some(existing) = &self.confirmed {
            return Ok(existing.clone());
        }
        let slot = self
            .selected
            .as_ref()
            .ok_or_else(|| BookingError::InvalidSlot("no slot selected".into()))?;
        let novo = self.novo_agendamento(slot);

        let created = match tokio::time::timeout(timeout, backend.submit_booking(&novo)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BookingError::Timeout {
                    ms: timeout.as_millis() as u64,
                });
            }
        };
        info!(os_id = %self.os_id, agendamento = %created.id, data = %created.data, "booking confirmed");
        self.confirmed = Some(created.clone());
        Ok(created)
    }

    /// Solta o agendamento confirmado e mantém a seleção.
    ///
    /// Usado quando o resultado não pôde ser gravado na OS: o usuário volta a
    /// poder escolher outro horário.
    pub fn release(&mut self) -> Option<Agendamento> {
        self.confirmed.take()
    }

    /// Descarta seleção e agendamento.
    pub fn reset(&mut self) {
        self.selected = None;
        self.confirmed = None;
    }
}
