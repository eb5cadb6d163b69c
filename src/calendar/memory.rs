//! Backend de agendamento em memória.
//!
//! Reproduz a checagem de vagas por turno do banco: um agendamento só é
//! criado se o número de agendamentos confirmados sobrepostos, no mesmo turno
//! e data, estiver abaixo de `vagas`. Datas e janelas bloqueadas recusam
//! qualquer agendamento.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use super::client::CalendarBackend;
use super::error::BookingError;
use super::types::{Agendamento, AgendamentoStatus, Bloqueio, NovoAgendamento, Slot, Turno};

#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    turnos: HashMap<String, Turno>,
    bloqueios: Vec<Bloqueio>,
    agendamentos: Mutex<Vec<Agendamento>>,
}

impl InMemoryCalendar {
    pub fn new(turnos: impl IntoIterator<Item = Turno>) -> Self {
        Self {
            turnos: turnos.into_iter().map(|t| (t.id.clone(), t)).collect(),
            bloqueios: Vec::new(),
            agendamentos: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bloqueios(mut self, bloqueios: impl IntoIterator<Item = Bloqueio>) -> Self {
        self.bloqueios.extend(bloqueios);
        self
    }

    /// Turnos padrão: manhã 08–12 e tarde 13–17, duas vagas cada.
    pub fn with_default_turnos() -> Self {
        let hm = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new([
            Turno {
                id: "turno-manha".into(),
                hora_inicio: hm(8),
                hora_fim: hm(12),
                vagas: 2,
                setores: Vec::new(),
            },
            Turno {
                id: "turno-tarde".into(),
                hora_inicio: hm(13),
                hora_fim: hm(17),
                vagas: 2,
                setores: Vec::new(),
            },
        ])
    }

    pub fn turno(&self, id: &str) -> Option<&Turno> {
        self.turnos.get(id)
    }

    /// Cópia dos agendamentos criados até agora.
    pub fn agendamentos(&self) -> Vec<Agendamento> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Agendamento>> {
        self.agendamentos
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_slot(&self, novo: &NovoAgendamento) -> Result<&Turno, BookingError> {
        let turno = self
            .turnos
            .get(&novo.turno_id)
            .ok_or_else(|| BookingError::TurnoNotFound(novo.turno_id.clone()))?;

        if novo.horario_fim <= novo.horario_inicio
            || novo.horario_inicio < turno.hora_inicio
            || novo.horario_fim > turno.hora_fim
        {
            return Err(BookingError::InvalidSlot(format!(
                "{}-{} not within {}-{}",
                novo.horario_inicio, novo.horario_fim, turno.hora_inicio, turno.hora_fim
            )));
        }

        if !turno.setores.is_empty() && !turno.setores.contains(&novo.setor) {
            return Err(BookingError::SectorNotServed {
                turno: turno.id.clone(),
                setor: novo.setor.clone(),
            });
        }

        if let Some(b) = self
            .bloqueios
            .iter()
            .find(|b| b.blocks(&novo.setor, novo.data, novo.horario_inicio, novo.horario_fim))
        {
            return Err(BookingError::Blocked {
                data: novo.data,
                motivo: b.motivo.clone(),
            });
        }
        Ok(turno)
    }
}

impl CalendarBackend for InMemoryCalendar {
    async fn submit_booking(&self, novo: &NovoAgendamento) -> Result<Agendamento, BookingError> {
        let turno = self.check_slot(novo)?;
        let slot = Slot {
            turno_id: novo.turno_id.clone(),
            data: novo.data,
            horario_inicio: novo.horario_inicio,
            horario_fim: novo.horario_fim,
        };

        let mut agendamentos = self.lock();
        let ocupadas = agendamentos
            .iter()
            .filter(|a| {
                a.status == AgendamentoStatus::Confirmado
                    && a.turno_id == slot.turno_id
                    && a.data == slot.data
                    && slot.overlaps(a.horario_inicio, a.horario_fim)
            })
            .count();
        if ocupadas >= turno.vagas as usize {
            return Err(BookingError::NoVacancy);
        }

        let created = Agendamento {
            id: Uuid::new_v4().to_string(),
            turno_id: novo.turno_id.clone(),
            data: novo.data,
            horario_inicio: novo.horario_inicio,
            horario_fim: novo.horario_fim,
            duracao_horas: novo.duracao_horas,
            categoria: novo.categoria.clone(),
            setor: novo.setor.clone(),
            os_id: novo.os_id.clone(),
            solicitante_nome: novo.solicitante_nome.clone(),
            solicitante_contato: novo.solicitante_contato.clone(),
            status: AgendamentoStatus::Confirmado,
            criado_em: Some(Utc::now()),
        };
        agendamentos.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn novo(turno: &str, inicio: u32, fim: u32) -> NovoAgendamento {
        NovoAgendamento {
            turno_id: turno.into(),
            data: NaiveDate::from_ymd_opt(2099, 1, 15).unwrap(),
            horario_inicio: NaiveTime::from_hms_opt(inicio, 0, 0).unwrap(),
            horario_fim: NaiveTime::from_hms_opt(fim, 0, 0).unwrap(),
            duracao_horas: f64::from(fim) - f64::from(inicio),
            categoria: "Visita Técnica".into(),
            setor: "obras".into(),
            os_id: None,
            solicitante_nome: None,
            solicitante_contato: None,
        }
    }

    #[tokio::test]
    async fn books_until_vacancies_run_out() {
        let cal = InMemoryCalendar::with_default_turnos();
        cal.submit_booking(&novo("turno-manha", 8, 10)).await.unwrap();
        cal.submit_booking(&novo("turno-manha", 9, 11)).await.unwrap();

        let err = cal
            .submit_booking(&novo("turno-manha", 9, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NoVacancy));
        assert_eq!(cal.agendamentos().len(), 2);
    }

    #[tokio::test]
    async fn non_overlapping_slots_do_not_consume_vacancy() {
        let cal = InMemoryCalendar::with_default_turnos();
        cal.submit_booking(&novo("turno-manha", 8, 9)).await.unwrap();
        cal.submit_booking(&novo("turno-manha", 8, 9)).await.unwrap();
        assert!(cal.submit_booking(&novo("turno-manha", 10, 12)).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_unknown_turno_and_out_of_hours() {
        let cal = InMemoryCalendar::with_default_turnos();
        assert!(matches!(
            cal.submit_booking(&novo("turno-noite", 19, 20)).await,
            Err(BookingError::TurnoNotFound(_))
        ));
        assert!(matches!(
            cal.submit_booking(&novo("turno-tarde", 12, 14)).await,
            Err(BookingError::InvalidSlot(_))
        ));
    }

    #[tokio::test]
    async fn inverted_slot_is_rejected() {
        let cal = InMemoryCalendar::with_default_turnos();
        let inverted = novo("turno-tarde", 15, 14);
        assert_eq!(inverted.duracao_horas, -1.0);
        assert!(matches!(
            cal.submit_booking(&inverted).await,
            Err(BookingError::InvalidSlot(_))
        ));
        assert!(cal.agendamentos().is_empty());
    }

    #[tokio::test]
    async fn blocked_dates_and_windows_refuse_bookings() {
        let data = NaiveDate::from_ymd_opt(2099, 1, 15).unwrap();
        let cal = InMemoryCalendar::with_default_turnos().with_bloqueios([
            Bloqueio {
                data_inicio: data,
                data_fim: data,
                dia_inteiro: false,
                hora_inicio: NaiveTime::from_hms_opt(8, 0, 0),
                hora_fim: NaiveTime::from_hms_opt(10, 0, 0),
                setor: None,
                motivo: Some("manutenção".into()),
            },
            Bloqueio {
                data_inicio: data,
                data_fim: data,
                dia_inteiro: true,
                hora_inicio: None,
                hora_fim: None,
                setor: Some("assessoria".into()),
                motivo: None,
            },
        ]);

        let err = cal
            .submit_booking(&novo("turno-manha", 9, 11))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Blocked { motivo: Some(ref m), .. } if m == "manutenção"
        ));

        // outside the window, and the whole-day block is for another sector
        assert!(cal.submit_booking(&novo("turno-manha", 10, 12)).await.is_ok());
        assert_eq!(cal.agendamentos().len(), 1);
    }

    #[tokio::test]
    async fn sector_restricted_turno() {
        let cal = InMemoryCalendar::new([Turno {
            id: "turno-assessoria".into(),
            hora_inicio: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            hora_fim: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            vagas: 1,
            setores: vec!["assessoria".into()],
        }]);
        let err = cal
            .submit_booking(&novo("turno-assessoria", 8, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SectorNotServed { .. }));
    }

    #[tokio::test]
    async fn created_booking_is_confirmed() {
        let cal = InMemoryCalendar::with_default_turnos();
        let ag = cal.submit_booking(&novo("turno-tarde", 13, 15)).await.unwrap();
        assert_eq!(ag.status, AgendamentoStatus::Confirmado);
        assert!(!ag.id.is_empty());
        assert!(ag.criado_em.is_some());
        assert!(cal.turno("turno-tarde").is_some());
    }
}
