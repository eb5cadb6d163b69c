//! Tipos de dados dos agendamentos.
//!
//! Os nomes de campo seguem as colunas da tabela `agendamentos`, então as
//! structs serializam direto no formato esperado pelo backend.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Situação de um agendamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendamentoStatus {
    Confirmado,
    Cancelado,
    Realizado,
    Ausente,
}

/// Agendamento persistido, como devolvido pelo backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agendamento {
    pub id: String,
    pub turno_id: String,
    pub data: NaiveDate,
    pub horario_inicio: NaiveTime,
    pub horario_fim: NaiveTime,
    pub duracao_horas: f64,
    pub categoria: String,
    pub setor: String,
    #[serde(default)]
    pub os_id: Option<String>,
    #[serde(default)]
    pub solicitante_nome: Option<String>,
    #[serde(default)]
    pub solicitante_contato: Option<String>,
    pub status: AgendamentoStatus,
    #[serde(default)]
    pub criado_em: Option<DateTime<Utc>>,
}

/// Dados para criar um agendamento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovoAgendamento {
    pub turno_id: String,
    pub data: NaiveDate,
    pub horario_inicio: NaiveTime,
    pub horario_fim: NaiveTime,
    pub duracao_horas: f64,
    pub categoria: String,
    pub setor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solicitante_nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solicitante_contato: Option<String>,
}

/// Horário escolhido pelo usuário no calendário.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub turno_id: String,
    pub data: NaiveDate,
    pub horario_inicio: NaiveTime,
    pub horario_fim: NaiveTime,
}

impl Slot {
    /// Duração em horas; negativa quando o fim vem antes do início.
    pub fn duracao_horas(&self) -> f64 {
        (self.horario_fim - self.horario_inicio).num_minutes() as f64 / 60.0
    }

    pub fn overlaps(&self, other_inicio: NaiveTime, other_fim: NaiveTime) -> bool {
        self.horario_inicio < other_fim && other_inicio < self.horario_fim
    }
}

/// Turno de atendimento com limite de vagas simultâneas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turno {
    pub id: String,
    pub hora_inicio: NaiveTime,
    pub hora_fim: NaiveTime,
    pub vagas: u32,
    /// Setores atendidos; vazio aceita qualquer setor.
    #[serde(default)]
    pub setores: Vec<String>,
}

/// Bloqueio do calendário: feriado, manutenção, evento interno.
///
/// Um bloqueio de dia inteiro fecha todas as datas entre `data_inicio` e
/// `data_fim`; sem `dia_inteiro`, só a janela `hora_inicio`..`hora_fim` de
/// cada dia. Sem `setor`, vale para todos os setores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bloqueio {
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub dia_inteiro: bool,
    #[serde(default)]
    pub hora_inicio: Option<NaiveTime>,
    #[serde(default)]
    pub hora_fim: Option<NaiveTime>,
    #[serde(default)]
    pub setor: Option<String>,
    #[serde(default)]
    pub motivo: Option<String>,
}

impl Bloqueio {
    /// O intervalo `inicio..fim` de `data` cai neste bloqueio?
    pub fn blocks(&self, setor: &str, data: NaiveDate, inicio: NaiveTime, fim: NaiveTime) -> bool {
        if data < self.data_inicio || data > self.data_fim {
            return false;
        }
        if self.setor.as_deref().is_some_and(|s| s != setor) {
            return false;
        }
        match (self.dia_inteiro, self.hora_inicio, self.hora_fim) {
            (true, _, _) => true,
            (false, Some(h_inicio), Some(h_fim)) => inicio < h_fim && h_inicio < fim,
            // janela incompleta vale o dia todo
            (false, _, _) => true,
        }
    }
}

/// Resumo gravado no formulário da etapa depois do agendamento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendamentoData {
    pub agendamento_id: Option<String>,
    pub data_agendamento: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_duration_in_hours() {
        let slot = Slot {
            turno_id: "manha".into(),
            data: NaiveDate::from_ymd_opt(2099, 3, 10).unwrap(),
            horario_inicio: t(8, 0),
            horario_fim: t(9, 30),
        };
        assert_eq!(slot.duracao_horas(), 1.5);
    }

    #[test]
    fn slot_overlap_is_half_open() {
        let slot = Slot {
            turno_id: "manha".into(),
            data: NaiveDate::from_ymd_opt(2099, 3, 10).unwrap(),
            horario_inicio: t(9, 0),
            horario_fim: t(10, 0),
        };
        assert!(slot.overlaps(t(9, 30), t(11, 0)));
        assert!(!slot.overlaps(t(10, 0), t(11, 0)));
        assert!(!slot.overlaps(t(8, 0), t(9, 0)));
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2099, 3, d).unwrap()
    }

    #[test]
    fn whole_day_block_covers_its_date_range() {
        let feriado = Bloqueio {
            data_inicio: day(10),
            data_fim: day(11),
            dia_inteiro: true,
            hora_inicio: None,
            hora_fim: None,
            setor: None,
            motivo: Some("feriado".into()),
        };
        assert!(feriado.blocks("obras", day(10), t(8, 0), t(9, 0)));
        assert!(feriado.blocks("assessoria", day(11), t(16, 0), t(17, 0)));
        assert!(!feriado.blocks("obras", day(12), t(8, 0), t(9, 0)));
    }

    #[test]
    fn time_window_block_only_hits_overlapping_slots() {
        let reuniao = Bloqueio {
            data_inicio: day(10),
            data_fim: day(10),
            dia_inteiro: false,
            hora_inicio: Some(t(9, 0)),
            hora_fim: Some(t(10, 0)),
            setor: Some("obras".into()),
            motivo: None,
        };
        assert!(reuniao.blocks("obras", day(10), t(9, 30), t(11, 0)));
        assert!(!reuniao.blocks("obras", day(10), t(10, 0), t(11, 0)));
        assert!(!reuniao.blocks("assessoria", day(10), t(9, 0), t(10, 0)));
    }

    #[test]
    fn agendamento_deserializes_from_table_row() {
        let row = r#"{
            "id": "ag-1",
            "turno_id": "turno-manha",
            "data": "2099-05-04",
            "horario_inicio": "09:00:00",
            "horario_fim": "11:00:00",
            "duracao_horas": 2,
            "categoria": "Visita Técnica",
            "setor": "obras",
            "os_id": "os-1",
            "status": "confirmado"
        }"#;
        let ag: Agendamento = serde_json::from_str(row).unwrap();
        assert_eq!(ag.status, AgendamentoStatus::Confirmado);
        assert_eq!(ag.horario_inicio, t(9, 0));
        assert_eq!(ag.duracao_horas, 2.0);
        assert!(ag.solicitante_nome.is_none());
    }

    #[test]
    fn novo_agendamento_omits_empty_optionals() {
        let novo = NovoAgendamento {
            turno_id: "turno-manha".into(),
            data: NaiveDate::from_ymd_opt(2099, 5, 4).unwrap(),
            horario_inicio: t(9, 0),
            horario_fim: t(10, 0),
            duracao_horas: 1.0,
            categoria: "Visita Técnica".into(),
            setor: "obras".into(),
            os_id: None,
            solicitante_nome: None,
            solicitante_contato: None,
        };
        let json = serde_json::to_string(&novo).unwrap();
        assert!(!json.contains("os_id"));
        assert!(json.contains(r#""horario_inicio":"09:00:00""#));
    }
}
