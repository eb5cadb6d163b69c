//! Tipos de erro do agendamento.
//!
//! Todas as variantes são recuperáveis: a etapa continua ativa e o usuário
//! pode tentar de novo. Nenhuma é retentada automaticamente, porque criar um
//! agendamento não é idempotente.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    /// O turno já está lotado no horário pedido.
    #[error("No vacancy left in this shift")]
    NoVacancy,

    #[error("Unknown shift: {0}")]
    TurnoNotFound(String),

    /// Horário fora do turno ou com fim antes do início.
    #[error("Slot outside shift hours: {0}")]
    InvalidSlot(String),

    /// A data ou a janela de horário está bloqueada no calendário.
    #[error("Calendar is blocked on {data}{}", reason_suffix(.motivo))]
    Blocked {
        data: chrono::NaiveDate,
        motivo: Option<String>,
    },

    #[error("Shift {turno} does not serve sector {setor}")]
    SectorNotServed { turno: String, setor: String },

    /// Erro HTTP devolvido pelo backend (4xx/5xx).
    #[error("Backend error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// O backend respondeu sem o registro criado.
    #[error("Backend returned an empty booking response")]
    EmptyResponse,

    #[error("Booking request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

fn reason_suffix(motivo: &Option<String>) -> String {
    motivo
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = BookingError::Api {
            status: 409,
            message: "conflict".into(),
        };
        assert_eq!(err.to_string(), "Backend error (status 409): conflict");
    }

    #[test]
    fn timeout_display() {
        assert_eq!(
            BookingError::Timeout { ms: 15000 }.to_string(),
            "Booking request timed out after 15000ms"
        );
    }

    #[test]
    fn blocked_display_includes_reason() {
        let data = chrono::NaiveDate::from_ymd_opt(2099, 12, 25).unwrap();
        assert_eq!(
            BookingError::Blocked { data, motivo: Some("feriado".into()) }.to_string(),
            "Calendar is blocked on 2099-12-25 (feriado)"
        );
        assert_eq!(
            BookingError::Blocked { data, motivo: None }.to_string(),
            "Calendar is blocked on 2099-12-25"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BookingError>();
    }
}
