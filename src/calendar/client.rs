use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::BookingError;
use super::types::{Agendamento, NovoAgendamento};

/// Anything that can create a calendar booking.
pub trait CalendarBackend {
    async fn submit_booking(&self, novo: &NovoAgendamento) -> Result<Agendamento, BookingError>;
}

impl<T: CalendarBackend> CalendarBackend for std::sync::Arc<T> {
    async fn submit_booking(&self, novo: &NovoAgendamento) -> Result<Agendamento, BookingError> {
        (**self).submit_booking(novo).await
    }
}

#[derive(Serialize)]
struct VagasRequest<'a> {
    p_turno_id: &'a str,
    p_data: chrono::NaiveDate,
    p_horario_inicio: chrono::NaiveTime,
    p_horario_fim: chrono::NaiveTime,
}

/// Booking backend speaking the REST conventions of the hosted database.
///
/// Vacancy is checked through the `verificar_vagas_turno` RPC before the row
/// is inserted into `agendamentos`.
pub struct RestCalendarClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl RestCalendarClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, BookingError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
    }

    async fn has_vacancy(&self, novo: &NovoAgendamento) -> Result<bool, BookingError> {
        let body = VagasRequest {
            p_turno_id: &novo.turno_id,
            p_data: novo.data,
            p_horario_inicio: novo.horario_inicio,
            p_horario_fim: novo.horario_fim,
        };
        let response = self.post("rpc/verificar_vagas_turno").json(&body).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<bool>().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BookingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    warn!(status = status.as_u16(), %message, "booking backend error");
    Err(BookingError::Api {
        status: status.as_u16(),
        message,
    })
}

impl CalendarBackend for RestCalendarClient {
    async fn submit_booking(&self, novo: &NovoAgendamento) -> Result<Agendamento, BookingError> {
        if !self.has_vacancy(novo).await? {
            return Err(BookingError::NoVacancy);
        }

        let response = self
            .post("agendamentos")
            .header("prefer", "return=representation")
            .json(novo)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            // Unique slot constraint: someone booked between the RPC and the insert.
            return Err(BookingError::NoVacancy);
        }
        let response = check_status(response).await?;

        let mut rows = response.json::<Vec<Agendamento>>().await?;
        if rows.is_empty() {
            return Err(BookingError::EmptyResponse);
        }
        let created = rows.swap_remove(0);
        debug!(id = %created.id, data = %created.data, "booking created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn novo() -> NovoAgendamento {
        NovoAgendamento {
            turno_id: "turno-manha".into(),
            data: NaiveDate::from_ymd_opt(2099, 6, 1).unwrap(),
            horario_inicio: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            horario_fim: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duracao_horas: 1.0,
            categoria: "Visita Técnica".into(),
            setor: "obras".into(),
            os_id: Some("os-1".into()),
            solicitante_nome: None,
            solicitante_contato: None,
        }
    }

    fn created_row() -> serde_json::Value {
        json!([{
            "id": "ag-77",
            "turno_id": "turno-manha",
            "data": "2099-06-01",
            "horario_inicio": "09:00:00",
            "horario_fim": "10:00:00",
            "duracao_horas": 1.0,
            "categoria": "Visita Técnica",
            "setor": "obras",
            "os_id": "os-1",
            "status": "confirmado"
        }])
    }

    #[tokio::test]
    async fn submit_booking_checks_vacancy_then_inserts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/verificar_vagas_turno"))
            .and(header("apikey", "anon-key"))
            .and(body_partial_json(json!({ "p_turno_id": "turno-manha" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/agendamentos"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(created_row()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestCalendarClient::new(&server.uri(), "anon-key".into()).unwrap();
        let ag = client.submit_booking(&novo()).await.unwrap();
        assert_eq!(ag.id, "ag-77");
        assert_eq!(ag.os_id.as_deref(), Some("os-1"));
    }

    #[tokio::test]
    async fn no_vacancy_skips_insert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/verificar_vagas_turno"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/agendamentos"))
            .respond_with(ResponseTemplate::new(201).set_body_json(created_row()))
            .expect(0)
            .mount(&server)
            .await;

        let client = RestCalendarClient::new(&server.uri(), "k".into()).unwrap();
        let err = client.submit_booking(&novo()).await.unwrap_err();
        assert!(matches!(err, BookingError::NoVacancy));
    }

    #[tokio::test]
    async fn insert_conflict_maps_to_no_vacancy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/verificar_vagas_turno"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/agendamentos"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;

        let client = RestCalendarClient::new(&server.uri(), "k".into()).unwrap();
        let err = client.submit_booking(&novo()).await.unwrap_err();
        assert!(matches!(err, BookingError::NoVacancy));
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/verificar_vagas_turno"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = RestCalendarClient::new(&server.uri(), "k".into()).unwrap();
        match client.submit_booking(&novo()).await.unwrap_err() {
            BookingError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_insert_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/verificar_vagas_turno"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/agendamentos"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = RestCalendarClient::new(&format!("{}/", server.uri()), "k".into()).unwrap();
        let err = client.submit_booking(&novo()).await.unwrap_err();
        assert!(matches!(err, BookingError::EmptyResponse));
    }
}
