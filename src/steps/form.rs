//! Etapas de formulário.
//!
//! Cada etapa tem um conjunto fixo de regras de campo; `validate` aplica todas
//! e só então o payload pode ser gravado no store.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::debug;

use super::{StepView, WorkflowStep};
use crate::error::{StepError, ValidationError};
use crate::workflow::{ServiceOrder, StepDefinition, StepKind, StepResult, WorkflowHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Text,
    Email,
    /// `YYYY-MM-DD`.
    Date,
    /// JSON number or numeric string.
    Number,
    /// Must be `true`.
    Accepted,
    /// Non-empty array.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub min_len: Option<usize>,
    pub format: FieldFormat,
}

impl FieldRule {
    pub const fn required(field: &'static str) -> Self {
        Self {
            field,
            required: true,
            min_len: None,
            format: FieldFormat::Text,
        }
    }

    pub const fn optional(field: &'static str) -> Self {
        Self {
            field,
            required: false,
            min_len: None,
            format: FieldFormat::Text,
        }
    }

    pub const fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub const fn format(mut self, format: FieldFormat) -> Self {
        self.format = format;
        self
    }

    pub fn check(&self, value: Option<&Value>) -> Result<(), ValidationError> {
        let value = match value {
            Some(v) if !is_blank(v) => v,
            _ if self.required => {
                return Err(ValidationError::MissingField {
                    field: self.field.to_string(),
                });
            }
            _ => return Ok(()),
        };

        if let Some(min) = self.min_len {
            let len = value.as_str().map(|s| s.trim().chars().count()).unwrap_or(0);
            if len < min {
                return Err(self.invalid(format!("must have at least {min} characters")));
            }
        }

        match self.format {
            FieldFormat::Text => Ok(()),
            FieldFormat::Email => match value.as_str() {
                Some(s) if looks_like_email(s) => Ok(()),
                _ => Err(self.invalid("invalid email".into())),
            },
            FieldFormat::Date => match value.as_str().map(|s| s.parse::<NaiveDate>()) {
                Some(Ok(_)) => Ok(()),
                _ => Err(self.invalid("expected a date (YYYY-MM-DD)".into())),
            },
            FieldFormat::Number => {
                let ok = value.is_number()
                    || value
                        .as_str()
                        .is_some_and(|s| s.trim().replace(',', ".").parse::<f64>().is_ok());
                if ok {
                    Ok(())
                } else {
                    Err(self.invalid("expected a number".into()))
                }
            }
            FieldFormat::Accepted => match value.as_bool() {
                Some(true) => Ok(()),
                _ => Err(self.invalid("must be confirmed".into())),
            },
            FieldFormat::List => match value.as_array() {
                Some(items) if !items.is_empty() => Ok(()),
                _ => Err(self.invalid("at least one item is required".into())),
            },
        }
    }

    fn invalid(&self, message: String) -> ValidationError {
        ValidationError::InvalidField {
            field: self.field.to_string(),
            message,
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn looks_like_email(s: &str) -> bool {
    let s = s.trim();
    match s.split_once('@') {
        Some((user, domain)) => {
            !user.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

use FieldFormat::{Accepted, Date, Email, List, Number};

static IDENTIFICACAO_LEAD: [FieldRule; 3] = [
    FieldRule::required("leadId"),
    FieldRule::required("nome").min_len(3),
    FieldRule::optional("email").format(Email),
];
static IDENTIFICACAO_CLIENTE: [FieldRule; 3] = [
    FieldRule::required("nome").min_len(3),
    FieldRule::required("email").format(Email),
    FieldRule::optional("telefone"),
];
static SELECAO_TIPO: [FieldRule; 1] = [FieldRule::required("tipoOS")];
static FOLLOWUP_1: [FieldRule; 2] = [
    FieldRule::required("dataEntrevista").format(Date),
    FieldRule::required("interessePrincipal"),
];
static REALIZAR_VISITA: [FieldRule; 2] = [
    FieldRule::required("dataVisitaRealizada").format(Date),
    FieldRule::required("observacoesVisita").min_len(10),
];
static FOLLOWUP_2: [FieldRule; 2] = [
    FieldRule::required("dataFollowup").format(Date),
    FieldRule::required("feedback").min_len(10),
];
static MEMORIAL_ESCOPO: [FieldRule; 3] = [
    FieldRule::required("idadeEdificacao"),
    FieldRule::required("tipoEdificacao"),
    FieldRule::required("descricaoEscopo").min_len(20),
];
static PRECIFICACAO: [FieldRule; 3] = [
    FieldRule::required("materialCusto").format(Number),
    FieldRule::required("maoObraCusto").format(Number),
    FieldRule::required("margemLucro").format(Number),
];
static ANALISE_PARECER: [FieldRule; 1] = [FieldRule::required("parecer").min_len(20)];

static UPLOAD: [FieldRule; 1] = [FieldRule::required("arquivos").format(List)];
static DOCUMENT: [FieldRule; 1] = [FieldRule::required("documentoId")];
static APPROVAL: [FieldRule; 1] = [FieldRule::required("aprovado").format(Accepted)];

/// Regras de campo de uma etapa. Etapas sem regras próprias usam as do tipo.
pub fn rules_for(step: &StepDefinition) -> &'static [FieldRule] {
    match step.id {
        "identificacao-lead" => &IDENTIFICACAO_LEAD,
        "identificacao-cliente" | "identificacao-solicitante" | "cadastrar-cliente" => {
            &IDENTIFICACAO_CLIENTE
        }
        "selecao-tipo" => &SELECAO_TIPO,
        "followup-1" => &FOLLOWUP_1,
        "realizar-visita" => &REALIZAR_VISITA,
        "followup-2" => &FOLLOWUP_2,
        "memorial-escopo" => &MEMORIAL_ESCOPO,
        "precificacao" => &PRECIFICACAO,
        "analise-parecer" => &ANALISE_PARECER,
        _ => match step.kind {
            StepKind::Upload => &UPLOAD,
            StepKind::Document => &DOCUMENT,
            StepKind::Approval => &APPROVAL,
            StepKind::Form | StepKind::Scheduling(_) => &[],
        },
    }
}

/// Etapa de entrada de dados: formulário, upload, documento ou aprovação.
#[derive(Debug, Clone)]
pub struct FormStep {
    definition: &'static StepDefinition,
    rules: &'static [FieldRule],
    values: Map<String, Value>,
}

impl FormStep {
    pub fn new(definition: &'static StepDefinition) -> Self {
        Self {
            definition,
            rules: rules_for(definition),
            values: Map::new(),
        }
    }

    pub fn rules(&self) -> &'static [FieldRule] {
        self.rules
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Copia todos os campos de um objeto JSON; outros valores são ignorados.
    pub fn fill(&mut self, values: &Value) {
        if let Some(obj) = values.as_object() {
            for (k, v) in obj {
                self.values.insert(k.clone(), v.clone());
            }
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl WorkflowStep for FormStep {
    fn id(&self) -> &'static str {
        self.definition.id
    }

    fn render(&self, order: &ServiceOrder) -> StepView {
        StepView::for_step(self.definition, order)
    }

    fn validate(&self) -> Result<Value, ValidationError> {
        for rule in self.rules {
            rule.check(self.values.get(rule.field))?;
        }
        Ok(Value::Object(self.values.clone()))
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
        let payload = self.validate()?;
        let result = handle.commit(&ticket, payload)?;
        debug!(step = self.id(), "form step submitted");
        Ok(result)
    }

    fn reset(&mut self) {
        self.values.clear();
    }
}
