use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RouteError;

/// Service-order type code, `type-01` through `type-13`.
///
/// Parses both the canonical form (`type-07`) and the business alias used on
/// documents and in the database (`OS-07`). Always displays canonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeCode(u8);

impl TypeCode {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 13;

    /// Builds a code from its number; `None` outside `1..=13`.
    pub fn new(number: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&number)
            .then_some(Self(number))
    }

    // Table literals only; callers outside the crate go through `new`.
    pub(crate) const fn raw(number: u8) -> Self {
        Self(number)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// The `OS-NN` form shown on documents.
    pub fn os_code(self) -> String {
        format!("OS-{:02}", self.0)
    }

    /// Every valid code in ascending order.
    pub fn all() -> impl Iterator<Item = TypeCode> {
        (Self::MIN..=Self::MAX).map(TypeCode)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type-{:02}", self.0)
    }
}

impl FromStr for TypeCode {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("type-")
            .or_else(|| lower.strip_prefix("os-"))
            .ok_or_else(|| RouteError::NotFound(s.to_string()))?;

        // Exactly two digits: "type-7" and "type-007" are not table keys.
        if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(RouteError::NotFound(s.to_string()));
        }

        digits
            .parse::<u8>()
            .ok()
            .and_then(TypeCode::new)
            .ok_or_else(|| RouteError::NotFound(s.to_string()))
    }
}

impl TryFrom<String> for TypeCode {
    type Error = RouteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeCode> for String {
    fn from(code: TypeCode) -> Self {
        code.to_string()
    }
}

/// Lifecycle status of a service order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Completed and cancelled orders accept no further commits.
    pub fn is_closed(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "OPEN"),
            OrderStatus::InProgress => write!(f, "IN_PROGRESS"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Approval state of a step that needs a coordinator's sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// The step has no approval gate.
    NaoRequer,
    /// Gate exists but nobody asked for approval yet.
    Pendente,
    Solicitada,
    Aprovada,
    Rejeitada,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalStatus::NaoRequer => "nao_requer",
            ApprovalStatus::Pendente => "pendente",
            ApprovalStatus::Solicitada => "solicitada",
            ApprovalStatus::Aprovada => "aprovada",
            ApprovalStatus::Rejeitada => "rejeitada",
        })
    }
}

/// One change of a step's approval state. The newest entry per step wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepApproval {
    pub step_number: u32,
    pub status: ApprovalStatus,
    /// Cargo slug of whoever made the change, when known.
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub justificativa: Option<String>,
    #[serde(default)]
    pub motivo_rejeicao: Option<String>,
    pub at: DateTime<Utc>,
}

/// Output of one successful step submission. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub step_number: u32,
    pub payload: Value,
    pub completed_at: DateTime<Utc>,
}

/// One move of the step cursor, forward or backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTransition {
    pub from: u32,
    pub to: u32,
    pub at: DateTime<Utc>,
}

/// A service order as held by the workflow store during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: String,
    /// Human-facing code, e.g. `OS-07-0001`.
    pub codigo: String,
    pub type_code: TypeCode,
    /// 1-based index into the type's step catalogue.
    pub current_step: u32,
    pub status: OrderStatus,
    pub step_results: Vec<StepResult>,
    pub history: Vec<StepTransition>,
    #[serde(default)]
    pub approvals: Vec<StepApproval>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    pub fn new(type_code: TypeCode, sequence: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            codigo: format!("{}-{sequence:04}", type_code.os_code()),
            type_code,
            current_step: 1,
            status: OrderStatus::Open,
            step_results: Vec::new(),
            history: Vec::new(),
            approvals: Vec::new(),
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Most recent result committed for a step number, if any.
    pub fn latest_result(&self, step_number: u32) -> Option<&StepResult> {
        self.step_results
            .iter()
            .rev()
            .find(|r| r.step_number == step_number)
    }

    pub fn has_result(&self, step_number: u32) -> bool {
        self.latest_result(step_number).is_some()
    }

    /// Latest approval record for a step, if any was ever made.
    pub fn latest_approval(&self, step_number: u32) -> Option<&StepApproval> {
        self.approvals
            .iter()
            .rev()
            .find(|a| a.step_number == step_number)
    }

    /// Number of distinct steps with at least one committed result.
    pub fn completed_steps(&self) -> usize {
        let mut numbers: Vec<u32> = self.step_results.iter().map(|r| r.step_number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers.len()
    }
}

/// Compact record of a finished (or abandoned) workflow session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub order_id: String,
    pub codigo: String,
    pub type_code: TypeCode,
    pub status: OrderStatus,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub transitions: Vec<StepTransition>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl WorkflowSummary {
    pub fn from_order(order: &ServiceOrder, total_steps: usize) -> Self {
        let now = Utc::now();
        Self {
            order_id: order.id.clone(),
            codigo: order.codigo.clone(),
            type_code: order.type_code,
            status: order.status,
            completed_steps: order.completed_steps(),
            total_steps,
            transitions: order.history.clone(),
            started_at: order.created_at,
            finished_at: now,
            duration_ms: (now - order.created_at).num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_code_parses_canonical_and_alias() {
        let canonical: TypeCode = "type-07".parse().unwrap();
        let alias: TypeCode = "OS-07".parse().unwrap();
        assert_eq!(canonical, alias);
        assert_eq!(canonical.number(), 7);
        assert_eq!(canonical.to_string(), "type-07");
        assert_eq!(canonical.os_code(), "OS-07");
    }

    #[test]
    fn type_code_rejects_out_of_range_and_malformed() {
        assert!("type-00".parse::<TypeCode>().is_err());
        assert!("type-14".parse::<TypeCode>().is_err());
        assert!("type-7".parse::<TypeCode>().is_err());
        assert!("type-ab".parse::<TypeCode>().is_err());
        assert!("07".parse::<TypeCode>().is_err());
        assert_eq!(TypeCode::all().count(), 13);
    }

    #[test]
    fn order_creation_defaults() {
        let order = ServiceOrder::new(TypeCode::raw(13), 42);
        assert_eq!(order.codigo, "OS-13-0042");
        assert_eq!(order.current_step, 1);
        assert_eq!(order.status, OrderStatus::Open);
        assert!(order.step_results.is_empty());
        assert!(order.history.is_empty());
    }

    #[test]
    fn latest_result_prefers_newest_entry() {
        let mut order = ServiceOrder::new(TypeCode::raw(1), 1);
        for answer in ["first", "second"] {
            order.step_results.push(StepResult {
                step_id: "followup-1".into(),
                step_number: 3,
                payload: json!({ "answer": answer }),
                completed_at: Utc::now(),
            });
        }
        let latest = order.latest_result(3).unwrap();
        assert_eq!(latest.payload["answer"], "second");
        assert_eq!(order.completed_steps(), 1);
        assert!(!order.has_result(4));
    }

    #[test]
    fn latest_approval_wins() {
        let mut order = ServiceOrder::new(TypeCode::raw(1), 1);
        assert!(order.latest_approval(9).is_none());
        for status in [ApprovalStatus::Solicitada, ApprovalStatus::Rejeitada] {
            order.approvals.push(StepApproval {
                step_number: 9,
                status,
                by: None,
                justificativa: None,
                motivo_rejeicao: None,
                at: Utc::now(),
            });
        }
        assert_eq!(order.latest_approval(9).unwrap().status, ApprovalStatus::Rejeitada);
        assert_eq!(ApprovalStatus::NaoRequer.to_string(), "nao_requer");
    }

    #[test]
    fn orders_without_approvals_still_deserialize() {
        let order = ServiceOrder::new(TypeCode::raw(7), 1);
        let mut json = serde_json::to_value(&order).unwrap();
        json.as_object_mut().unwrap().remove("approvals");
        let back: ServiceOrder = serde_json::from_value(json).unwrap();
        assert!(back.approvals.is_empty());
    }

    #[test]
    fn order_serializes_type_code_as_string() {
        let order = ServiceOrder::new(TypeCode::raw(5), 1);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["type_code"], "type-05");
        assert_eq!(json["status"], "open");

        let back: ServiceOrder = serde_json::from_value(json).unwrap();
        assert_eq!(back.type_code, order.type_code);
    }

    #[test]
    fn summary_counts_distinct_steps() {
        let mut order = ServiceOrder::new(TypeCode::raw(7), 3);
        order.status = OrderStatus::Completed;
        order.step_results.push(StepResult {
            step_id: "identificacao-cliente".into(),
            step_number: 1,
            payload: json!({}),
            completed_at: Utc::now(),
        });
        let summary = WorkflowSummary::from_order(&order, 5);
        assert_eq!(summary.completed_steps, 1);
        assert_eq!(summary.total_steps, 5);
        assert_eq!(summary.codigo, "OS-07-0003");
    }
}
