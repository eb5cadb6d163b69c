use chrono::NaiveDate;
use thiserror::Error;

use crate::calendar::BookingError;
use crate::workflow::ApprovalStatus;

/// Local input problems. The step stays active and the user can fix and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Select a slot in the calendar to continue")]
    NoSlotSelected,

    #[error("Scheduling date {date} is in the past")]
    DateInPast { date: NaiveDate },

    #[error("Contact data is required before booking")]
    MissingContact,

    #[error("Step {given} is not the current step ({current})")]
    WrongStep { given: String, current: String },

    #[error("Service order {0} is closed")]
    OrderClosed(String),
}

/// Route-config and URL resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No route configured for type code: {0}")]
    NotFound(String),

    #[error("No page matches path: {0}")]
    UnknownPath(String),

    #[error("Invalid step segment in path: {0}")]
    InvalidStep(String),
}

/// Errors from moving the workflow cursor or committing through a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Service order {order_id} is already at its last step")]
    TerminalState { order_id: String },

    #[error("Step {step} has no committed result yet")]
    StepNotCommitted { step: u32 },

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Cannot return to step {target} from step {current}")]
    InvalidTarget { target: u32, current: u32 },

    #[error("Service order {0} is closed")]
    Closed(String),

    #[error("Stale submission discarded (ticket epoch {ticket}, store epoch {current})")]
    Stale { ticket: u64, current: u64 },

    /// The step is committed but its approval gate is still closed.
    #[error("Step {step} is waiting for approval ({status})")]
    ApprovalPending { step: u32, status: ApprovalStatus },

    #[error("Step {step} does not require approval")]
    ApprovalNotRequired { step: u32 },

    #[error("Approval of step {step} cannot change while {status}")]
    InvalidApproval { step: u32, status: ApprovalStatus },

    #[error("{0} cannot approve steps")]
    NotApprover(String),

    #[error("A rejection reason is required")]
    MissingReason,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Everything a step submission can fail with. Caught at the page boundary.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl StepError {
    /// True when the result arrived after the user navigated away.
    pub fn is_stale(&self) -> bool {
        matches!(self, StepError::Workflow(WorkflowError::Stale { .. }))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Booking(_) => FailureKind::Remote,
            _ => FailureKind::Local,
        }
    }
}

/// Where a step failure originated. Neither kind is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    /// Input or workflow-state problem detected locally.
    Local,
    /// The booking backend rejected or failed the call.
    Remote,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Local => write!(f, "Local"),
            FailureKind::Remote => write!(f, "Remote"),
        }
    }
}
