mod definition;
mod order;
mod ownership;
mod store;

pub use definition::{
    Cargo, HandoffPoint, Initiator, SchedulingKind, Setor, StepDefinition, StepKind,
    WorkflowDefinition, definition_for,
};
pub use order::{
    ApprovalStatus, OrderStatus, ServiceOrder, StepApproval, StepResult, StepTransition, TypeCode,
    WorkflowSummary,
};
pub use store::{NextRoute, StepTicket, WorkflowHandle, WorkflowStore};
