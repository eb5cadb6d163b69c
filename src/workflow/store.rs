use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::definition::{Cargo, HandoffPoint, StepDefinition, WorkflowDefinition, definition_for};
use super::order::{
    ApprovalStatus, OrderStatus, ServiceOrder, StepApproval, StepResult, StepTransition, TypeCode,
};
use crate::error::{RouteError, ValidationError, WorkflowError};
use crate::routes;

/// Where the page should navigate after a cursor move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextRoute {
    pub type_code: TypeCode,
    pub order_id: String,
    pub step: u32,
    pub step_id: &'static str,
    pub path: String,
    /// Responsibility change on this move, if the catalogue defines one.
    pub handoff: Option<HandoffPoint>,
}

/// Snapshot of the cursor taken when a submission starts.
///
/// Committing through a ticket fails with [`WorkflowError::Stale`] once the
/// store has navigated since the ticket was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTicket {
    pub order_id: String,
    pub step: u32,
    pub step_id: &'static str,
    pub epoch: u64,
}

/// Single source of truth for one service order during a workflow session.
#[derive(Debug)]
pub struct WorkflowStore {
    order: ServiceOrder,
    definition: &'static WorkflowDefinition,
    // Bumped on every navigation; late submissions compare against it.
    epoch: u64,
}

impl WorkflowStore {
    pub fn new(order: ServiceOrder) -> Self {
        let definition = definition_for(order.type_code);
        Self {
            order,
            definition,
            epoch: 0,
        }
    }

    pub fn current_order(&self) -> &ServiceOrder {
        &self.order
    }

    pub fn definition(&self) -> &'static WorkflowDefinition {
        self.definition
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_step(&self) -> &'static StepDefinition {
        // current_step is kept inside 1..=total by every mutator.
        let definition: &'static WorkflowDefinition = self.definition;
        definition
            .step(self.order.current_step)
            .unwrap_or(&definition.steps[0])
    }

    pub fn ticket(&self) -> StepTicket {
        StepTicket {
            order_id: self.order.id.clone(),
            step: self.order.current_step,
            step_id: self.current_step().id,
            epoch: self.epoch,
        }
    }

    /// Appends a result for the current step.
    ///
    /// Committing the last step completes the order.
    pub fn update_step(
        &mut self,
        step_id: &str,
        payload: Value,
    ) -> Result<StepResult, ValidationError> {
        if self.order.status.is_closed() {
            return Err(ValidationError::OrderClosed(self.order.codigo.clone()));
        }
        let current = self.current_step();
        if current.id != step_id {
            return Err(ValidationError::WrongStep {
                given: step_id.to_string(),
                current: current.id.to_string(),
            });
        }

        let result = StepResult {
            step_id: current.id.to_string(),
            step_number: current.number,
            payload,
            completed_at: Utc::now(),
        };
        self.order.step_results.push(result.clone());
        self.order.updated_at = result.completed_at;

        if self.order.current_step == self.definition.total_steps() {
            self.order.status = OrderStatus::Completed;
            info!(order = %self.order.codigo, "service order completed");
        } else if self.order.status == OrderStatus::Open {
            self.order.status = OrderStatus::InProgress;
        }

        debug!(order = %self.order.codigo, step = current.id, "step committed");
        Ok(result)
    }

    /// Commits only if nothing navigated since `ticket` was issued.
    pub fn commit(
        &mut self,
        ticket: &StepTicket,
        payload: Value,
    ) -> Result<StepResult, WorkflowError> {
        if ticket.order_id != self.order.id || ticket.epoch != self.epoch {
            warn!(
                order = %self.order.codigo,
                step = ticket.step_id,
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "discarding stale submission"
            );
            return Err(WorkflowError::Stale {
                ticket: ticket.epoch,
                current: self.epoch,
            });
        }
        Ok(self.update_step(ticket.step_id, payload)?)
    }

    /// Moves to the next step.
    ///
    /// At the last step this always fails with `TerminalState`, however many
    /// times it is called.
    pub fn advance(&mut self) -> Result<NextRoute, WorkflowError> {
        let current = self.order.current_step;
        if current >= self.definition.total_steps() {
            return Err(WorkflowError::TerminalState {
                order_id: self.order.id.clone(),
            });
        }
        if self.order.status == OrderStatus::Cancelled {
            return Err(WorkflowError::Closed(self.order.codigo.clone()));
        }
        if !self.order.has_result(current) {
            return Err(WorkflowError::StepNotCommitted { step: current });
        }
        match self.approval_status(current) {
            ApprovalStatus::NaoRequer | ApprovalStatus::Aprovada => {}
            status => return Err(WorkflowError::ApprovalPending { step: current, status }),
        }
        self.move_to(current + 1)
    }

    /// Approval state of a step; `NaoRequer` for steps without a gate.
    pub fn approval_status(&self, step: u32) -> ApprovalStatus {
        if !self.definition.requires_approval(step) {
            return ApprovalStatus::NaoRequer;
        }
        self.order
            .latest_approval(step)
            .map_or(ApprovalStatus::Pendente, |a| a.status)
    }

    /// Asks for approval of the current step, once its result is committed.
    ///
    /// Returns the handoff to the approver's cargo when the catalogue defines
    /// one on the step itself (e.g. 9 → 9).
    pub fn request_approval(
        &mut self,
        justificativa: Option<&str>,
    ) -> Result<Option<HandoffPoint>, WorkflowError> {
        self.ensure_open()?;
        let step = self.order.current_step;
        match self.approval_status(step) {
            ApprovalStatus::NaoRequer => Err(WorkflowError::ApprovalNotRequired { step }),
            ApprovalStatus::Pendente | ApprovalStatus::Rejeitada => {
                if !self.order.has_result(step) {
                    return Err(WorkflowError::StepNotCommitted { step });
                }
                self.record_approval(step, ApprovalStatus::Solicitada, None, |a| {
                    a.justificativa = justificativa.map(str::to_string);
                });
                info!(order = %self.order.codigo, step, "approval requested");
                Ok(self.definition.handoff(step, step).copied())
            }
            status => Err(WorkflowError::InvalidApproval { step, status }),
        }
    }

    /// Approves the current step. `advance` is allowed afterwards.
    pub fn approve(&mut self, by: Cargo) -> Result<(), WorkflowError> {
        let step = self.requested_step(by)?;
        self.record_approval(step, ApprovalStatus::Aprovada, Some(by), |_| {});
        info!(order = %self.order.codigo, step, by = %by, "step approved");
        Ok(())
    }

    /// Rejects the current step.
    ///
    /// When the catalogue has a return handoff from the step (proposal back
    /// to the memorial), the cursor follows it and the route is returned.
    /// Otherwise the cursor stays and approval can be requested again.
    pub fn reject(&mut self, by: Cargo, motivo: &str) -> Result<Option<NextRoute>, WorkflowError> {
        if motivo.trim().is_empty() {
            return Err(WorkflowError::MissingReason);
        }
        let step = self.requested_step(by)?;
        let route = match self.definition.return_handoff(step) {
            Some(h) => Some(self.move_to(h.to_step)?),
            None => None,
        };
        self.record_approval(step, ApprovalStatus::Rejeitada, Some(by), |a| {
            a.motivo_rejeicao = Some(motivo.trim().to_string());
        });
        info!(order = %self.order.codigo, step, by = %by, motivo, "step rejected");
        Ok(route)
    }

    // Current step, if `by` may decide on it and approval was requested.
    fn requested_step(&self, by: Cargo) -> Result<u32, WorkflowError> {
        self.ensure_open()?;
        if !by.can_approve() {
            return Err(WorkflowError::NotApprover(by.to_string()));
        }
        let step = self.order.current_step;
        match self.approval_status(step) {
            ApprovalStatus::Solicitada => Ok(step),
            ApprovalStatus::NaoRequer => Err(WorkflowError::ApprovalNotRequired { step }),
            status => Err(WorkflowError::InvalidApproval { step, status }),
        }
    }

    fn record_approval(
        &mut self,
        step: u32,
        status: ApprovalStatus,
        by: Option<Cargo>,
        fill: impl FnOnce(&mut StepApproval),
    ) {
        let now = Utc::now();
        let mut approval = StepApproval {
            step_number: step,
            status,
            by: by.map(|c| c.to_string()),
            justificativa: None,
            motivo_rejeicao: None,
            at: now,
        };
        fill(&mut approval);
        self.order.approvals.push(approval);
        self.order.updated_at = now;
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.order.status.is_closed() {
            return Err(WorkflowError::Closed(self.order.codigo.clone()));
        }
        Ok(())
    }

    /// Steps back one step. Committed results are kept.
    pub fn go_back(&mut self) -> Result<NextRoute, WorkflowError> {
        let current = self.order.current_step;
        if current <= 1 {
            return Err(WorkflowError::AtFirstStep);
        }
        self.return_to(current - 1)
    }

    /// Jumps back to an earlier step, e.g. a proposal rejected back to the memorial.
    pub fn return_to(&mut self, target: u32) -> Result<NextRoute, WorkflowError> {
        if self.order.status.is_closed() {
            return Err(WorkflowError::Closed(self.order.codigo.clone()));
        }
        let current = self.order.current_step;
        if target == 0 || target >= current {
            return Err(WorkflowError::InvalidTarget { target, current });
        }
        self.move_to(target)
    }

    pub fn cancel(&mut self, reason: &str) -> Result<(), WorkflowError> {
        if self.order.status.is_closed() {
            return Err(WorkflowError::Closed(self.order.codigo.clone()));
        }
        self.order.status = OrderStatus::Cancelled;
        self.order.cancel_reason = Some(reason.to_string());
        self.order.updated_at = Utc::now();
        self.epoch += 1;
        info!(order = %self.order.codigo, reason, "service order cancelled");
        Ok(())
    }

    /// Route for the step the cursor is on.
    pub fn current_route(&self) -> Result<NextRoute, WorkflowError> {
        self.route_for(self.order.current_step, None)
    }

    fn move_to(&mut self, to: u32) -> Result<NextRoute, WorkflowError> {
        let from = self.order.current_step;
        let handoff = self.definition.handoff(from, to).copied();
        let route = self.route_for(to, handoff)?;

        let now = Utc::now();
        self.order.history.push(StepTransition { from, to, at: now });
        self.order.current_step = to;
        self.order.updated_at = now;
        self.epoch += 1;

        match &handoff {
            Some(h) => info!(
                order = %self.order.codigo,
                from,
                to,
                to_cargo = %h.to_cargo,
                "step handoff"
            ),
            None => debug!(order = %self.order.codigo, from, to, "step changed"),
        }
        Ok(route)
    }

    fn route_for(
        &self,
        step: u32,
        handoff: Option<HandoffPoint>,
    ) -> Result<NextRoute, WorkflowError> {
        let type_code = self.order.type_code;
        let entry = routes::lookup_code(type_code)
            .ok_or_else(|| RouteError::NotFound(type_code.to_string()))?;
        let step_def = self
            .definition
            .step(step)
            .ok_or(WorkflowError::InvalidTarget {
                target: step,
                current: self.order.current_step,
            })?;
        Ok(NextRoute {
            type_code,
            order_id: self.order.id.clone(),
            step,
            step_id: step_def.id,
            path: entry.render(&self.order.id, step),
            handoff,
        })
    }
}

/// Cloneable handle to a [`WorkflowStore`] passed to steps and pages.
///
/// The lock is held only for the duration of each call, never across an
/// `.await`.
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    inner: Arc<Mutex<WorkflowStore>>,
}

impl WorkflowHandle {
    pub fn new(order: ServiceOrder) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkflowStore::new(order))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowStore> {
        // A panic elsewhere cannot leave the store half-written: every
        // mutator validates before touching state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the order as of now. Do not hold on to it across submissions.
    pub fn current_order(&self) -> ServiceOrder {
        self.lock().current_order().clone()
    }

    pub fn current_step(&self) -> &'static StepDefinition {
        self.lock().current_step()
    }

    pub fn definition(&self) -> &'static WorkflowDefinition {
        self.lock().definition()
    }

    pub fn ticket(&self) -> StepTicket {
        self.lock().ticket()
    }

    pub fn update_step(&self, step_id: &str, payload: Value) -> Result<StepResult, ValidationError> {
        self.lock().update_step(step_id, payload)
    }

    pub fn commit(&self, ticket: &StepTicket, payload: Value) -> Result<StepResult, WorkflowError> {
        self.lock().commit(ticket, payload)
    }

    pub fn advance(&self) -> Result<NextRoute, WorkflowError> {
        self.lock().advance()
    }

    pub fn go_back(&self) -> Result<NextRoute, WorkflowError> {
        self.lock().go_back()
    }

    pub fn return_to(&self, step: u32) -> Result<NextRoute, WorkflowError> {
        self.lock().return_to(step)
    }

    pub fn cancel(&self, reason: &str) -> Result<(), WorkflowError> {
        self.lock().cancel(reason)
    }

    pub fn current_route(&self) -> Result<NextRoute, WorkflowError> {
        self.lock().current_route()
    }

    pub fn approval_status(&self, step: u32) -> ApprovalStatus {
        self.lock().approval_status(step)
    }

    pub fn request_approval(
        &self,
        justificativa: Option<&str>,
    ) -> Result<Option<HandoffPoint>, WorkflowError> {
        self.lock().request_approval(justificativa)
    }

    pub fn approve(&self, by: Cargo) -> Result<(), WorkflowError> {
        self.lock().approve(by)
    }

    pub fn reject(&self, by: Cargo, motivo: &str) -> Result<Option<NextRoute>, WorkflowError> {
        self.lock().reject(by, motivo)
    }
}
