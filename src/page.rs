//! Página de workflow: conduz a etapa atual de uma OS.
//!
//! A página nunca propaga erro de etapa. Toda falha vira um toast e a etapa
//! continua ativa; só um resultado gravado avança o cursor. Etapas com
//! aprovação ficam paradas até um coordenador aprovar.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::calendar::CalendarBackend;
use crate::error::{StepError, WorkflowError};
use crate::notify::{Notifier, Toast};
use crate::steps::{StepComponent, StepView, WorkflowStep, build_steps};
use crate::workflow::{ApprovalStatus, Cargo, HandoffPoint, NextRoute, ServiceOrder, WorkflowHandle};

/// Resultado de `submit_current`.
#[derive(Debug)]
pub enum PageOutcome {
    /// Etapa gravada; navegar para a rota.
    Advanced(NextRoute),
    /// Última etapa gravada; a OS foi concluída.
    Completed,
    /// A submissão falhou e a etapa continua ativa.
    Stayed(StepError),
    /// O resultado chegou depois de uma navegação e foi descartado.
    Discarded,
    /// Etapa gravada, mas o avanço espera a aprovação de um coordenador.
    AwaitingApproval,
}

pub struct WorkflowPage<C, N> {
    handle: WorkflowHandle,
    steps: Vec<StepComponent<C>>,
    notifier: N,
    // Cargo do usuário logado; decide se um handoff pede delegação.
    acting_as: Option<Cargo>,
}

impl<C: CalendarBackend, N: Notifier> WorkflowPage<C, N> {
    pub fn open(order: ServiceOrder, backend: Arc<C>, booking_timeout: Duration, notifier: N) -> Self {
        Self::with_handle(WorkflowHandle::new(order), backend, booking_timeout, notifier)
    }

    pub fn with_handle(
        handle: WorkflowHandle,
        backend: Arc<C>,
        booking_timeout: Duration,
        notifier: N,
    ) -> Self {
        let order = handle.current_order();
        let steps = build_steps(&order, handle.definition(), backend, booking_timeout);
        Self {
            handle,
            steps,
            notifier,
            acting_as: None,
        }
    }

    pub fn acting_as(mut self, cargo: Cargo) -> Self {
        self.acting_as = Some(cargo);
        self
    }

    pub fn handle(&self) -> &WorkflowHandle {
        &self.handle
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn route(&self) -> Result<NextRoute, WorkflowError> {
        self.handle.current_route()
    }

    pub fn views(&self) -> Vec<StepView> {
        let order = self.handle.current_order();
        self.steps.iter().map(|s| s.render(&order)).collect()
    }

    pub fn current_view(&self) -> Option<StepView> {
        let order = self.handle.current_order();
        self.steps
            .get(index(order.current_step))
            .map(|s| s.render(&order))
    }

    pub fn current_step_mut(&mut self) -> Option<&mut StepComponent<C>> {
        let number = self.handle.current_step().number;
        self.steps.get_mut(index(number))
    }

    pub fn step_mut(&mut self, number: u32) -> Option<&mut StepComponent<C>> {
        self.steps.get_mut(index(number))
    }

    /// Submete a etapa atual e avança quando ela for gravada.
    pub async fn submit_current(&mut self) -> PageOutcome {
        let current = self.handle.current_step();
        let Some(step) = self.steps.get_mut(index(current.number)) else {
            return PageOutcome::Stayed(WorkflowError::StepNotCommitted { step: current.number }.into());
        };

        self.notifier.begin_loading(current.title);
        let submitted = step.try_submit(&self.handle).await;
        self.notifier.end_loading();

        match submitted {
            Ok(result) => {
                debug!(step = %result.step_id, "step result stored");
                self.advance_after_commit(current.title)
            }
            Err(err) if err.is_stale() => {
                warn!(step = current.id, error = %err, "late submission discarded");
                PageOutcome::Discarded
            }
            Err(err) => {
                self.notifier.toast(error_toast(&err));
                PageOutcome::Stayed(err)
            }
        }
    }

    fn advance_after_commit(&self, title: &str) -> PageOutcome {
        match self.handle.advance() {
            Ok(route) => {
                self.notifier.toast(Toast::success(format!("Step completed: {title}")));
                self.toast_handoff(route.handoff);
                PageOutcome::Advanced(route)
            }
            Err(WorkflowError::ApprovalPending { status, .. }) => self.await_approval(title, status),
            Err(WorkflowError::TerminalState { .. }) => {
                let codigo = self.handle.current_order().codigo;
                self.notifier
                    .toast(Toast::success(format!("Service order {codigo} completed")));
                PageOutcome::Completed
            }
            Err(err) => {
                let err = StepError::from(err);
                self.notifier.toast(error_toast(&err));
                PageOutcome::Stayed(err)
            }
        }
    }

    fn await_approval(&self, title: &str, status: ApprovalStatus) -> PageOutcome {
        if status == ApprovalStatus::Solicitada {
            self.notifier
                .toast(Toast::info("Waiting for coordinator approval to continue"));
            return PageOutcome::AwaitingApproval;
        }
        match self.handle.request_approval(None) {
            Ok(handoff) => {
                self.notifier
                    .toast(Toast::success(format!("Approval requested: {title}")));
                self.toast_handoff(handoff);
                PageOutcome::AwaitingApproval
            }
            Err(err) => {
                let err = StepError::from(err);
                self.notifier.toast(error_toast(&err));
                PageOutcome::Stayed(err)
            }
        }
    }

    /// Aprova a etapa atual em nome de `approver` e avança.
    pub fn approve(&mut self, approver: Cargo) -> PageOutcome {
        let current = self.handle.current_step();
        match self.handle.approve(approver) {
            Ok(()) => {
                self.notifier
                    .toast(Toast::success(format!("Approved: {}", current.title)));
                self.advance_after_commit(current.title)
            }
            Err(err) => {
                let err = StepError::from(err);
                self.notifier.toast(error_toast(&err));
                PageOutcome::Stayed(err)
            }
        }
    }

    /// Rejeita a etapa atual. Devolve a rota de retorno, quando houver.
    pub fn reject(&mut self, approver: Cargo, motivo: &str) -> Option<NextRoute> {
        match self.handle.reject(approver, motivo) {
            Ok(route) => {
                self.notifier
                    .toast(Toast::warning(format!("Approval rejected: {}", motivo.trim())));
                if let Some(r) = &route {
                    self.toast_handoff(r.handoff);
                }
                route
            }
            Err(err) => {
                self.notifier.toast(Toast::error(err.to_string()));
                None
            }
        }
    }

    // Info toast for a handoff, unless the user already holds the target cargo.
    fn toast_handoff(&self, handoff: Option<HandoffPoint>) {
        let delegation = handoff.filter(|h| match self.acting_as {
            Some(cargo) => self
                .handle
                .definition()
                .delegation_required(h.from_step, h.to_step, cargo)
                .is_some(),
            None => true,
        });
        if let Some(h) = delegation {
            self.notifier.toast(Toast::info(h.description));
        }
    }

    pub fn go_back(&mut self) -> Option<NextRoute> {
        self.navigate(|h| h.go_back())
    }

    pub fn return_to(&mut self, step: u32) -> Option<NextRoute> {
        self.navigate(|h| h.return_to(step))
    }

    pub fn cancel(&mut self, reason: &str) -> bool {
        match self.handle.cancel(reason) {
            Ok(()) => {
                self.notifier.toast(Toast::warning("Service order cancelled"));
                true
            }
            Err(err) => {
                self.notifier.toast(Toast::error(err.to_string()));
                false
            }
        }
    }

    fn navigate(
        &mut self,
        op: impl FnOnce(&WorkflowHandle) -> Result<NextRoute, WorkflowError>,
    ) -> Option<NextRoute> {
        match op(&self.handle) {
            Ok(route) => Some(route),
            Err(err) => {
                self.notifier.toast(Toast::error(err.to_string()));
                None
            }
        }
    }
}

fn index(step_number: u32) -> usize {
    step_number.saturating_sub(1) as usize
}

fn error_toast(err: &StepError) -> Toast {
    match err {
        StepError::Booking(e) => Toast::error(format!("Could not book the slot: {e}")),
        other => Toast::error(other.to_string()),
    }
}
