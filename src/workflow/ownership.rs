//! Regras de responsabilidade por etapa.
//!
//! Quando a etapa seguinte pertence a outro cargo, o avanço carrega o
//! [`HandoffPoint`] correspondente e a página decide se precisa delegar.

use super::definition::{Cargo, HandoffPoint, Initiator, WorkflowDefinition};

impl WorkflowDefinition {
    /// Cargo dono da etapa, ou `None` para número fora do catálogo.
    pub fn owner_of(&self, step: u32) -> Option<Cargo> {
        self.step(step).map(|s| s.owner)
    }

    /// Ponto de handoff definido entre duas etapas.
    pub fn handoff(&self, from_step: u32, to_step: u32) -> Option<&'static HandoffPoint> {
        let handoffs: &'static [HandoffPoint] = self.handoffs;
        handoffs
            .iter()
            .find(|h| h.from_step == from_step && h.to_step == to_step)
    }

    /// Handoff de retorno a partir de uma etapa, como a proposta rejeitada
    /// que volta para o memorial.
    pub fn return_handoff(&self, from_step: u32) -> Option<&'static HandoffPoint> {
        let handoffs: &'static [HandoffPoint] = self.handoffs;
        handoffs
            .iter()
            .find(|h| h.from_step == from_step && h.to_step < from_step)
    }

    /// Handoff que exige delegação para o usuário atual.
    ///
    /// Retorna `None` quando não há troca de responsável ou quando o usuário
    /// já ocupa o cargo de destino e pode assumir a etapa ele mesmo.
    pub fn delegation_required(
        &self,
        from_step: u32,
        to_step: u32,
        current_cargo: Cargo,
    ) -> Option<&'static HandoffPoint> {
        self.handoff(from_step, to_step)
            .filter(|h| h.to_cargo != current_cargo)
    }

    /// OS abertas pelo cliente ou de início livre aceitam qualquer cargo.
    pub fn can_initiate(&self, cargo: Cargo) -> bool {
        match self.initiator {
            Initiator::Cliente | Initiator::Livre => true,
            Initiator::Cargo(required) => required == cargo,
        }
    }
}
