//! Catálogo de etapas por tipo de OS.
//!
//! Cada [`WorkflowDefinition`] lista as etapas em ordem, o cargo dono de cada
//! uma e os pontos de troca de responsabilidade (handoff). As regras de
//! ownership ficam em [`super::ownership`].

use std::fmt;

use serde::Serialize;

use super::order::TypeCode;

/// Cargos que podem ser donos de etapas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cargo {
    CoordAdministrativo,
    CoordAssessoria,
    CoordObras,
    OperacionalAdmin,
    OperacionalAssessoria,
    OperacionalObras,
}

impl Cargo {
    pub fn slug(self) -> &'static str {
        match self {
            Cargo::CoordAdministrativo => "coord_administrativo",
            Cargo::CoordAssessoria => "coord_assessoria",
            Cargo::CoordObras => "coord_obras",
            Cargo::OperacionalAdmin => "operacional_admin",
            Cargo::OperacionalAssessoria => "operacional_assessoria",
            Cargo::OperacionalObras => "operacional_obras",
        }
    }

    /// Coordenadores aprovam etapas; operacionais não.
    pub fn can_approve(self) -> bool {
        matches!(
            self,
            Cargo::CoordAdministrativo | Cargo::CoordAssessoria | Cargo::CoordObras
        )
    }

    /// Setor ao qual o cargo pertence.
    pub fn setor(self) -> Setor {
        match self {
            Cargo::CoordAdministrativo | Cargo::OperacionalAdmin => Setor::Administrativo,
            Cargo::CoordAssessoria | Cargo::OperacionalAssessoria => Setor::Assessoria,
            Cargo::CoordObras | Cargo::OperacionalObras => Setor::Obras,
        }
    }
}

impl fmt::Display for Cargo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Setores da empresa; também o primeiro segmento das rotas de workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Setor {
    Administrativo,
    Assessoria,
    Obras,
}

impl Setor {
    pub fn slug(self) -> &'static str {
        match self {
            Setor::Administrativo => "administrativo",
            Setor::Assessoria => "assessoria",
            Setor::Obras => "obras",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "administrativo" => Some(Setor::Administrativo),
            "assessoria" => Some(Setor::Assessoria),
            "obras" => Some(Setor::Obras),
            _ => None,
        }
    }
}

impl fmt::Display for Setor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Quem pode abrir uma OS do tipo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Initiator {
    Cargo(Cargo),
    /// Aberta pelo cliente via link público.
    Cliente,
    /// Qualquer colaborador.
    Livre,
}

/// Qual agendamento uma etapa de calendário cria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulingKind {
    InitialVisit,
    FinalVisit,
    Presentation,
    RecurringVisit,
}

impl SchedulingKind {
    /// Categoria gravada no agendamento.
    pub fn categoria(self) -> &'static str {
        match self {
            SchedulingKind::InitialVisit => "Visita Técnica",
            SchedulingKind::FinalVisit => "Visita Final",
            SchedulingKind::Presentation => "Apresentação de Proposta",
            SchedulingKind::RecurringVisit => "Visita Recorrente",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    Form,
    Scheduling(SchedulingKind),
    Upload,
    Document,
    Approval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub number: u32,
    pub id: &'static str,
    pub title: &'static str,
    pub kind: StepKind,
    pub owner: Cargo,
}

/// Troca de responsabilidade ao passar de `from_step` para `to_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandoffPoint {
    pub from_step: u32,
    pub to_step: u32,
    pub to_cargo: Cargo,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WorkflowDefinition {
    pub name: &'static str,
    pub initiator: Initiator,
    pub steps: &'static [StepDefinition],
    pub handoffs: &'static [HandoffPoint],
    /// Etapas que só avançam depois de aprovadas por um coordenador.
    pub approval_steps: &'static [u32],
}

impl WorkflowDefinition {
    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Etapa pelo número (1-based).
    pub fn step(&self, number: u32) -> Option<&'static StepDefinition> {
        let steps: &'static [StepDefinition] = self.steps;
        number
            .checked_sub(1)
            .and_then(|i| steps.get(i as usize))
    }

    pub fn requires_approval(&self, step: u32) -> bool {
        self.approval_steps.contains(&step)
    }

    pub fn step_by_id(&self, id: &str) -> Option<&'static StepDefinition> {
        let steps: &'static [StepDefinition] = self.steps;
        steps.iter().find(|s| s.id == id)
    }
}

use Cargo::{CoordAdministrativo as ADM, CoordAssessoria as ASS, CoordObras as OBR};
use SchedulingKind::*;
use StepKind::*;

const fn step(
    number: u32,
    id: &'static str,
    title: &'static str,
    kind: StepKind,
    owner: Cargo,
) -> StepDefinition {
    StepDefinition {
        number,
        id,
        title,
        kind,
        owner,
    }
}

const fn handoff(
    from_step: u32,
    to_step: u32,
    to_cargo: Cargo,
    description: &'static str,
) -> HandoffPoint {
    HandoffPoint {
        from_step,
        to_step,
        to_cargo,
        description,
    }
}

// OS 01-04: obras (perícia, revitalização, reforço, outros).
static OBRAS_STEPS: [StepDefinition; 15] = [
    step(1, "identificacao-lead", "Identificação do Cliente/Lead", Form, ADM),
    step(2, "selecao-tipo", "Seleção do Tipo de OS", Form, ADM),
    step(3, "followup-1", "Follow-up 1 (Entrevista Inicial)", Form, ADM),
    step(4, "agendar-visita", "Agendar Visita Técnica", Scheduling(InitialVisit), ADM),
    step(5, "realizar-visita", "Realizar Visita", Form, OBR),
    step(6, "followup-2", "Follow-up 2 (Pós-Visita)", Form, OBR),
    step(7, "memorial-escopo", "Formulário Memorial (Escopo)", Form, OBR),
    step(8, "precificacao", "Precificação", Form, OBR),
    step(9, "gerar-proposta", "Gerar Proposta Comercial", Document, ADM),
    step(10, "agendar-apresentacao", "Agendar Visita (Apresentação)", Scheduling(Presentation), ADM),
    step(11, "realizar-apresentacao", "Realizar Visita (Apresentação)", Form, ADM),
    step(12, "followup-3", "Follow-up 3 (Pós-Apresentação)", Form, ADM),
    step(13, "gerar-contrato", "Gerar Contrato (Upload)", Upload, ADM),
    step(14, "contrato-assinado", "Contrato Assinado", Upload, ADM),
    step(15, "iniciar-contrato-obra", "Iniciar Contrato de Obra", Approval, ADM),
];

static OBRAS_HANDOFFS: [HandoffPoint; 4] = [
    handoff(4, 5, OBR, "Transferir para Coordenação de Obras para realizar visita técnica"),
    handoff(9, 9, ADM, "Transferir para Coordenação Administrativa para aprovação da proposta"),
    handoff(9, 10, ADM, "Proposta aprovada - Transferir para Coordenação Administrativa"),
    handoff(9, 7, OBR, "Retornar para Obras para revisão do memorial após rejeição"),
];

// OS 05-06: assessoria básica; Coord. Administrativo conduz tudo.
static ASSESSORIA_BASICA_STEPS: [StepDefinition; 12] = [
    step(1, "identificacao-lead", "Identifique o Lead", Form, ADM),
    step(2, "selecao-tipo", "Seleção do Tipo de OS", Form, ADM),
    step(3, "followup-1", "Follow-up 1 (Entrevista Inicial)", Form, ADM),
    step(4, "memorial-escopo", "Formulário Memorial (Escopo e Prazos)", Form, ADM),
    step(5, "precificacao", "Precificação (Formulário Financeiro)", Form, ADM),
    step(6, "gerar-proposta", "Gerar Proposta Comercial", Document, ADM),
    step(7, "agendar-apresentacao", "Agendar Visita (Apresentação)", Scheduling(Presentation), ADM),
    step(8, "realizar-apresentacao", "Realizar Visita (Apresentação)", Form, ADM),
    step(9, "followup-3", "Follow-up 3 (Pós-Apresentação)", Form, ADM),
    step(10, "gerar-contrato", "Gerar Contrato (Upload)", Upload, ADM),
    step(11, "contrato-assinado", "Contrato Assinado", Upload, ADM),
    step(12, "ativar-contrato", "Ativar Contrato", Approval, ADM),
];

static OS07_STEPS: [StepDefinition; 5] = [
    step(1, "identificacao-cliente", "Identificação do Cliente", Form, ASS),
    step(2, "coletar-dados", "Coletar Dados do Cliente", Form, ASS),
    step(3, "analise-parecer", "Análise e Parecer", Form, ASS),
    step(4, "gerar-pdf", "Gerar PDF", Document, ASS),
    step(5, "concluida", "Concluída", Approval, ASS),
];

static OS08_STEPS: [StepDefinition; 7] = [
    step(1, "identificacao-solicitante", "Identificação do Solicitante", Form, ADM),
    step(2, "atribuir-cliente", "Atribuir Cliente", Form, ADM),
    step(3, "agendar-visita", "Agendar Visita", Scheduling(InitialVisit), ASS),
    step(4, "realizar-visita", "Realizar Visita", Form, ASS),
    step(5, "formulario-pos-visita", "Formulário Pós-Visita", Form, ASS),
    step(6, "gerar-documento", "Gerar Documento", Document, ASS),
    step(7, "enviar-cliente", "Enviar ao Cliente", Document, ASS),
];

static OS08_HANDOFFS: [HandoffPoint; 1] = [handoff(
    2,
    3,
    ASS,
    "Transferir para Coordenação de Assessoria após triagem",
)];

static OS09_STEPS: [StepDefinition; 5] = [
    step(1, "requisicao-compra", "Requisição de Compra", Form, OBR),
    step(2, "upload-orcamentos", "Upload de Orçamentos", Upload, ADM),
    step(3, "aprovacao-orcamento", "Aprovação de Orçamento", Approval, ADM),
    step(4, "pedido-compra", "Pedido de Compra", Form, ADM),
    step(5, "recebimento-material", "Recebimento de Material", Form, ADM),
];

static OS09_HANDOFFS: [HandoffPoint; 1] = [handoff(
    1,
    2,
    ADM,
    "Transferir para Coordenação Administrativa para orçamentos",
)];

static OS10_STEPS: [StepDefinition; 5] = [
    step(1, "abertura-solicitacao", "Abertura da Solicitação", Form, ADM),
    step(2, "selecao-centro-custo", "Seleção do Centro de Custo", Form, ADM),
    step(3, "selecao-colaborador", "Seleção do Colaborador", Form, ADM),
    step(4, "detalhes-vaga", "Detalhes da Vaga", Form, ADM),
    step(5, "requisicao-multipla", "Requisição Múltipla", Form, ADM),
];

static OS11_STEPS: [StepDefinition; 7] = [
    step(1, "cadastrar-cliente", "Cadastrar Cliente", Form, ADM),
    step(2, "agendar-visita", "Agendar Visita", Scheduling(InitialVisit), ADM),
    step(3, "realizar-visita", "Realizar Visita", Form, ASS),
    step(4, "anexar-rt", "Anexar RT", Upload, ASS),
    step(5, "questionario-pos-visita", "Questionário Pós-Visita", Form, ASS),
    step(6, "gerar-documento", "Gerar Documento", Document, ASS),
    step(7, "enviar-cliente", "Enviar ao Cliente", Document, ASS),
];

static OS11_HANDOFFS: [HandoffPoint; 1] = [handoff(
    2,
    3,
    ASS,
    "Transferir para Coordenação de Assessoria após agendamento",
)];

static OS12_STEPS: [StepDefinition; 8] = [
    step(1, "cadastro-cliente-portal", "Cadastro do Cliente e Portal", Form, ADM),
    step(2, "upload-art", "Upload de ART", Upload, ASS),
    step(3, "plano-manutencao", "Upload de Plano de Manutenção", Upload, ASS),
    step(4, "agendar-visita", "Agendar Visita", Scheduling(InitialVisit), ADM),
    step(5, "realizar-visita", "Realizar Visita", Form, ADM),
    step(6, "agendar-visita-recorrente", "Agendar Visita Recorrente", Scheduling(RecurringVisit), ADM),
    step(7, "realizar-visita-recorrente", "Realizar Visita Recorrente", Form, ASS),
    step(8, "concluir-contrato", "Concluir e Ativar Contrato", Approval, ASS),
];

static OS12_HANDOFFS: [HandoffPoint; 3] = [
    handoff(1, 2, ASS, "Transferir para Assessoria para anexar ART"),
    handoff(3, 4, ADM, "Retornar para Admin para agendar visita"),
    handoff(6, 7, ASS, "Transferir para Assessoria para realizar visita recorrente"),
];

static OS13_STEPS: [StepDefinition; 17] = [
    step(1, "dados-cliente", "Dados do Cliente", Form, ADM),
    step(2, "anexar-art", "Anexar ART", Upload, OBR),
    step(3, "relatorio-fotografico", "Relatório Fotográfico", Upload, OBR),
    step(4, "imagem-areas", "Imagem de Áreas", Upload, OBR),
    step(5, "cronograma", "Cronograma", Form, OBR),
    step(6, "agendar-visita-inicial", "Agendar Visita Inicial", Scheduling(InitialVisit), ADM),
    step(7, "realizar-visita-inicial", "Realizar Visita Inicial", Form, ADM),
    step(8, "histograma", "Histograma", Form, OBR),
    step(9, "placa-obra", "Placa de Obra", Upload, OBR),
    step(10, "requisicao-compras", "Requisição de Compras", Form, OBR),
    step(11, "requisicao-mao-obra", "Requisição de Mão de Obra", Form, OBR),
    step(12, "evidencia-mobilizacao", "Evidência Mobilização", Upload, OBR),
    step(13, "diario-obra", "Diário de Obra", Form, OBR),
    step(14, "seguro-obras", "Seguro de Obras", Upload, ADM),
    step(15, "documentos-sst", "Documentos SST", Upload, OBR),
    step(16, "agendar-visita-final", "Agendar Visita Final", Scheduling(FinalVisit), ADM),
    step(17, "realizar-visita-final", "Realizar Visita Final", Form, OBR),
];

static OS13_HANDOFFS: [HandoffPoint; 7] = [
    handoff(1, 2, OBR, "Transferir para Coord. Obras para anexar ART"),
    handoff(5, 6, ADM, "Retornar para Coord. Admin para agendar visita inicial"),
    handoff(7, 8, OBR, "Transferir para Coord. Obras para Histograma e Diário"),
    handoff(13, 14, ADM, "Retornar para Coord. Admin para providenciar Seguro"),
    handoff(14, 15, OBR, "Transferir para Coord. Obras para documentos SST"),
    handoff(15, 16, ADM, "Retornar para Coord. Admin para agendar visita final"),
    handoff(16, 17, OBR, "Transferir para Coord. Obras para realizar visita final"),
];

static OBRAS: WorkflowDefinition = WorkflowDefinition {
    name: "Obras (Perícia, Revitalização, Reforço, Outros)",
    initiator: Initiator::Cargo(ADM),
    steps: &OBRAS_STEPS,
    handoffs: &OBRAS_HANDOFFS,
    approval_steps: &[9],
};

static ASSESSORIA_BASICA: WorkflowDefinition = WorkflowDefinition {
    name: "Assessoria Básica (Mensal / Laudo Pontual)",
    initiator: Initiator::Cargo(ADM),
    steps: &ASSESSORIA_BASICA_STEPS,
    handoffs: &[],
    approval_steps: &[6],
};

static OS07: WorkflowDefinition = WorkflowDefinition {
    name: "Solicitação do Cliente (Reforma)",
    initiator: Initiator::Cliente,
    steps: &OS07_STEPS,
    handoffs: &[],
    approval_steps: &[],
};

static OS08: WorkflowDefinition = WorkflowDefinition {
    name: "Visita Técnica / Parecer Técnico",
    initiator: Initiator::Cliente,
    steps: &OS08_STEPS,
    handoffs: &OS08_HANDOFFS,
    approval_steps: &[],
};

static OS09: WorkflowDefinition = WorkflowDefinition {
    name: "Requisição de Compras/Materiais",
    initiator: Initiator::Livre,
    steps: &OS09_STEPS,
    handoffs: &OS09_HANDOFFS,
    approval_steps: &[],
};

static OS10: WorkflowDefinition = WorkflowDefinition {
    name: "Requisição de Mão de Obra",
    initiator: Initiator::Livre,
    steps: &OS10_STEPS,
    handoffs: &[],
    approval_steps: &[],
};

static OS11: WorkflowDefinition = WorkflowDefinition {
    name: "Execução de Laudo Pontual",
    initiator: Initiator::Cargo(ADM),
    steps: &OS11_STEPS,
    handoffs: &OS11_HANDOFFS,
    approval_steps: &[],
};

static OS12: WorkflowDefinition = WorkflowDefinition {
    name: "Execução de Assessoria Recorrente",
    initiator: Initiator::Cargo(ADM),
    steps: &OS12_STEPS,
    handoffs: &OS12_HANDOFFS,
    approval_steps: &[],
};

static OS13: WorkflowDefinition = WorkflowDefinition {
    name: "Obra Complexa (Contrato)",
    initiator: Initiator::Cargo(ADM),
    steps: &OS13_STEPS,
    handoffs: &OS13_HANDOFFS,
    approval_steps: &[],
};

/// Definição de workflow para um tipo de OS. Todo código válido tem uma.
pub fn definition_for(code: TypeCode) -> &'static WorkflowDefinition {
    match code.number() {
        1..=4 => &OBRAS,
        5 | 6 => &ASSESSORIA_BASICA,
        7 => &OS07,
        8 => &OS08,
        9 => &OS09,
        10 => &OS10,
        11 => &OS11,
        12 => &OS12,
        _ => &OS13,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_contiguous_step_numbers() {
        for code in TypeCode::all() {
            let def = definition_for(code);
            assert!(!def.steps.is_empty(), "{code} has no steps");
            for (i, s) in def.steps.iter().enumerate() {
                assert_eq!(s.number, i as u32 + 1, "{code} step {}", s.id);
            }
        }
    }

    #[test]
    fn step_ids_are_unique_within_a_workflow() {
        for code in TypeCode::all() {
            let def = definition_for(code);
            let mut ids: Vec<&str> = def.steps.iter().map(|s| s.id).collect();
            ids.sort_unstable();
            let before = ids.len();
            ids.dedup();
            assert_eq!(before, ids.len(), "{code} repeats a step id");
        }
    }

    #[test]
    fn handoffs_reference_existing_steps() {
        for code in TypeCode::all() {
            let def = definition_for(code);
            for h in def.handoffs {
                assert!(def.step(h.from_step).is_some());
                assert!(def.step(h.to_step).is_some());
            }
        }
    }

    #[test]
    fn step_lookup_by_number_and_id() {
        let def = definition_for(TypeCode::raw(13));
        assert_eq!(def.total_steps(), 17);
        assert_eq!(def.step(16).unwrap().id, "agendar-visita-final");
        assert_eq!(
            def.step_by_id("agendar-visita-inicial").unwrap().kind,
            Scheduling(InitialVisit)
        );
        assert!(def.step(0).is_none());
        assert!(def.step(18).is_none());
    }

    #[test]
    fn shared_definitions() {
        assert!(std::ptr::eq(
            definition_for(TypeCode::raw(1)),
            definition_for(TypeCode::raw(4))
        ));
        assert_eq!(definition_for(TypeCode::raw(6)).total_steps(), 12);
        assert_eq!(definition_for(TypeCode::raw(7)).initiator, Initiator::Cliente);
    }

    #[test]
    fn proposals_need_approval() {
        let obras = definition_for(TypeCode::raw(3));
        assert!(obras.requires_approval(9));
        assert!(!obras.requires_approval(8));
        assert_eq!(obras.step(9).unwrap().id, "gerar-proposta");
        assert!(obras.handoff(9, 9).is_some());

        let basica = definition_for(TypeCode::raw(5));
        assert_eq!(basica.step(6).unwrap().id, "gerar-proposta");
        assert!(basica.requires_approval(6));
        assert!(definition_for(TypeCode::raw(7)).approval_steps.is_empty());
    }

    #[test]
    fn approval_steps_reference_existing_steps() {
        for code in TypeCode::all() {
            let def = definition_for(code);
            for &n in def.approval_steps {
                assert!(def.step(n).is_some(), "{code} approval step {n}");
            }
        }
    }

    #[test]
    fn cargo_maps_to_setor() {
        assert_eq!(Cargo::CoordObras.setor(), Setor::Obras);
        assert_eq!(Cargo::OperacionalAdmin.setor(), Setor::Administrativo);
        assert_eq!(Setor::from_slug("assessoria"), Some(Setor::Assessoria));
        assert_eq!(Setor::from_slug("rh"), None);
        assert!(Cargo::CoordObras.can_approve());
        assert!(!Cargo::OperacionalObras.can_approve());
    }
}
