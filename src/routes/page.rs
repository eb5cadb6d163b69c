//! URL → página.
//!
//! Cada rota da aplicação vira uma variante de [`Page`] com os parâmetros já
//! extraídos. Nenhuma regra de negócio mora aqui.

use serde::Serialize;

use super::table::lookup_code;
use crate::error::RouteError;
use crate::workflow::{Setor, TypeCode, definition_for};

/// Páginas de criação de OS (`/os/criar/{slug}`).
const CREATE_SLUGS: &[&str] = &[
    "requisicao-compras",
    "requisicao-mao-de-obra",
    "vistoria",
    "start-contrato-obra",
    "solicitacao-reforma",
    "laudo-pontual",
    "assessoria-recorrente",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Page {
    /// Workflow de uma OS numa etapa específica.
    OsWorkflow {
        type_code: TypeCode,
        os_id: String,
        step: u32,
    },
    OsCreate {
        slug: String,
    },
    OsDetails {
        os_id: String,
    },
    ClientPortal {
        client_id: String,
    },
    Financeiro,
    Colaboradores,
    Colaborador {
        colaborador_id: String,
    },
    PublicProposal {
        os_id: String,
    },
    PublicRenovationRequest {
        os_id: String,
    },
}

impl Page {
    /// Páginas acessíveis sem login.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Page::PublicProposal { .. } | Page::PublicRenovationRequest { .. }
        )
    }
}

/// Resolve um caminho (query string ignorada) para a página correspondente.
pub fn resolve(path: &str) -> Result<Page, RouteError> {
    let clean = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = clean.split('/').filter(|s| !s.is_empty()).collect();
    let unknown = || RouteError::UnknownPath(path.to_string());

    match segments.as_slice() {
        ["os", "criar", slug] if CREATE_SLUGS.contains(slug) => Ok(Page::OsCreate {
            slug: slug.to_string(),
        }),
        ["os", "details-workflow", id] => Ok(Page::OsDetails {
            os_id: id.to_string(),
        }),
        ["os", setor, code, os_id, step] => {
            let setor = Setor::from_slug(setor).ok_or_else(unknown)?;
            let type_code: TypeCode = code.parse()?;
            let entry = lookup_code(type_code)
                .ok_or_else(|| RouteError::NotFound(code.to_string()))?;
            // The setor segment must agree with the table, otherwise two URLs
            // would name the same workflow page.
            if entry.setor != setor {
                return Err(unknown());
            }
            let total = definition_for(type_code).total_steps();
            let step = step
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=total).contains(n))
                .ok_or_else(|| RouteError::InvalidStep(step.to_string()))?;
            Ok(Page::OsWorkflow {
                type_code,
                os_id: os_id.to_string(),
                step,
            })
        }
        ["portal", client_id] => Ok(Page::ClientPortal {
            client_id: client_id.to_string(),
        }),
        ["financeiro"] => Ok(Page::Financeiro),
        ["colaboradores"] => Ok(Page::Colaboradores),
        ["colaboradores", id] => Ok(Page::Colaborador {
            colaborador_id: id.to_string(),
        }),
        ["publico", "proposta", os_id] => Ok(Page::PublicProposal {
            os_id: os_id.to_string(),
        }),
        ["publico", "solicitacao-reforma", os_id] => Ok(Page::PublicRenovationRequest {
            os_id: os_id.to_string(),
        }),
        _ => Err(unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::table::lookup;

    #[test]
    fn resolves_rendered_workflow_route() {
        let path = lookup("type-07").unwrap().render("os-1", 3);
        assert_eq!(
            resolve(&path).unwrap(),
            Page::OsWorkflow {
                type_code: "type-07".parse().unwrap(),
                os_id: "os-1".into(),
                step: 3,
            }
        );
    }

    #[test]
    fn workflow_route_with_wrong_setor_is_unknown() {
        assert!(matches!(
            resolve("/os/obras/type-07/os-1/1"),
            Err(RouteError::UnknownPath(_))
        ));
    }

    #[test]
    fn workflow_route_with_unmapped_code_is_not_found() {
        assert_eq!(
            resolve("/os/obras/type-99/os-1/1"),
            Err(RouteError::NotFound("type-99".into()))
        );
    }

    #[test]
    fn workflow_route_rejects_bad_step() {
        assert_eq!(
            resolve("/os/obras/type-13/os-1/zero"),
            Err(RouteError::InvalidStep("zero".into()))
        );
        assert_eq!(
            resolve("/os/obras/type-13/os-1/0"),
            Err(RouteError::InvalidStep("0".into()))
        );
    }

    #[test]
    fn workflow_route_step_must_exist_in_catalogue() {
        assert_eq!(
            resolve("/os/obras/type-13/os-1/99"),
            Err(RouteError::InvalidStep("99".into()))
        );
        assert_eq!(
            resolve("/os/obras/type-13/os-1/18"),
            Err(RouteError::InvalidStep("18".into()))
        );
        assert!(resolve("/os/obras/type-13/os-1/17").is_ok());
        assert_eq!(
            resolve("/os/assessoria/type-07/os-1/6"),
            Err(RouteError::InvalidStep("6".into()))
        );
    }

    #[test]
    fn resolves_create_and_details_pages() {
        assert_eq!(
            resolve("/os/criar/requisicao-compras?osId=1").unwrap(),
            Page::OsCreate {
                slug: "requisicao-compras".into()
            }
        );
        assert!(resolve("/os/criar/inexistente").is_err());
        assert_eq!(
            resolve("/os/details-workflow/abc/").unwrap(),
            Page::OsDetails { os_id: "abc".into() }
        );
    }

    #[test]
    fn public_pages_are_flagged() {
        let proposal = resolve("/publico/proposta/os-9").unwrap();
        assert!(proposal.is_public());
        let reforma = resolve("/publico/solicitacao-reforma/os-9").unwrap();
        assert!(reforma.is_public());
        assert!(!resolve("/financeiro").unwrap().is_public());
    }

    #[test]
    fn resolves_portal_and_admin_pages() {
        assert_eq!(
            resolve("/portal/cli-7").unwrap(),
            Page::ClientPortal {
                client_id: "cli-7".into()
            }
        );
        assert_eq!(resolve("/colaboradores").unwrap(), Page::Colaboradores);
        assert_eq!(
            resolve("/colaboradores/42").unwrap(),
            Page::Colaborador {
                colaborador_id: "42".into()
            }
        );
        assert!(matches!(
            resolve("/nada/aqui"),
            Err(RouteError::UnknownPath(_))
        ));
    }
}
