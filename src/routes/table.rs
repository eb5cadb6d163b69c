use serde::Serialize;

use crate::error::RouteError;
use crate::workflow::{Setor, TypeCode};

/// Static route configuration for one service-order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteConfigEntry {
    pub type_code: TypeCode,
    /// Workflow page template with `$osId` and `$step` placeholders.
    pub route_template: &'static str,
    pub label: &'static str,
    pub setor: Setor,
}

impl RouteConfigEntry {
    /// Fills the template placeholders.
    pub fn render(&self, os_id: &str, step: u32) -> String {
        self.route_template
            .replace("$osId", os_id)
            .replace("$step", &step.to_string())
    }
}

const fn entry(
    number: u8,
    route_template: &'static str,
    label: &'static str,
    setor: Setor,
) -> RouteConfigEntry {
    RouteConfigEntry {
        type_code: TypeCode::raw(number),
        route_template,
        label,
        setor,
    }
}

static ROUTE_TABLE: [RouteConfigEntry; 13] = [
    entry(1, "/os/obras/type-01/$osId/$step", "Perícia de Fachada", Setor::Obras),
    entry(2, "/os/obras/type-02/$osId/$step", "Revitalização de Fachada", Setor::Obras),
    entry(3, "/os/obras/type-03/$osId/$step", "Reforço Estrutural", Setor::Obras),
    entry(4, "/os/obras/type-04/$osId/$step", "Outros (Obras)", Setor::Obras),
    entry(5, "/os/assessoria/type-05/$osId/$step", "Assessoria Mensal", Setor::Assessoria),
    entry(6, "/os/assessoria/type-06/$osId/$step", "Laudo Pontual", Setor::Assessoria),
    entry(7, "/os/assessoria/type-07/$osId/$step", "Solicitação de Reforma", Setor::Assessoria),
    entry(8, "/os/assessoria/type-08/$osId/$step", "Visita Técnica / Parecer Técnico", Setor::Assessoria),
    entry(9, "/os/administrativo/type-09/$osId/$step", "Requisição de Compras", Setor::Administrativo),
    entry(10, "/os/administrativo/type-10/$osId/$step", "Requisição de Mão de Obra", Setor::Administrativo),
    entry(11, "/os/assessoria/type-11/$osId/$step", "Execução de Laudo Pontual", Setor::Assessoria),
    entry(12, "/os/assessoria/type-12/$osId/$step", "Execução de Assessoria Recorrente", Setor::Assessoria),
    entry(13, "/os/obras/type-13/$osId/$step", "Obra Complexa (Contrato)", Setor::Obras),
];

/// Looks up the route entry for a type code.
///
/// Accepts the canonical (`type-07`) and alias (`OS-07`) spellings. Anything
/// not in the table is `NotFound`; there is no fallback entry.
pub fn lookup(code: &str) -> Result<&'static RouteConfigEntry, RouteError> {
    let type_code: TypeCode = code.parse()?;
    lookup_code(type_code).ok_or_else(|| RouteError::NotFound(code.to_string()))
}

pub fn lookup_code(type_code: TypeCode) -> Option<&'static RouteConfigEntry> {
    ROUTE_TABLE.iter().find(|e| e.type_code == type_code)
}

/// Every configured entry, in type-code order.
pub fn entries() -> &'static [RouteConfigEntry] {
    &ROUTE_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_round_trips_every_entry() {
        for e in entries() {
            let key = e.type_code.to_string();
            let found = lookup(&key).unwrap();
            assert_eq!(found.type_code.to_string(), key);
        }
    }

    #[test]
    fn type_codes_are_unique() {
        let mut codes: Vec<TypeCode> = entries().iter().map(|e| e.type_code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), entries().len());
    }

    #[test]
    fn lookup_type_07_returns_literal_template() {
        let e = lookup("type-07").unwrap();
        assert_eq!(e.route_template, "/os/assessoria/type-07/$osId/$step");
        assert_eq!(e.setor, Setor::Assessoria);
    }

    #[test]
    fn lookup_unknown_code_is_not_found() {
        for code in ["type-14", "type-00", "obra", "", "type-7"] {
            assert_eq!(
                lookup(code),
                Err(RouteError::NotFound(code.to_string())),
                "{code:?}"
            );
        }
    }

    #[test]
    fn lookup_accepts_business_alias() {
        assert_eq!(lookup("OS-13").unwrap().type_code.to_string(), "type-13");
    }

    #[test]
    fn template_prefix_matches_setor() {
        for e in entries() {
            let prefix = format!("/os/{}/{}/", e.setor, e.type_code);
            assert!(e.route_template.starts_with(&prefix), "{}", e.route_template);
        }
    }

    #[test]
    fn render_substitutes_parameters() {
        let e = lookup("type-12").unwrap();
        assert_eq!(e.render("abc-123", 4), "/os/assessoria/type-12/abc-123/4");
    }
}
