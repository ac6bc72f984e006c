//! Catalog-to-action projection.

use crate::catalog::ToolCatalog;
use crate::host::{ActionDefinition, ArgumentDefinition, ArgumentKind};

/// Project the catalog into the host's action schema.
///
/// One action per declaration, all under the given routing label. The
/// type mapping is deliberately lossy: the host's trigger arguments are
/// string-only, so every declared parameter kind (number, boolean, null,
/// anything) becomes [`ArgumentKind::String`]. The worker is responsible
/// for interpreting the string values.
pub fn actions_for(catalog: &ToolCatalog, layer: &str) -> Vec<ActionDefinition> {
    catalog
        .iter()
        .map(|tool| ActionDefinition {
            name: tool.name.clone(),
            layer: layer.to_string(),
            description: tool.description.clone(),
            arguments: tool
                .parameters
                .iter()
                .map(|param| ArgumentDefinition {
                    name: param.name.clone(),
                    kind: ArgumentKind::String,
                    required: param.required,
                    description: param.description.clone(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn sample_catalog() -> ToolCatalog {
        catalog::load_from_handshake(
            r#"{
                "tools": [
                    {"name": "alpha", "description": "first", "parameters": {
                        "text": {"type": "string", "required": true, "description": "words"},
                        "count": {"type": "number"},
                        "flag": {"type": "boolean"}
                    }},
                    {"name": "beta", "description": "second", "parameters": {}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn one_action_per_declaration() {
        let actions = actions_for(&sample_catalog(), "tools");
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.layer == "tools"));
        assert_eq!(actions[0].name, "alpha");
        assert_eq!(actions[1].name, "beta");
    }

    #[test]
    fn every_argument_is_coerced_to_string() {
        let actions = actions_for(&sample_catalog(), "tools");
        let alpha = &actions[0];
        assert_eq!(alpha.arguments.len(), 3);
        assert!(
            alpha
                .arguments
                .iter()
                .all(|a| a.kind == ArgumentKind::String)
        );
    }

    #[test]
    fn required_flag_and_description_survive() {
        let actions = actions_for(&sample_catalog(), "tools");
        let text = actions[0]
            .arguments
            .iter()
            .find(|a| a.name == "text")
            .unwrap();
        assert!(text.required);
        assert_eq!(text.description, "words");
    }
}
