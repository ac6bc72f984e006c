//! Tool catalog loading and normalization.
//!
//! Two sources produce the same normalized [`ToolCatalog`]: a static
//! declaration file read at startup, or a tool list the worker supplies
//! over the line protocol. The Action Registrar consumes one shape
//! regardless of source.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Declared parameter type, as a tagged variant.
///
/// External declarations are loosely typed; anything outside the known
/// tags normalizes to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Null,
}

impl ParamKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "number" | "integer" => Self::Number,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::String,
        }
    }
}

/// One typed parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

/// One externally callable capability the worker offers.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

/// The loaded set of tool declarations, in declaration order.
///
/// Loaded exactly once per bridge lifetime and immutable afterwards. An
/// empty catalog is a startup error, never a constructed value.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDeclaration>,
}

impl ToolCatalog {
    fn from_tools(tools: Vec<ToolDeclaration>) -> Result<Self, CatalogError> {
        if tools.is_empty() {
            return Err(CatalogError::Empty);
        }
        // Tool name is the lookup key; a declaration set that reuses one
        // is broken at the source.
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(CatalogError::DuplicateName(tool.name.clone()));
            }
        }
        Ok(Self { tools })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDeclaration> {
        self.tools.iter()
    }

    /// Look up a declaration by tool name.
    pub fn get(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read tool declarations: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tool declarations: {0}")]
    Parse(String),

    #[error("tool catalog is empty")]
    Empty,

    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    tools: Vec<RawTool>,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: serde_json::Map<String, Value>,
}

/// Load the catalog from a static declaration file.
///
/// A missing file, malformed document, or zero tools aborts bridge
/// startup.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ToolCatalog, CatalogError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_file(&content)
}

fn parse_file(content: &str) -> Result<ToolCatalog, CatalogError> {
    let file: CatalogFile =
        serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;

    let tools = file
        .tools
        .into_iter()
        .map(|tool| ToolDeclaration {
            name: tool.name,
            description: tool.description,
            parameters: normalize_parameters(&tool.parameters),
        })
        .collect();

    ToolCatalog::from_tools(tools)
}

/// Load the catalog from a worker-supplied tool list.
///
/// `raw` is the response line to a `list_tools` request: a JSON object
/// with a `tools` array. Entries that are not well-formed tool objects
/// are skipped, not fatal; zero usable tools is still a startup error.
pub fn load_from_handshake(raw: &str) -> Result<ToolCatalog, CatalogError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| CatalogError::Parse(e.to_string()))?;

    let entries = value
        .get("tools")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::Parse("missing `tools` array".to_string()))?;

    let mut tools = Vec::new();
    for entry in entries {
        let Some(object) = entry.as_object() else {
            tracing::warn!("skipping non-object tool entry in worker tool list");
            continue;
        };
        let Some(name) = object.get("name").and_then(Value::as_str) else {
            tracing::warn!("skipping tool entry without a name");
            continue;
        };

        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let parameters = object
            .get("parameters")
            .and_then(Value::as_object)
            .map(normalize_parameters)
            .unwrap_or_default();

        tools.push(ToolDeclaration {
            name: name.to_string(),
            description,
            parameters,
        });
    }

    ToolCatalog::from_tools(tools)
}

/// Normalize a parameter map into typed parameters.
///
/// Entries whose value is not an object are skipped on both load paths.
fn normalize_parameters(map: &serde_json::Map<String, Value>) -> Vec<ToolParameter> {
    let mut parameters = Vec::new();
    for (name, value) in map {
        let Some(object) = value.as_object() else {
            continue;
        };

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map(ParamKind::from_tag)
            .unwrap_or(ParamKind::String);
        let required = object
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        parameters.push(ToolParameter {
            name: name.clone(),
            kind,
            required,
            description,
        });
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "tools": [
            {
                "name": "retrieve_page",
                "description": "Retrieve a page",
                "parameters": {
                    "page_id": {"type": "string", "required": true, "description": "Page ID"}
                }
            },
            {
                "name": "append_block_children",
                "description": "Append blocks",
                "parameters": {
                    "block_id": {"type": "string", "required": true},
                    "count": {"type": "integer"},
                    "archived": {"type": "boolean"},
                    "payload": {"type": "frobnicator"}
                }
            }
        ]
    }"#;

    #[test]
    fn parses_declaration_document() {
        let catalog = parse_file(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);

        let tool = catalog.get("retrieve_page").unwrap();
        assert_eq!(tool.description, "Retrieve a page");
        assert_eq!(tool.parameters.len(), 1);
        assert!(tool.parameters[0].required);
        assert_eq!(tool.parameters[0].kind, ParamKind::String);
    }

    #[test]
    fn normalizes_type_tags() {
        let catalog = parse_file(SAMPLE).unwrap();
        let tool = catalog.get("append_block_children").unwrap();
        let kind_of = |name: &str| {
            tool.parameters
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.kind)
                .unwrap()
        };

        assert_eq!(kind_of("count"), ParamKind::Number);
        assert_eq!(kind_of("archived"), ParamKind::Boolean);
        // Unknown tags collapse to String.
        assert_eq!(kind_of("payload"), ParamKind::String);
    }

    #[test]
    fn zero_tools_is_fatal() {
        assert!(matches!(
            parse_file(r#"{"tools": []}"#),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn duplicate_names_are_fatal() {
        let doc = r#"{
            "tools": [
                {"name": "retrieve_page"},
                {"name": "retrieve_page", "description": "shadow"}
            ]
        }"#;
        assert!(matches!(
            parse_file(doc),
            Err(CatalogError::DuplicateName(name)) if name == "retrieve_page"
        ));
        assert!(matches!(
            load_from_handshake(doc),
            Err(CatalogError::DuplicateName(_))
        ));
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(matches!(
            parse_file("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = load_from_file("/nonexistent/tools.json");
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let catalog = load_from_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn handshake_skips_malformed_entries() {
        let raw = r#"{
            "tools": [
                {"name": "good", "description": "fine", "parameters": {
                    "arg": {"type": "string"},
                    "junk": "not an object"
                }},
                "not an object",
                {"description": "missing name"}
            ]
        }"#;

        let catalog = load_from_handshake(raw).unwrap();
        assert_eq!(catalog.len(), 1);

        let tool = catalog.get("good").unwrap();
        assert_eq!(tool.parameters.len(), 1);
        assert_eq!(tool.parameters[0].name, "arg");
    }

    #[test]
    fn handshake_without_tools_array_fails() {
        assert!(matches!(
            load_from_handshake(r#"{"status": "ready"}"#),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn handshake_with_only_junk_is_empty() {
        assert!(matches!(
            load_from_handshake(r#"{"tools": [42, "nope"]}"#),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn preserves_declaration_order() {
        let catalog = parse_file(SAMPLE).unwrap();
        let names: Vec<_> = catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["retrieve_page", "append_block_children"]);
    }
}
