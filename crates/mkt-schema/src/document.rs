//! # Document Loading
//!
//! Reads tree documents from disk and validates them. The format is chosen
//! by extension: `.yaml`/`.yml` are parsed as YAML and converted to JSON
//! values, everything else is parsed as JSON.

use std::path::Path;

use mkt_core::{ErrorPayload, ValidationIssues};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::tree::{TreeSchema, TreeValidator};

/// Error while loading or validating a document file.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be read or parsed.
    #[error("failed to load document {path}: {reason}")]
    Load { path: String, reason: String },

    /// The document was read but is not a valid tree.
    #[error("{schema_name} document failed validation with {} issue(s):\n{issues}", .issues.len())]
    ValidationFailed {
        schema_name: &'static str,
        issues: ValidationIssues,
    },
}

impl DocumentError {
    /// The 400-style body for a validation failure; `None` for load errors.
    pub fn payload(&self) -> Option<ErrorPayload> {
        match self {
            Self::ValidationFailed {
                schema_name,
                issues,
            } => Some(ErrorPayload::new(schema_name, issues)),
            Self::Load { .. } => None,
        }
    }
}

/// Read a JSON or YAML document into a JSON value.
pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    let load_error = |reason: String| DocumentError::Load {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| load_error(format!("cannot read file: {e}")))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value = match ext {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
            yaml_to_json_value(&yaml)
                .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))?
        }
        _ => serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}")))?,
    };

    tracing::debug!(path = %path.display(), format = ext, "loaded document");
    Ok(value)
}

/// Load a document and validate it against `S`.
pub fn validate_file<S: TreeSchema>(
    validator: &TreeValidator<S>,
    path: &Path,
) -> Result<S::Node, DocumentError> {
    let value = load_document(path)?;
    validator
        .validate(&value)
        .map_err(|issues| DocumentError::ValidationFailed {
            schema_name: S::NAME,
            issues,
        })
}

/// A YAML container being converted.
enum YamlFrame<'y> {
    Sequence {
        items: std::slice::Iter<'y, serde_yaml::Value>,
        out: Vec<Value>,
    },
    Mapping {
        members: serde_yaml::mapping::Iter<'y>,
        key: String,
        out: Map<String, Value>,
    },
}

/// Convert a YAML value to JSON with an explicit stack, so nesting depth is
/// bounded by memory rather than the host stack. Tags are dropped; scalar
/// map keys become strings.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    let mut stack: Vec<YamlFrame<'_>> = Vec::new();
    let mut finished = open_yaml(yaml, &mut stack)?;

    loop {
        if let Some(value) = finished.take() {
            match stack.last_mut() {
                None => return Ok(value),
                Some(YamlFrame::Sequence { out, .. }) => out.push(value),
                Some(YamlFrame::Mapping { key, out, .. }) => {
                    out.insert(std::mem::take(key), value);
                }
            }
        }

        let next = match stack.last_mut() {
            Some(YamlFrame::Sequence { items, .. }) => items.next(),
            Some(YamlFrame::Mapping { members, key, .. }) => match members.next() {
                Some((name, value)) => {
                    *key = yaml_key(name)?;
                    Some(value)
                }
                None => None,
            },
            None => return Ok(Value::Null),
        };

        finished = match next {
            Some(child) => open_yaml(child, &mut stack)?,
            None => match stack.pop() {
                Some(YamlFrame::Sequence { out, .. }) => Some(Value::Array(out)),
                Some(YamlFrame::Mapping { out, .. }) => Some(Value::Object(out)),
                None => None,
            },
        };
    }
}

/// Convert a scalar, or push a frame for a container and return `None`.
fn open_yaml<'y>(
    yaml: &'y serde_yaml::Value,
    stack: &mut Vec<YamlFrame<'y>>,
) -> Result<Option<Value>, String> {
    use serde_yaml::Value as Yaml;

    let yaml = match yaml {
        Yaml::Tagged(tagged) => &tagged.value,
        other => other,
    };
    let value = match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => Value::Number(json_number(n)?),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => {
            stack.push(YamlFrame::Sequence {
                items: items.iter(),
                out: Vec::with_capacity(items.len()),
            });
            return Ok(None);
        }
        Yaml::Mapping(mapping) => {
            stack.push(YamlFrame::Mapping {
                members: mapping.iter(),
                key: String::new(),
                out: Map::new(),
            });
            return Ok(None);
        }
        Yaml::Tagged(_) => return Err("unsupported nested YAML tag".to_string()),
    };
    Ok(Some(value))
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported YAML map key: {other:?}")),
    }
}

fn json_number(n: &serde_yaml::Number) -> Result<Number, String> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    let f = n
        .as_f64()
        .ok_or_else(|| format!("unsupported YAML number: {n}"))?;
    Number::from_f64(f).ok_or_else(|| format!("cannot represent float {f} in JSON"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{NavItem, NavigationValidator};
    use crate::walk::TreeNode;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_yaml_document_validates() {
        let file = write_temp(
            ".yaml",
            "kind: group\nlabel: Seller tools\nchildren:\n  - kind: link\n    label: Payouts\n    href: /seller/payouts\n  - kind: divider\n",
        );
        let item = validate_file(&NavigationValidator::default(), file.path()).unwrap();
        assert_eq!(item.children().len(), 2);
        assert!(matches!(item, NavItem::Group(ref g) if !g.expanded));
    }

    #[test]
    fn test_json_document_with_issues() {
        let file = write_temp(".json", r#"{"kind": "link", "label": "Home"}"#);
        let err = validate_file(&NavigationValidator::default(), file.path()).unwrap_err();
        let payload = err.payload().unwrap();
        assert_eq!(payload.error, ErrorPayload::ERROR_CODE);
        assert_eq!(payload.issues.len(), 1);
        assert!(err.to_string().contains("href: missing required field `href`"));
    }

    #[test]
    fn test_invalid_json_is_a_load_error() {
        let file = write_temp(".json", "{not json");
        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, DocumentError::Load { .. }));
        assert!(err.payload().is_none());
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_document(Path::new("/nonexistent/menu.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read file"));
    }

    #[test]
    fn test_yaml_numbers_and_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("gap: 8\n1: one\nratio: 0.5\n").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json["gap"], serde_json::json!(8));
        assert_eq!(json["1"], serde_json::json!("one"));
        assert_eq!(json["ratio"], serde_json::json!(0.5));
    }

    #[test]
    fn test_yaml_tags_are_dropped_and_order_kept() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("kind: !label group\nlabel: Docs\nchildren: []\nicon: ~\n").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["kind", "label", "children", "icon"]);
        assert_eq!(json["kind"], serde_json::json!("group"));
        assert_eq!(json["icon"], Value::Null);
    }

    #[test]
    fn test_yaml_rejects_non_scalar_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("? [a, b]\n: 1\n").unwrap();
        let err = yaml_to_json_value(&yaml).unwrap_err();
        assert!(err.contains("unsupported YAML map key"));
    }

    #[test]
    fn test_deep_yaml_converts_without_recursion() {
        const DEPTH: usize = 5_000;
        let mut yaml = serde_yaml::Value::Null;
        for _ in 0..DEPTH {
            yaml = serde_yaml::Value::Sequence(vec![yaml]);
        }
        let json = yaml_to_json_value(&yaml).unwrap();

        // Both values drop recursively; unwind them by hand.
        let mut depth = 0;
        let mut current = json;
        while let Value::Array(mut items) = current {
            depth += 1;
            current = items.pop().unwrap_or(Value::Null);
        }
        assert_eq!(depth, DEPTH);
        let mut current = yaml;
        while let serde_yaml::Value::Sequence(mut items) = current {
            current = items.pop().unwrap_or(serde_yaml::Value::Null);
        }
    }
}
