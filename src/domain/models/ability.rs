//! Ability catalogue models.
//!
//! Abilities are named, externally-implemented operations with declared
//! parameter schemas. The engine never validates argument shapes itself;
//! invalid shapes surface as dispatch errors at invocation time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared parameter of an ability, rendered into prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityParameter {
    pub name: String,
    /// Free-form type tag, e.g. "string", "integer"
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl AbilityParameter {
    pub fn required(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: param_type.to_string(),
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: param_type.to_string(),
            description: description.to_string(),
            required: false,
        }
    }
}

/// Catalogue entry describing an ability for prompt construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<AbilityParameter>,
    /// Human-readable tag of the produced value, e.g. "string", "dict"
    pub output_type: String,
}

impl AbilitySpec {
    /// Render this spec as one prompt catalogue line.
    ///
    /// Format mirrors what the model is asked to echo back: name, what it
    /// does, and the argument list with required markers.
    pub fn prompt_line(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| {
                format!(
                    "{}: {}{}",
                    p.name,
                    p.param_type,
                    if p.required { " (required)" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}) -> {}: {}", self.name, params, self.output_type, self.description)
    }
}

/// Ability invocation descriptor parsed out of a step completion answer.
///
/// `is_last` may be emitted by the model but is advisory only; plan
/// position is authoritative for step termination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_spec() -> AbilitySpec {
        AbilitySpec {
            name: "select_from_table".to_string(),
            description: "Runs a SQL query against a registered table".to_string(),
            parameters: vec![
                AbilityParameter::required("query", "string", "SQL to run"),
                AbilityParameter::optional("limit", "integer", "Row cap"),
            ],
            output_type: "dict".to_string(),
        }
    }

    #[test]
    fn test_prompt_line_format() {
        let line = sample_spec().prompt_line();
        assert!(line.starts_with("select_from_table(query: string (required), limit: integer)"));
        assert!(line.contains("-> dict"));
        assert!(line.contains("Runs a SQL query"));
    }

    #[test]
    fn test_ability_call_parsing() {
        let call: AbilityCall = serde_json::from_value(json!({
            "name": "select_from_table",
            "args": {"query": "SELECT 1"}
        }))
        .unwrap();
        assert_eq!(call.name, "select_from_table");
        assert_eq!(call.args.get("query"), Some(&json!("SELECT 1")));
        assert_eq!(call.is_last, None);
    }

    #[test]
    fn test_ability_call_advisory_is_last() {
        let call: AbilityCall = serde_json::from_value(json!({
            "name": "finish",
            "args": {},
            "is_last": true
        }))
        .unwrap();
        assert_eq!(call.is_last, Some(true));
    }
}
