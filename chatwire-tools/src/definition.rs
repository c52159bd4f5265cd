//! What the model is told about each tool.
//!
//! A [`ToolDefinition`] is sent in the `tools` array of every completion
//! request that offers tools. Properties serialize in declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Parameter schema of a tool: always a JSON Schema `object`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectJsonSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Schema of each parameter, keyed by name.
    pub properties: IndexMap<String, JsonValue>,

    /// Parameters the model must supply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Free-text description of the parameter object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `additionalProperties`; omitted when unset.
    #[serde(
        default,
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl ObjectJsonSchema {
    /// An object schema without parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_type: "object".into(),
            properties: IndexMap::new(),
            required: Vec::new(),
            description: None,
            additional_properties: None,
        }
    }

    /// Schema of one parameter.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&JsonValue> {
        self.properties.get(name)
    }

    /// The schema as a plain JSON value, for nesting inside another schema.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut value = serde_json::json!({
            "type": self.schema_type,
            "properties": self.properties,
        });
        if !self.required.is_empty() {
            value["required"] = serde_json::json!(self.required);
        }
        if let Some(description) = &self.description {
            value["description"] = JsonValue::String(description.clone());
        }
        if let Some(allowed) = self.additional_properties {
            value["additionalProperties"] = JsonValue::Bool(allowed);
        }
        value
    }
}

impl Default for ObjectJsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Name, description and parameter schema of one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Name the model uses to call the tool.
    pub name: String,

    /// When and why the model should call it.
    pub description: String,

    /// Accepted arguments.
    pub parameters: ObjectJsonSchema,
}

impl ToolDefinition {
    /// A definition taking no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ObjectJsonSchema::new(),
        }
    }

    /// Replace the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ObjectJsonSchema) -> Self {
        self.parameters = parameters;
        self
    }

    /// The tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
