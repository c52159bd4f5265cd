//! Fluent construction of tool parameter schemas.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::definition::ObjectJsonSchema;

/// Schema builder for manual schema construction.
///
/// # Example
///
/// ```rust
/// use chatwire_tools::SchemaBuilder;
///
/// let schema = SchemaBuilder::new()
///     .string("query", "The search query", true)
///     .enum_values("depth", "Search depth", &["basic", "advanced"], false)
///     .build();
/// assert_eq!(schema.required, vec!["query".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    properties: IndexMap<String, JsonValue>,
    required: Vec<String>,
    description: Option<String>,
    additional_properties: Option<bool>,
}

impl SchemaBuilder {
    /// Create a new empty schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn property(mut self, name: &str, schema: JsonValue, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required && !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a string property.
    #[must_use]
    pub fn string(self, name: &str, desc: &str, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "string", "description": desc }),
            required,
        )
    }

    /// Add a boolean property.
    #[must_use]
    pub fn boolean(self, name: &str, desc: &str, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "boolean", "description": desc }),
            required,
        )
    }

    /// Add an integer property with optional bounds.
    #[must_use]
    pub fn integer_constrained(
        self,
        name: &str,
        desc: &str,
        required: bool,
        minimum: Option<i64>,
        maximum: Option<i64>,
    ) -> Self {
        let mut prop = serde_json::json!({ "type": "integer", "description": desc });
        if let Some(min) = minimum {
            prop["minimum"] = JsonValue::from(min);
        }
        if let Some(max) = maximum {
            prop["maximum"] = JsonValue::from(max);
        }
        self.property(name, prop, required)
    }

    /// Add an array property.
    #[must_use]
    pub fn array(self, name: &str, desc: &str, items: JsonValue, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "array", "description": desc, "items": items }),
            required,
        )
    }

    /// Add a string array property.
    #[must_use]
    pub fn string_array(self, name: &str, desc: &str, required: bool) -> Self {
        self.array(name, desc, serde_json::json!({ "type": "string" }), required)
    }

    /// Add a nested object property.
    #[must_use]
    pub fn object(
        self,
        name: &str,
        desc: &str,
        schema: ObjectJsonSchema,
        required: bool,
    ) -> Self {
        let mut obj = schema.to_json();
        if let Some(map) = obj.as_object_mut() {
            map.insert(
                "description".to_string(),
                JsonValue::String(desc.to_string()),
            );
        }
        self.property(name, obj, required)
    }

    /// Add an enum property (string values).
    #[must_use]
    pub fn enum_values(self, name: &str, desc: &str, values: &[&str], required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "string", "description": desc, "enum": values }),
            required,
        )
    }

    /// Set the schema description.
    #[must_use]
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Set whether properties beyond the declared ones are accepted.
    #[must_use]
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }

    /// Build the object schema.
    #[must_use]
    pub fn build(self) -> ObjectJsonSchema {
        ObjectJsonSchema {
            schema_type: "object".to_string(),
            properties: self.properties,
            required: self.required,
            description: self.description,
            additional_properties: self.additional_properties,
        }
    }
}
