//! Typed input schemas and the validated argument values they produce.
//!
//! An [`InputSchema`] is the subset of JSON Schema that tool definitions use:
//! a flat object whose fields are strings, numbers, or string enums, each
//! optionally required. It serializes back to plain JSON Schema for
//! `tools/list`, with fields in declaration order.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::types::McpError;

/// Declared type of one schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    /// A string restricted to the listed values.
    Enum(Vec<String>),
}

impl FieldType {
    fn json_type(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Enum(_) => "string",
            FieldType::Number => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub description: Option<String>,
    pub field_type: FieldType,
    pub required: bool,
}

/// Object schema describing a tool's accepted arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSchema>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn required(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        description: &str,
    ) -> Self {
        self.field(name, field_type, description, true)
    }

    /// Add an optional field.
    pub fn optional(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        description: &str,
    ) -> Self {
        self.field(name, field_type, description, false)
    }

    fn field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        description: &str,
        required: bool,
    ) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            description: (!description.is_empty()).then(|| description.to_string()),
            field_type,
            required,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Parse a JSON Schema object. Only the supported subset is accepted.
    pub fn from_json(schema: &Value) -> Result<Self, McpError> {
        let obj = schema
            .as_object()
            .ok_or_else(|| McpError::Definition("input schema must be an object".into()))?;

        match obj.get("type").and_then(Value::as_str) {
            None | Some("object") => {}
            Some(other) => {
                return Err(McpError::Definition(format!(
                    "input schema type must be \"object\", got \"{}\"",
                    other
                )))
            }
        }

        let mut fields = Vec::new();
        if let Some(props) = obj.get("properties") {
            let props = props
                .as_object()
                .ok_or_else(|| McpError::Definition("\"properties\" must be an object".into()))?;
            for (name, prop) in props {
                fields.push(FieldSchema {
                    name: name.clone(),
                    description: prop
                        .get("description")
                        .and_then(Value::as_str)
                        .map(String::from),
                    field_type: parse_field_type(name, prop)?,
                    required: false,
                });
            }
        }

        if let Some(required) = obj.get("required") {
            let required = required
                .as_array()
                .ok_or_else(|| McpError::Definition("\"required\" must be an array".into()))?;
            for entry in required {
                let name = entry.as_str().ok_or_else(|| {
                    McpError::Definition("\"required\" entries must be strings".into())
                })?;
                let field = fields.iter_mut().find(|f| f.name == name).ok_or_else(|| {
                    McpError::Definition(format!(
                        "required field \"{}\" is not a declared property",
                        name
                    ))
                })?;
                field.required = true;
            }
        }

        Ok(InputSchema { fields })
    }
}

fn parse_field_type(name: &str, prop: &Value) -> Result<FieldType, McpError> {
    let declared = prop.get("type").and_then(Value::as_str);
    match (declared, prop.get("enum")) {
        (Some("string") | None, Some(values)) => {
            let values = values
                .as_array()
                .ok_or_else(|| {
                    McpError::Definition(format!("field \"{}\": enum must be an array", name))
                })?
                .iter()
                .map(|v| {
                    v.as_str().map(String::from).ok_or_else(|| {
                        McpError::Definition(format!(
                            "field \"{}\": enum values must be strings",
                            name
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if values.is_empty() {
                return Err(McpError::Definition(format!("field \"{}\": enum is empty", name)));
            }
            Ok(FieldType::Enum(values))
        }
        (Some("string"), None) => Ok(FieldType::String),
        (Some("number"), None) => Ok(FieldType::Number),
        (Some(other), _) => Err(McpError::Definition(format!(
            "field \"{}\": unsupported type \"{}\"",
            name, other
        ))),
        (None, None) => Err(McpError::Definition(format!("field \"{}\": missing type", name))),
    }
}

impl Serialize for InputSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &Properties(&self.fields))?;
        if !required.is_empty() {
            map.serialize_entry("required", &required)?;
        }
        map.end()
    }
}

struct Properties<'a>(&'a [FieldSchema]);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in self.0 {
            map.serialize_entry(&field.name, field)?;
        }
        map.end()
    }
}

impl Serialize for FieldSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.field_type.json_type())?;
        if let FieldType::Enum(values) = &self.field_type {
            map.serialize_entry("enum", values)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InputSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        InputSchema::from_json(&value).map_err(serde::de::Error::custom)
    }
}

// ── Validated arguments ──

/// A single validated argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Number(f64),
}

/// Arguments that passed schema validation. Handlers only ever see these.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, ArgValue>,
}

impl Arguments {
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// The string argument `name`, or `InvalidArguments` if it is absent.
    pub fn require_str(&self, name: &str) -> Result<&str, McpError> {
        self.str(name)
            .ok_or_else(|| {
                McpError::invalid_arguments(format!("missing string field \"{}\"", name))
            })
    }

    /// The numeric argument `name`, or `InvalidArguments` if it is absent.
    pub fn require_number(&self, name: &str) -> Result<f64, McpError> {
        self.number(name)
            .ok_or_else(|| {
                McpError::invalid_arguments(format!("missing number field \"{}\"", name))
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
