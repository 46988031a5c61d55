use serde_json::{Map, Value};

use crate::schema::{ArgValue, Arguments, FieldType, InputSchema};
use crate::types::{McpError, Prompt, Tool};

impl Tool {
    /// Validate arguments against the tool's input schema.
    pub fn validate_arguments(&self, args: &Value) -> Result<Arguments, McpError> {
        self.input_schema.validate(args)
    }
}

impl InputSchema {
    /// Check `args` against the schema and convert it into typed [`Arguments`].
    ///
    /// Absent or `null` arguments count as an empty object. Values are never
    /// coerced: `"2"` does not satisfy a number field.
    pub fn validate(&self, args: &Value) -> Result<Arguments, McpError> {
        let empty = Map::new();
        let obj = as_object(args, &empty)?;

        reject_unknown(obj, |key| self.get(key).is_some())?;

        let mut out = Arguments::default();
        for field in self.fields() {
            let Some(value) = obj.get(&field.name) else {
                if field.required {
                    return Err(McpError::invalid_arguments(format!(
                        "missing required field \"{}\"",
                        field.name
                    )));
                }
                continue;
            };

            let checked = match &field.field_type {
                FieldType::String => value.as_str().map(|s| ArgValue::String(s.into())),
                FieldType::Number => value.as_f64().map(ArgValue::Number),
                FieldType::Enum(allowed) => match value.as_str() {
                    Some(s) if allowed.iter().any(|a| a == s) => Some(ArgValue::String(s.into())),
                    _ => {
                        return Err(McpError::invalid_arguments(format!(
                            "field \"{}\" must be one of: {}",
                            field.name,
                            allowed.join(", ")
                        )))
                    }
                },
            };

            match checked {
                Some(v) => out.insert(field.name.clone(), v),
                None => {
                    return Err(McpError::invalid_arguments(format!(
                        "field \"{}\" must be a {}",
                        field.name,
                        match field.field_type {
                            FieldType::Number => "number",
                            _ => "string",
                        }
                    )))
                }
            }
        }

        Ok(out)
    }
}

impl Prompt {
    /// Validate prompt arguments. Prompt arguments are always strings.
    pub fn validate_arguments(&self, args: &Value) -> Result<Arguments, McpError> {
        let empty = Map::new();
        let obj = as_object(args, &empty)?;

        reject_unknown(obj, |key| self.arguments.iter().any(|a| a.name == key))?;

        let mut out = Arguments::default();
        for arg in &self.arguments {
            match obj.get(&arg.name) {
                Some(Value::String(s)) => out.insert(arg.name.clone(), ArgValue::String(s.clone())),
                Some(_) => {
                    return Err(McpError::invalid_arguments(format!(
                        "argument \"{}\" must be a string",
                        arg.name
                    )))
                }
                None if arg.required => {
                    return Err(McpError::invalid_arguments(format!(
                        "missing required argument \"{}\"",
                        arg.name
                    )))
                }
                None => {}
            }
        }

        Ok(out)
    }
}

fn as_object<'a>(
    args: &'a Value,
    empty: &'a Map<String, Value>,
) -> Result<&'a Map<String, Value>, McpError> {
    match args {
        Value::Null => Ok(empty),
        Value::Object(obj) => Ok(obj),
        _ => Err(McpError::invalid_arguments("arguments must be an object")),
    }
}

fn reject_unknown(obj: &Map<String, Value>, known: impl Fn(&str) -> bool) -> Result<(), McpError> {
    match obj.keys().find(|k| !known(k.as_str())) {
        Some(key) => Err(McpError::invalid_arguments(format!("unknown field \"{}\"", key))),
        None => Ok(()),
    }
}
