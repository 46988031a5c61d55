use std::path::Path;

use crate::types::{McpError, Prompt, Resource, Tool};

/// Load tool definitions from a JSON file on disk.
pub fn load_tools(path: impl AsRef<Path>) -> Result<Vec<Tool>, McpError> {
    let data = std::fs::read(path)?;
    parse_tools(&data)
}

/// Parse tool definitions from raw JSON bytes.
///
/// Each entry's `inputSchema` must use the supported subset of JSON Schema
/// (see [`InputSchema`](crate::schema::InputSchema)); anything else is an error.
pub fn parse_tools(data: &[u8]) -> Result<Vec<Tool>, McpError> {
    let tools: Vec<Tool> = serde_json::from_slice(data)?;
    for tool in &tools {
        if tool.name.is_empty() {
            return Err(McpError::Definition("tool name must not be empty".into()));
        }
    }
    Ok(tools)
}

/// Load resource definitions from a JSON file on disk.
pub fn load_resources(path: impl AsRef<Path>) -> Result<Vec<Resource>, McpError> {
    let data = std::fs::read(path)?;
    parse_resources(&data)
}

/// Parse resource definitions from raw JSON bytes.
pub fn parse_resources(data: &[u8]) -> Result<Vec<Resource>, McpError> {
    let resources: Vec<Resource> = serde_json::from_slice(data)?;
    for resource in &resources {
        if resource.uri.is_empty() {
            return Err(McpError::Definition(format!(
                "resource \"{}\" has an empty uri",
                resource.name
            )));
        }
    }
    Ok(resources)
}

/// Load prompt definitions from a JSON file on disk.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<Prompt>, McpError> {
    let data = std::fs::read(path)?;
    parse_prompts(&data)
}

/// Parse prompt definitions from raw JSON bytes.
pub fn parse_prompts(data: &[u8]) -> Result<Vec<Prompt>, McpError> {
    let prompts: Vec<Prompt> = serde_json::from_slice(data)?;
    for prompt in &prompts {
        if prompt.name.is_empty() {
            return Err(McpError::Definition("prompt name must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = prompt.arguments.iter().find(|a| !seen.insert(a.name.as_str())) {
            return Err(McpError::Definition(format!(
                "prompt \"{}\" declares argument \"{}\" twice",
                prompt.name, dup.name
            )));
        }
    }
    Ok(prompts)
}
