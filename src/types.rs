use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::schema::InputSchema;

/// JSON-RPC 2.0 error codes.
pub const ERR_CODE_PARSE: i32 = -32700;
pub const ERR_CODE_INVALID_REQ: i32 = -32600;
pub const ERR_CODE_NO_METHOD: i32 = -32601;
pub const ERR_CODE_BAD_PARAMS: i32 = -32602;
pub const ERR_CODE_INTERNAL: i32 = -32603;

/// MCP-specific error code for `resources/read` on an unknown URI.
pub const ERR_CODE_RESOURCE_NOT_FOUND: i32 = -32002;

/// Latest MCP protocol version this server implements.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Every protocol version the server will agree to during `initialize`.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[PROTOCOL_VERSION, "2024-11-05"];

// ── Request ──

/// Inbound JSON-RPC 2.0 request. A missing `id` marks a notification;
/// an explicit `"id": null` is still a request and is answered.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Keeps a present `id` even when it is `null`; only an absent member
/// falls back to `None` through `#[serde(default)]`.
fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ── Response ──

/// Response from [`Server::handle()`](crate::Server::handle).
///
/// The list endpoints (`tools/list`, `resources/list`, `prompts/list`) never
/// change after the registry is built, so their results are serialized once
/// and shared via `Arc`.
///
/// Implements [`Serialize`]; error responses always carry an `id` member
/// (`null` when the request id could not be determined).
#[derive(Debug)]
pub struct McpResponse {
    id: Option<Value>,
    kind: ResponseKind,
}

#[derive(Debug)]
enum ResponseKind {
    /// Pre-serialized result.
    Cached(Arc<RawValue>),
    Result(Value),
    Error(RpcError),
    /// Notification sentinel: nothing is written back.
    Notification,
}

impl McpResponse {
    /// True when the request was a notification (no response body needed).
    pub fn is_notification(&self) -> bool {
        matches!(self.kind, ResponseKind::Notification)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ResponseKind::Error(_))
    }

    /// Convert to a [`JsonRpcResponse`] for structured inspection.
    pub fn into_json_rpc(self) -> JsonRpcResponse {
        let (result, error) = match self.kind {
            ResponseKind::Cached(raw) => (serde_json::from_str(raw.get()).ok(), None),
            ResponseKind::Result(value) => (Some(value), None),
            ResponseKind::Error(err) => (None, Some(err)),
            ResponseKind::Notification => (None, None),
        };
        JsonRpcResponse {
            jsonrpc: "2.0".into(),
            id: self.id,
            result,
            error,
        }
    }

    // ── Internal constructors ──

    pub(crate) fn cached(id: Option<Value>, raw: &Arc<RawValue>) -> Self {
        McpResponse {
            id,
            kind: ResponseKind::Cached(Arc::clone(raw)),
        }
    }

    pub(crate) fn ok(id: Option<Value>, result: Value) -> Self {
        McpResponse {
            id,
            kind: ResponseKind::Result(result),
        }
    }

    pub(crate) fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        McpResponse {
            id,
            kind: ResponseKind::Error(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub(crate) fn notification() -> Self {
        McpResponse {
            id: None,
            kind: ResponseKind::Notification,
        }
    }
}

impl Serialize for McpResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let is_error = matches!(self.kind, ResponseKind::Error(_));
        let has_id = self.id.is_some() || is_error;
        let has_payload = !matches!(self.kind, ResponseKind::Notification);
        let len = 1 + has_id as usize + has_payload as usize;

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("jsonrpc", "2.0")?;

        if has_id {
            map.serialize_entry("id", &self.id)?;
        }

        match &self.kind {
            ResponseKind::Cached(raw) => map.serialize_entry("result", raw.as_ref())?,
            ResponseKind::Result(value) => map.serialize_entry("result", value)?,
            ResponseKind::Error(err) => map.serialize_entry("error", err)?,
            ResponseKind::Notification => {}
        }

        map.end()
    }
}

/// Structured JSON-RPC 2.0 response, mostly useful in tests and clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ── MCP domain types ──

/// The three kinds of capability a server can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapabilityKind::Tool => "tool",
            CapabilityKind::Resource => "resource",
            CapabilityKind::Prompt => "prompt",
        })
    }
}

/// Name and version of a server or client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// MCP tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// MCP resource definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// MCP prompt definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// One named argument a prompt accepts. Prompt arguments are always strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Tool call result returned by handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// Single content block in a tool result or prompt message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock {
            block_type: "text".into(),
            text: Some(text.into()),
        }
    }
}

/// Resource content returned by resource handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

impl ResourceContent {
    /// Textual content for `uri`.
    pub fn text(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        ResourceContent {
            uri: uri.into(),
            mime_type: Some(mime_type.into()),
            text: Some(text.into()),
            blob: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a rendered prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: ContentBlock,
}

impl PromptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        PromptMessage {
            role: Role::User,
            content: ContentBlock::text(text),
        }
    }
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

// ── Convenience constructors ──

/// Create a simple text tool result.
pub fn text_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock::text(text)],
        is_error: false,
    }
}

/// Create an error tool result.
pub fn error_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock::text(text)],
        is_error: true,
    }
}

/// MCP error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// No capability of `kind` is registered under `name`.
    #[error("Unknown {kind}: {name}")]
    NotFound { kind: CapabilityKind, name: String },
    /// Arguments failed schema validation.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// A handler rejected the call on business grounds.
    #[error("{0}")]
    Domain(String),
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: CapabilityKind, name: String },
    /// Malformed capability definition.
    #[error("invalid definition: {0}")]
    Definition(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn not_found(kind: CapabilityKind, name: impl Into<String>) -> Self {
        McpError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        McpError::InvalidArguments(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        McpError::Domain(msg.into())
    }

    /// JSON-RPC error code reported when this error fails a request.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::NotFound {
                kind: CapabilityKind::Resource,
                ..
            } => ERR_CODE_RESOURCE_NOT_FOUND,
            McpError::NotFound { .. } | McpError::InvalidArguments(_) => ERR_CODE_BAD_PARAMS,
            _ => ERR_CODE_INTERNAL,
        }
    }
}

// Internal params structs for deserialization.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub client_info: Option<Implementation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceReadParams {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromptGetParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}
