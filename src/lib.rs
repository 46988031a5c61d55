//! `mcpdemo`: demo MCP (Model Context Protocol) servers over stdio.
//!
//! A [`Server`] is an immutable registry of tools, resources and prompts,
//! each paired with an async handler. Tool and prompt arguments are
//! validated against the declared schema before a handler runs. The
//! [`transport`] module drives a line-delimited JSON-RPC 2.0 session over
//! stdin/stdout, and [`builtin`] provides the demo capabilities.
//!
//! # Quick start
//!
//! ```rust
//! use mcpdemo::builtin::{self, Variant};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), mcpdemo::McpError> {
//! let server = builtin::build_server(Variant::Basic, "basic-mcp-server", "0.1.0", None)?;
//!
//! let result = server
//!     .call_tool("calculate", &json!({"operation": "add", "a": 2, "b": 3}))
//!     .await?;
//! assert_eq!(result.content[0].text.as_deref(), Some("2 add 3 = 5"));
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod config;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod server;
pub mod transport;
pub mod types;
mod validate;

// Re-export the most commonly used items at the crate root.
pub use config::{Config, LogFormat};
pub use loader::{
    load_prompts, load_resources, load_tools, parse_prompts, parse_resources, parse_tools,
};
pub use schema::{ArgValue, Arguments, FieldType, InputSchema};
pub use server::{
    FnPromptHandler, FnToolHandler, PromptHandler, ResourceHandler, Server, ServerBuilder,
    ToolHandler,
};
pub use transport::{serve, StdioTransport, TransportError};
pub use types::{
    error_result, text_result, ContentBlock, GetPromptResult, JsonRpcRequest, JsonRpcResponse,
    McpError, McpResponse, Prompt, PromptArgument, PromptMessage, Resource, ResourceContent,
    RpcError, Tool, ToolResult, PROTOCOL_VERSION,
};
