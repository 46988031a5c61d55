//! Built-in demo capabilities and the server variants that expose them.
//!
//! Definitions live in the JSON catalogs next to this file; handlers are
//! wired to them by name when the registry is built. Each [`Variant`]
//! selects a subset of the catalog.

mod prompts;
mod resources;
mod tools;

pub use prompts::{explain_mcp, greet_user, EXPLAIN_MCP, GREET_USER};
pub use resources::{ConfigDocument, CONFIG_URI, EXAMPLE_URI};
pub use tools::{calculate, format_number, hello, Operation, CALCULATE, HELLO};

use crate::loader;
use crate::server::Server;
use crate::types::McpError;

const TOOLS_JSON: &[u8] = include_bytes!("tools.json");
const RESOURCES_JSON: &[u8] = include_bytes!("resources.json");
const PROMPTS_JSON: &[u8] = include_bytes!("prompts.json");

/// Which demo server to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// `hello` only, both resources, both prompts.
    Demo,
    /// `hello` and `calculate`, both resources, both prompts.
    Basic,
    /// `hello` and `calculate`, the example resource, `greet_user`.
    #[value(name = "fastmcp")]
    FastMcp,
}

impl Variant {
    pub fn default_name(self) -> &'static str {
        match self {
            Variant::Demo => "fast-mcp-demo",
            Variant::Basic => "basic-mcp-server",
            Variant::FastMcp => "fastmcp-example-server",
        }
    }

    pub fn default_version(self) -> &'static str {
        "0.1.0"
    }

    pub fn tools(self) -> &'static [&'static str] {
        match self {
            Variant::Demo => &[HELLO],
            Variant::Basic | Variant::FastMcp => &[HELLO, CALCULATE],
        }
    }

    pub fn resources(self) -> &'static [&'static str] {
        match self {
            Variant::Demo | Variant::Basic => &[EXAMPLE_URI, CONFIG_URI],
            Variant::FastMcp => &[EXAMPLE_URI],
        }
    }

    pub fn prompts(self) -> &'static [&'static str] {
        match self {
            Variant::Demo | Variant::Basic => &[GREET_USER, EXPLAIN_MCP],
            Variant::FastMcp => &[GREET_USER],
        }
    }

    /// Name `hello` greets when given an empty one. The fastmcp server
    /// greets the empty string as-is.
    fn hello_fallback(self) -> Option<&'static str> {
        match self {
            Variant::FastMcp => None,
            _ => Some("World"),
        }
    }

    fn example_text(self) -> &'static str {
        match self {
            Variant::FastMcp => "This is an example resource from the FastMCP server!",
            _ => "This is an example resource from the MCP server!",
        }
    }

    /// Capability kinds this variant exposes, as advertised by `demo://config`.
    pub fn capability_kinds(self) -> Vec<String> {
        [
            ("tools", self.tools()),
            ("resources", self.resources()),
            ("prompts", self.prompts()),
        ]
        .into_iter()
        .filter(|(_, names)| !names.is_empty())
        .map(|(kind, _)| kind.to_string())
        .collect()
    }
}

/// Build the immutable server for `variant` with the given server info.
pub fn build_server(
    variant: Variant,
    name: &str,
    version: &str,
    instructions: Option<&str>,
) -> Result<Server, McpError> {
    let mut builder = Server::builder().server_info(name, version);
    if let Some(instructions) = instructions {
        builder = builder.instructions(instructions);
    }

    let config = ConfigDocument {
        server_name: name.to_string(),
        version: version.to_string(),
        capabilities: variant.capability_kinds(),
    };

    let builder = tools::register(
        builder,
        variant.tools(),
        &loader::parse_tools(TOOLS_JSON)?,
        variant.hello_fallback(),
    )?;
    let builder = resources::register(
        builder,
        variant.resources(),
        &loader::parse_resources(RESOURCES_JSON)?,
        variant.example_text(),
        &config,
    )?;
    let builder = prompts::register(
        builder,
        variant.prompts(),
        &loader::parse_prompts(PROMPTS_JSON)?,
    )?;

    builder.build()
}

/// Find the catalog entry keyed `key`.
fn definition<'a, T>(
    defs: &'a [T],
    key: &str,
    key_of: impl Fn(&T) -> &str,
) -> Result<&'a T, McpError> {
    defs.iter().find(|d| key_of(d) == key).ok_or_else(|| {
        McpError::Definition(format!("built-in catalog has no entry for \"{}\"", key))
    })
}
