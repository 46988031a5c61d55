//! Command-line and environment configuration.

use clap::{Parser, ValueEnum};

use crate::builtin::{self, Variant};
use crate::server::Server;
use crate::types::McpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Demo MCP server over stdio.
#[derive(Debug, Clone, Parser)]
#[command(name = "mcpdemo")]
#[command(about = "Demo Model Context Protocol servers over stdio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Config {
    /// Which demo server to run
    #[arg(long, value_enum, env = "MCP_VARIANT", default_value_t = Variant::Basic)]
    pub variant: Variant,

    /// Server name reported in serverInfo (defaults per variant)
    #[arg(long, env = "MCP_SERVER_NAME")]
    pub name: Option<String>,

    /// Server version reported in serverInfo (defaults per variant)
    #[arg(long = "server-version", env = "MCP_SERVER_VERSION")]
    pub server_version: Option<String>,

    /// Instructions returned from initialize
    #[arg(long, env = "MCP_INSTRUCTIONS")]
    pub instructions: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (always written to stderr)
    #[arg(long, value_enum, env = "MCP_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn server_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.variant.default_name())
    }

    pub fn server_version(&self) -> &str {
        self.server_version
            .as_deref()
            .unwrap_or(self.variant.default_version())
    }

    pub fn validate(&self) -> Result<(), McpError> {
        if self.server_name().trim().is_empty() {
            return Err(McpError::Config("server name must not be empty".into()));
        }
        if self.server_version().trim().is_empty() {
            return Err(McpError::Config("server version must not be empty".into()));
        }
        if self.log_level.trim().is_empty() {
            return Err(McpError::Config("log level must not be empty".into()));
        }
        Ok(())
    }

    /// Validate and build the server this configuration describes.
    pub fn build_server(&self) -> Result<Server, McpError> {
        self.validate()?;
        builtin::build_server(
            self.variant,
            self.server_name(),
            self.server_version(),
            self.instructions.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("mcpdemo").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.variant, Variant::Basic);
        assert_eq!(config.server_name(), "basic-mcp-server");
        assert_eq!(config.server_version(), "0.1.0");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.instructions.is_none());
    }

    #[test]
    fn test_variant_and_overrides() {
        let config = parse(&[
            "--variant",
            "fastmcp",
            "--name",
            "mine",
            "--server-version",
            "2.0.0",
            "--log-format",
            "json",
        ]);
        assert_eq!(config.variant, Variant::FastMcp);
        assert_eq!(config.server_name(), "mine");
        assert_eq!(config.server_version(), "2.0.0");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        assert!(Config::try_parse_from(["mcpdemo", "--variant", "weather"]).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let config = parse(&["--name", " "]);
        assert!(matches!(config.validate(), Err(McpError::Config(_))));
        assert!(config.build_server().is_err());
    }

    #[test]
    fn test_build_server_uses_config() {
        let config = parse(&["--variant", "demo", "--instructions", "be nice"]);
        let server = config.build_server().unwrap();
        assert_eq!(server.info().name, "fast-mcp-demo");
        assert_eq!(server.list_tools().count(), 1);
    }
}
