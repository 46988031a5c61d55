use std::sync::Arc;

use crate::schema::Arguments;
use crate::server::{FnPromptHandler, PromptHandler, ServerBuilder};
use crate::types::{McpError, Prompt, PromptMessage};

pub const GREET_USER: &str = "greet_user";
pub const EXPLAIN_MCP: &str = "explain_mcp";

pub(super) fn register(
    mut builder: ServerBuilder,
    names: &[&str],
    defs: &[Prompt],
) -> Result<ServerBuilder, McpError> {
    for &name in names {
        let def = super::definition(defs, name, |p| p.name.as_str())?.clone();
        let handler: Arc<dyn PromptHandler> = match name {
            GREET_USER => {
                FnPromptHandler::new(|args: Arguments| async move { greet_user(&args) })
            }
            EXPLAIN_MCP => FnPromptHandler::new(|_args: Arguments| async move {
                Ok::<_, McpError>(explain_mcp())
            }),
            other => {
                return Err(McpError::Definition(format!(
                    "no handler for built-in prompt \"{}\"",
                    other
                )))
            }
        };
        builder = builder.prompt(def, handler);
    }
    Ok(builder)
}

pub fn greet_user(args: &Arguments) -> Result<Vec<PromptMessage>, McpError> {
    let name = match args.require_str("name")? {
        "" => "User",
        name => name,
    };
    Ok(vec![PromptMessage::user(format!(
        "Please create a friendly greeting for {}. Make it warm and welcoming!",
        name
    ))])
}

pub fn explain_mcp() -> Vec<PromptMessage> {
    vec![PromptMessage::user(
        "What is the Model Context Protocol (MCP)? Explain it in simple terms.",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ArgValue;
    use crate::types::Role;

    #[test]
    fn test_greet_user() {
        let mut args = Arguments::default();
        args.insert("name", ArgValue::String("Grace".into()));
        let messages = greet_user(&args).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            messages[0].content.text.as_deref(),
            Some("Please create a friendly greeting for Grace. Make it warm and welcoming!")
        );
    }

    #[test]
    fn test_greet_user_requires_name() {
        assert!(greet_user(&Arguments::default()).is_err());
    }
}
