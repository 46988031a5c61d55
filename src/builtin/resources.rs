use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::server::{ResourceHandler, ServerBuilder};
use crate::types::{McpError, Resource, ResourceContent};

pub const EXAMPLE_URI: &str = "demo://example";
pub const CONFIG_URI: &str = "demo://config";

/// Body of the `demo://config` resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub server_name: String,
    pub version: String,
    pub capabilities: Vec<String>,
}

/// A resource whose content is fixed when the registry is built.
struct StaticText {
    mime_type: String,
    text: String,
}

#[async_trait]
impl ResourceHandler for StaticText {
    async fn call(&self, uri: &str) -> Result<ResourceContent, McpError> {
        Ok(ResourceContent::text(uri, &self.mime_type, &self.text))
    }
}

pub(super) fn register(
    mut builder: ServerBuilder,
    uris: &[&str],
    defs: &[Resource],
    example_text: &str,
    config: &ConfigDocument,
) -> Result<ServerBuilder, McpError> {
    for &uri in uris {
        let def = super::definition(defs, uri, |r| r.uri.as_str())?.clone();
        let text = match uri {
            EXAMPLE_URI => example_text.to_string(),
            CONFIG_URI => serde_json::to_string_pretty(config)?,
            other => {
                return Err(McpError::Definition(format!(
                    "no handler for built-in resource \"{}\"",
                    other
                )))
            }
        };
        let handler = Arc::new(StaticText {
            mime_type: def.mime_type.clone(),
            text,
        });
        builder = builder.resource(def, handler);
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_document_shape() {
        let doc = ConfigDocument {
            server_name: "srv".into(),
            version: "1.2.3".into(),
            capabilities: vec!["tools".into()],
        };
        let text = serde_json::to_string_pretty(&doc).unwrap();
        assert_eq!(
            text,
            "{\n  \"serverName\": \"srv\",\n  \"version\": \"1.2.3\",\n  \"capabilities\": [\n    \"tools\"\n  ]\n}"
        );
    }

    #[tokio::test]
    async fn test_static_text_echoes_uri() {
        let handler = StaticText {
            mime_type: "text/plain".into(),
            text: "hi".into(),
        };
        let content = handler.call(EXAMPLE_URI).await.unwrap();
        assert_eq!(content.uri, EXAMPLE_URI);
        assert_eq!(content.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(content.text.as_deref(), Some("hi"));
    }
}
