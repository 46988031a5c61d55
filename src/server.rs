use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::{to_raw_value, RawValue};
use serde_json::{json, Map, Value};

use crate::registry::Registry;
use crate::schema::Arguments;
use crate::types::*;

/// Handler trait for MCP tools. Implement this or use [`FnToolHandler`].
///
/// Arguments arrive already validated against the tool's input schema.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Arguments) -> Result<ToolResult, McpError>;
}

/// Handler trait for MCP resources.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn call(&self, uri: &str) -> Result<ResourceContent, McpError>;
}

/// Handler trait for MCP prompts. Returns the rendered messages.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn call(&self, args: Arguments) -> Result<Vec<PromptMessage>, McpError>;
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    async fn call(&self, args: Arguments) -> Result<ToolResult, McpError> {
        (self.f)(args).await
    }
}

/// Wraps an async closure into a PromptHandler.
pub struct FnPromptHandler<F> {
    f: F,
}

impl<F, Fut> FnPromptHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Vec<PromptMessage>, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn PromptHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> PromptHandler for FnPromptHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Vec<PromptMessage>, McpError>> + Send + 'static,
{
    async fn call(&self, args: Arguments) -> Result<Vec<PromptMessage>, McpError> {
        (self.f)(args).await
    }
}

struct ToolEntry {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

struct ResourceEntry {
    resource: Resource,
    handler: Arc<dyn ResourceHandler>,
}

struct PromptEntry {
    prompt: Prompt,
    handler: Arc<dyn PromptHandler>,
}

/// `*/list` results, serialized once at build time.
struct CachedLists {
    tools: Arc<RawValue>,
    resources: Arc<RawValue>,
    prompts: Arc<RawValue>,
}

/// The MCP server: an immutable capability table plus the dispatcher over it.
///
/// Build with [`ServerBuilder`]. Nothing about a `Server` changes after
/// `build()`, so it can be shared behind an `Arc` across concurrent requests.
pub struct Server {
    info: Implementation,
    instructions: Option<String>,
    tools: Registry<ToolEntry>,
    resources: Registry<ResourceEntry>,
    prompts: Registry<PromptEntry>,
    cached: CachedLists,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn info(&self) -> &Implementation {
        &self.info
    }

    // ── Typed dispatch ──

    /// All tools, in registration order.
    pub fn list_tools(&self) -> impl Iterator<Item = &Tool> + '_ {
        self.tools.iter().map(|e| &e.tool)
    }

    /// All resources, in registration order.
    pub fn list_resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.resources.iter().map(|e| &e.resource)
    }

    /// All prompts, in registration order.
    pub fn list_prompts(&self) -> impl Iterator<Item = &Prompt> + '_ {
        self.prompts.iter().map(|e| &e.prompt)
    }

    /// Look up, validate and run a tool. Handler errors are returned unchanged.
    pub async fn call_tool(&self, name: &str, args: &Value) -> Result<ToolResult, McpError> {
        let entry = self.tools.lookup(name)?;
        let args = entry.tool.validate_arguments(args)?;
        tracing::debug!(tool = %name, "calling tool");
        entry.handler.call(args).await
    }

    /// Load the resource registered under `uri`.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContent, McpError> {
        let entry = self.resources.lookup(uri)?;
        tracing::debug!(uri = %uri, "reading resource");
        entry.handler.call(&entry.resource.uri).await
    }

    /// Validate arguments for the prompt `name` and render it.
    pub async fn get_prompt(&self, name: &str, args: &Value) -> Result<GetPromptResult, McpError> {
        let entry = self.prompts.lookup(name)?;
        let args = entry.prompt.validate_arguments(args)?;
        tracing::debug!(prompt = %name, "rendering prompt");
        let messages = entry.handler.call(args).await?;
        Ok(GetPromptResult {
            description: Some(entry.prompt.description.clone()),
            messages,
        })
    }

    // ── JSON-RPC routing ──

    /// Route a JSON-RPC request to the appropriate MCP handler.
    ///
    /// Every failure is reported in the returned response; nothing here
    /// panics or affects later requests.
    pub async fn handle(&self, req: JsonRpcRequest) -> McpResponse {
        if req.is_notification() {
            tracing::debug!(method = %req.method, "notification");
            return McpResponse::notification();
        }

        if req.jsonrpc != "2.0" {
            return McpResponse::error(req.id, ERR_CODE_INVALID_REQ, "jsonrpc must be '2.0'");
        }

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "ping" => McpResponse::ok(req.id, json!({})),
            "tools/list" => McpResponse::cached(req.id, &self.cached.tools),
            "tools/call" => self.handle_tools_call(req).await,
            "resources/list" => McpResponse::cached(req.id, &self.cached.resources),
            "resources/read" => self.handle_resources_read(req).await,
            "prompts/list" => McpResponse::cached(req.id, &self.cached.prompts),
            "prompts/get" => self.handle_prompts_get(req).await,
            _ => McpResponse::error(
                req.id,
                ERR_CODE_NO_METHOD,
                format!("Method not found: {}", req.method),
            ),
        }
    }

    fn handle_initialize(&self, req: JsonRpcRequest) -> McpResponse {
        let params: InitializeParams = req
            .params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        let client_name = params.client_info.as_ref().map_or("", |c| c.name.as_str());
        let client_version = params.client_info.as_ref().map_or("", |c| c.version.as_str());
        let protocol_version = negotiate_version(params.protocol_version.as_deref());
        tracing::info!(
            client_name,
            client_version,
            requested = ?params.protocol_version,
            protocol_version,
            "initialize"
        );

        let mut capabilities = Map::new();
        if !self.tools.is_empty() {
            capabilities.insert("tools".into(), json!({"listChanged": false}));
        }
        if !self.resources.is_empty() {
            capabilities.insert(
                "resources".into(),
                json!({"subscribe": false, "listChanged": false}),
            );
        }
        if !self.prompts.is_empty() {
            capabilities.insert("prompts".into(), json!({"listChanged": false}));
        }

        let mut result = json!({
            "protocolVersion": protocol_version,
            "capabilities": capabilities,
            "serverInfo": self.info,
        });
        if let Some(instructions) = &self.instructions {
            result["instructions"] = json!(instructions);
        }

        McpResponse::ok(req.id, result)
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest) -> McpResponse {
        let params: ToolCallParams = match parse_params(req.params) {
            Ok(p) => p,
            Err(msg) => return McpResponse::error(req.id, ERR_CODE_BAD_PARAMS, msg),
        };

        match self.call_tool(&params.name, &params.arguments).await {
            Ok(result) => ok_json(req.id, &result),
            // Domain failures are a completed call that reports an error.
            Err(McpError::Domain(msg)) => {
                tracing::warn!(tool = %params.name, error = %msg, "tool failed");
                ok_json(req.id, &error_result(msg))
            }
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tools/call rejected");
                McpResponse::error(req.id, e.rpc_code(), e.to_string())
            }
        }
    }

    async fn handle_resources_read(&self, req: JsonRpcRequest) -> McpResponse {
        let params: ResourceReadParams = match parse_params(req.params) {
            Ok(p) => p,
            Err(msg) => return McpResponse::error(req.id, ERR_CODE_BAD_PARAMS, msg),
        };

        match self.read_resource(&params.uri).await {
            Ok(content) => McpResponse::ok(req.id, json!({ "contents": [content] })),
            Err(e) => {
                tracing::warn!(uri = %params.uri, error = %e, "resources/read failed");
                McpResponse::error(req.id, e.rpc_code(), e.to_string())
            }
        }
    }

    async fn handle_prompts_get(&self, req: JsonRpcRequest) -> McpResponse {
        let params: PromptGetParams = match parse_params(req.params) {
            Ok(p) => p,
            Err(msg) => return McpResponse::error(req.id, ERR_CODE_BAD_PARAMS, msg),
        };

        match self.get_prompt(&params.name, &params.arguments).await {
            Ok(result) => ok_json(req.id, &result),
            Err(e) => {
                tracing::warn!(prompt = %params.name, error = %e, "prompts/get failed");
                McpResponse::error(req.id, e.rpc_code(), e.to_string())
            }
        }
    }
}

/// Pick the protocol version to answer `initialize` with: the client's
/// request if supported, the latest version otherwise.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == r))
        .copied()
        .unwrap_or(PROTOCOL_VERSION)
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    match params {
        Some(p) => serde_json::from_value(p).map_err(|e| format!("invalid params: {}", e)),
        None => Err("params required".into()),
    }
}

fn ok_json<T: Serialize>(id: Option<Value>, result: &T) -> McpResponse {
    match serde_json::to_value(result) {
        Ok(value) => McpResponse::ok(id, value),
        Err(e) => McpResponse::error(id, ERR_CODE_INTERNAL, format!("serialize result: {}", e)),
    }
}

#[derive(Serialize)]
struct ToolsList<'a> {
    tools: Vec<&'a Tool>,
}

#[derive(Serialize)]
struct ResourcesList<'a> {
    resources: Vec<&'a Resource>,
}

#[derive(Serialize)]
struct PromptsList<'a> {
    prompts: Vec<&'a Prompt>,
}

/// Builder for constructing an MCP Server.
///
/// Each capability is registered together with its handler, so a definition
/// can never exist without something to run.
#[derive(Default)]
pub struct ServerBuilder {
    server_name: Option<String>,
    server_version: Option<String>,
    instructions: Option<String>,
    tools: Vec<(Tool, Arc<dyn ToolHandler>)>,
    resources: Vec<(Resource, Arc<dyn ResourceHandler>)>,
    prompts: Vec<(Prompt, Arc<dyn PromptHandler>)>,
}

impl ServerBuilder {
    /// Set server name and version.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.server_version = Some(version.into());
        self
    }

    /// Instructions returned to the client from `initialize`.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Register a tool and its handler.
    pub fn tool(mut self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push((tool, handler));
        self
    }

    /// Register a resource and its handler.
    pub fn resource(mut self, resource: Resource, handler: Arc<dyn ResourceHandler>) -> Self {
        self.resources.push((resource, handler));
        self
    }

    /// Register a prompt and its handler.
    pub fn prompt(mut self, prompt: Prompt, handler: Arc<dyn PromptHandler>) -> Self {
        self.prompts.push((prompt, handler));
        self
    }

    /// Build the server. Fails if a name (or URI) is registered twice.
    pub fn build(self) -> Result<Server, McpError> {
        let mut tools = Registry::new(CapabilityKind::Tool);
        for (tool, handler) in self.tools {
            tools.insert(tool.name.clone(), ToolEntry { tool, handler })?;
        }

        let mut resources = Registry::new(CapabilityKind::Resource);
        for (resource, handler) in self.resources {
            resources.insert(resource.uri.clone(), ResourceEntry { resource, handler })?;
        }

        let mut prompts = Registry::new(CapabilityKind::Prompt);
        for (prompt, handler) in self.prompts {
            prompts.insert(prompt.name.clone(), PromptEntry { prompt, handler })?;
        }

        let cached = CachedLists {
            tools: raw(&ToolsList {
                tools: tools.iter().map(|e| &e.tool).collect(),
            })?,
            resources: raw(&ResourcesList {
                resources: resources.iter().map(|e| &e.resource).collect(),
            })?,
            prompts: raw(&PromptsList {
                prompts: prompts.iter().map(|e| &e.prompt).collect(),
            })?,
        };

        let info = Implementation {
            name: self.server_name.unwrap_or_else(|| "mcpdemo".into()),
            version: self
                .server_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").into()),
        };

        tracing::debug!(
            tools = tools.len(),
            resources = resources.len(),
            prompts = prompts.len(),
            "capability registry built"
        );

        Ok(Server {
            info,
            instructions: self.instructions,
            tools,
            resources,
            prompts,
            cached,
        })
    }
}

fn raw<T: Serialize>(value: &T) -> Result<Arc<RawValue>, McpError> {
    Ok(Arc::from(to_raw_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{parse_prompts, parse_resources, parse_tools};
    use crate::schema::{FieldType, InputSchema};

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, args: Arguments) -> Result<ToolResult, McpError> {
            let msg = args.require_str("msg")?;
            if msg == "boom" {
                return Err(McpError::domain("echo refused"));
            }
            Ok(text_result(format!("echo: {}", msg)))
        }
    }

    struct FileHandler;

    #[async_trait]
    impl ResourceHandler for FileHandler {
        async fn call(&self, uri: &str) -> Result<ResourceContent, McpError> {
            Ok(ResourceContent::text(uri, "text/csv", "a,b\n1,2"))
        }
    }

    struct BrokenHandler;

    #[async_trait]
    impl ResourceHandler for BrokenHandler {
        async fn call(&self, _uri: &str) -> Result<ResourceContent, McpError> {
            Err(McpError::domain("backend unavailable"))
        }
    }

    fn test_server() -> Server {
        let tools = parse_tools(
            br#"[
            {"name":"echo","description":"echoes","inputSchema":{"type":"object","properties":{"msg":{"type":"string"}},"required":["msg"]}}
        ]"#,
        )
        .unwrap();
        let resources = parse_resources(
            br#"[
            {"uri":"file:///test.csv","name":"test","description":"test resource","mimeType":"text/csv"},
            {"uri":"file:///broken","name":"broken","description":"always fails","mimeType":"text/plain"}
        ]"#,
        )
        .unwrap();
        let prompts = parse_prompts(
            br#"[{"name":"greet","description":"greets","arguments":[{"name":"who","required":true}]}]"#,
        )
        .unwrap();

        let mut tools = tools.into_iter();
        let mut resources = resources.into_iter();
        Server::builder()
            .server_info("test-server", "0.1.0")
            .tool(tools.next().unwrap(), Arc::new(EchoHandler))
            .resource(resources.next().unwrap(), Arc::new(FileHandler))
            .resource(resources.next().unwrap(), Arc::new(BrokenHandler))
            .prompt(
                prompts.into_iter().next().unwrap(),
                FnPromptHandler::new(|args: Arguments| async move {
                    let who = args.require_str("who")?;
                    Ok::<_, McpError>(vec![PromptMessage::user(format!("Say hi to {}", who))])
                }),
            )
            .build()
            .unwrap()
    }

    fn make_req(method: &str, id: Option<Value>, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }

    async fn rpc(srv: &Server, method: &str, params: Option<Value>) -> JsonRpcResponse {
        srv.handle(make_req(method, Some(json!(1)), params))
            .await
            .into_json_rpc()
    }

    #[tokio::test]
    async fn test_bad_jsonrpc_version() {
        let srv = test_server();
        let req = JsonRpcRequest {
            jsonrpc: "1.0".into(),
            id: Some(json!(1)),
            method: "ping".into(),
            params: None,
        };
        let resp = srv.handle(req).await.into_json_rpc();
        assert_eq!(resp.error.unwrap().code, ERR_CODE_INVALID_REQ);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let srv = test_server();
        let resp = rpc(&srv, "unknown/method", None).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_NO_METHOD);
    }

    #[tokio::test]
    async fn test_initialize() {
        let srv = test_server();
        let params = json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "0.1"}
        });
        let resp = rpc(&srv, "initialize", Some(params)).await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["serverInfo"]["version"], "0.1.0");
        assert!(result["capabilities"].get("tools").is_some());
        assert!(result["capabilities"].get("prompts").is_some());
        assert!(result.get("instructions").is_none());
    }

    #[tokio::test]
    async fn test_initialize_without_params_uses_latest_version() {
        let srv = test_server();
        let resp = rpc(&srv, "initialize", None).await;
        assert_eq!(resp.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_initialize_omits_empty_capabilities() {
        let srv = Server::builder()
            .instructions("nothing to see")
            .build()
            .unwrap();
        let result = rpc(&srv, "initialize", None).await.result.unwrap();
        assert_eq!(result["capabilities"], json!({}));
        assert_eq!(result["instructions"], "nothing to see");
        assert_eq!(result["serverInfo"]["name"], "mcpdemo");
    }

    #[test]
    fn test_negotiate_version() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("1999-01-01")), PROTOCOL_VERSION);
        assert_eq!(negotiate_version(None), PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_ping() {
        let srv = test_server();
        let resp = rpc(&srv, "ping", None).await;
        assert_eq!(resp.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_notifications_return_sentinel() {
        let srv = test_server();
        let resp = srv
            .handle(make_req("notifications/initialized", None, None))
            .await;
        assert!(resp.is_notification());

        // Requests without an id are notifications even for known methods.
        let resp = srv.handle(make_req("tools/list", None, None)).await;
        assert!(resp.is_notification());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let srv = test_server();
        let result = rpc(&srv, "tools/list", None).await.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["msg"]));
    }

    #[tokio::test]
    async fn test_tools_list_is_stable() {
        let srv = test_server();
        let first = rpc(&srv, "tools/list", None).await.result;
        let _ = rpc(&srv, "tools/call", Some(json!({"name": "nope"}))).await;
        let second = rpc(&srv, "tools/list", None).await.result;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let srv = test_server();
        let params = json!({"name": "echo", "arguments": {"msg": "hello"}});
        let resp = rpc(&srv, "tools/call", Some(params)).await;
        let result: ToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.content[0].text.as_deref(), Some("echo: hello"));
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_tools_call_missing_required() {
        let srv = test_server();
        let params = json!({"name": "echo", "arguments": {}});
        let resp = rpc(&srv, "tools/call", Some(params)).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, ERR_CODE_BAD_PARAMS);
        assert!(err.message.contains("missing required field"));
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let srv = test_server();
        let params = json!({"name": "nonexistent", "arguments": {}});
        let resp = rpc(&srv, "tools/call", Some(params)).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, ERR_CODE_BAD_PARAMS);
        assert_eq!(err.message, "Unknown tool: nonexistent");
    }

    #[tokio::test]
    async fn test_tools_call_domain_error_is_error_result() {
        let srv = test_server();
        let params = json!({"name": "echo", "arguments": {"msg": "boom"}});
        let resp = rpc(&srv, "tools/call", Some(params)).await;
        assert!(resp.error.is_none());
        let result: ToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error);
        assert_eq!(result.content[0].text.as_deref(), Some("echo refused"));
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let srv = test_server();
        let resp = rpc(&srv, "tools/call", None).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_BAD_PARAMS);
    }

    #[tokio::test]
    async fn test_call_tool_typed() {
        let srv = test_server();
        let err = srv.call_tool("echo", &json!({"msg": "boom"})).await.unwrap_err();
        assert!(matches!(err, McpError::Domain(_)));
        let err = srv.call_tool("missing", &json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::NotFound { kind: CapabilityKind::Tool, .. }));
        let ok = srv.call_tool("echo", &json!({"msg": "x"})).await.unwrap();
        assert_eq!(ok.content[0].text.as_deref(), Some("echo: x"));
    }

    #[tokio::test]
    async fn test_resources_list() {
        let srv = test_server();
        let result = rpc(&srv, "resources/list", None).await.result.unwrap();
        let resources = result["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0]["uri"], "file:///test.csv");
        assert_eq!(resources[0]["mimeType"], "text/csv");
        assert_eq!(resources[1]["name"], "broken");
    }

    #[tokio::test]
    async fn test_resources_read() {
        let srv = test_server();
        let params = json!({"uri": "file:///test.csv"});
        let result = rpc(&srv, "resources/read", Some(params)).await.result.unwrap();
        let contents = result["contents"].as_array().unwrap();
        assert_eq!(contents[0]["uri"], "file:///test.csv");
        assert_eq!(contents[0]["text"], "a,b\n1,2");
    }

    #[tokio::test]
    async fn test_resources_read_not_found() {
        let srv = test_server();
        let params = json!({"uri": "file:///nope"});
        let resp = rpc(&srv, "resources/read", Some(params)).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resources_read_handler_error() {
        let srv = test_server();
        let params = json!({"uri": "file:///broken"});
        let resp = rpc(&srv, "resources/read", Some(params)).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, ERR_CODE_INTERNAL);
        assert_eq!(err.message, "backend unavailable");
    }

    #[tokio::test]
    async fn test_resources_read_missing_params() {
        let srv = test_server();
        let resp = rpc(&srv, "resources/read", Some(json!({}))).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_BAD_PARAMS);
    }

    #[tokio::test]
    async fn test_prompts_list_and_get() {
        let srv = test_server();
        let result = rpc(&srv, "prompts/list", None).await.result.unwrap();
        assert_eq!(result["prompts"][0]["name"], "greet");
        assert_eq!(result["prompts"][0]["arguments"][0]["required"], true);

        let params = json!({"name": "greet", "arguments": {"who": "Ada"}});
        let result = rpc(&srv, "prompts/get", Some(params)).await.result.unwrap();
        assert_eq!(result["description"], "greets");
        assert_eq!(result["messages"][0]["role"], "user");
        assert_eq!(result["messages"][0]["content"]["text"], "Say hi to Ada");
    }

    #[tokio::test]
    async fn test_prompts_get_errors() {
        let srv = test_server();
        let resp = rpc(&srv, "prompts/get", Some(json!({"name": "greet"}))).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_BAD_PARAMS);

        let resp = rpc(&srv, "prompts/get", Some(json!({"name": "missing"}))).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, ERR_CODE_BAD_PARAMS);
        assert_eq!(err.message, "Unknown prompt: missing");
    }

    #[test]
    fn test_build_rejects_duplicate_tool() {
        let tool = Tool {
            name: "dup".into(),
            description: "d".into(),
            input_schema: InputSchema::new().optional("x", FieldType::String, ""),
        };
        let result = Server::builder()
            .tool(tool.clone(), Arc::new(EchoHandler))
            .tool(tool, Arc::new(EchoHandler))
            .build();
        assert!(matches!(
            result,
            Err(McpError::Duplicate { kind: CapabilityKind::Tool, .. })
        ));
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mk = |name: &str| Tool {
            name: name.into(),
            description: String::new(),
            input_schema: InputSchema::new(),
        };
        let srv = Server::builder()
            .tool(mk("zulu"), Arc::new(EchoHandler))
            .tool(mk("alpha"), Arc::new(EchoHandler))
            .tool(mk("mike"), Arc::new(EchoHandler))
            .build()
            .unwrap();
        let names: Vec<&str> = srv.list_tools().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["zulu", "alpha", "mike"]);
    }
}
