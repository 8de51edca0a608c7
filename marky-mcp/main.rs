// MCP stdio 服务：暴露 convert_to_markdown 工具，stdout 只承载协议消息。
use anyhow::Result;
use marky::logging::init_tracing;
use marky::{load_config, Marky};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData as McpError, JsonObject,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const MCP_TOOL_NAME: &str = "convert_to_markdown";
const MCP_TOOL_DESCRIPTION: &str = "Convert a file to markdown format";
const MCP_INSTRUCTIONS: &str = "Convert local CSV, HTML, DOCX, XLSX, PPTX, EPUB, IPYNB and PDF files to Markdown.";
const CONSOLE_OUTPUT: &str = "console";

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(None);
    init_tracing(&config);
    let server = MarkyMcpServer::new(Arc::new(Marky::with_defaults(&config)));
    info!("marky MCP server listening on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

#[derive(Clone)]
struct MarkyMcpServer {
    marky: Arc<Marky>,
}

impl MarkyMcpServer {
    fn new(marky: Arc<Marky>) -> Self {
        Self { marky }
    }

    fn convert_tool() -> Tool {
        let schema: JsonObject = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "Path to the input file to convert to markdown"
                },
                "output": {
                    "type": "string",
                    "description": "Path to the output markdown file"
                }
            },
            "required": ["input"]
        }))
        .unwrap_or_default();
        Tool::new(
            Cow::Borrowed(MCP_TOOL_NAME),
            Cow::Borrowed(MCP_TOOL_DESCRIPTION),
            Arc::new(schema),
        )
    }

    async fn convert(&self, input: String, output: String) -> Result<String, String> {
        let marky = self.marky.clone();
        let path = PathBuf::from(&input);
        let markdown = tokio::task::spawn_blocking(move || marky.convert(&path))
            .await
            .map_err(|err| format!("Failed to convert file: {err}"))?
            .map_err(|err| format!("Failed to convert file: {err}"))?;
        if output != CONSOLE_OUTPUT {
            tokio::fs::write(&output, markdown.as_bytes())
                .await
                .map_err(|err| format!("Failed to write output file: {err}"))?;
        }
        Ok(markdown)
    }
}

impl ServerHandler for MarkyMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(MCP_INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = vec![Self::convert_tool()];
        async move {
            Ok(ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if request.name.as_ref() != MCP_TOOL_NAME {
            return Err(McpError::invalid_params("unknown tool", None));
        }
        let argument = |name: &str| {
            request
                .arguments
                .as_ref()
                .and_then(|args| args.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let Some(input) = argument("input").filter(|input| !input.trim().is_empty()) else {
            return Ok(CallToolResult::error(vec![Content::text(
                "required argument \"input\" not found",
            )]));
        };
        let output = argument("output").unwrap_or_else(|| CONSOLE_OUTPUT.to_string());
        match self.convert(input, output).await {
            Ok(markdown) => Ok(CallToolResult::success(vec![Content::text(markdown)])),
            Err(message) => {
                warn!("{message}");
                Ok(CallToolResult::error(vec![Content::text(message)]))
            }
        }
    }
}
