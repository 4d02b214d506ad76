//! MCP Tool definitions and handlers
//!
//! Defines the four MyTaskly tools and the dispatcher that gates them. Tools
//! declared [`Access::Authenticated`] only run after the bearer token has been
//! verified, and they receive the caller id from the resulting [`Identity`],
//! never from their arguments.

use std::sync::Arc;

use schemars::JsonSchema;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::{extract_bearer, Identity, TokenVerifier};
use crate::config::Config;
use crate::error::{AuthError, McpError, Result};
use crate::format::format_tasks_for_ui;
use crate::mcp::types::{CallToolResult, Tool};
use crate::upstream::types::NoteDraft;
use crate::upstream::UpstreamClient;

/// Whether a tool requires a verified caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

/// The tools this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    GetTasks,
    GetCategories,
    CreateNote,
    HealthCheck,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::GetTasks,
        ToolKind::GetCategories,
        ToolKind::CreateNote,
        ToolKind::HealthCheck,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetTasks => "get_tasks",
            ToolKind::GetCategories => "get_categories",
            ToolKind::CreateNote => "create_note",
            ToolKind::HealthCheck => "health_check",
        }
    }

    pub fn access(self) -> Access {
        match self {
            ToolKind::HealthCheck => Access::Public,
            _ => Access::Authenticated,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ToolKind::GetTasks => {
                "Get all tasks for the authenticated user, formatted for the mobile UI \
                 with column definitions, summary statistics and a voice summary"
            }
            ToolKind::GetCategories => "Get all task categories for the authenticated user",
            ToolKind::CreateNote => "Create a new post-it style note for the authenticated user",
            ToolKind::HealthCheck => {
                "Check health of the MCP server and the MyTaskly API (no authentication required)"
            }
        }
    }

    fn input_schema(self) -> Value {
        match self {
            ToolKind::CreateNote => input_schema::<NoteDraft>(self.access()),
            _ => input_schema::<NoArguments>(self.access()),
        }
    }
}

/// Tool handler
pub struct ToolHandler {
    verifier: Arc<TokenVerifier>,
    upstream: Arc<UpstreamClient>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(verifier: Arc<TokenVerifier>, upstream: Arc<UpstreamClient>) -> Self {
        Self { verifier, upstream }
    }

    /// Build the verifier and upstream client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(TokenVerifier::new(&config.auth)),
            Arc::new(UpstreamClient::new(&config.upstream)?),
        ))
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        ToolKind::ALL
            .into_iter()
            .map(|tool| Tool {
                name: tool.name().to_string(),
                description: Some(tool.description().to_string()),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Call a tool over MCP, where the bearer value travels as the
    /// `authorization` argument
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let authorization = args
            .get("authorization")
            .and_then(Value::as_str)
            .map(str::to_string);

        match self.dispatch(name, args, authorization.as_deref()).await {
            Ok(value) => CallToolResult::json(value),
            Err(e) => CallToolResult::error(e.to_payload()),
        }
    }

    /// Authenticate if required, then run the tool
    pub async fn dispatch(&self, name: &str, args: Value, authorization: Option<&str>) -> Result<Value> {
        let tool = ToolKind::from_name(name).ok_or_else(|| McpError::UnknownTool {
            name: name.to_string(),
        })?;

        let identity = match tool.access() {
            Access::Public => None,
            Access::Authenticated => Some(self.authenticate(tool, authorization)?),
        };

        let result = match (tool, identity.as_ref()) {
            (ToolKind::HealthCheck, _) => self.handle_health_check().await,
            (ToolKind::GetTasks, Some(identity)) => self.handle_get_tasks(identity).await,
            (ToolKind::GetCategories, Some(identity)) => self.handle_get_categories(identity).await,
            (ToolKind::CreateNote, Some(identity)) => self.handle_create_note(identity, args).await,
            (_, None) => Err(AuthError::MissingAuth.into()),
        };

        if let Err(e) = &result {
            tracing::warn!(tool = tool.name(), code = e.code(), "tool call failed");
        }
        result
    }

    fn authenticate(&self, tool: ToolKind, authorization: Option<&str>) -> Result<Identity> {
        let verified = extract_bearer(authorization).and_then(|token| self.verifier.verify(token));
        match verified {
            Ok(identity) => {
                tracing::debug!(tool = tool.name(), "caller authenticated");
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(tool = tool.name(), reason = e.code(), "authentication failed");
                Err(e.into())
            }
        }
    }

    // ==================== Tool Handlers ====================

    async fn handle_get_tasks(&self, identity: &Identity) -> Result<Value> {
        let tasks = self.upstream.get_tasks(identity).await?;
        Ok(serde_json::to_value(format_tasks_for_ui(&tasks))?)
    }

    async fn handle_get_categories(&self, identity: &Identity) -> Result<Value> {
        let categories = self.upstream.get_categories(identity).await?;
        Ok(json!({
            "total": categories.len(),
            "categories": categories,
        }))
    }

    async fn handle_create_note(&self, identity: &Identity, args: Value) -> Result<Value> {
        let draft: NoteDraft = serde_json::from_value(args).map_err(|e| McpError::InvalidArguments {
            message: e.to_string(),
        })?;
        draft.validate().map_err(|e| McpError::InvalidArguments {
            message: e.to_string(),
        })?;

        let note = self.upstream.create_note(identity, &draft).await?;
        Ok(serde_json::to_value(note)?)
    }

    async fn handle_health_check(&self) -> Result<Value> {
        let health = self.upstream.health_check().await;
        Ok(json!({
            "mcp_server": "healthy",
            "fastapi_server": health.status(),
            "fastapi_url": self.upstream.base_url().as_str().trim_end_matches('/'),
            "fastapi_details": health,
        }))
    }
}

// ==================== Schema Definitions ====================

#[derive(JsonSchema)]
#[allow(dead_code)]
struct NoArguments {}

/// Input schema generated from the argument type; authenticated tools also
/// take a required `authorization` string
fn input_schema<T: JsonSchema>(access: Access) -> Value {
    let mut schema =
        serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({}));

    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
        object.insert("type".to_string(), json!("object"));
        object
            .entry("properties")
            .or_insert_with(|| json!({}));

        if access == Access::Authenticated {
            if let Some(properties) = object.get_mut("properties").and_then(Value::as_object_mut) {
                properties.insert(
                    "authorization".to_string(),
                    json!({
                        "type": "string",
                        "description": "JWT bearer token in the form \"Bearer <token>\""
                    }),
                );
            }

            let required = object.entry("required").or_insert_with(|| json!([]));
            if let Some(required) = required.as_array_mut() {
                required.insert(0, json!("authorization"));
            }
        }
    }

    schema
}
