//! HTTP transport
//!
//! Exposes the same tools as the stdio server as plain JSON endpoints for
//! clients that cannot speak MCP. The bearer token travels in the
//! `Authorization` header instead of the arguments.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::error::{McpError, Result, TasklyMcpError, UpstreamError};
use crate::mcp::tools::{ToolHandler, ToolKind};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    tools: Arc<ToolHandler>,
    server_name: String,
    server_version: String,
}

impl AppState {
    pub fn new(
        tools: Arc<ToolHandler>,
        server_name: impl Into<String>,
        server_version: impl Into<String>,
    ) -> Self {
        Self {
            tools,
            server_name: server_name.into(),
            server_version: server_version.into(),
        }
    }
}

/// Start the HTTP server and run until Ctrl-C
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/mcp/:tool", post(call_tool))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Server information
async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tools: serde_json::Map<String, Value> = ToolKind::ALL
        .into_iter()
        .filter(|tool| *tool != ToolKind::HealthCheck)
        .map(|tool| (tool.name().to_string(), json!(format!("POST /mcp/{}", tool.name()))))
        .collect();

    Json(json!({
        "server": state.server_name,
        "version": state.server_version,
        "status": "running",
        "endpoints": {
            "health": "/health",
            "mcp_tools": tools,
        }
    }))
}

/// Health check (no authentication)
async fn health(State(state): State<Arc<AppState>>) -> Response {
    respond(state.tools.dispatch(ToolKind::HealthCheck.name(), json!({}), None).await)
}

/// Invoke a tool with the request body as its arguments
async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(tool): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    // An unparseable body still goes through authentication first and is
    // rejected by tools that take arguments.
    let args = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    respond(state.tools.dispatch(&tool, args, authorization).await)
}

fn respond(result: Result<Value>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// Error rendered as `{detail, error_code}`
pub struct ApiError(pub TasklyMcpError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TasklyMcpError::Auth(_) => StatusCode::UNAUTHORIZED,
            TasklyMcpError::Mcp(McpError::UnknownTool { .. }) => StatusCode::NOT_FOUND,
            TasklyMcpError::Mcp(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TasklyMcpError::Upstream(UpstreamError::Unavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TasklyMcpError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(self.0.to_payload());

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use jsonwebtoken::Algorithm;
    use reqwest::Url;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::dev::mint_token;
    use crate::auth::TokenVerifier;
    use crate::config::{AuthConfig, Secret, UpstreamConfig};
    use crate::error::AuthError;
    use crate::upstream::UpstreamClient;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            secret: Secret::new("http-secret"),
            algorithm: Algorithm::HS256,
            audience: "mcp://svc".to_string(),
            issuer: None,
            clock_skew_secs: 60,
        }
    }

    fn app(base_url: &str) -> Router {
        let upstream = UpstreamConfig {
            base_url: Url::parse(&format!("{}/", base_url.trim_end_matches('/'))).unwrap(),
            api_key: None,
            delegation_secret: Secret::new("upstream"),
            delegation_algorithm: Algorithm::HS256,
            timeout: Duration::from_secs(5),
        };
        let tools = ToolHandler::new(
            Arc::new(TokenVerifier::new(&auth_config())),
            Arc::new(UpstreamClient::new(&upstream).unwrap()),
        );
        create_router(AppState::new(Arc::new(tools), "MyTaskly MCP Server", "0.1.0"))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root() {
        let response = app("http://127.0.0.1:1")
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["endpoints"]["mcp_tools"]["get_tasks"], "POST /mcp/get_tasks");
    }

    #[tokio::test]
    async fn test_missing_auth_is_401() {
        let response = app("http://127.0.0.1:1")
            .oneshot(Request::post("/mcp/get_tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "MISSING_AUTH");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_404() {
        let response = app("http://127.0.0.1:1")
            .oneshot(Request::post("/mcp/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error_code"], "UNKNOWN_TOOL");
    }

    #[tokio::test]
    async fn test_get_tasks_with_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"task_id": 1, "title": "Pizza", "priority": "Alta", "category": "Cibo"}
            ])))
            .mount(&server)
            .await;

        let token = mint_token(&auth_config(), "1", chrono::Duration::minutes(5), &[]).unwrap();
        let request = Request::post("/mcp/get_tasks")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app(&server.uri()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["type"], "task_list");
        assert_eq!(body["tasks"][0]["categoryColor"], "#EF4444");
    }

    #[tokio::test]
    async fn test_health_without_upstream() {
        let response = app("http://127.0.0.1:1")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["fastapi_server"], "unhealthy");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TasklyMcpError::from(AuthError::Expired), StatusCode::UNAUTHORIZED),
            (
                McpError::InvalidArguments { message: "x".into() }.into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                UpstreamError::Unavailable { message: "down".into() }.into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                UpstreamError::Status { status: 500, body: String::new() }.into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError(error).status(), status);
        }
    }
}
