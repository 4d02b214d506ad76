//! Error types for the MyTaskly MCP Server
//!
//! Every failure a caller can observe maps to a stable error code through
//! [`TasklyMcpError::code`]. Transports render those codes; nothing is allowed
//! to escape as an unhandled fault.

use serde_json::{json, Value};
use thiserror::Error;

/// Main error type for the MyTaskly MCP Server
#[derive(Error, Debug)]
pub enum TasklyMcpError {
    /// Token or Authorization header rejected
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Upstream MyTaskly API errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol and tool dispatch errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TasklyMcpError {
    /// Stable, caller-visible error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.code(),
            Self::Upstream(e) => e.code(),
            Self::Mcp(e) => e.code(),
            Self::Config(_) | Self::Io(_) | Self::Json(_) => "INTERNAL_ERROR",
        }
    }

    /// Structured payload returned to tool callers
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "error_code": self.code(),
            "detail": self.to_string(),
        });
        if let Self::Upstream(UpstreamError::Status { status, .. }) = self {
            payload["upstream_status"] = json!(status);
        }
        payload
    }
}

/// Reasons a call is rejected before the tool body runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header (expected 'Bearer <token>')")]
    MissingAuth,

    #[error("Malformed token: {message}")]
    Malformed { message: String },

    #[error("Token signature verification failed")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token audience does not match this service")]
    WrongAudience,

    #[error("Token issuer is not trusted")]
    WrongIssuer,

    #[error("Token has no subject")]
    MissingSubject,
}

impl AuthError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAuth => "MISSING_AUTH",
            Self::Malformed { .. } => "MALFORMED",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::Expired => "EXPIRED",
            Self::WrongAudience => "WRONG_AUDIENCE",
            Self::WrongIssuer => "WRONG_ISSUER",
            Self::MissingSubject => "MISSING_SUBJECT",
        }
    }
}

/// Convert `jsonwebtoken` decode failures into rejection reasons.
///
/// Only signature and pinned-algorithm failures count as `BadSignature`;
/// every structural failure is `Malformed`.
impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
            _ => AuthError::malformed(err.to_string()),
        }
    }
}

/// MyTaskly API errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("MyTaskly API unavailable: {message}")]
    Unavailable { message: String },

    #[error("MyTaskly API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from MyTaskly API: {message}")]
    InvalidResponse { message: String },

    #[error("Failed to build upstream request: {message}")]
    Request { message: String },
}

impl UpstreamError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "UPSTREAM_UNAVAILABLE",
            Self::Status { .. } | Self::InvalidResponse { .. } | Self::Request { .. } => {
                "UPSTREAM_ERROR"
            }
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Development tokens are disabled in the {environment} environment")]
    DevTokensDisabled { environment: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

impl McpError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTool { .. } => "UNKNOWN_TOOL",
            Self::InvalidArguments { .. } => "INVALID_ARGUMENTS",
        }
    }
}

/// Result type alias for MyTaskly MCP operations
pub type Result<T> = std::result::Result<T, TasklyMcpError>;
