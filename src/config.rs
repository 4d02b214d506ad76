//! Configuration management for the MyTaskly MCP Server
//!
//! Configuration is read once at process start into an immutable [`Config`]
//! and handed to the verifier and upstream client explicitly.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use reqwest::Url;

use crate::error::{ConfigError, Result};

/// Default MyTaskly API location
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default server name reported in `initialize`
pub const DEFAULT_SERVER_NAME: &str = "MyTaskly MCP Server";

/// A secret value that never appears in `Debug` output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes redacted>)", self.0.len())
    }
}

/// Deployment profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Whether tooling that signs arbitrary tokens may run
    pub fn allows_dev_tokens(self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Token verification settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret with the authorization server
    pub secret: Secret,

    /// Pinned signing algorithm; the token header cannot override it
    pub algorithm: Algorithm,

    /// Exact `aud` value tokens must carry
    pub audience: String,

    /// Exact `iss` value, when issuer pinning is enabled
    pub issuer: Option<String>,

    /// Tolerance for `iat` values ahead of the local clock
    pub clock_skew_secs: i64,
}

/// MyTaskly API settings
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,

    /// Static `X-API-Key` header value
    pub api_key: Option<Secret>,

    /// Secret used to sign the per-user token sent upstream
    pub delegation_secret: Secret,

    /// Algorithm for the per-user token sent upstream
    pub delegation_algorithm: Algorithm,

    /// Bound on each upstream request
    pub timeout: Duration,
}

/// Configuration for the MyTaskly MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported to MCP clients
    pub server_name: String,

    /// Server version reported to MCP clients
    pub server_version: String,

    /// Deployment profile
    pub environment: Environment,

    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,

    pub auth: AuthConfig,

    pub upstream: UpstreamConfig,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = var("JWT_SECRET_KEY")
            .map(Secret::new)
            .ok_or_else(|| missing("JWT_SECRET_KEY"))?;

        let algorithm = match var("JWT_ALGORITHM") {
            Some(name) => parse_algorithm("JWT_ALGORITHM", &name)?,
            None => Algorithm::HS256,
        };

        let audience = var("MCP_AUDIENCE").ok_or_else(|| missing("MCP_AUDIENCE"))?;

        let clock_skew_secs = match var("JWT_CLOCK_SKEW_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs >= 0)
                .ok_or_else(|| invalid("JWT_CLOCK_SKEW_SECS", "expected a non-negative integer"))?,
            None => 60,
        };

        let base_url = parse_base_url(
            &var("FASTAPI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let delegation_secret = var("UPSTREAM_JWT_SECRET_KEY")
            .map(Secret::new)
            .unwrap_or_else(|| secret.clone());

        let timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| invalid("UPSTREAM_TIMEOUT_SECS", "expected a positive number"))?,
            None => Duration::from_secs(30),
        };

        let environment = match var("MCP_ENV").as_deref().map(str::trim) {
            None => Environment::Production,
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            Some(v) if v.eq_ignore_ascii_case("development") => Environment::Development,
            Some(other) => {
                return Err(invalid(
                    "MCP_ENV",
                    &format!("'{}' is not 'development' or 'production'", other),
                )
                .into())
            }
        };

        Ok(Self {
            server_name: var("MCP_SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            auth: AuthConfig {
                secret,
                algorithm,
                audience,
                issuer: var("MCP_ISSUER"),
                clock_skew_secs,
            },
            upstream: UpstreamConfig {
                base_url,
                api_key: var("FASTAPI_API_KEY").map(Secret::new),
                delegation_secret,
                delegation_algorithm: algorithm,
                timeout,
            },
        })
    }
}

/// Only symmetric MAC algorithms are accepted
fn parse_algorithm(var: &str, name: &str) -> std::result::Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(invalid(
            var,
            &format!("'{}' is not a supported HMAC algorithm", other),
        )),
    }
}

fn parse_base_url(raw: &str) -> std::result::Result<Url, ConfigError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }

    let url = Url::parse(&raw).map_err(|e| invalid("FASTAPI_BASE_URL", &e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(
            "FASTAPI_BASE_URL",
            &format!("unsupported scheme '{}'", scheme),
        )),
    }
}

fn missing(var: &str) -> ConfigError {
    ConfigError::MissingEnvVar {
        var: var.to_string(),
    }
}

fn invalid(var: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        message: message.to_string(),
    }
}
