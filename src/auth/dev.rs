//! Development token minting
//!
//! Signs tokens with the verifier's own key, which makes this module an
//! authentication bypass. It only exists in test builds or with the
//! `dev-tokens` feature. Outside tests, go through [`mint_dev_token`], which
//! refuses unless the configured environment allows development tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;

use crate::config::{AuthConfig, Config};
use crate::error::{ConfigError, Result};

#[derive(Debug, Serialize)]
struct DevClaims<'a> {
    sub: &'a str,
    aud: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<&'a str>,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

/// Mint a token for `subject`, only when `MCP_ENV=development`
pub fn mint_dev_token(config: &Config, subject: &str, ttl_minutes: i64, scopes: &[&str]) -> Result<String> {
    if !config.environment.allows_dev_tokens() {
        return Err(ConfigError::DevTokensDisabled {
            environment: config.environment.as_str().to_string(),
        }
        .into());
    }

    let ttl = Duration::try_minutes(ttl_minutes).ok_or_else(|| ConfigError::InvalidValue {
        var: "--ttl-minutes".to_string(),
        message: format!("{} minutes is out of range", ttl_minutes),
    })?;
    mint_token(&config.auth, subject, ttl, scopes)
}

/// Mint a token for `subject` that the configured verifier will accept.
/// A negative `ttl` produces an already-expired token.
pub fn mint_token(config: &AuthConfig, subject: &str, ttl: Duration, scopes: &[&str]) -> Result<String> {
    let now = Utc::now();
    let expires = now.checked_add_signed(ttl).ok_or_else(|| ConfigError::InvalidValue {
        var: "--ttl-minutes".to_string(),
        message: "token expiry is out of range".to_string(),
    })?;
    let claims = DevClaims {
        sub: subject,
        aud: &config.audience,
        iss: config.issuer.as_deref(),
        iat: now.timestamp(),
        exp: expires.timestamp(),
        scope: (!scopes.is_empty()).then(|| scopes.join(" ")),
    };

    jsonwebtoken::encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| {
        ConfigError::InvalidValue {
            var: "JWT_SECRET_KEY".to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::auth::TokenVerifier;
    use crate::config::{Environment, Secret};
    use crate::error::{AuthError, TasklyMcpError};

    fn config(environment: Option<&str>) -> Config {
        Config::from_vars(|name| match name {
            "JWT_SECRET_KEY" => Some("dev-secret".to_string()),
            "MCP_AUDIENCE" => Some("mcp://svc".to_string()),
            "MCP_ENV" => environment.map(str::to_string),
            _ => None,
        })
        .unwrap()
    }

    fn auth_config() -> AuthConfig {
        AuthConfig {
            secret: Secret::new("dev-secret"),
            algorithm: Algorithm::HS256,
            audience: "mcp://svc".to_string(),
            issuer: Some("https://auth.mytaskly.it".to_string()),
            clock_skew_secs: 60,
        }
    }

    #[test]
    fn test_create_test_token() {
        let token = mint_token(&auth_config(), "123", Duration::minutes(30), &[]).unwrap();
        assert!(token.len() > 50);
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_minted_token_verifies() {
        let config = auth_config();
        let token = mint_token(&config, "123", Duration::minutes(30), &["tasks:read"]).unwrap();
        let identity = TokenVerifier::new(&config).verify(&token).unwrap();
        assert_eq!(identity.caller_id(), "123");
        assert!(identity.has_scope("tasks:read"));
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let config = auth_config();
        let token = mint_token(&config, "123", Duration::minutes(-1), &[]).unwrap();
        assert_eq!(TokenVerifier::new(&config).verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_production_refuses_dev_tokens() {
        let config = config(None);
        assert_eq!(config.environment, Environment::Production);
        assert!(!Environment::Production.allows_dev_tokens());

        let err = mint_dev_token(&config, "123", 30, &[]).unwrap_err();
        assert!(matches!(
            err,
            TasklyMcpError::Config(ConfigError::DevTokensDisabled { .. })
        ));

        let err = mint_dev_token(&self::config(Some("production")), "123", 30, &[]).unwrap_err();
        assert!(matches!(
            err,
            TasklyMcpError::Config(ConfigError::DevTokensDisabled { .. })
        ));
    }

    #[test]
    fn test_development_mints_verifiable_token() {
        let config = config(Some("development"));
        let token = mint_dev_token(&config, "123", 30, &[]).unwrap();
        let identity = TokenVerifier::new(&config.auth).verify(&token).unwrap();
        assert_eq!(identity.caller_id(), "123");
    }

    #[test]
    fn test_huge_ttl_is_config_error() {
        let config = config(Some("development"));
        let err = mint_dev_token(&config, "123", i64::MAX, &[]).unwrap_err();
        assert!(matches!(err, TasklyMcpError::Config(ConfigError::InvalidValue { .. })));

        let err = mint_token(&config.auth, "123", Duration::MAX, &[]).unwrap_err();
        assert!(matches!(err, TasklyMcpError::Config(ConfigError::InvalidValue { .. })));
    }
}
