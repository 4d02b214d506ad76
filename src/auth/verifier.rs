//! JWT verification
//!
//! The verifier is a pure function of the token, its own settings and the
//! clock. Checks run in a fixed order:
//!
//! 1. structure and signature under the pinned algorithm
//! 2. `exp`, then `iat` sanity
//! 3. `aud` (and `iss` when pinned)
//! 4. `sub`
//!
//! No claim value is inspected until the signature has been verified.

use std::collections::BTreeSet;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Verified caller identity
///
/// Only [`TokenVerifier`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    caller_id: String,
    scopes: BTreeSet<String>,
}

impl Identity {
    pub(crate) fn new(caller_id: String, scopes: BTreeSet<String>) -> Self {
        Self { caller_id, scopes }
    }

    /// The token subject
    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Claim set as it appears on the wire. Every field is optional here so that
/// presence is checked explicitly, in order, after the signature.
#[derive(Debug, Deserialize)]
struct WireClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    aud: Option<Value>,
    #[serde(default)]
    iss: Option<String>,
    /// NumericDate; fractional seconds are allowed on the wire
    #[serde(default)]
    exp: Option<f64>,
    #[serde(default)]
    iat: Option<f64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Validates bearer tokens issued by the MyTaskly authorization server
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    audience: String,
    issuer: Option<String>,
    clock_skew_secs: i64,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation: signature_only(config.algorithm),
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
            clock_skew_secs: config.clock_skew_secs,
        }
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token against an explicit Unix timestamp
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::malformed("empty token"));
        }

        let claims = jsonwebtoken::decode::<WireClaims>(token, &self.key, &self.validation)?.claims;

        let exp = numeric_date(claims.exp, "exp")?;
        if now >= exp {
            return Err(AuthError::Expired);
        }

        let iat = numeric_date(claims.iat, "iat")?;
        if iat > now.saturating_add(self.clock_skew_secs) {
            return Err(AuthError::malformed("iat claim is in the future"));
        }

        match claims.aud {
            Some(Value::String(ref aud)) if *aud == self.audience => {}
            _ => return Err(AuthError::WrongAudience),
        }

        if let Some(expected) = &self.issuer {
            if claims.iss.as_deref() != Some(expected.as_str()) {
                return Err(AuthError::WrongIssuer);
            }
        }

        let caller_id = claims
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or(AuthError::MissingSubject)?;

        let scopes = claims
            .scope
            .map(|scope| scope.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Identity::new(caller_id, scopes))
    }
}

/// Whole seconds of a NumericDate claim, rounded down
fn numeric_date(value: Option<f64>, claim: &str) -> Result<i64, AuthError> {
    match value {
        None => Err(AuthError::malformed(format!("missing {} claim", claim))),
        Some(secs) if !secs.is_finite() => {
            Err(AuthError::malformed(format!("{} claim is not a finite number", claim)))
        }
        Some(secs) => Ok(secs.floor() as i64),
    }
}

/// `jsonwebtoken` validation that checks the signature under one pinned
/// algorithm and nothing else; claim checks happen in `verify_at`.
fn signature_only(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.algorithms = vec![algorithm];
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation
}
