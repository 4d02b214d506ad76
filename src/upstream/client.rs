//! MyTaskly API client
//!
//! Every request carries a short-lived token minted for the verified caller,
//! so the API sees the same user the MCP caller authenticated as.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::Identity;
use crate::config::{Secret, UpstreamConfig};
use crate::error::{Result, UpstreamError};
use crate::upstream::types::{
    CreatedNoteResponse, NewNoteRequest, NoteCreated, NoteDraft, Task, UpstreamHealth,
};

/// Lifetime of the per-user token sent upstream
const DELEGATION_TTL_MINUTES: i64 = 30;

/// Longest upstream error body relayed to callers
const MAX_ERROR_BODY: usize = 512;

/// Claims of the per-user token the MyTaskly API expects
#[derive(Debug, Serialize)]
struct DelegatedClaims<'a> {
    sub: &'a str,
    #[serde(rename = "type")]
    token_type: &'static str,
    exp: i64,
}

/// MyTaskly API client
pub struct UpstreamClient {
    /// HTTP client
    http_client: reqwest::Client,

    base_url: Url,

    api_key: Option<Secret>,

    delegation_key: EncodingKey,

    delegation_algorithm: Algorithm,
}

impl UpstreamClient {
    /// Create a new client; the timeout applies to every request
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Request {
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            delegation_key: EncodingKey::from_secret(config.delegation_secret.as_bytes()),
            delegation_algorithm: config.delegation_algorithm,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, UpstreamError> {
        self.base_url.join(path).map_err(|e| UpstreamError::Request {
            message: format!("invalid endpoint '{}': {}", path, e),
        })
    }

    /// Sign the per-user token for `identity`
    fn delegated_token(&self, identity: &Identity) -> std::result::Result<String, UpstreamError> {
        let claims = DelegatedClaims {
            sub: identity.caller_id(),
            token_type: "access",
            exp: (Utc::now() + Duration::minutes(DELEGATION_TTL_MINUTES)).timestamp(),
        };

        jsonwebtoken::encode(
            &Header::new(self.delegation_algorithm),
            &claims,
            &self.delegation_key,
        )
        .map_err(|e| UpstreamError::Request {
            message: e.to_string(),
        })
    }

    /// Attach the caller's credentials to a request
    fn authorize(
        &self,
        request: RequestBuilder,
        identity: &Identity,
    ) -> std::result::Result<RequestBuilder, UpstreamError> {
        let request = request.bearer_auth(self.delegated_token(identity)?);
        Ok(match &self.api_key {
            Some(key) => request.header("X-API-Key", key.expose()),
            None => request,
        })
    }

    /// Send a request and decode a JSON success body
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> std::result::Result<T, UpstreamError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "MyTaskly API responded");

        if status.is_success() {
            return response.json().await.map_err(transport_error);
        }

        if matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        ) {
            return Err(UpstreamError::Unavailable {
                message: format!("{} returned HTTP {}", path, status.as_u16()),
            });
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }

        Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        })
    }

    // ==================== Task Operations ====================

    /// Get all tasks of the caller
    pub async fn get_tasks(&self, identity: &Identity) -> Result<Vec<Task>> {
        let request = self.http_client.get(self.endpoint("tasks/")?);
        let request = self.authorize(request, identity)?;
        Ok(self.send_json(request, "tasks/").await?)
    }

    /// Get all categories of the caller, passed through unchanged
    pub async fn get_categories(&self, identity: &Identity) -> Result<Vec<Value>> {
        let request = self.http_client.get(self.endpoint("categories/")?);
        let request = self.authorize(request, identity)?;
        Ok(self.send_json(request, "categories/").await?)
    }

    /// Create a note owned by the caller
    pub async fn create_note(&self, identity: &Identity, draft: &NoteDraft) -> Result<NoteCreated> {
        let body = NewNoteRequest {
            user_id: caller_id_value(identity),
            title: &draft.title,
            position_x: &draft.position_x,
            position_y: &draft.position_y,
            color: &draft.color,
        };

        let request = self.http_client.post(self.endpoint("notes")?).json(&body);
        let request = self.authorize(request, identity)?;
        let created: CreatedNoteResponse = self.send_json(request, "notes").await?;

        Ok(NoteCreated {
            note_id: created.note_id,
            title: draft.title.clone(),
            color: draft.color.clone(),
            position_x: draft.position_x.clone(),
            position_y: draft.position_y.clone(),
            message: "[OK] Nota creata con successo".to_string(),
        })
    }

    // ==================== Health ====================

    /// Probe `GET /health`; never fails
    pub async fn health_check(&self) -> UpstreamHealth {
        let url = match self.endpoint("health") {
            Ok(url) => url,
            Err(e) => return UpstreamHealth::unhealthy(e.to_string()),
        };

        match self.http_client.get(url).send().await {
            Ok(response) => UpstreamHealth::healthy(response.status().as_u16()),
            Err(e) => {
                tracing::warn!(error = %e, "MyTaskly API health probe failed");
                UpstreamHealth::unhealthy(e.to_string())
            }
        }
    }
}

/// The API keys users by integer id; keep non-numeric subjects as strings
fn caller_id_value(identity: &Identity) -> Value {
    match identity.caller_id().parse::<i64>() {
        Ok(id) => Value::from(id),
        Err(_) => Value::from(identity.caller_id()),
    }
}

fn transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_decode() {
        UpstreamError::InvalidResponse {
            message: err.to_string(),
        }
    } else {
        UpstreamError::Unavailable {
            message: err.to_string(),
        }
    }
}
