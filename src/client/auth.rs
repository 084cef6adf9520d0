//! Client-credentials token cache.
//!
//! The cache is the only shared mutable state in the client. Its lock is held
//! across the refresh, so concurrent callers wait for a single in-flight
//! token request instead of issuing their own.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::AuthError;
use super::transport::{ApiRequest, Body, Transport};

/// Assumed token lifetime when the issuer omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
/// Upper bound on how long a token is cached.
pub const MAX_CACHE_SECS: i64 = 50 * 60;

/// An access token as returned by the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds as stated by the issuer.
    pub expires_in: Option<i64>,
}

/// A cached token and the instant after which it is no longer used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// How long to keep a token: `min(50 min, expires_in * 5/6)`.
pub fn cache_lifetime(expires_in: Option<i64>) -> Duration {
    let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS).max(0);
    Duration::seconds((expires_in * 5 / 6).min(MAX_CACHE_SECS))
}

/// First characters of a token, for logs.
pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}...")
}

/// Source of fresh access tokens.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self) -> Result<IssuedToken, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// OAuth2 client-credentials grant against the configured token endpoint.
pub struct ClientCredentialsIssuer {
    transport: Arc<dyn Transport>,
    auth_url: String,
    client_id: String,
}

impl ClientCredentialsIssuer {
    pub fn new(
        transport: Arc<dyn Transport>,
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl TokenIssuer for ClientCredentialsIssuer {
    async fn issue(&self) -> Result<IssuedToken, AuthError> {
        let request = ApiRequest::post(
            &self.auth_url,
            Body::Form(vec![
                ("grant_type".into(), "client_credentials".into()),
                ("client_id".into(), self.client_id.clone()),
            ]),
        )
        .header("Accept", "application/json");

        let resp = self.transport.execute(request).await?;
        if !resp.is_success() {
            return Err(AuthError::AuthRequestFailed {
                status: resp.status,
                body: resp.body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&resp.body)
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;
        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidTokenResponse("missing access_token".into()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: parsed.expires_in,
        })
    }
}

/// Caches the current access token and refreshes it when it expires.
pub struct TokenCache {
    issuer: Box<dyn TokenIssuer>,
    current: Mutex<Option<AuthToken>>,
}

impl TokenCache {
    pub fn new(issuer: impl TokenIssuer + 'static) -> Self {
        Self {
            issuer: Box::new(issuer),
            current: Mutex::new(None),
        }
    }

    /// A valid access token, requesting a new one if none is cached or the
    /// cached one has expired.
    ///
    /// # Errors
    /// Issuer failures are returned as-is; nothing is retried.
    pub async fn token(&self) -> Result<String, AuthError> {
        let mut current = self.current.lock().await;
        let now = Utc::now();

        if let Some(token) = current.as_ref().filter(|t| t.is_valid_at(now)) {
            debug!(token = %redact(&token.value), "using cached token");
            return Ok(token.value.clone());
        }

        debug!("requesting new access token");
        let issued = self.issuer.issue().await?;
        let expires_at = Utc::now() + cache_lifetime(issued.expires_in);
        debug!(token = %redact(&issued.access_token), %expires_at, "access token issued");

        let value = issued.access_token.clone();
        *current = Some(AuthToken {
            value: issued.access_token,
            expires_at,
        });
        Ok(value)
    }

    /// Headers for an authenticated JSON call.
    pub async fn auth_headers(&self) -> Result<Vec<(String, String)>, AuthError> {
        let token = self.token().await?;
        Ok(vec![
            ("Authorization".to_string(), format!("Bearer {token}")),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ])
    }

    /// Drop the cached token so the next call requests a new one.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    /// The cached token, if any, without refreshing.
    pub async fn cached(&self) -> Option<AuthToken> {
        self.current.lock().await.clone()
    }
}
