//! Exchanges a signed JWT assertion for a short-lived bearer token and caches it.

use super::document::{load_credentials, ServiceCredentials};
use crate::clock::Clock;
use crate::config::CredentialConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Issued token; replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<Arc<BearerToken>>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Build the three-part RS256 assertion for `creds`.
pub fn build_assertion(
    creds: &ServiceCredentials,
    scope: &str,
    audience: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let claims = AssertionClaims {
        iss: creds.client_email.clone(),
        scope: scope.to_string(),
        aud: audience.to_string(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        iat: now.timestamp(),
    };
    let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?)
}

pub struct CredentialManager {
    credentials_path: PathBuf,
    token_url: String,
    scope: String,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<Arc<BearerToken>>>,
}

impl CredentialManager {
    pub fn new(
        credentials_path: PathBuf,
        config: &CredentialConfig,
        http: reqwest::Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials_path,
            token_url: config.token_url.trim().to_string(),
            scope: config.scope.clone(),
            http,
            clock,
            cached: RwLock::new(None),
        }
    }

    /// Cached token while `now < expiry`, otherwise a fresh exchange.
    /// Concurrent refreshes may each exchange; the last write wins.
    pub async fn get_token(&self) -> Result<Arc<BearerToken>> {
        let now = self.clock.now();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_valid_at(now) {
                return Ok(Arc::clone(token));
            }
        }
        let token = Arc::new(self.exchange().await?);
        *self.cached.write().await = Some(Arc::clone(&token));
        Ok(token)
    }

    async fn exchange(&self) -> Result<BearerToken> {
        let creds = load_credentials(&self.credentials_path)?;
        let token_url = creds.endpoint().unwrap_or(&self.token_url);
        let issued_at = self.clock.now();
        let assertion = build_assertion(&creds, &self.scope, token_url, issued_at)?;
        debug!("[auth] exchanging assertion for {} at {}", creds.client_email, token_url);

        let response = self
            .http
            .post(token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Auth(format!(
                "token endpoint rejected assertion {}: {}",
                status, body
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Auth(format!("malformed token response: {}", e)))?;
        let expires_at = issued_at + Duration::seconds(parsed.expires_in);
        info!("[auth] issued token valid until {}", expires_at);
        Ok(BearerToken {
            value: parsed.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for CredentialManager {
    async fn token(&self) -> Result<Arc<BearerToken>> {
        self.get_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_expires_at_instant() {
        let expires_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let token = BearerToken {
            value: "t".into(),
            expires_at,
        };
        assert!(token.is_valid_at(expires_at - Duration::seconds(1)));
        assert!(!token.is_valid_at(expires_at));
    }

    #[test]
    fn garbage_key_fails_signing_as_auth_error() {
        let creds = ServiceCredentials {
            client_email: "svc@example.com".into(),
            private_key: "not a pem".into(),
            token_uri: None,
        };
        let err = build_assertion(&creds, "scope", "aud", Utc::now()).unwrap_err();
        assert!(matches!(err, PipelineError::Auth(_)));
    }
}
