//! Service-account credential document.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCredentials {
    /// Issuer identity placed in the `iss` claim.
    #[serde(alias = "issuer")]
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Token endpoint named by the document; overrides the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

impl ServiceCredentials {
    pub fn endpoint(&self) -> Option<&str> {
        self.token_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }
}

pub fn load_credentials(path: &Path) -> Result<ServiceCredentials> {
    if !path.exists() {
        return Err(PipelineError::Auth(format!(
            "credential document not found: {}",
            path.display()
        )));
    }
    let json = std::fs::read_to_string(path).map_err(PipelineError::auth)?;
    let creds: ServiceCredentials = serde_json::from_str(&json)
        .map_err(|e| PipelineError::Auth(format!("malformed credential document: {}", e)))?;
    if creds.client_email.trim().is_empty() || creds.private_key.trim().is_empty() {
        return Err(PipelineError::Auth(
            "credential document lacks issuer or private key".to_string(),
        ));
    }
    Ok(creds)
}

pub fn save_credentials(path: &Path, creds: &ServiceCredentials) -> Result<()> {
    let json = serde_json::to_string_pretty(creds)?;
    std::fs::write(path, json)?;
    Ok(())
}
