//! Service-account credentials and bearer token issuance.

mod document;
mod manager;

pub use document::{load_credentials, save_credentials, ServiceCredentials};
pub use manager::{
    build_assertion, AssertionClaims, BearerToken, CredentialManager, TokenProvider,
    JWT_BEARER_GRANT,
};
