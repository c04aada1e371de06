use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Credential verification is delegated to an external provider; this seam
/// only classifies its failures. No password handling happens in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("wrong email or password")]
    WrongCredentials,
    #[error("malformed email address")]
    InvalidEmail,
    #[error("{0}")]
    Provider(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}

pub type AuthHandle = Arc<dyn AuthProvider>;

/// Stand-in used when the board runs without external configuration: every
/// sign-in attempt fails as a provider error, sign-out succeeds trivially.
pub struct DisabledAuth;

#[async_trait]
impl AuthProvider for DisabledAuth {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthUser, AuthError> {
        Err(AuthError::Provider(
            "authentication provider is not configured".into(),
        ))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
