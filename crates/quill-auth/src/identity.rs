use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use quill_types::UserId;

use crate::error::{AuthError, AuthResult};
use crate::token::TokenSigner;

/// The acting user of an authenticated request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AuthenticatedIdentity {
    pub user_id: UserId,
}

impl AuthenticatedIdentity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// What a client presented to prove who it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// Session cookie value.
    Cookie(String),
    Anonymous,
}

impl Credentials {
    /// The raw token, whichever way it was presented.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Bearer(t) | Self::Cookie(t) => Some(t),
            Self::Anonymous => None,
        }
    }
}

/// Turns presented credentials into an identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult<AuthenticatedIdentity>;
}

/// Authenticates session tokens issued by a [`TokenSigner`].
pub struct TokenAuthenticator {
    signer: Arc<TokenSigner>,
}

impl TokenAuthenticator {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl AuthProvider for TokenAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult<AuthenticatedIdentity> {
        let token = credentials
            .token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::MissingCredentials)?;
        let claims = self.signer.verify(token).inspect_err(|e| {
            debug!(error = %e, "session token rejected");
        })?;
        Ok(AuthenticatedIdentity::new(claims.sub))
    }
}
