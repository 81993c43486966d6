use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Profile claims returned by a federated identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedProfile {
    /// Provider name, e.g. `google`.
    pub provider: String,
    /// Stable subject id at the provider.
    pub subject: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Exchanges a provider-issued token for verified profile claims.
#[async_trait]
pub trait FederatedVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AuthResult<FederatedProfile>;
}

/// Verifier for deployments without federated login.
pub struct NoFederation;

#[async_trait]
impl FederatedVerifier for NoFederation {
    async fn verify(&self, _token: &str) -> AuthResult<FederatedProfile> {
        Err(AuthError::Federated("federated login is disabled".into()))
    }
}

/// Verifier backed by a fixed token table, for tests and local setups.
#[derive(Default)]
pub struct StaticFederatedVerifier {
    profiles: HashMap<String, FederatedProfile>,
}

impl StaticFederatedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, token: impl Into<String>, profile: FederatedProfile) -> Self {
        self.profiles.insert(token.into(), profile);
        self
    }
}

#[async_trait]
impl FederatedVerifier for StaticFederatedVerifier {
    async fn verify(&self, token: &str) -> AuthResult<FederatedProfile> {
        self.profiles
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::Federated("unknown token".into()))
    }
}
