use std::sync::Arc;

use quill_auth::{
    AuthProvider, FederatedVerifier, NoFederation, SaltedBlake3Hasher, TokenAuthenticator,
    TokenSigner,
};
use quill_engine::Platform;
use quill_fabric::{EventHub, HubConfig};
use quill_store::{InMemoryStore, Store};
use tracing::warn;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared request state. Every dependency is passed in here; handlers
/// never reach for globals.
#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<Platform>,
    pub hub: Arc<EventHub>,
    pub auth: Arc<dyn AuthProvider>,
    pub cookies: CookiePolicy,
}

/// How the session cookie is written.
#[derive(Clone, Copy, Debug)]
pub struct CookiePolicy {
    pub max_age_secs: i64,
    pub secure: bool,
}

impl AppState {
    /// Assemble the state from its parts.
    pub fn new(
        store: Arc<dyn Store>,
        hub: Arc<EventHub>,
        signer: Arc<TokenSigner>,
        federation: Arc<dyn FederatedVerifier>,
        config: &ServerConfig,
    ) -> Self {
        let platform = Platform::new(
            store,
            Arc::clone(&hub),
            Arc::clone(&signer),
            Arc::new(SaltedBlake3Hasher::new(config.password_rounds)),
            federation,
        );
        Self {
            platform: Arc::new(platform),
            hub,
            auth: Arc::new(TokenAuthenticator::new(Arc::clone(&signer))),
            cookies: CookiePolicy {
                max_age_secs: signer.ttl_secs(),
                secure: config.secure_cookies,
            },
        }
    }

    /// In-memory store, configured signing key, no federated login.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let signer = match &config.signing_key {
            Some(seed) => TokenSigner::from_hex(seed, config.session_ttl_secs)?,
            None => {
                warn!("no signing key configured; sessions will not survive a restart");
                TokenSigner::generate(config.session_ttl_secs)
            }
        };
        let hub = EventHub::new(HubConfig {
            channel_capacity: config.event_buffer,
        });
        Ok(Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(hub),
            Arc::new(signer),
            Arc::new(NoFederation),
            config,
        ))
    }
}
