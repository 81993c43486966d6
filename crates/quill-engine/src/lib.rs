//! Application services for Quill.
//!
//! The [`ReactionEngine`] applies like/dislike/emoji toggles to blogs and
//! comments and announces the results on the [`EventHub`]. The blog, comment,
//! and user services cover the rest of the platform. All of them share one
//! store and one hub, both passed in explicitly; [`Platform`] wires them
//! together.

pub mod blogs;
pub mod comments;
pub mod error;
pub mod reactions;
pub mod users;

use std::sync::Arc;

use quill_auth::{FederatedVerifier, PasswordHasher, TokenSigner};
use quill_fabric::EventHub;
use quill_store::Store;

pub use blogs::{BlogService, BlogView, ReactionTotals};
pub use comments::{CommentService, CommentView};
pub use error::{EngineError, EngineResult};
pub use reactions::{ReactionEngine, ReactionTarget, Toggled};
pub use users::{Registration, Session, UserService, MIN_PASSWORD_LEN};

/// Every service, sharing one store and one hub.
#[derive(Clone)]
pub struct Platform {
    pub reactions: ReactionEngine,
    pub blogs: BlogService,
    pub comments: CommentService,
    pub users: UserService,
}

impl Platform {
    pub fn new(
        store: Arc<dyn Store>,
        hub: Arc<EventHub>,
        signer: Arc<TokenSigner>,
        hasher: Arc<dyn PasswordHasher>,
        federation: Arc<dyn FederatedVerifier>,
    ) -> Self {
        Self {
            reactions: ReactionEngine::new(Arc::clone(&store), Arc::clone(&hub)),
            blogs: BlogService::new(Arc::clone(&store)),
            comments: CommentService::new(Arc::clone(&store), hub),
            users: UserService::new(store, signer, hasher, federation),
        }
    }
}
