//! Authentication for Quill.
//!
//! Every authenticated request resolves to one canonical
//! [`AuthenticatedIdentity`]. Session tokens are Ed25519-signed claims; the
//! HTTP layer hands whatever the client presented to an [`AuthProvider`] and
//! receives either an identity or an [`AuthError`].
//!
//! Password digests and federated identity checks sit behind the
//! [`PasswordHasher`] and [`FederatedVerifier`] traits so deployments can
//! plug in their own implementations.

pub mod error;
pub mod federated;
pub mod identity;
pub mod password;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use federated::{FederatedProfile, FederatedVerifier, NoFederation, StaticFederatedVerifier};
pub use identity::{AuthProvider, AuthenticatedIdentity, Credentials, TokenAuthenticator};
pub use password::{PasswordHasher, SaltedBlake3Hasher};
pub use token::{check_ttl, SessionClaims, TokenSigner, MAX_TTL_SECS};
