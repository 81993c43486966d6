use thiserror::Error;

use quill_auth::AuthError;
use quill_store::StoreError;
use quill_types::TypeError;

/// Failure classes surfaced to callers of the engine.
///
/// Every message is safe to show to an end user; `Internal` carries detail
/// for logs only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// No identity, or the identity could not be verified.
    #[error("{0}")]
    Unauthenticated(String),

    /// The identity is valid but does not own the resource.
    #[error("{0}")]
    Forbidden(String),

    /// The addressed record does not exist.
    #[error("{} not found", capitalize(.entity))]
    NotFound { entity: &'static str },

    /// A unique field is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store or collaborator failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn forbidden(action: &str, entity: &str) -> Self {
        Self::Forbidden(format!("Unauthorized to {action} this {entity}"))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => Self::NotFound { entity },
            StoreError::Duplicate { field, .. } => {
                Self::Conflict(format!("{} already exists", capitalize(field)))
            }
            StoreError::Rejected(e) => Self::from(e),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<TypeError> for EngineError {
    fn from(err: TypeError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<AuthError> for EngineError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Digest(msg) | AuthError::InvalidKey(msg) => Self::Internal(msg),
            AuthError::InvalidTtl(ttl) => Self::Internal(format!("invalid session lifetime: {ttl}s")),
            AuthError::Federated(_) => Self::Unauthenticated("Federated login failed".into()),
            AuthError::MissingCredentials | AuthError::InvalidToken(_) | AuthError::Expired => {
                Self::Unauthenticated("User not authenticated".into())
            }
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
