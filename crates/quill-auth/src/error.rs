use thiserror::Error;

/// Errors produced while establishing or checking an identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The request carried no credentials.
    #[error("no credentials presented")]
    MissingCredentials,

    /// The token could not be decoded or its signature is wrong.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token was valid but has expired.
    #[error("token expired")]
    Expired,

    /// A signing key could not be parsed.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The federated identity provider rejected the token.
    #[error("federated identity rejected: {0}")]
    Federated(String),

    /// Session lifetime is not positive or is too large to represent.
    #[error("invalid session lifetime: {0}s")]
    InvalidTtl(i64),

    /// Password digest could not be produced or parsed.
    #[error("password digest error: {0}")]
    Digest(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
