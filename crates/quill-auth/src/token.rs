use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};

use quill_types::UserId;

use crate::error::{AuthError, AuthResult};

/// Longest accepted session lifetime: ten years.
pub const MAX_TTL_SECS: i64 = 10 * 366 * 24 * 60 * 60;

/// Check that a session lifetime lies in `1..=MAX_TTL_SECS`.
pub fn check_ttl(ttl_secs: i64) -> AuthResult<i64> {
    if (1..=MAX_TTL_SECS).contains(&ttl_secs) {
        Ok(ttl_secs)
    } else {
        Err(AuthError::InvalidTtl(ttl_secs))
    }
}

/// Claims carried inside a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The authenticated user.
    pub sub: UserId,
    /// Issued-at, seconds since the UNIX epoch.
    pub iat: i64,
    /// Expiry, seconds since the UNIX epoch.
    pub exp: i64,
}

impl SessionClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Issues and verifies Ed25519-signed session tokens.
///
/// Token format: `hex(claims-json) "." hex(signature)`. The signature covers
/// the raw claim bytes.
pub struct TokenSigner {
    key: ed25519_dalek::SigningKey,
    ttl_secs: i64,
}

impl TokenSigner {
    /// Create a signer with a fresh random key.
    pub fn generate(ttl_secs: i64) -> Self {
        let mut csprng = rand::thread_rng();
        Self {
            key: ed25519_dalek::SigningKey::generate(&mut csprng),
            ttl_secs,
        }
    }

    /// Create a signer from a 32-byte hex-encoded seed.
    pub fn from_hex(seed: &str, ttl_secs: i64) -> AuthResult<Self> {
        let ttl_secs = check_ttl(ttl_secs)?;
        let bytes = hex::decode(seed.trim()).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            AuthError::InvalidKey(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self {
            key: ed25519_dalek::SigningKey::from_bytes(&seed),
            ttl_secs,
        })
    }

    /// Hex encoding of the secret seed, for persisting generated keys.
    pub fn seed_hex(&self) -> String {
        hex::encode(self.key.as_bytes())
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `user`, valid from now.
    pub fn issue(&self, user: UserId) -> AuthResult<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: UserId, now: DateTime<Utc>) -> AuthResult<String> {
        let ttl = check_ttl(self.ttl_secs)?;
        let exp = now
            .timestamp()
            .checked_add(ttl)
            .ok_or(AuthError::InvalidTtl(ttl))?;
        let claims = SessionClaims {
            sub: user,
            iat: now.timestamp(),
            exp,
        };
        let body = serde_json::to_vec(&claims).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let signature = self.key.sign(&body);
        Ok(format!(
            "{}.{}",
            hex::encode(&body),
            hex::encode(signature.to_bytes())
        ))
    }

    /// Verify a token's signature and expiry.
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<SessionClaims> {
        let (body_hex, sig_hex) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| AuthError::InvalidToken("malformed token".into()))?;
        let body = hex::decode(body_hex).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let sig_bytes: [u8; 64] = hex::decode(sig_hex)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .try_into()
            .map_err(|_| AuthError::InvalidToken("bad signature length".into()))?;
        let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);

        self.key
            .verifying_key()
            .verify(&body, &signature)
            .map_err(|_| AuthError::InvalidToken("signature mismatch".into()))?;

        let claims: SessionClaims =
            serde_json::from_slice(&body).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenSigner(<redacted>, ttl={}s)", self.ttl_secs)
    }
}
