use rand::RngCore;

use crate::error::{AuthError, AuthResult};

/// Produces and checks password digests.
pub trait PasswordHasher: Send + Sync {
    /// Digest a plaintext password into a self-describing string.
    fn hash(&self, password: &str) -> AuthResult<String>;

    /// Check a plaintext password against a stored digest.
    fn verify(&self, password: &str, digest: &str) -> bool;
}

const DIGEST_CONTEXT: &str = "quill 2024 password digest v1";
const SCHEME: &str = "b3";

/// Salted, iterated BLAKE3 password digests.
///
/// Digest format: `b3$<rounds>$<salt-hex>$<hash-hex>`. Comparison goes
/// through `blake3::Hash`, whose equality is constant time.
#[derive(Clone, Debug)]
pub struct SaltedBlake3Hasher {
    rounds: u32,
}

impl SaltedBlake3Hasher {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    fn digest(rounds: u32, salt: &[u8], password: &str) -> blake3::Hash {
        let mut material = Vec::with_capacity(salt.len() + password.len());
        material.extend_from_slice(salt);
        material.extend_from_slice(password.as_bytes());
        let mut state = blake3::derive_key(DIGEST_CONTEXT, &material);
        for _ in 1..rounds {
            let mut hasher = blake3::Hasher::new_keyed(&state);
            hasher.update(&material);
            state = *hasher.finalize().as_bytes();
        }
        blake3::Hash::from(state)
    }
}

impl Default for SaltedBlake3Hasher {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl PasswordHasher for SaltedBlake3Hasher {
    fn hash(&self, password: &str) -> AuthResult<String> {
        let mut salt = [0u8; 16];
        rand::thread_rng()
            .try_fill_bytes(&mut salt)
            .map_err(|e| AuthError::Digest(e.to_string()))?;
        let hash = Self::digest(self.rounds, &salt, password);
        Ok(format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            hex::encode(salt),
            hash.to_hex()
        ))
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        let mut parts = digest.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        let (Ok(rounds), Ok(salt), Ok(expected)) = (
            rounds.parse::<u32>(),
            hex::decode(salt),
            blake3::Hash::from_hex(expected),
        ) else {
            return false;
        };
        Self::digest(rounds.max(1), &salt, password) == expected
    }
}
