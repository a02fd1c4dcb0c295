//! Key derivation: PBKDF2 over a configurable digest, memoized.
//!
//! Master secrets arrive per call from the session-plugin framework and are
//! never owned by this crate beyond the derivation cache. Subkeys are derived
//! per purpose salt — one salt for signing keys, a different salt for
//! encryption keys — so the two never coincide.

use std::sync::Arc;

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::crypto::cache::{CacheKey, KeyCache, MemoryKeyCache};
use crate::error::SecretError;

/// Minimum master secret length in bytes. Shorter secrets are rejected
/// before any hashing happens.
pub const MIN_SECRET_LEN: usize = 64;

/// Keyed-hash function iterated inside the derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Digest {
    Sha1,
    Sha256,
    Sha512,
}

/// Derivation parameters. Immutable once a store is initialized.
///
/// Defaults: 1000 iterations, 32-byte output, SHA-256. No upper bound is
/// enforced on iterations or length — misconfiguration is the caller's
/// responsibility.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationParams {
    pub iterations: u32,
    pub length: usize,
    pub digest: Digest,
}

impl Default for DerivationParams {
    fn default() -> Self {
        DerivationParams {
            iterations: 1000,
            length: 32,
            digest: Digest::Sha256,
        }
    }
}

/// Derives fixed-length subkeys from a master secret and a purpose salt.
///
/// Holds the injectable cache. Deriving twice with the same
/// (secret, salt, params) yields identical bytes whether or not the cache
/// kept the first result.
pub struct KeyDeriver {
    cache: Arc<dyn KeyCache>,
}

impl KeyDeriver {
    pub fn new(cache: Arc<dyn KeyCache>) -> Self {
        KeyDeriver { cache }
    }

    /// Derive `params.length` bytes from `secret` and `salt`.
    ///
    /// Rejects secrets shorter than [`MIN_SECRET_LEN`] before any
    /// cryptographic work. Results are memoized by the full
    /// (secret, salt, params) tuple; a cache miss recomputes.
    pub fn derive(
        &self,
        secret: &[u8],
        salt: &[u8],
        params: &DerivationParams,
    ) -> Result<Vec<u8>, SecretError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SecretError::TooShort {
                len: secret.len(),
                min: MIN_SECRET_LEN,
            });
        }

        let key = CacheKey {
            secret: secret.to_vec(),
            salt: salt.to_vec(),
            params: params.clone(),
        };
        if let Some(derived) = self.cache.lookup(&key) {
            return Ok(derived);
        }

        let derived = run_pbkdf2(secret, salt, params);
        self.cache.store(key, derived.clone());
        Ok(derived)
    }
}

impl Default for KeyDeriver {
    /// Deriver backed by a fresh in-memory cache.
    fn default() -> Self {
        KeyDeriver::new(Arc::new(MemoryKeyCache::new()))
    }
}

fn run_pbkdf2(secret: &[u8], salt: &[u8], params: &DerivationParams) -> Vec<u8> {
    let mut out = vec![0u8; params.length];
    match params.digest {
        Digest::Sha1 => pbkdf2_hmac::<Sha1>(secret, salt, params.iterations, &mut out),
        Digest::Sha256 => pbkdf2_hmac::<Sha256>(secret, salt, params.iterations, &mut out),
        Digest::Sha512 => pbkdf2_hmac::<Sha512>(secret, salt, params.iterations, &mut out),
    }
    out
}
