//! Injectable cache for derived keys.
//!
//! Key derivation is deliberately slow (iterated hashing), so the deriver
//! memoizes results by the full (secret, salt, params) tuple. The cache is an
//! explicit object owned by the `KeyDeriver` that received it — never ambient
//! global state — so tests can substitute [`NoopKeyCache`] and exercise the
//! recompute path.

use std::collections::HashMap;
use std::sync::RwLock;

use zeroize::Zeroize;

use crate::crypto::kdf::DerivationParams;

/// Cache key: the complete derivation tuple. Two requests share an entry only
/// when secret, salt, and parameters all match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub secret: Vec<u8>,
    pub salt: Vec<u8>,
    pub params: DerivationParams,
}

/// Storage for memoized derivations.
///
/// Implementations must be safe for concurrent use from independent request
/// threads. Concurrent derivations for the same tuple may race and `store`
/// twice; a `lookup` must never observe a torn value. Entries may be evicted
/// at any time — a miss simply recomputes.
pub trait KeyCache: Send + Sync {
    fn lookup(&self, key: &CacheKey) -> Option<Vec<u8>>;
    fn store(&self, key: CacheKey, derived: Vec<u8>);
}

/// Process-memory cache backed by `RwLock<HashMap>`.
///
/// Writes are atomic upserts under the write lock. All retained key material
/// (master secrets in cache keys included) is zeroized when the cache drops.
#[derive(Default)]
pub struct MemoryKeyCache {
    entries: RwLock<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryKeyCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyCache for MemoryKeyCache {
    fn lookup(&self, key: &CacheKey) -> Option<Vec<u8>> {
        // A poisoned lock degrades to a miss; derivation recomputes.
        self.entries.read().ok()?.get(key).cloned()
    }

    fn store(&self, key: CacheKey, derived: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, derived);
        }
    }
}

impl Drop for MemoryKeyCache {
    fn drop(&mut self) {
        if let Ok(entries) = self.entries.get_mut() {
            for (mut key, mut derived) in entries.drain() {
                key.secret.zeroize();
                key.salt.zeroize();
                derived.zeroize();
            }
        }
    }
}

/// Cache that retains nothing: every derivation recomputes.
#[derive(Clone, Copy, Default)]
pub struct NoopKeyCache;

impl KeyCache for NoopKeyCache {
    fn lookup(&self, _key: &CacheKey) -> Option<Vec<u8>> {
        None
    }

    fn store(&self, _key: CacheKey, _derived: Vec<u8>) {}
}
