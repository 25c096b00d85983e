//! Bounded cache for decoded public keys.
//!
//! Subgroup validation dominates the cost of decoding a public key, and a
//! consensus engine decodes the same committee keys for every vote. The cache
//! amortizes that cost: hits skip decompression and validation entirely.
//!
//! The cache is explicitly constructed and passed around by whoever builds the
//! subsystem rather than living in a global, which keeps test runs isolated
//! and lets callers size it to their committee.

use crate::{keys::PublicKey, Error, PUBLIC_KEY_LENGTH};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Default capacity, sized for several consensus committees' worth of keys.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// A bounded LRU cache of validated public keys, keyed by their raw 48-byte
/// encoding.
///
/// Safe to share across tasks: the internal lock is held only for the lookup
/// or insert itself, never across validation. Entries are handed out by value
/// ([`PublicKey`] is `Copy`), so callers never alias cache state.
pub struct PublicKeyCache {
    entries: Mutex<LruCache<[u8; PUBLIC_KEY_LENGTH], PublicKey>>,
}

impl PublicKeyCache {
    /// Creates a cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("cache capacity must be non-zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Decodes a public key, consulting the cache before paying for
    /// decompression and validation.
    ///
    /// Validation failures are never cached: a malformed or degenerate key
    /// fails again (cheaply, at the length check or decode) on every attempt.
    pub fn decode(&self, bytes: &[u8]) -> Result<PublicKey, Error> {
        let raw: [u8; PUBLIC_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| Error::InvalidPublicKeyLength)?;
        if let Some(key) = self.entries.lock().expect("cache lock poisoned").get(&raw) {
            return Ok(*key);
        }
        let key = PublicKey::from_bytes(bytes)?;
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .put(raw, key);
        Ok(key)
    }

    /// Number of keys currently cached.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PublicKeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
