//! Session key store for per-conversation content keys.
//!
//! One store per client session. Keys live only in memory and are zeroized
//! when evicted or when the store is dropped.

use std::collections::HashMap;

use parking_lot::Mutex;
use sealpost_crypto::{CryptoError, Entropy, SessionKey};
use sealpost_proto::ConversationId;

/// Caches one session key per conversation.
///
/// # Invariants
///
/// - At most one key per conversation at any time
/// - Concurrent `get_or_create` calls for the same conversation return the
///   same key (the lock is held across check-and-create)
/// - A cached key is only replaced after an explicit `evict`
pub struct SessionKeyStore<E: Entropy> {
    entropy: E,
    keys: Mutex<HashMap<ConversationId, SessionKey>>,
}

impl<E: Entropy> SessionKeyStore<E> {
    /// Create an empty store drawing new keys from `entropy`.
    pub fn new(entropy: E) -> Self {
        Self { entropy, keys: Mutex::new(HashMap::new()) }
    }

    /// Cached key for `conversation`, if any.
    pub fn get(&self, conversation: &ConversationId) -> Option<SessionKey> {
        self.keys.lock().get(conversation).cloned()
    }

    /// Cached key for `conversation`, generating one on first use.
    ///
    /// # Errors
    ///
    /// - `EntropyUnavailable` if a new key was needed and none could be drawn
    pub fn get_or_create(&self, conversation: &ConversationId) -> Result<SessionKey, CryptoError> {
        let mut keys = self.keys.lock();
        if let Some(key) = keys.get(conversation) {
            return Ok(key.clone());
        }

        let key = SessionKey::generate(&self.entropy)?;
        keys.insert(conversation.clone(), key.clone());
        tracing::debug!(%conversation, "created session key");
        Ok(key)
    }

    /// Cache `key` for `conversation` unless a key is already cached.
    ///
    /// Returns the key that is cached afterwards.
    pub fn adopt(&self, conversation: &ConversationId, key: SessionKey) -> SessionKey {
        let mut keys = self.keys.lock();
        if let Some(existing) = keys.get(conversation) {
            return existing.clone();
        }

        keys.insert(conversation.clone(), key.clone());
        tracing::debug!(%conversation, "adopted session key from envelope");
        key
    }

    /// Drop the key for `conversation`. Returns true if one was cached.
    pub fn evict(&self, conversation: &ConversationId) -> bool {
        self.keys.lock().remove(conversation).is_some()
    }

    /// Drop every cached key.
    pub fn clear(&self) {
        self.keys.lock().clear();
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    /// True if no key is cached.
    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}
