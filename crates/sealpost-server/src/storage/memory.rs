use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{AccountRecord, AccountSecrets, AccountStorage, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// Uses `HashMap` keyed by username. All state is wrapped in Arc<Mutex<>> to
/// allow Clone and concurrent access. Thread-safe through Mutex, but uses
/// `lock().expect()` which will panic if the mutex is poisoned - acceptable
/// for test code. All operations are O(1) except `list_users`.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<String, AccountRecord>>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Number of stored accounts.
    ///
    /// Useful for debugging and testing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn account_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStorage for MemoryStorage {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn create_account(&self, user: &str, record: &AccountRecord) -> Result<(), StorageError> {
        let mut accounts = self.inner.lock().expect("Mutex poisoned");

        if accounts.contains_key(user) {
            return Err(StorageError::AlreadyExists { user: user.to_string() });
        }
        accounts.insert(user.to_string(), record.clone());

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn load_account(&self, user: &str) -> Result<Option<AccountRecord>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").get(user).cloned())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn replace_secrets(
        &self,
        user: &str,
        expected_vault: &[u8],
        secrets: &AccountSecrets,
    ) -> Result<(), StorageError> {
        let mut accounts = self.inner.lock().expect("Mutex poisoned");

        let record = accounts
            .get_mut(user)
            .ok_or_else(|| StorageError::NotFound { user: user.to_string() })?;

        if record.secrets.vault.ciphertext != expected_vault {
            return Err(StorageError::Conflict { user: user.to_string() });
        }
        record.secrets = secrets.clone();

        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn list_users(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").keys().cloned().collect())
    }
}
