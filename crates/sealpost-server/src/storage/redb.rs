//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! All accounts survive server restarts, and a password change either lands
//! completely or not at all.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{AccountRecord, AccountSecrets, AccountStorage, StorageError};

/// Table: accounts
/// Key: username (UTF-8)
/// Value: CBOR-encoded AccountRecord
const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the ACCOUNTS table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(ACCOUNTS).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl AccountStorage for RedbStorage {
    fn create_account(&self, user: &str, record: &AccountRecord) -> Result<(), StorageError> {
        let bytes = encode_record(record)?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(ACCOUNTS).map_err(|e| StorageError::Io(e.to_string()))?;

            let exists =
                table.get(user).map_err(|e| StorageError::Io(e.to_string()))?.is_some();
            if exists {
                return Err(StorageError::AlreadyExists { user: user.to_string() });
            }

            table.insert(user, bytes.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn load_account(&self, user: &str) -> Result<Option<AccountRecord>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(ACCOUNTS).map_err(|e| StorageError::Io(e.to_string()))?;

        match table.get(user).map_err(|e| StorageError::Io(e.to_string()))? {
            Some(value) => Ok(Some(decode_record(value.value())?)),
            None => Ok(None),
        }
    }

    fn replace_secrets(
        &self,
        user: &str,
        expected_vault: &[u8],
        secrets: &AccountSecrets,
    ) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(ACCOUNTS).map_err(|e| StorageError::Io(e.to_string()))?;

            let mut record = {
                let Some(value) = table.get(user).map_err(|e| StorageError::Io(e.to_string()))?
                else {
                    return Err(StorageError::NotFound { user: user.to_string() });
                };
                decode_record(value.value())?
            };

            if record.secrets.vault.ciphertext != expected_vault {
                return Err(StorageError::Conflict { user: user.to_string() });
            }
            record.secrets = secrets.clone();

            let bytes = encode_record(&record)?;
            table.insert(user, bytes.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(ACCOUNTS).map_err(|e| StorageError::Io(e.to_string()))?;

        let mut users = Vec::new();
        for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
            let (key, _) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            users.push(key.value().to_string());
        }

        Ok(users)
    }
}

fn encode_record(record: &AccountRecord) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(record, &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode_record(bytes: &[u8]) -> Result<AccountRecord, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::storage::test_support::{sample_record, sample_secrets};

    #[test]
    fn test_create_and_load() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        let record = sample_record(1);
        storage.create_account("alice", &record).unwrap();

        assert_eq!(storage.load_account("alice").unwrap(), Some(record));
        assert_eq!(storage.load_account("bob").unwrap(), None);
    }

    #[test]
    fn test_duplicate_create_rolls_back() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        storage.create_account("alice", &sample_record(1)).unwrap();
        let result = storage.create_account("alice", &sample_record(2));

        assert_eq!(result, Err(StorageError::AlreadyExists { user: "alice".to_string() }));
        assert_eq!(storage.load_account("alice").unwrap(), Some(sample_record(1)));
    }

    #[test]
    fn test_replace_secrets_compare_and_swap() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        let record = sample_record(1);
        storage.create_account("alice", &record).unwrap();

        let stale = storage.replace_secrets("alice", &[0xEE; 48], &sample_secrets(2));
        assert_eq!(stale, Err(StorageError::Conflict { user: "alice".to_string() }));
        assert_eq!(storage.load_account("alice").unwrap(), Some(record.clone()));

        storage
            .replace_secrets("alice", &record.secrets.vault.ciphertext, &sample_secrets(2))
            .unwrap();
        let loaded = storage.load_account("alice").unwrap().unwrap();
        assert_eq!(loaded.secrets, sample_secrets(2));
        assert_eq!(loaded.created_at_secs, record.created_at_secs);
    }

    #[test]
    fn test_replace_secrets_unknown_user() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        let result = storage.replace_secrets("ghost", &[], &sample_secrets(1));
        assert_eq!(result, Err(StorageError::NotFound { user: "ghost".to_string() }));
    }

    #[test]
    fn test_list_users() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        assert!(storage.list_users().unwrap().is_empty());

        for (i, user) in ["carol", "alice", "bob"].into_iter().enumerate() {
            storage.create_account(user, &sample_record(i as u8)).unwrap();
        }

        let mut users = storage.list_users().unwrap();
        users.sort();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
    }
}
