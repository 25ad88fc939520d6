//! Storage error types

use thiserror::Error;

/// Errors from account storage operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Account already exists
    #[error("account already exists: {user}")]
    AlreadyExists {
        /// Username that is taken
        user: String,
    },

    /// Account does not exist
    #[error("account not found: {user}")]
    NotFound {
        /// Username that was not found
        user: String,
    },

    /// Stored secrets changed since they were read
    ///
    /// Raised by `replace_secrets` when the stored vault ciphertext no longer
    /// matches the one the caller based its update on. Another password
    /// change won the race.
    #[error("account secrets changed concurrently: {user}")]
    Conflict {
        /// Username whose secrets changed
        user: String,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}
