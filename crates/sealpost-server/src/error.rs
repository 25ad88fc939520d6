//! Server error types.

use sealpost_crypto::CryptoError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur in the account service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Login or password change refused.
    ///
    /// Unknown user, wrong password and a vault that fails to open all map
    /// here, so the caller cannot tell which check failed.
    #[error("incorrect username or password")]
    IncorrectCredentials,

    /// Registration for a username that is taken.
    #[error("user already exists: {user}")]
    UserExists {
        /// Requested username
        user: String,
    },

    /// Public key lookup for a username with no account.
    ///
    /// Only directory lookups report this. Login never does.
    #[error("unknown user: {user}")]
    UnknownUser {
        /// Requested username
        user: String,
    },

    /// Username rejected before any work was done.
    #[error("invalid username: {reason}")]
    InvalidUsername {
        /// What is wrong with it
        reason: String,
    },

    /// Another password change for the same user won the race.
    ///
    /// Transient. The caller may retry with the password that is now current.
    #[error("account was modified concurrently: {user}")]
    Conflict {
        /// Username whose secrets changed
        user: String,
    },

    /// Storage backend failed.
    ///
    /// May be transient (I/O) or fatal (corrupted records).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Key generation, vault or entropy failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Unexpected state, such as a blocking task that panicked.
    ///
    /// Indicates a bug. Fatal - report as issue.
    #[error("internal error: {0}")]
    Internal(String),

    /// Invalid configuration (bad database path, weak KDF parameters).
    ///
    /// Prevents startup. Fix configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ServerError {
    /// Returns true if the service cannot keep operating after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::IncorrectCredentials => false,
            Self::UserExists { .. } => false,
            Self::UnknownUser { .. } => false,
            Self::InvalidUsername { .. } => false,
            Self::Conflict { .. } => false,
            Self::Storage(StorageError::Serialization(_)) => true,
            Self::Storage(_) => false,
            Self::Crypto(err) => err.is_fatal(),
            Self::Internal(_) => true,
            Self::Config(_) => true,
        }
    }
}
