//! Sealpost account service.
//!
//! Server-side collaborator for the end-to-end encryption core. It stores
//! each user's public key, password-locked vault and login verifier, and
//! releases the unlocked identity to the user once per successful login.
//!
//! # Architecture
//!
//! ```text
//! register / login / change_password
//!        │
//!        ▼
//! AccountService ──► spawn_blocking (RSA keygen, PBKDF2, vault AEAD)
//!        │
//!        ▼ one call per operation
//! AccountStorage ──► MemoryStorage | RedbStorage | ChaoticStorage
//! ```
//!
//! # Components
//!
//! - [`AccountService`]: registration, login, password change, key directory
//! - [`AccountStorage`]: synchronous persistence trait with atomic operations
//! - [`LoginVerifier`]: constant-time salted password check

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod credentials;
mod error;
pub mod storage;

pub use accounts::{AccountConfig, AccountService, LoginGrant, MAX_USERNAME_LEN};
pub use credentials::LoginVerifier;
pub use error::ServerError;
pub use sealpost_crypto::{Entropy, KdfHash, KdfParams, OsEntropy};
pub use storage::{AccountStorage, ChaoticStorage, MemoryStorage, RedbStorage, StorageError};
