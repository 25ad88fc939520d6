//! Storage abstraction for Sealpost accounts
//!
//! Trait-based abstraction for persisting account records. The trait is
//! synchronous (no async) to maintain a clean synchronous API design; the
//! account service calls it from async code between blocking-pool steps.
//!
//! Records hold only public keys, vaults and login verifiers. No plaintext
//! private key or password ever reaches an implementation.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;
use sealpost_crypto::{IV_LEN, KdfParams, SALT_LEN, VaultRecord};
use serde::{Deserialize, Serialize};

pub use self::redb::RedbStorage;
use crate::credentials::{LoginVerifier, VERIFIER_LEN};

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// SubjectPublicKeyInfo DER of the identity key
    pub public_key: Vec<u8>,
    /// Vault and login verifier, always replaced together
    pub secrets: AccountSecrets,
    /// Unix timestamp (seconds) of registration
    pub created_at_secs: u64,
}

/// Password-dependent part of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSecrets {
    /// Password-locked private key
    pub vault: StoredVault,
    /// Login password verifier
    pub verifier: StoredVerifier,
}

/// PBKDF2 parameters as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKdf {
    /// Iteration count
    pub iterations: u32,
    /// PRF hash name
    pub hash: String,
}

/// Vault fields as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVault {
    /// AES-GCM ciphertext with the tag appended
    pub ciphertext: Vec<u8>,
    /// KDF salt
    pub salt: [u8; SALT_LEN],
    /// AES-GCM IV
    pub iv: [u8; IV_LEN],
    /// KDF parameters
    pub kdf: StoredKdf,
}

/// Login verifier fields as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVerifier {
    /// PBKDF2 output
    pub hash: [u8; VERIFIER_LEN],
    /// KDF salt, independent of the vault salt
    pub salt: [u8; SALT_LEN],
    /// KDF parameters
    pub kdf: StoredKdf,
}

impl StoredKdf {
    fn from_params(params: &KdfParams) -> Self {
        Self { iterations: params.iterations(), hash: params.hash().as_str().to_string() }
    }

    fn to_params(&self) -> Result<KdfParams, StorageError> {
        let hash = self.hash.parse().map_err(StorageError::Serialization)?;
        KdfParams::new(self.iterations, hash)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

impl StoredVault {
    /// Persisted form of `record`.
    pub fn from_record(record: &VaultRecord) -> Self {
        Self {
            ciphertext: record.ciphertext().to_vec(),
            salt: *record.salt(),
            iv: *record.iv(),
            kdf: StoredKdf::from_params(record.kdf()),
        }
    }

    /// Rebuild the vault record.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the stored KDF parameters are unknown or too weak
    pub fn to_record(&self) -> Result<VaultRecord, StorageError> {
        let kdf = self.kdf.to_params()?;
        Ok(VaultRecord::from_parts(self.ciphertext.clone(), self.salt, self.iv, kdf))
    }
}

impl StoredVerifier {
    /// Persisted form of `verifier`.
    pub fn from_verifier(verifier: &LoginVerifier) -> Self {
        Self {
            hash: *verifier.hash(),
            salt: *verifier.salt(),
            kdf: StoredKdf::from_params(verifier.kdf()),
        }
    }

    /// Rebuild the login verifier.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the stored KDF parameters are unknown or too weak
    pub fn to_verifier(&self) -> Result<LoginVerifier, StorageError> {
        Ok(LoginVerifier::from_parts(self.hash, self.salt, self.kdf.to_params()?))
    }
}

/// Storage abstraction for account records
///
/// Must be Clone (shared by the service and its tasks), Send + Sync
/// (thread-safe), and synchronous (no async methods). Implementations
/// typically share internal state via Arc, so clones access the same
/// underlying storage.
///
/// # Invariants
///
/// - Each method is atomic: it either applies completely or not at all
/// - The vault and login verifier of an account only change together
pub trait AccountStorage: Clone + Send + Sync + 'static {
    /// Store a new account.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if `user` already has an account
    fn create_account(&self, user: &str, record: &AccountRecord) -> Result<(), StorageError>;

    /// Load an account. `None` if the user does not exist.
    fn load_account(&self, user: &str) -> Result<Option<AccountRecord>, StorageError>;

    /// Replace vault and verifier in one step.
    ///
    /// Applies only if the stored vault ciphertext still equals
    /// `expected_vault`, i.e. nobody changed the password since the caller
    /// read the record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `user` has no account
    /// - `Conflict` if the stored vault differs from `expected_vault`
    fn replace_secrets(
        &self,
        user: &str,
        expected_vault: &[u8],
        secrets: &AccountSecrets,
    ) -> Result<(), StorageError>;

    /// List all usernames.
    ///
    /// Order is not guaranteed.
    fn list_users(&self) -> Result<Vec<String>, StorageError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{AccountRecord, AccountSecrets, StoredKdf, StoredVault, StoredVerifier};

    /// Structurally valid record with recognisable bytes. Not unlockable.
    pub(crate) fn sample_record(fill: u8) -> AccountRecord {
        AccountRecord {
            public_key: vec![fill; 8],
            secrets: sample_secrets(fill),
            created_at_secs: 1_700_000_000,
        }
    }

    pub(crate) fn sample_secrets(fill: u8) -> AccountSecrets {
        let kdf = StoredKdf { iterations: 100_000, hash: "sha256".to_string() };
        AccountSecrets {
            vault: StoredVault {
                ciphertext: vec![fill; 48],
                salt: [fill; 16],
                iv: [fill; 12],
                kdf: kdf.clone(),
            },
            verifier: StoredVerifier { hash: [fill; 32], salt: [fill ^ 0xFF; 16], kdf },
        }
    }
}
