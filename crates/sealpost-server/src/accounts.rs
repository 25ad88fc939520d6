//! Account service: registration, login and password changes.
//!
//! The service owns no secrets between calls. Registration generates the
//! identity keypair and locks it into a vault; login unlocks the vault and
//! hands the identity back to the caller once; a password change re-wraps the
//! vault and recomputes the login verifier in one storage update.
//!
//! # Cancellation
//!
//! Key generation and PBKDF2 run on the blocking pool. Storage is written only
//! after the blocking step has returned, with no await point in between, so a
//! future dropped mid-operation never leaves a partial record behind.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use sealpost_crypto::{Entropy, IdentityKeypair, KdfParams, PublicKey, lock};
use sealpost_proto::IdentityGrant;
use zeroize::Zeroizing;

use crate::{
    credentials::{LoginVerifier, burn_kdf, check_credentials},
    error::ServerError,
    storage::{
        AccountRecord, AccountSecrets, AccountStorage, StorageError, StoredVault, StoredVerifier,
    },
};

/// Longest accepted username in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Account service configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountConfig {
    /// KDF parameters for new vaults and login verifiers.
    ///
    /// Existing accounts keep the parameters they were stored with until the
    /// next password change.
    pub kdf: KdfParams,
}

/// Identity unlocked by a successful login.
///
/// Not `Clone`: the private key is handed to the caller once.
pub struct LoginGrant {
    user: String,
    identity: IdentityKeypair,
}

impl LoginGrant {
    /// Username that logged in.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Unlocked identity.
    pub fn identity(&self) -> &IdentityKeypair {
        &self.identity
    }

    /// Take the identity for a client session.
    pub fn into_identity(self) -> IdentityKeypair {
        self.identity
    }

    /// Consume the grant into its wire form.
    pub fn into_payload(self) -> Result<IdentityGrant, ServerError> {
        IdentityGrant::from_identity(&self.identity)
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

impl fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginGrant")
            .field("user", &self.user)
            .field("key_id", &self.identity.key_id())
            .finish_non_exhaustive()
    }
}

/// Registration, login and password management over an [`AccountStorage`].
///
/// # Invariants
///
/// - Stored records never contain a plaintext private key or password
/// - Unknown user, wrong password and an unreadable vault are reported as the
///   same `IncorrectCredentials` error
/// - Vault and login verifier change together or not at all
#[derive(Clone)]
pub struct AccountService<S: AccountStorage, E: Entropy> {
    storage: S,
    entropy: E,
    config: AccountConfig,
}

impl<S: AccountStorage, E: Entropy> AccountService<S, E> {
    /// Create a service over `storage`.
    pub fn new(storage: S, entropy: E, config: AccountConfig) -> Self {
        Self { storage, entropy, config }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Active configuration.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Create an account and its identity keypair.
    ///
    /// Returns the new public key for the directory.
    ///
    /// # Errors
    ///
    /// - `InvalidUsername` if `user` is empty, too long or contains whitespace
    /// - `UserExists` if the name is taken
    /// - `Crypto` if key generation or entropy fails
    pub async fn register(&self, user: &str, password: &str) -> Result<PublicKey, ServerError> {
        validate_username(user)?;
        if self.storage.load_account(user)?.is_some() {
            return Err(ServerError::UserExists { user: user.to_string() });
        }

        let password = Zeroizing::new(password.to_string());
        let entropy = self.entropy.clone();
        let kdf = self.config.kdf;

        let (public_key, secrets) = run_blocking(move || {
            let identity = IdentityKeypair::generate(&entropy)?;
            let vault = lock(identity.private_key(), &password, &kdf, &entropy)?;
            let verifier = LoginVerifier::derive(&password, &kdf, &entropy)?;

            let secrets = AccountSecrets {
                vault: StoredVault::from_record(&vault),
                verifier: StoredVerifier::from_verifier(&verifier),
            };
            Ok((identity.public_key().clone(), secrets))
        })
        .await?;

        let record = AccountRecord {
            public_key: public_key.to_der().to_vec(),
            secrets,
            created_at_secs: unix_now(),
        };

        match self.storage.create_account(user, &record) {
            Ok(()) => {},
            Err(StorageError::AlreadyExists { user }) => {
                return Err(ServerError::UserExists { user });
            },
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user, key_id = %public_key.key_id(), "registered account");
        Ok(public_key)
    }

    /// Check credentials and unlock the user's identity.
    ///
    /// # Errors
    ///
    /// - `IncorrectCredentials` for an unknown user, a wrong password or a
    ///   vault that does not open
    /// - `Storage` if the record cannot be read
    pub async fn login(&self, user: &str, password: &str) -> Result<LoginGrant, ServerError> {
        let password = Zeroizing::new(password.to_string());

        let Some(record) = self.storage.load_account(user)? else {
            self.burn(password).await?;
            tracing::warn!(user, "login refused");
            return Err(ServerError::IncorrectCredentials);
        };

        let verifier = record.secrets.verifier.to_verifier()?;
        let vault = record.secrets.vault.to_record()?;
        let public_key = record.public_key;

        let unlocked = run_blocking(move || {
            Ok(check_credentials(&verifier, &vault, &public_key, &password))
        })
        .await?;

        let Some(identity) = unlocked else {
            tracing::warn!(user, "login refused");
            return Err(ServerError::IncorrectCredentials);
        };

        tracing::info!(user, key_id = %identity.key_id(), "login succeeded");
        Ok(LoginGrant { user: user.to_string(), identity })
    }

    /// Replace the password that protects the user's vault.
    ///
    /// The vault is re-encrypted under `new_password` with the configured KDF
    /// parameters, and the login verifier is recomputed. Both are stored in a
    /// single compare-and-swap against the vault that was read, so nothing
    /// changes if any step fails.
    ///
    /// # Errors
    ///
    /// - `IncorrectCredentials` if `old_password` is wrong or the user is
    ///   unknown
    /// - `Conflict` if another password change landed first
    /// - `Crypto` / `Storage` on primitive or backend failure
    pub async fn change_password(
        &self,
        user: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServerError> {
        let old_password = Zeroizing::new(old_password.to_string());
        let new_password = Zeroizing::new(new_password.to_string());

        let Some(record) = self.storage.load_account(user)? else {
            self.burn(old_password).await?;
            tracing::warn!(user, "password change refused");
            return Err(ServerError::IncorrectCredentials);
        };

        let verifier = record.secrets.verifier.to_verifier()?;
        let vault = record.secrets.vault.to_record()?;
        let public_key = record.public_key.clone();
        let entropy = self.entropy.clone();
        let kdf = self.config.kdf;

        let secrets = run_blocking(move || {
            let Some(identity) = check_credentials(&verifier, &vault, &public_key, &old_password)
            else {
                return Ok(None);
            };

            let vault = lock(identity.private_key(), &new_password, &kdf, &entropy)?;
            let verifier = LoginVerifier::derive(&new_password, &kdf, &entropy)?;

            Ok(Some(AccountSecrets {
                vault: StoredVault::from_record(&vault),
                verifier: StoredVerifier::from_verifier(&verifier),
            }))
        })
        .await?;

        let Some(secrets) = secrets else {
            tracing::warn!(user, "password change refused");
            return Err(ServerError::IncorrectCredentials);
        };

        match self.storage.replace_secrets(user, &record.secrets.vault.ciphertext, &secrets) {
            Ok(()) => {},
            Err(StorageError::Conflict { user }) => return Err(ServerError::Conflict { user }),
            Err(StorageError::NotFound { .. }) => return Err(ServerError::IncorrectCredentials),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user, "password changed");
        Ok(())
    }

    /// Public key of `user`.
    ///
    /// # Errors
    ///
    /// - `UnknownUser` if there is no such account
    pub fn public_key(&self, user: &str) -> Result<PublicKey, ServerError> {
        let record = self
            .storage
            .load_account(user)?
            .ok_or_else(|| ServerError::UnknownUser { user: user.to_string() })?;

        Ok(PublicKey::from_der(&record.public_key)?)
    }

    /// Public keys of every user in `users`, in order.
    ///
    /// Fails on the first unknown user so a message is never sent to a
    /// partial recipient list.
    pub fn public_keys(&self, users: &[&str]) -> Result<Vec<PublicKey>, ServerError> {
        users.iter().map(|user| self.public_key(user)).collect()
    }

    /// All registered usernames, sorted.
    pub fn users(&self) -> Result<Vec<String>, ServerError> {
        let mut users = self.storage.list_users()?;
        users.sort();
        Ok(users)
    }

    /// Spend a credential check's worth of KDF work for a user that does not
    /// exist.
    async fn burn(&self, password: Zeroizing<String>) -> Result<(), ServerError> {
        let kdf = self.config.kdf;
        run_blocking(move || {
            burn_kdf(&password, &kdf);
            Ok(())
        })
        .await
    }
}

/// Reject usernames that could not be shown or looked up unambiguously.
fn validate_username(user: &str) -> Result<(), ServerError> {
    let reason = if user.is_empty() {
        "must not be empty".to_string()
    } else if user.len() > MAX_USERNAME_LEN {
        format!("longer than {MAX_USERNAME_LEN} bytes")
    } else if user.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "must not contain whitespace or control characters".to_string()
    } else {
        return Ok(());
    };

    Err(ServerError::InvalidUsername { reason })
}

/// Run CPU-bound crypto on the blocking pool.
async fn run_blocking<T, F>(task: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}
