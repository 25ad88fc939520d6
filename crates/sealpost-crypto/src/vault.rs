//! Password-protected storage of the identity private key
//!
//! ```text
//! password ──┐
//!            ├─ PBKDF2 (KdfParams) ──► vault key (256-bit)
//! salt ──────┘                               │
//!                                            ▼
//! PKCS#8 private key ──────────────► AES-256-GCM ──► ciphertext ‖ tag
//!                                      ▲
//!                                fresh 96-bit IV
//! ```
//!
//! The record `{ciphertext, salt, iv, kdf}` is not secret and is stored
//! server-side. Unlocking is the only check that a password can recover the
//! private key, so any failure (wrong password, flipped bit, truncated record)
//! surfaces as the same [`CryptoError::WrongPasswordOrCorruptedVault`].

use zeroize::Zeroizing;

use crate::{
    CryptoError, Entropy,
    aead::{self, IV_LEN, TAG_LEN},
    identity::{IdentityKeypair, PrivateKey},
    kdf::{KdfParams, SALT_LEN},
};

/// Encrypted private key record.
///
/// Replace all fields together; a ciphertext paired with another record's
/// salt or IV is unrecoverable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultRecord {
    /// AES-GCM ciphertext with the 16-byte tag appended
    ciphertext: Vec<u8>,
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    kdf: KdfParams,
}

impl VaultRecord {
    /// Reassemble a record loaded from storage.
    pub fn from_parts(
        ciphertext: Vec<u8>,
        salt: [u8; SALT_LEN],
        iv: [u8; IV_LEN],
        kdf: KdfParams,
    ) -> Self {
        Self { ciphertext, salt, iv, kdf }
    }

    /// Ciphertext with the tag appended.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// KDF salt.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// AES-GCM IV.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// KDF parameters this record was locked with.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }
}

/// Encrypt `private_key` under a key derived from `password`.
///
/// Draws a fresh salt and IV. Runs the slow KDF, so call it from a blocking
/// context.
pub fn lock<E: Entropy>(
    private_key: &PrivateKey,
    password: &str,
    kdf: &KdfParams,
    entropy: &E,
) -> Result<VaultRecord, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    entropy.fill(&mut salt)?;

    let vault_key = kdf.derive_key(password.as_bytes(), &salt);
    let der = private_key.to_pkcs8_der()?;

    let sealed = aead::seal_detached(&vault_key, &der, entropy)?;

    let mut ciphertext = sealed.ciphertext;
    ciphertext.extend_from_slice(&sealed.tag);

    Ok(VaultRecord { ciphertext, salt, iv: sealed.iv, kdf: *kdf })
}

/// Recover the identity keypair from `record` using `password`.
///
/// # Errors
///
/// - `WrongPasswordOrCorruptedVault` on any failure
pub fn unlock(record: &VaultRecord, password: &str) -> Result<IdentityKeypair, CryptoError> {
    let Some(split) = record.ciphertext.len().checked_sub(TAG_LEN) else {
        return Err(CryptoError::WrongPasswordOrCorruptedVault);
    };
    let (ciphertext, tag) = record.ciphertext.split_at(split);
    let tag: &[u8; TAG_LEN] =
        tag.try_into().map_err(|_| CryptoError::WrongPasswordOrCorruptedVault)?;

    let vault_key = record.kdf.derive_key(password.as_bytes(), &record.salt);

    let der = Zeroizing::new(
        aead::open_detached(&vault_key, ciphertext, &record.iv, tag)
            .map_err(|_| CryptoError::WrongPasswordOrCorruptedVault)?,
    );

    let private = PrivateKey::from_pkcs8_der(&der)?;
    IdentityKeypair::from_private(private).map_err(|_| CryptoError::WrongPasswordOrCorruptedVault)
}

/// Re-encrypt the private key in `record` under `new_password`.
///
/// The result has a fresh salt and IV and uses `kdf`, which may differ from
/// the parameters of the old record.
///
/// # Errors
///
/// - `WrongPasswordOrCorruptedVault` if `old_password` does not unlock
///   `record`
pub fn rewrap<E: Entropy>(
    record: &VaultRecord,
    old_password: &str,
    new_password: &str,
    kdf: &KdfParams,
    entropy: &E,
) -> Result<VaultRecord, CryptoError> {
    let identity = unlock(record, old_password)?;
    lock(identity.private_key(), new_password, kdf, entropy)
}
