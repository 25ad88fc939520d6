//! Login password verifier.
//!
//! The server checks login passwords against a salted PBKDF2 hash before it
//! attempts to unlock the vault. The verifier salt is drawn independently of
//! the vault salt, so the stored hash never equals the vault key.

use sealpost_crypto::{
    CryptoError, Entropy, IdentityKeypair, KdfParams, SALT_LEN, VaultRecord, unlock,
};
use subtle::ConstantTimeEq;

/// Length of the stored verifier hash in bytes.
pub const VERIFIER_LEN: usize = 32;

/// Salted PBKDF2 hash of a login password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginVerifier {
    hash: [u8; VERIFIER_LEN],
    salt: [u8; SALT_LEN],
    kdf: KdfParams,
}

impl LoginVerifier {
    /// Derive a verifier for `password` with a fresh salt.
    ///
    /// Runs the slow KDF; call from a blocking context.
    pub fn derive<E: Entropy>(
        password: &str,
        kdf: &KdfParams,
        entropy: &E,
    ) -> Result<Self, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        entropy.fill(&mut salt)?;

        let hash = *kdf.derive_key(password.as_bytes(), &salt);
        Ok(Self { hash, salt, kdf: *kdf })
    }

    /// Reassemble a verifier loaded from storage.
    pub fn from_parts(hash: [u8; VERIFIER_LEN], salt: [u8; SALT_LEN], kdf: KdfParams) -> Self {
        Self { hash, salt, kdf }
    }

    /// Check `password` in constant time.
    ///
    /// Runs the slow KDF; call from a blocking context.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = self.kdf.derive_key(password.as_bytes(), &self.salt);
        candidate[..].ct_eq(&self.hash[..]).into()
    }

    /// Stored hash.
    pub fn hash(&self) -> &[u8; VERIFIER_LEN] {
        &self.hash
    }

    /// Verifier salt.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// KDF parameters.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }
}

/// Check `password` against both the login verifier and the vault.
///
/// The verifier and the vault derivation always both run, so a wrong
/// password costs the same as a right password over a damaged vault.
/// Returns the identity only if the verifier matches, the vault opens and
/// the vault holds the key published as `public_key`.
pub fn check_credentials(
    verifier: &LoginVerifier,
    vault: &VaultRecord,
    public_key: &[u8],
    password: &str,
) -> Option<IdentityKeypair> {
    let verified = verifier.verify(password);
    let unlocked = unlock(vault, password).ok();

    unlocked.filter(|identity| verified && identity.public_key().to_der() == public_key)
}

/// Spend the KDF work of [`check_credentials`] and discard the result.
///
/// Used for unknown users so response time does not reveal whether an
/// account exists. There is no stored record, so `kdf` is the service's
/// configured parameters.
pub fn burn_kdf(password: &str, kdf: &KdfParams) {
    for _ in 0..2 {
        let _ = kdf.derive_key(password.as_bytes(), &[0u8; SALT_LEN]);
    }
}
