//! Password-based key derivation (PBKDF2-HMAC)
//!
//! [`KdfParams`] is a plain value passed to every vault and login verifier
//! operation, and stored next to what it protects. Raising the iteration
//! count for new vaults never breaks old ones.

use std::{fmt, str::FromStr};

use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::{CryptoError, aead::KEY_LEN};

/// Lowest accepted iteration count.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Iteration count used by [`KdfParams::default`].
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Random salt size for vaults and login verifiers (16 bytes)
pub const SALT_LEN: usize = 16;

/// PRF hash used inside PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KdfHash {
    /// HMAC-SHA-256
    #[default]
    Sha256,
    /// HMAC-SHA-512
    Sha512,
}

impl KdfHash {
    /// Stable name used in stored records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for KdfHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KdfHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(format!("unknown kdf hash: {other}")),
        }
    }
}

/// PBKDF2 parameters.
///
/// # Invariants
///
/// - `iterations >= MIN_ITERATIONS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
    hash: KdfHash,
}

impl KdfParams {
    /// Validate and build parameters.
    ///
    /// # Errors
    ///
    /// - `WeakKdfParams` if `iterations` is below [`MIN_ITERATIONS`]
    pub fn new(iterations: u32, hash: KdfHash) -> Result<Self, CryptoError> {
        if iterations < MIN_ITERATIONS {
            return Err(CryptoError::WeakKdfParams { iterations, minimum: MIN_ITERATIONS });
        }
        Ok(Self { iterations, hash })
    }

    /// PBKDF2 iteration count.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// PRF hash.
    pub fn hash(&self) -> KdfHash {
        self.hash
    }

    /// Derive a 256-bit key from `password` and `salt`.
    ///
    /// Deliberately slow. Call from a blocking context, not an async task.
    pub fn derive_key(&self, password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        match self.hash {
            KdfHash::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, self.iterations, &mut *key),
            KdfHash::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, self.iterations, &mut *key),
        }
        key
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { iterations: DEFAULT_ITERATIONS, hash: KdfHash::Sha256 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_meets_minimum() {
        let params = KdfParams::default();
        assert!(params.iterations() >= MIN_ITERATIONS);
        assert_eq!(params.hash(), KdfHash::Sha256);
    }

    #[test]
    fn weak_iteration_count_is_refused() {
        let result = KdfParams::new(1_000, KdfHash::Sha256);
        assert_eq!(result, Err(CryptoError::WeakKdfParams { iterations: 1_000, minimum: 100_000 }));
    }

    #[test]
    fn derivation_is_deterministic() {
        let params = KdfParams::default();
        let salt = [1u8; SALT_LEN];

        let a = params.derive_key(b"password", &salt);
        let b = params.derive_key(b"password", &salt);
        assert_eq!(*a, *b);
    }

    #[test]
    fn salt_changes_output() {
        let params = KdfParams::default();

        let a = params.derive_key(b"password", &[1u8; SALT_LEN]);
        let b = params.derive_key(b"password", &[2u8; SALT_LEN]);
        assert_ne!(*a, *b);
    }

    #[test]
    fn hash_choice_changes_output() {
        let salt = [1u8; SALT_LEN];
        let sha256 = KdfParams::new(MIN_ITERATIONS, KdfHash::Sha256).unwrap();
        let sha512 = KdfParams::new(MIN_ITERATIONS, KdfHash::Sha512).unwrap();

        assert_ne!(*sha256.derive_key(b"pw", &salt), *sha512.derive_key(b"pw", &salt));
    }

    #[test]
    fn uses_configured_iteration_count() {
        let params = KdfParams::default();
        let key = params.derive_key(b"passwd", b"salt");
        let expected = {
            let mut out = [0u8; KEY_LEN];
            pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 100_000, &mut out);
            out
        };
        assert_eq!(*key, expected);
    }

    #[test]
    fn hash_names_roundtrip() {
        for hash in [KdfHash::Sha256, KdfHash::Sha512] {
            assert_eq!(hash.as_str().parse::<KdfHash>(), Ok(hash));
        }
        assert!("md5".parse::<KdfHash>().is_err());
    }
}
