//! Entropy abstraction for deterministic testing.
//!
//! Every random value the crate produces (identity keys, salts, IVs, session
//! keys, OAEP padding) is drawn from an [`Entropy`] implementation passed in by
//! the caller. Production code uses [`OsEntropy`]; tests use the seeded source
//! in [`crate::test_utils`].

use rand_chacha::{ChaCha20Rng, rand_core::SeedableRng};
use zeroize::Zeroize;

use crate::CryptoError;

/// Source of cryptographically secure random bytes.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `fill()` uses cryptographically secure entropy in production
/// - A failure is reported as an error, never papered over with zeros or a
///   weaker source
pub trait Entropy: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn fill(&self, buffer: &mut [u8]) -> Result<(), CryptoError>;

    /// Seeds a fresh ChaCha20 CSPRNG from this source.
    ///
    /// RSA key generation and OAEP padding consume randomness through an
    /// infallible RNG interface. Drawing the seed up front keeps entropy
    /// failures reportable instead of panicking inside the RSA library.
    fn csprng(&self) -> Result<ChaCha20Rng, CryptoError> {
        let mut seed = [0u8; 32];
        self.fill(&mut seed)?;
        let rng = ChaCha20Rng::from_seed(seed);
        seed.zeroize();
        Ok(rng)
    }
}

/// Production entropy from the operating system (getrandom).
///
/// Backed by `/dev/urandom` / `getrandom(2)` on Linux, `BCryptGenRandom` on
/// Windows, and the platform equivalent elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl OsEntropy {
    /// Create a new OS entropy source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Entropy for OsEntropy {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::fill(buffer)
            .map_err(|e| CryptoError::EntropyUnavailable { reason: e.to_string() })
    }
}
