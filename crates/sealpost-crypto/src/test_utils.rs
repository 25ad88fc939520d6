//! Deterministic entropy and shared identity fixtures for tests.
//!
//! RSA key generation dominates test time, so [`alice`], [`bob`] and
//! [`carol`] are generated once per test binary from fixed seeds and shared.

#![allow(clippy::expect_used, reason = "Fixtures abort the test on setup failure")]

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rand_chacha::{
    ChaCha20Rng,
    rand_core::{RngCore, SeedableRng},
};

use crate::{CryptoError, Entropy, IdentityKeypair};

/// Seeded ChaCha20 entropy.
///
/// Clones share one RNG stream, so the sequence of bytes handed out is a
/// function of the seed and the order of calls.
#[derive(Clone)]
pub struct SeededEntropy {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SeededEntropy {
    /// Create an entropy source from a seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
    }
}

impl Entropy for SeededEntropy {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
        Ok(())
    }
}

/// Entropy source that always fails, for exercising error paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEntropy;

impl Entropy for FailingEntropy {
    fn fill(&self, _buffer: &mut [u8]) -> Result<(), CryptoError> {
        Err(CryptoError::EntropyUnavailable { reason: "entropy source disabled".to_string() })
    }
}

fn fixture(cell: &'static OnceLock<IdentityKeypair>, seed: u64) -> &'static IdentityKeypair {
    cell.get_or_init(|| {
        IdentityKeypair::generate(&SeededEntropy::with_seed(seed))
            .expect("fixture keypair generation")
    })
}

/// Shared identity for the first participant.
pub fn alice() -> &'static IdentityKeypair {
    static CELL: OnceLock<IdentityKeypair> = OnceLock::new();
    fixture(&CELL, 0xA11CE)
}

/// Shared identity for the second participant.
pub fn bob() -> &'static IdentityKeypair {
    static CELL: OnceLock<IdentityKeypair> = OnceLock::new();
    fixture(&CELL, 0xB0B)
}

/// Shared identity for a third participant in group tests.
pub fn carol() -> &'static IdentityKeypair {
    static CELL: OnceLock<IdentityKeypair> = OnceLock::new();
    fixture(&CELL, 0xCA201)
}
