//! Error types for identity, vault, cipher and envelope operations

use thiserror::Error;

use crate::envelope::KeyId;

/// Errors from Sealpost cryptographic operations.
///
/// Every variant is terminal for the operation that raised it. Callers must
/// not retry with a different key or substitute a default key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Identity keypair could not be generated
    #[error("identity key generation failed: {reason}")]
    KeyGeneration {
        /// Underlying library or entropy failure
        reason: String,
    },

    /// The operating system could not supply random bytes
    #[error("entropy unavailable: {reason}")]
    EntropyUnavailable {
        /// Error reported by the entropy source
        reason: String,
    },

    /// Vault could not be opened with the supplied password.
    ///
    /// Deliberately does not distinguish a wrong password from a damaged
    /// record.
    #[error("wrong password or corrupted vault")]
    WrongPasswordOrCorruptedVault,

    /// Content ciphertext or tag failed verification
    #[error("authentication failed: content was tampered with or sealed under another key")]
    AuthenticationFailure,

    /// Session key envelope could not be opened with the private key
    #[error("session key envelope could not be decrypted")]
    EnvelopeDecryption,

    /// The content carries no envelope for the reader's key
    #[error("no session key envelope for recipient {recipient}")]
    MissingEnvelope {
        /// Key id of the reader
        recipient: KeyId,
    },

    /// Session key could not be wrapped for a recipient
    #[error("session key envelope could not be created: {reason}")]
    EnvelopeEncryption {
        /// Underlying library failure
        reason: String,
    },

    /// Public key bytes are malformed or too weak
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// What was wrong with the key
        reason: String,
    },

    /// Key material has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// Plaintext exceeds the content size bound
    #[error("content too large: {len} bytes exceeds {max}")]
    ContentTooLarge {
        /// Plaintext length
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// Key derivation parameters are below the accepted minimum
    #[error("kdf iteration count {iterations} is below the minimum of {minimum}")]
    WeakKdfParams {
        /// Requested iteration count
        iterations: u32,
        /// Minimum iteration count
        minimum: u32,
    },
}

impl CryptoError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors mean the local setup cannot operate securely, e.g. no
    /// entropy. Everything else is scoped to one vault, message or envelope
    /// and is reported to the caller for that item only.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::KeyGeneration { .. } => true,
            Self::EntropyUnavailable { .. } => true,

            Self::WrongPasswordOrCorruptedVault => false,
            Self::AuthenticationFailure => false,
            Self::EnvelopeDecryption => false,
            Self::MissingEnvelope { .. } => false,
            Self::EnvelopeEncryption { .. } => false,
            Self::InvalidPublicKey { .. } => false,
            Self::InvalidKeyLength { .. } => false,
            Self::ContentTooLarge { .. } => false,
            Self::WeakKdfParams { .. } => false,
        }
    }
}
