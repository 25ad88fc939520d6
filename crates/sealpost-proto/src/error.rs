//! Decoding errors for wire payloads

use sealpost_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while converting between wire payloads and core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON for the expected shape
    #[error("malformed payload: {reason}")]
    Malformed {
        /// Parser message
        reason: String,
    },

    /// A binary field is not standard base64
    #[error("field {field} is not valid base64")]
    InvalidBase64 {
        /// Wire name of the field
        field: &'static str,
    },

    /// A key id is not 64 hex characters
    #[error("field {field} is not a valid hex key id")]
    InvalidHex {
        /// Wire name of the field
        field: &'static str,
    },

    /// A fixed-size field decoded to the wrong number of bytes
    #[error("field {field} has {actual} bytes, expected {expected}")]
    InvalidLength {
        /// Wire name of the field
        field: &'static str,
        /// Required length in bytes
        expected: usize,
        /// Decoded length in bytes
        actual: usize,
    },

    /// Two envelopes address the same recipient
    #[error("duplicate envelope for recipient {recipient}")]
    DuplicateRecipient {
        /// Hex key id of the repeated recipient
        recipient: String,
    },

    /// KDF parameters are unknown or below the minimum strength
    #[error("invalid kdf parameters: {reason}")]
    InvalidKdf {
        /// What was rejected
        reason: String,
    },

    /// Key material could not be parsed or does not match
    #[error("invalid key: {source}")]
    InvalidKey {
        /// Underlying parse failure
        #[source]
        source: CryptoError,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed { reason: err.to_string() }
    }
}

/// Convenience alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
