//! Client error types

use sealpost_crypto::CryptoError;
use sealpost_proto::{ConversationId, ProtocolError};
use thiserror::Error;

/// Errors from client send and receive operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Cryptographic operation failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Message body could not be decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Encryption was requested with nobody to address the session key to
    #[error("no recipients for conversation {conversation}")]
    NoRecipients {
        /// Conversation the message was for
        conversation: ConversationId,
    },

    /// Decrypted content is not UTF-8 text
    #[error("decrypted content is not valid UTF-8")]
    NotUtf8,
}

impl ClientError {
    /// Returns true if the client can no longer operate.
    ///
    /// Per-message failures (tampering, missing envelope, bad encoding) are
    /// not fatal; the caller drops that message and carries on.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Crypto(err) => err.is_fatal(),
            Self::Protocol(_) | Self::NoRecipients { .. } | Self::NotUtf8 => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_failure_is_fatal() {
        let err = ClientError::from(CryptoError::EntropyUnavailable { reason: "x".into() });
        assert!(err.is_fatal());
    }

    #[test]
    fn tampering_is_not_fatal() {
        assert!(!ClientError::from(CryptoError::AuthenticationFailure).is_fatal());
        assert!(!ClientError::NotUtf8.is_fatal());
    }
}
