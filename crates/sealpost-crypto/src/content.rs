//! Encrypted content as it travels: sealed bytes plus recipient envelopes.

use crate::{cipher::SealedContent, envelope::EnvelopeSet};

/// One encrypted message, post or comment.
///
/// Immutable once authored. The envelopes address the session key that
/// sealed `sealed` to each reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedContent {
    /// Ciphertext, IV and tag
    pub sealed: SealedContent,
    /// Session key wrapped per recipient
    pub envelopes: EnvelopeSet,
}
