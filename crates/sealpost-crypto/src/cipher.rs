//! Content encryption under a conversation session key (AES-256-GCM)
//!
//! [`seal`] draws a fresh IV on every call; there is no way to pass one in.
//! [`open`] verifies the authentication tag before any plaintext leaves this
//! module.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    CryptoError, Entropy,
    aead::{self, IV_LEN, KEY_LEN, TAG_LEN},
};

/// Session key size (256 bits)
pub const SESSION_KEY_LEN: usize = KEY_LEN;

/// Largest plaintext accepted by [`seal`] (1 MiB)
pub const MAX_CONTENT_LEN: usize = 1 << 20;

/// Symmetric key for one conversation.
///
/// Zeroized on drop. Comparison is constant-time and `Debug` never prints
/// the key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Draw a new random key.
    pub fn generate<E: Entropy>(entropy: &E) -> Result<Self, CryptoError> {
        let mut key = [0u8; SESSION_KEY_LEN];
        entropy.fill(&mut key)?;
        Ok(Self(key))
    }

    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength` unless `bytes` is exactly 32 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; SESSION_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: SESSION_KEY_LEN, actual: bytes.len() }
        })?;
        Ok(Self(key))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Encrypted content with the IV and tag needed to open it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedContent {
    ciphertext: Vec<u8>,
    iv: [u8; IV_LEN],
    auth_tag: [u8; TAG_LEN],
}

impl SealedContent {
    /// Reassemble sealed content received from the wire.
    pub fn from_parts(ciphertext: Vec<u8>, iv: [u8; IV_LEN], auth_tag: [u8; TAG_LEN]) -> Self {
        Self { ciphertext, iv, auth_tag }
    }

    /// Ciphertext without the tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// 96-bit IV used for this content.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// 128-bit GCM authentication tag.
    pub fn auth_tag(&self) -> &[u8; TAG_LEN] {
        &self.auth_tag
    }
}

/// Encrypt `plaintext` under `key`.
///
/// # Errors
///
/// - `ContentTooLarge` if `plaintext` exceeds [`MAX_CONTENT_LEN`]
/// - `EntropyUnavailable` if no IV can be drawn
pub fn seal<E: Entropy>(
    plaintext: &[u8],
    key: &SessionKey,
    entropy: &E,
) -> Result<SealedContent, CryptoError> {
    if plaintext.len() > MAX_CONTENT_LEN {
        return Err(CryptoError::ContentTooLarge { len: plaintext.len(), max: MAX_CONTENT_LEN });
    }

    let sealed = aead::seal_detached(key.as_bytes(), plaintext, entropy)?;
    Ok(SealedContent { ciphertext: sealed.ciphertext, iv: sealed.iv, auth_tag: sealed.tag })
}

/// Decrypt `sealed` under `key`.
///
/// # Errors
///
/// - `ContentTooLarge` if the ciphertext exceeds [`MAX_CONTENT_LEN`]; nothing
///   is decrypted
/// - `AuthenticationFailure` if the tag does not verify (tampering, wrong
///   key, wrong IV). No plaintext is returned in that case.
pub fn open(sealed: &SealedContent, key: &SessionKey) -> Result<Vec<u8>, CryptoError> {
    let len = sealed.ciphertext.len();
    if len > MAX_CONTENT_LEN {
        return Err(CryptoError::ContentTooLarge { len, max: MAX_CONTENT_LEN });
    }

    aead::open_detached(key.as_bytes(), &sealed.ciphertext, &sealed.iv, &sealed.auth_tag)
}
