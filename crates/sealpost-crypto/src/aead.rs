//! AES-256-GCM with detached tags.
//!
//! This is the only place in the crate that produces an IV. Both the content
//! cipher and the vault seal through [`seal_detached`], so every encryption
//! gets a fresh random 96-bit IV and no caller can supply one.

use aes_gcm::{
    Aes256Gcm, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};

use crate::{CryptoError, Entropy};

/// AES-256 key size (32 bytes)
pub const KEY_LEN: usize = 32;

/// AES-GCM IV size (12 bytes)
pub const IV_LEN: usize = 12;

/// AES-GCM authentication tag size (16 bytes)
pub const TAG_LEN: usize = 16;

/// Output of one AEAD seal.
pub(crate) struct Detached {
    pub(crate) ciphertext: Vec<u8>,
    pub(crate) iv: [u8; IV_LEN],
    pub(crate) tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` under `key` with a freshly drawn IV.
pub(crate) fn seal_detached<E: Entropy>(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
    entropy: &E,
) -> Result<Detached, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    entropy.fill(&mut iv)?;

    let cipher = Aes256Gcm::new(key.into());
    let mut buffer = plaintext.to_vec();

    let Ok(tag) = cipher.encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
    else {
        unreachable!("AES-256-GCM encryption cannot fail for bounded plaintext");
    };

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Detached { ciphertext: buffer, iv, tag: tag_bytes })
}

/// Verify `tag` and decrypt `ciphertext`.
///
/// The tag is checked before any plaintext is produced; on failure no bytes
/// are returned.
pub(crate) fn open_detached(
    key: &[u8; KEY_LEN],
    ciphertext: &[u8],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.into());
    let mut buffer = ciphertext.to_vec();

    cipher
        .decrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buffer, Tag::from_slice(tag))
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OsEntropy;

    #[test]
    fn seal_open_roundtrip() {
        let key = [7u8; KEY_LEN];
        let sealed = seal_detached(&key, b"payload", &OsEntropy).unwrap();

        let opened = open_detached(&key, &sealed.ciphertext, &sealed.iv, &sealed.tag).unwrap();
        assert_eq!(opened, b"payload");
    }

    #[test]
    fn ciphertext_length_matches_plaintext() {
        let key = [7u8; KEY_LEN];
        let sealed = seal_detached(&key, b"twelve bytes", &OsEntropy).unwrap();

        // Tag is detached, so the ciphertext is exactly as long as the input
        assert_eq!(sealed.ciphertext.len(), 12);
    }

    #[test]
    fn wrong_iv_fails() {
        let key = [7u8; KEY_LEN];
        let sealed = seal_detached(&key, b"payload", &OsEntropy).unwrap();

        let mut iv = sealed.iv;
        iv[0] ^= 0x01;

        let result = open_detached(&key, &sealed.ciphertext, &iv, &sealed.tag);
        assert_eq!(result, Err(CryptoError::AuthenticationFailure));
    }
}
