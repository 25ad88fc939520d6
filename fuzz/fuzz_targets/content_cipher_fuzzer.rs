//! Fuzz target for the content cipher
//!
//! # Strategy
//!
//! - Arbitrary keys and plaintexts (including empty)
//! - Bit flips at arbitrary positions of the ciphertext or tag
//! - Forged sealed content assembled from raw bytes
//!
//! # Invariants
//!
//! - seal/open roundtrip succeeds
//! - Ciphertext length equals plaintext length
//! - Any single bit flip fails with AuthenticationFailure
//! - Forged content never opens

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealpost_crypto::{
    CryptoError, IV_LEN, OsEntropy, SealedContent, SessionKey, TAG_LEN, open, seal,
};

#[derive(Debug, Arbitrary)]
struct CipherScenario {
    key: [u8; 32],
    plaintext: Vec<u8>,
    flip: Option<(usize, u8)>,
    forged: Forged,
}

#[derive(Debug, Arbitrary)]
struct Forged {
    ciphertext: Vec<u8>,
    iv: [u8; IV_LEN],
    tag: [u8; TAG_LEN],
}

fuzz_target!(|scenario: CipherScenario| {
    let Ok(key) = SessionKey::from_bytes(&scenario.key) else {
        return;
    };
    let Ok(sealed) = seal(&scenario.plaintext, &key, &OsEntropy) else {
        return;
    };

    assert_eq!(sealed.ciphertext().len(), scenario.plaintext.len());
    assert_eq!(open(&sealed, &key).as_deref(), Ok(scenario.plaintext.as_slice()));

    if let Some((position, bit)) = scenario.flip {
        let mut ciphertext = sealed.ciphertext().to_vec();
        let mut tag = *sealed.auth_tag();
        let total = ciphertext.len() + TAG_LEN;
        let position = position % total;
        let mask = 1u8 << (bit % 8);

        if position < ciphertext.len() {
            ciphertext[position] ^= mask;
        } else {
            tag[position - ciphertext.len()] ^= mask;
        }

        let tampered = SealedContent::from_parts(ciphertext, *sealed.iv(), tag);
        assert_eq!(open(&tampered, &key), Err(CryptoError::AuthenticationFailure));
    }

    let forged = SealedContent::from_parts(
        scenario.forged.ciphertext,
        scenario.forged.iv,
        scenario.forged.tag,
    );
    assert!(open(&forged, &key).is_err());
});
