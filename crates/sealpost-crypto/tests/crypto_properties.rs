//! Property tests for the content cipher, envelopes and the vault.
//!
//! These tests verify the invariants callers rely on:
//! - `open(seal(p, k), k) == p` for all plaintexts and keys
//! - Any single bit flip in ciphertext or tag is rejected
//! - `unwrap(wrap(k, pub), priv) == k`, and other private keys are rejected
//! - Vaults open only with the password they were locked with

use std::sync::OnceLock;

use proptest::prelude::*;
use sealpost_crypto::{
    CryptoError, IdentityKeypair, KdfParams, OsEntropy, SESSION_KEY_LEN, SealedContent,
    SessionKey, TAG_LEN, lock, open, seal, unlock, unwrap, wrap,
};

fn recipient() -> &'static IdentityKeypair {
    static CELL: OnceLock<IdentityKeypair> = OnceLock::new();
    CELL.get_or_init(|| IdentityKeypair::generate(&OsEntropy).unwrap())
}

fn outsider() -> &'static IdentityKeypair {
    static CELL: OnceLock<IdentityKeypair> = OnceLock::new();
    CELL.get_or_init(|| IdentityKeypair::generate(&OsEntropy).unwrap())
}

fn session_key_strategy() -> impl Strategy<Value = SessionKey> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| SessionKey::from_bytes(&bytes).unwrap())
}

proptest! {
    /// INVARIANT: sealing then opening with the same key is the identity.
    #[test]
    fn seal_open_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..4096),
        key in session_key_strategy(),
    ) {
        let sealed = seal(&plaintext, &key, &OsEntropy).unwrap();
        prop_assert_eq!(open(&sealed, &key).unwrap(), plaintext);
    }

    /// INVARIANT: flipping any bit of the ciphertext or tag is detected.
    #[test]
    fn bit_flip_is_rejected(
        plaintext in prop::collection::vec(any::<u8>(), 1..512),
        key in session_key_strategy(),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let sealed = seal(&plaintext, &key, &OsEntropy).unwrap();

        let mut ciphertext = sealed.ciphertext().to_vec();
        let mut tag = *sealed.auth_tag();

        let index = position.index(ciphertext.len() + TAG_LEN);
        if index < ciphertext.len() {
            ciphertext[index] ^= 1 << bit;
        } else {
            tag[index - ciphertext.len()] ^= 1 << bit;
        }

        let tampered = SealedContent::from_parts(ciphertext, *sealed.iv(), tag);
        prop_assert_eq!(open(&tampered, &key), Err(CryptoError::AuthenticationFailure));
    }

    /// INVARIANT: two seals of identical input never share an IV.
    #[test]
    fn repeated_seals_use_distinct_ivs(
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
        key in session_key_strategy(),
    ) {
        let first = seal(&plaintext, &key, &OsEntropy).unwrap();
        let second = seal(&plaintext, &key, &OsEntropy).unwrap();

        prop_assert_ne!(first.iv(), second.iv());
        if !plaintext.is_empty() {
            prop_assert_ne!(first.ciphertext(), second.ciphertext());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// INVARIANT: the intended recipient recovers exactly the wrapped key.
    #[test]
    fn envelope_roundtrip(key in session_key_strategy()) {
        let envelope = wrap(&key, recipient().public_key(), &OsEntropy).unwrap();
        let recovered = unwrap(&envelope, recipient().private_key()).unwrap();

        prop_assert_eq!(recovered.as_bytes().len(), SESSION_KEY_LEN);
        prop_assert_eq!(recovered, key);
    }

    /// INVARIANT: any other private key is refused.
    #[test]
    fn envelope_rejects_other_keys(key in session_key_strategy()) {
        let envelope = wrap(&key, recipient().public_key(), &OsEntropy).unwrap();

        prop_assert_eq!(
            unwrap(&envelope, outsider().private_key()),
            Err(CryptoError::EnvelopeDecryption)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    /// INVARIANT: a vault opens with its password and no other.
    #[test]
    fn vault_opens_only_with_its_password(
        password in "[ -~]{0,24}",
        other in "[ -~]{0,24}",
    ) {
        prop_assume!(password != other);

        let record = lock(recipient().private_key(), &password, &KdfParams::default(), &OsEntropy)
            .unwrap();

        let unlocked = unlock(&record, &password).unwrap();
        prop_assert_eq!(unlocked.public_key(), recipient().public_key());

        prop_assert!(matches!(
            unlock(&record, &other),
            Err(CryptoError::WrongPasswordOrCorruptedVault)
        ));
    }
}

#[test]
fn secret_vs_one_character_short() {
    let record =
        lock(recipient().private_key(), "Secr3t!", &KdfParams::default(), &OsEntropy).unwrap();

    let result = unlock(&record, "Secr3t");
    assert!(matches!(result, Err(CryptoError::WrongPasswordOrCorruptedVault)));
}
