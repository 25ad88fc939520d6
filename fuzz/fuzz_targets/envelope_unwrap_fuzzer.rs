//! Fuzz target for session key envelope unwrapping
//!
//! Feeds arbitrary bytes to RSA-OAEP unwrap under a fixed identity key.
//! Wrong lengths, out-of-range integers and bad padding must all surface as
//! `EnvelopeDecryption`.
//!
//! The fuzzer should NEVER panic.

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use sealpost_crypto::{CryptoError, Envelope, IdentityKeypair, OsEntropy, unwrap};

fn identity() -> &'static IdentityKeypair {
    static IDENTITY: OnceLock<IdentityKeypair> = OnceLock::new();
    IDENTITY.get_or_init(|| IdentityKeypair::generate(&OsEntropy).expect("keygen"))
}

fuzz_target!(|data: &[u8]| {
    let envelope = Envelope::from_bytes(data.to_vec());

    match unwrap(&envelope, identity().private_key()) {
        Ok(_) => {},
        Err(err) => assert_eq!(err, CryptoError::EnvelopeDecryption),
    }
});
