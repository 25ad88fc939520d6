//! Fuzz target for identity payload decoding
//!
//! Feeds arbitrary JSON to the public key, vault and identity grant payloads
//! and converts whatever parses into crypto types. Exercises the DER parsers
//! behind `PublicKey::from_der` and `PrivateKey::from_pkcs8_der`.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealpost_proto::{IdentityGrant, PublicKeyPayload, VaultPayload};

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = serde_json::from_slice::<PublicKeyPayload>(data) {
        let _ = payload.to_key();
    }

    if let Ok(payload) = serde_json::from_slice::<VaultPayload>(data) {
        let _ = payload.to_record();
    }

    if let Ok(grant) = serde_json::from_slice::<IdentityGrant>(data) {
        let _ = grant.to_identity();
    }
});
