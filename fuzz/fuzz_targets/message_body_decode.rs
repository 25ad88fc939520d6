//! Fuzz target for MessageBody::from_json
//!
//! Tests message body decoding with:
//! - Malformed JSON and unknown `kind` tags
//! - Invalid base64 in ciphertext, IV, tag and envelopes
//! - Wrong IV/tag lengths and invalid recipient key ids
//! - Duplicate recipients
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealpost_proto::MessageBody;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(body) = MessageBody::from_json(json) else {
        return;
    };

    if let MessageBody::Encrypted(payload) = &body {
        if let Ok(content) = payload.to_content() {
            // Anything that decodes must re-encode to the same content
            let again = MessageBody::encrypted(&content);
            let MessageBody::Encrypted(reencoded) = again else {
                panic!("encrypted body re-encoded as plaintext");
            };
            assert_eq!(reencoded.to_content().ok().as_ref(), Some(&content));
        }
    }

    let _ = body.to_json();
});
