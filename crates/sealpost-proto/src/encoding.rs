//! base64 and hex field codecs shared by the payload types.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sealpost_crypto::KeyId;

use crate::error::{ProtocolError, Result};

pub(crate) fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode(field: &'static str, value: &str) -> Result<Vec<u8>> {
    STANDARD.decode(value).map_err(|_| ProtocolError::InvalidBase64 { field })
}

pub(crate) fn decode_array<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N]> {
    let bytes = decode(field, value)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| ProtocolError::InvalidLength { field, expected: N, actual })
}

pub(crate) fn decode_key_id(field: &'static str, value: &str) -> Result<KeyId> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(value, &mut bytes).map_err(|_| ProtocolError::InvalidHex { field })?;
    Ok(KeyId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_length_is_enforced() {
        let short = encode(&[0u8; 11]);

        assert_eq!(
            decode_array::<12>("iv", &short),
            Err(ProtocolError::InvalidLength { field: "iv", expected: 12, actual: 11 })
        );
        assert!(decode_array::<11>("iv", &short).is_ok());
    }

    #[test]
    fn url_safe_alphabet_is_rejected() {
        assert_eq!(decode("salt", "-_-_"), Err(ProtocolError::InvalidBase64 { field: "salt" }));
    }

    #[test]
    fn key_id_requires_full_hex() {
        let id = KeyId::from_bytes([0xAB; 32]);

        assert_eq!(decode_key_id("recipientKeyId", &id.to_hex()), Ok(id));
        assert_eq!(
            decode_key_id("recipientKeyId", "abcd"),
            Err(ProtocolError::InvalidHex { field: "recipientKeyId" })
        );
    }
}
