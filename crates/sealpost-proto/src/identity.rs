//! Identity payloads: published public keys, stored vaults and the one-time
//! login grant.

use std::fmt;

use sealpost_crypto::{
    CryptoError, IV_LEN, IdentityKeypair, KdfHash, KdfParams, PrivateKey, PublicKey, SALT_LEN,
    VaultRecord,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{
    encoding::{decode, decode_array, decode_key_id, encode},
    error::{ProtocolError, Result},
};

/// A user's public key as published in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyPayload {
    /// Hex SHA-256 fingerprint of `public_key`
    pub key_id: String,
    /// base64 SubjectPublicKeyInfo DER
    pub public_key: String,
}

impl PublicKeyPayload {
    /// Encode `key` for the wire.
    pub fn from_key(key: &PublicKey) -> Self {
        Self { key_id: key.key_id().to_hex(), public_key: encode(key.to_der()) }
    }

    /// Parse the key and check it against the advertised key id.
    pub fn to_key(&self) -> Result<PublicKey> {
        let der = decode("publicKey", &self.public_key)?;
        let key = PublicKey::from_der(&der).map_err(|source| ProtocolError::InvalidKey { source })?;

        let advertised = decode_key_id("keyId", &self.key_id)?;
        if key.key_id() != advertised {
            return Err(ProtocolError::InvalidKey {
                source: CryptoError::InvalidPublicKey {
                    reason: "key id does not match public key".to_string(),
                },
            });
        }
        Ok(key)
    }
}

/// PBKDF2 parameters as stored next to a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfPayload {
    /// Iteration count
    pub iterations: u32,
    /// PRF hash name (`sha256` or `sha512`)
    pub hash: String,
}

impl KdfPayload {
    /// Encode `params`.
    pub fn from_params(params: &KdfParams) -> Self {
        Self { iterations: params.iterations(), hash: params.hash().as_str().to_string() }
    }

    /// Validate and decode.
    pub fn to_params(&self) -> Result<KdfParams> {
        let hash: KdfHash =
            self.hash.parse().map_err(|reason| ProtocolError::InvalidKdf { reason })?;
        KdfParams::new(self.iterations, hash)
            .map_err(|err| ProtocolError::InvalidKdf { reason: err.to_string() })
    }
}

/// Password-locked private key as stored server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultPayload {
    /// base64 AES-GCM ciphertext with the tag appended
    pub ciphertext: String,
    /// base64 16-byte KDF salt
    pub salt: String,
    /// base64 12-byte IV
    pub iv: String,
    /// KDF parameters the vault was locked with
    pub kdf: KdfPayload,
}

impl VaultPayload {
    /// Encode `record`.
    pub fn from_record(record: &VaultRecord) -> Self {
        Self {
            ciphertext: encode(record.ciphertext()),
            salt: encode(record.salt()),
            iv: encode(record.iv()),
            kdf: KdfPayload::from_params(record.kdf()),
        }
    }

    /// Decode into a record ready for unlocking.
    pub fn to_record(&self) -> Result<VaultRecord> {
        Ok(VaultRecord::from_parts(
            decode("ciphertext", &self.ciphertext)?,
            decode_array::<SALT_LEN>("salt", &self.salt)?,
            decode_array::<IV_LEN>("iv", &self.iv)?,
            self.kdf.to_params()?,
        ))
    }
}

/// Unlocked identity handed to the client once per login.
///
/// Carries the plaintext private key, so it is wiped on drop and never
/// printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct IdentityGrant {
    /// base64 SubjectPublicKeyInfo DER
    pub public_key: String,
    /// base64 PKCS#8 DER
    pub private_key: String,
}

impl IdentityGrant {
    /// Encode an unlocked identity.
    pub fn from_identity(identity: &IdentityKeypair) -> Result<Self> {
        let der = identity
            .private_key()
            .to_pkcs8_der()
            .map_err(|source| ProtocolError::InvalidKey { source })?;

        Ok(Self { public_key: encode(identity.public_key().to_der()), private_key: encode(&der) })
    }

    /// Decode the identity and check both halves belong together.
    pub fn to_identity(&self) -> Result<IdentityKeypair> {
        let der = Zeroizing::new(decode("privateKey", &self.private_key)?);
        let invalid = |source| ProtocolError::InvalidKey { source };
        let private = PrivateKey::from_pkcs8_der(&der).map_err(invalid)?;
        let identity = IdentityKeypair::from_private(private).map_err(invalid)?;

        let public_der = decode("publicKey", &self.public_key)?;
        if identity.public_key().to_der() != public_der.as_slice() {
            return Err(ProtocolError::InvalidKey {
                source: CryptoError::InvalidPublicKey {
                    reason: "public key does not match private key".to_string(),
                },
            });
        }
        Ok(identity)
    }
}

impl fmt::Debug for IdentityGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityGrant")
            .field("public_key", &self.public_key)
            .field("private_key", &"..")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use sealpost_crypto::{
        OsEntropy, TAG_LEN, lock,
        test_utils::{alice, bob},
    };

    use super::*;

    #[test]
    fn public_key_roundtrip() {
        let payload = PublicKeyPayload::from_key(alice().public_key());

        assert_eq!(payload.key_id.len(), 64);
        assert_eq!(&payload.to_key().unwrap(), alice().public_key());
    }

    #[test]
    fn public_key_with_foreign_key_id_is_rejected() {
        let mut payload = PublicKeyPayload::from_key(alice().public_key());
        payload.key_id = bob().key_id().to_hex();

        assert!(matches!(payload.to_key(), Err(ProtocolError::InvalidKey { .. })));
    }

    #[test]
    fn public_key_json_uses_camel_case() {
        let json = serde_json::to_value(PublicKeyPayload::from_key(alice().public_key())).unwrap();

        assert!(json.get("keyId").is_some());
        assert!(json.get("publicKey").is_some());
    }

    #[test]
    fn vault_payload_roundtrip() {
        let record =
            lock(alice().private_key(), "Secr3t!", &KdfParams::default(), &OsEntropy).unwrap();
        let payload = VaultPayload::from_record(&record);

        assert_eq!(payload.kdf, KdfPayload { iterations: 100_000, hash: "sha256".to_string() });
        assert_eq!(payload.to_record().unwrap(), record);
    }

    #[test]
    fn vault_payload_with_short_iv_is_rejected() {
        let payload = VaultPayload {
            ciphertext: encode(&[0u8; TAG_LEN]),
            salt: encode(&[0u8; SALT_LEN]),
            iv: encode(&[0u8; 8]),
            kdf: KdfPayload { iterations: 100_000, hash: "sha256".to_string() },
        };

        assert_eq!(
            payload.to_record(),
            Err(ProtocolError::InvalidLength { field: "iv", expected: IV_LEN, actual: 8 })
        );
    }

    #[test]
    fn weak_kdf_is_rejected() {
        let weak = KdfPayload { iterations: 1_000, hash: "sha256".to_string() };
        let unknown = KdfPayload { iterations: 100_000, hash: "md5".to_string() };

        assert!(matches!(weak.to_params(), Err(ProtocolError::InvalidKdf { .. })));
        assert!(matches!(unknown.to_params(), Err(ProtocolError::InvalidKdf { .. })));
    }

    #[test]
    fn grant_roundtrip() {
        let grant = IdentityGrant::from_identity(alice()).unwrap();
        let identity = grant.to_identity().unwrap();

        assert_eq!(identity.public_key(), alice().public_key());
    }

    #[test]
    fn grant_with_mismatched_halves_is_rejected() {
        let mut grant = IdentityGrant::from_identity(alice()).unwrap();
        grant.public_key = encode(bob().public_key().to_der());

        assert!(matches!(grant.to_identity(), Err(ProtocolError::InvalidKey { .. })));
    }

    #[test]
    fn grant_debug_hides_private_key() {
        let grant = IdentityGrant::from_identity(alice()).unwrap();
        let debug = format!("{grant:?}");

        assert!(!debug.contains(&grant.private_key));
    }
}
