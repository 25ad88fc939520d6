//! Identity keypairs (RSA-OAEP/SHA-256)
//!
//! One keypair per user, created once at registration. The public half is
//! exported as SubjectPublicKeyInfo DER and may be published freely. The
//! private half is exported as PKCS#8 DER only inside [`Zeroizing`] buffers,
//! for the vault and the one-time login hand-off.

use std::fmt;

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
    traits::PublicKeyParts,
};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{CryptoError, Entropy, envelope::KeyId};

/// Modulus size for newly generated identity keys.
pub const IDENTITY_KEY_BITS: usize = 2048;

/// Public half of an identity keypair.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
    /// SubjectPublicKeyInfo DER, cached for export and fingerprinting
    der: Vec<u8>,
}

impl PublicKey {
    fn from_rsa(inner: RsaPublicKey) -> Result<Self, CryptoError> {
        let der = inner
            .to_public_key_der()
            .map_err(|e| CryptoError::InvalidPublicKey { reason: e.to_string() })?
            .as_bytes()
            .to_vec();
        Ok(Self { inner, der })
    }

    /// Import a public key from SubjectPublicKeyInfo DER.
    ///
    /// # Errors
    ///
    /// - `InvalidPublicKey` if the bytes do not parse or the modulus is
    ///   smaller than [`IDENTITY_KEY_BITS`]
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let inner = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| CryptoError::InvalidPublicKey { reason: e.to_string() })?;

        let bits = inner.n().bits();
        if bits < IDENTITY_KEY_BITS {
            return Err(CryptoError::InvalidPublicKey {
                reason: format!("{bits}-bit modulus is below {IDENTITY_KEY_BITS} bits"),
            });
        }

        Self::from_rsa(inner)
    }

    /// SubjectPublicKeyInfo DER encoding.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    /// SHA-256 fingerprint of the DER encoding.
    pub fn key_id(&self) -> KeyId {
        KeyId::from_bytes(Sha256::digest(&self.der).into())
    }

    pub(crate) fn rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_id", &self.key_id())
            .field("bits", &self.bits())
            .finish()
    }
}

/// Private half of an identity keypair.
///
/// The RSA library zeroizes the key material on drop. `Debug` never prints
/// key material.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    /// Import a private key from PKCS#8 DER.
    ///
    /// Used by the vault after decryption and by clients receiving the login
    /// hand-off. A parse failure is reported as a vault failure so that a
    /// corrupted vault is indistinguishable from a wrong password.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, CryptoError> {
        let inner = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|_| CryptoError::WrongPasswordOrCorruptedVault)?;
        Ok(Self { inner })
    }

    /// PKCS#8 DER encoding, zeroized when dropped.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let document = self
            .inner
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyGeneration { reason: e.to_string() })?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_rsa(self.inner.to_public_key())
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A user's identity keypair.
#[derive(Clone, Debug)]
pub struct IdentityKeypair {
    public: PublicKey,
    private: PrivateKey,
}

impl IdentityKeypair {
    /// Generate a fresh [`IDENTITY_KEY_BITS`]-bit keypair.
    ///
    /// # Errors
    ///
    /// - `KeyGeneration` if the entropy source or the RSA library fails
    pub fn generate<E: Entropy>(entropy: &E) -> Result<Self, CryptoError> {
        Self::generate_with_bits(entropy, IDENTITY_KEY_BITS)
    }

    /// Generate a keypair with an explicit modulus size.
    ///
    /// Sizes below [`IDENTITY_KEY_BITS`] are refused.
    pub fn generate_with_bits<E: Entropy>(entropy: &E, bits: usize) -> Result<Self, CryptoError> {
        if bits < IDENTITY_KEY_BITS {
            return Err(CryptoError::KeyGeneration {
                reason: format!("{bits}-bit modulus is below {IDENTITY_KEY_BITS} bits"),
            });
        }

        let mut rng = entropy
            .csprng()
            .map_err(|e| CryptoError::KeyGeneration { reason: e.to_string() })?;
        let inner = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CryptoError::KeyGeneration { reason: e.to_string() })?;

        let private = PrivateKey { inner };
        let public = private
            .public_key()
            .map_err(|e| CryptoError::KeyGeneration { reason: e.to_string() })?;

        tracing::debug!(key_id = %public.key_id(), bits, "generated identity keypair");

        Ok(Self { public, private })
    }

    /// Rebuild a keypair from its private half.
    pub fn from_private(private: PrivateKey) -> Result<Self, CryptoError> {
        let public = private.public_key()?;
        Ok(Self { public, private })
    }

    /// Public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Fingerprint of the public half.
    pub fn key_id(&self) -> KeyId {
        self.public.key_id()
    }
}
