//! Session key envelopes (RSA-OAEP/SHA-256)
//!
//! An envelope is a session key encrypted to exactly one recipient public
//! key. Content addressed to several readers carries an [`EnvelopeSet`]: one
//! envelope per recipient, keyed by the recipient's [`KeyId`].

use std::{collections::BTreeMap, fmt};

use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    CryptoError, Entropy,
    cipher::SessionKey,
    identity::{IdentityKeypair, PrivateKey, PublicKey},
};

/// SHA-256 fingerprint of a public key's SubjectPublicKeyInfo DER.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId([u8; 32]);

impl KeyId {
    /// Wrap raw fingerprint bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty for logs
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({self})")
    }
}

/// Opaque RSA-OAEP ciphertext of one session key.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope(Vec<u8>);

impl Envelope {
    /// Wrap envelope bytes received from the wire.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Envelope bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Envelope({} bytes)", self.0.len())
    }
}

/// Encrypt `session_key` so that only the holder of `recipient`'s private key
/// can recover it.
pub fn wrap<E: Entropy>(
    session_key: &SessionKey,
    recipient: &PublicKey,
    entropy: &E,
) -> Result<Envelope, CryptoError> {
    let mut rng = entropy.csprng()?;
    let ciphertext = recipient
        .rsa()
        .encrypt(&mut rng, Oaep::new::<Sha256>(), session_key.as_bytes())
        .map_err(|e| CryptoError::EnvelopeEncryption { reason: e.to_string() })?;

    Ok(Envelope(ciphertext))
}

/// Recover the session key from an envelope addressed to `own`.
///
/// # Errors
///
/// - `EnvelopeDecryption` if the envelope was made for another key, was
///   corrupted, or does not hold a 256-bit key
pub fn unwrap(envelope: &Envelope, own: &PrivateKey) -> Result<SessionKey, CryptoError> {
    let plaintext = Zeroizing::new(
        own.rsa()
            .decrypt(Oaep::new::<Sha256>(), &envelope.0)
            .map_err(|_| CryptoError::EnvelopeDecryption)?,
    );

    SessionKey::from_bytes(&plaintext).map_err(|_| CryptoError::EnvelopeDecryption)
}

/// Envelopes for every recipient of one piece of content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvelopeSet {
    envelopes: BTreeMap<KeyId, Envelope>,
}

impl EnvelopeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `session_key` once for each recipient.
    ///
    /// Recipients that appear more than once get a single envelope.
    pub fn wrap_for<E: Entropy>(
        session_key: &SessionKey,
        recipients: &[PublicKey],
        entropy: &E,
    ) -> Result<Self, CryptoError> {
        let mut set = Self::new();
        for recipient in recipients {
            let key_id = recipient.key_id();
            if set.envelopes.contains_key(&key_id) {
                continue;
            }
            set.envelopes.insert(key_id, wrap(session_key, recipient, entropy)?);
        }
        Ok(set)
    }

    /// Add or replace the envelope for `recipient`.
    pub fn insert(&mut self, recipient: KeyId, envelope: Envelope) -> Option<Envelope> {
        self.envelopes.insert(recipient, envelope)
    }

    /// Envelope addressed to `recipient`, if any.
    pub fn get(&self, recipient: &KeyId) -> Option<&Envelope> {
        self.envelopes.get(recipient)
    }

    /// Check whether `recipient` has an envelope.
    pub fn contains(&self, recipient: &KeyId) -> bool {
        self.envelopes.contains_key(recipient)
    }

    /// Recover the session key using the envelope addressed to `own`.
    ///
    /// # Errors
    ///
    /// - `MissingEnvelope` if no envelope targets `own`
    /// - `EnvelopeDecryption` if that envelope cannot be opened
    pub fn unwrap_for(&self, own: &IdentityKeypair) -> Result<SessionKey, CryptoError> {
        let key_id = own.key_id();
        let envelope =
            self.envelopes.get(&key_id).ok_or(CryptoError::MissingEnvelope { recipient: key_id })?;
        unwrap(envelope, own.private_key())
    }

    /// Number of recipients.
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// True if no recipient has an envelope.
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Iterate `(recipient, envelope)` pairs in key id order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyId, &Envelope)> {
        self.envelopes.iter()
    }
}
