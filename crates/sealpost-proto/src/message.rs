//! Message, post and comment bodies.
//!
//! A body is exactly one of two shapes, discriminated by `kind`:
//!
//! ```json
//! {"kind": "plaintext", "content": "hello"}
//!
//! {"kind": "encrypted",
//!  "contentCiphertext": "<base64>", "iv": "<base64>", "authTag": "<base64>",
//!  "sessionKeyEnvelopes": [{"recipientKeyId": "<hex>", "envelope": "<base64>"}]}
//! ```
//!
//! Storage and the server treat the encrypted fields as opaque strings; only
//! clients convert them into [`EncryptedContent`].

use sealpost_crypto::{EncryptedContent, Envelope, EnvelopeSet, IV_LEN, SealedContent, TAG_LEN};
use serde::{Deserialize, Serialize};

use crate::{
    encoding::{decode, decode_array, decode_key_id, encode},
    error::{ProtocolError, Result},
};

/// Body of a message, post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    /// Unencrypted content (public posts)
    Plaintext {
        /// UTF-8 text
        content: String,
    },
    /// End-to-end encrypted content
    Encrypted(EncryptedPayload),
}

impl MessageBody {
    /// Plaintext body.
    pub fn plaintext(content: impl Into<String>) -> Self {
        Self::Plaintext { content: content.into() }
    }

    /// Encrypted body for `content`.
    pub fn encrypted(content: &EncryptedContent) -> Self {
        Self::Encrypted(EncryptedPayload::from_content(content))
    }

    /// Parse a JSON body.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// True for the encrypted shape.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

/// Wire form of [`EncryptedContent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    /// base64 AES-GCM ciphertext without the tag
    pub content_ciphertext: String,
    /// base64 12-byte IV
    pub iv: String,
    /// base64 16-byte authentication tag
    pub auth_tag: String,
    /// Session key wrapped for each recipient
    pub session_key_envelopes: Vec<RecipientEnvelope>,
}

/// Session key envelope addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientEnvelope {
    /// Hex key id of the recipient public key
    pub recipient_key_id: String,
    /// base64 RSA-OAEP ciphertext of the session key
    pub envelope: String,
}

impl EncryptedPayload {
    /// Encode `content`. Envelopes are listed in key id order.
    pub fn from_content(content: &EncryptedContent) -> Self {
        let sealed = &content.sealed;
        Self {
            content_ciphertext: encode(sealed.ciphertext()),
            iv: encode(sealed.iv()),
            auth_tag: encode(sealed.auth_tag()),
            session_key_envelopes: content
                .envelopes
                .iter()
                .map(|(recipient, envelope)| RecipientEnvelope {
                    recipient_key_id: recipient.to_hex(),
                    envelope: encode(envelope.as_bytes()),
                })
                .collect(),
        }
    }

    /// Decode into content ready for decryption.
    ///
    /// # Errors
    ///
    /// - `InvalidBase64` / `InvalidHex` / `InvalidLength` for malformed fields
    /// - `DuplicateRecipient` if two envelopes address the same key id
    pub fn to_content(&self) -> Result<EncryptedContent> {
        let sealed = SealedContent::from_parts(
            decode("contentCiphertext", &self.content_ciphertext)?,
            decode_array::<IV_LEN>("iv", &self.iv)?,
            decode_array::<TAG_LEN>("authTag", &self.auth_tag)?,
        );

        let mut envelopes = EnvelopeSet::new();
        for entry in &self.session_key_envelopes {
            let recipient = decode_key_id("recipientKeyId", &entry.recipient_key_id)?;
            let envelope = Envelope::from_bytes(decode("envelope", &entry.envelope)?);
            if envelopes.insert(recipient, envelope).is_some() {
                return Err(ProtocolError::DuplicateRecipient {
                    recipient: entry.recipient_key_id.clone(),
                });
            }
        }

        Ok(EncryptedContent { sealed, envelopes })
    }
}
