//! Sealpost wire format
//!
//! JSON payloads exchanged between clients, the account service and storage.
//! Binary fields are standard base64, key ids are lowercase hex, field names
//! are camelCase.
//!
//! Payload types hold strings, not keys. Converting into core types
//! (`to_key`, `to_record`, `to_content`, `to_identity`) is where lengths,
//! encodings and KDF strength are validated, so the server can store and relay
//! payloads without parsing them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod encoding;

pub mod conversation;
pub mod error;
pub mod identity;
pub mod message;

pub use conversation::ConversationId;
pub use error::{ProtocolError, Result};
pub use identity::{IdentityGrant, KdfPayload, PublicKeyPayload, VaultPayload};
pub use message::{EncryptedPayload, MessageBody, RecipientEnvelope};
