//! Client
//!
//! Per-login client for Sealpost end-to-end encryption. Holds the identity
//! unlocked at login, caches one session key per conversation, and turns
//! send/receive intents into encrypted bodies and readable text.
//!
//! # Architecture
//!
//! The client is I/O free. It receives events ([`ClientEvent`]), processes
//! them against its identity and session key store, and returns actions
//! ([`ClientAction`]) for the caller to execute. The direct methods
//! ([`Client::encrypt`], [`Client::decrypt`], [`Client::read`]) are available
//! for callers that do not need the event loop.
//!
//! # Components
//!
//! - [`Client`]: Identity plus session keys for one login session
//! - [`SessionKeyStore`]: Per-conversation session key cache
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;
mod session_key_store;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
pub use sealpost_crypto::{Entropy, OsEntropy};
pub use sealpost_proto::{ConversationId, MessageBody};
pub use session_key_store::SessionKeyStore;
