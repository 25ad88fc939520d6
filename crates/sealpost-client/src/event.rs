//! Client events and actions.

use sealpost_crypto::PublicKey;
use sealpost_proto::{ConversationId, MessageBody};

use crate::error::ClientError;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Looking up recipient public keys in the directory
/// - Fetching stored message bodies for a conversation
/// - Forwarding application intents (send, forget)
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Application wants to send an encrypted message.
    SendMessage {
        /// Target conversation.
        conversation: ConversationId,
        /// Message plaintext.
        plaintext: Vec<u8>,
        /// Public keys of everyone who should be able to read it.
        recipients: Vec<PublicKey>,
    },

    /// Stored message bodies arrived for a conversation.
    ///
    /// Each body is handled on its own; one bad message never hides the
    /// rest.
    MessagesReceived {
        /// Conversation the bodies belong to.
        conversation: ConversationId,
        /// Bodies in display order.
        bodies: Vec<MessageBody>,
    },

    /// Application is done with a conversation; drop its session key.
    ForgetConversation {
        /// Conversation to forget.
        conversation: ConversationId,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone)]
pub enum ClientAction {
    /// Store or relay an encrypted body.
    Publish {
        /// Conversation the body belongs to.
        conversation: ConversationId,
        /// Encrypted body ready for the wire.
        body: MessageBody,
    },

    /// Deliver readable content to the application layer.
    DeliverMessage {
        /// Conversation the message is from.
        conversation: ConversationId,
        /// Position in the received batch.
        index: usize,
        /// Message text.
        text: String,
    },

    /// A received message could not be read.
    ///
    /// The application shows a placeholder for it.
    MessageRejected {
        /// Conversation the message is from.
        conversation: ConversationId,
        /// Position in the received batch.
        index: usize,
        /// Why the message could not be read.
        error: ClientError,
    },
}
