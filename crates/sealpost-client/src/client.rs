//! Client state machine.
//!
//! The `Client` owns the unlocked identity for one login session and the
//! session key store, and turns send/receive intents into encrypted bodies
//! and readable text.

use sealpost_crypto::{
    CryptoError, EncryptedContent, Entropy, EnvelopeSet, IdentityKeypair, PublicKey, SessionKey,
    open, seal,
};
use sealpost_proto::{ConversationId, MessageBody};

use crate::{
    error::ClientError,
    event::{ClientAction, ClientEvent},
    session_key_store::SessionKeyStore,
};

/// Client behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Also wrap each session key for the sender's own public key.
    ///
    /// Off by default: the sender reads its own messages from the session
    /// key cache and loses them after a restart. Turning it on lets the
    /// sender recover its keys from envelopes like any other recipient.
    pub wrap_for_self: bool,
}

/// Client for one login session.
pub struct Client<E: Entropy> {
    /// Randomness for session keys, IVs and OAEP padding.
    entropy: E,

    /// Identity unlocked from the vault at login.
    identity: IdentityKeypair,

    /// Behaviour switches.
    config: ClientConfig,

    /// Per-conversation session keys.
    sessions: SessionKeyStore<E>,
}

impl<E: Entropy> Client<E> {
    /// Create a client for an unlocked identity.
    pub fn new(entropy: E, identity: IdentityKeypair, config: ClientConfig) -> Self {
        let sessions = SessionKeyStore::new(entropy.clone());
        Self { entropy, identity, config, sessions }
    }

    /// This client's public key.
    pub fn public_key(&self) -> &PublicKey {
        self.identity.public_key()
    }

    /// Session key store for this client.
    pub fn sessions(&self) -> &SessionKeyStore<E> {
        &self.sessions
    }

    /// Process an event and return actions for the caller.
    ///
    /// Received messages never fail the whole event; each unreadable body
    /// becomes a `MessageRejected` action.
    pub fn handle(&self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::SendMessage { conversation, plaintext, recipients } => {
                let content = self.encrypt(&conversation, &plaintext, &recipients)?;
                let body = MessageBody::encrypted(&content);
                Ok(vec![ClientAction::Publish { conversation, body }])
            },
            ClientEvent::MessagesReceived { conversation, bodies } => {
                let results = self.decrypt_all(&conversation, &bodies);
                let actions = results
                    .into_iter()
                    .enumerate()
                    .map(|(index, result)| {
                        let conversation = conversation.clone();
                        match result {
                            Ok(text) => ClientAction::DeliverMessage { conversation, index, text },
                            Err(error) => {
                                ClientAction::MessageRejected { conversation, index, error }
                            },
                        }
                    })
                    .collect();
                Ok(actions)
            },
            ClientEvent::ForgetConversation { conversation } => {
                self.forget_conversation(&conversation);
                Ok(Vec::new())
            },
        }
    }

    /// Encrypt `plaintext` for `recipients` under the conversation's session
    /// key.
    ///
    /// The sender's own key is skipped unless `wrap_for_self` is set, in which
    /// case it is always included. Repeated recipients get one envelope.
    ///
    /// # Errors
    ///
    /// - `NoRecipients` if nobody would receive an envelope
    /// - `ContentTooLarge` if `plaintext` exceeds the content limit
    /// - `EntropyUnavailable` / `EnvelopeEncryption` on primitive failure
    pub fn encrypt(
        &self,
        conversation: &ConversationId,
        plaintext: &[u8],
        recipients: &[PublicKey],
    ) -> Result<EncryptedContent, ClientError> {
        let own = self.identity.key_id();
        let mut targets: Vec<PublicKey> =
            recipients.iter().filter(|key| key.key_id() != own).cloned().collect();
        if targets.is_empty() && !self.config.wrap_for_self {
            return Err(ClientError::NoRecipients { conversation: conversation.clone() });
        }
        if self.config.wrap_for_self {
            targets.push(self.identity.public_key().clone());
        }

        let key = self.sessions.get_or_create(conversation)?;
        let sealed = seal(plaintext, &key, &self.entropy)?;
        let envelopes = EnvelopeSet::wrap_for(&key, &targets, &self.entropy)?;

        tracing::debug!(%conversation, recipients = envelopes.len(), "encrypted message");
        Ok(EncryptedContent { sealed, envelopes })
    }

    /// Decrypt `content` received in `conversation`.
    ///
    /// Uses the envelope addressed to this client when there is one, and the
    /// cached session key otherwise (the sender reading its own message). A
    /// key recovered from an envelope is cached once the content verifies.
    ///
    /// # Errors
    ///
    /// - `MissingEnvelope` if there is neither an envelope nor a cached key
    /// - `EnvelopeDecryption` if the envelope cannot be opened
    /// - `AuthenticationFailure` if the content does not verify
    pub fn decrypt(
        &self,
        conversation: &ConversationId,
        content: &EncryptedContent,
    ) -> Result<Vec<u8>, ClientError> {
        let own = self.identity.key_id();

        if content.envelopes.contains(&own) {
            let key = content.envelopes.unwrap_for(&self.identity)?;
            let plaintext = open(&content.sealed, &key)?;
            self.sessions.adopt(conversation, key);
            return Ok(plaintext);
        }

        let key: SessionKey = self
            .sessions
            .get(conversation)
            .ok_or(CryptoError::MissingEnvelope { recipient: own })?;
        Ok(open(&content.sealed, &key)?)
    }

    /// Read a message body as text.
    ///
    /// Plaintext bodies are returned as-is; encrypted bodies are decoded and
    /// decrypted.
    pub fn read(
        &self,
        conversation: &ConversationId,
        body: &MessageBody,
    ) -> Result<String, ClientError> {
        match body {
            MessageBody::Plaintext { content } => Ok(content.clone()),
            MessageBody::Encrypted(payload) => {
                let content = payload.to_content()?;
                let plaintext = self.decrypt(conversation, &content)?;
                String::from_utf8(plaintext).map_err(|_| ClientError::NotUtf8)
            },
        }
    }

    /// Read every body in a conversation, one result per body.
    pub fn decrypt_all(
        &self,
        conversation: &ConversationId,
        bodies: &[MessageBody],
    ) -> Vec<Result<String, ClientError>> {
        bodies
            .iter()
            .map(|body| {
                let result = self.read(conversation, body);
                if let Err(error) = &result {
                    tracing::debug!(%conversation, %error, "message unreadable");
                }
                result
            })
            .collect()
    }

    /// Drop the cached session key for `conversation`.
    ///
    /// The next send starts a fresh key; earlier messages remain readable
    /// only through envelopes.
    pub fn forget_conversation(&self, conversation: &ConversationId) {
        if self.sessions.evict(conversation) {
            tracing::debug!(%conversation, "evicted session key");
        }
    }
}

#[cfg(test)]
mod tests {
    use sealpost_crypto::{
        OsEntropy, SealedContent,
        test_utils::{alice, bob, carol},
    };

    use super::*;

    fn client(identity: &IdentityKeypair) -> Client<OsEntropy> {
        Client::new(OsEntropy, identity.clone(), ClientConfig::default())
    }

    fn c1() -> ConversationId {
        ConversationId::from("c1")
    }

    #[test]
    fn envelopes_skip_the_sender() {
        let sender = client(alice());
        let recipients = [alice().public_key().clone(), bob().public_key().clone()];

        let content = sender.encrypt(&c1(), b"hi", &recipients).unwrap();

        assert_eq!(content.envelopes.len(), 1);
        assert!(content.envelopes.contains(&bob().key_id()));
        assert!(!content.envelopes.contains(&alice().key_id()));
    }

    #[test]
    fn encrypting_to_self_only_is_rejected() {
        let sender = client(alice());

        let result = sender.encrypt(&c1(), b"hi", &[alice().public_key().clone()]);

        assert_eq!(result, Err(ClientError::NoRecipients { conversation: c1() }));
        assert!(sender.sessions().is_empty());
    }

    #[test]
    fn wrap_for_self_adds_own_envelope() {
        let sender = Client::new(
            OsEntropy,
            alice().clone(),
            ClientConfig { wrap_for_self: true },
        );

        let content = sender.encrypt(&c1(), b"hi", &[bob().public_key().clone()]).unwrap();

        assert_eq!(content.envelopes.len(), 2);
        assert!(content.envelopes.contains(&alice().key_id()));
    }

    #[test]
    fn same_conversation_reuses_session_key() {
        let sender = client(alice());
        let recipients = [bob().public_key().clone()];

        sender.encrypt(&c1(), b"one", &recipients).unwrap();
        sender.encrypt(&c1(), b"two", &recipients).unwrap();
        sender.encrypt(&ConversationId::from("c2"), b"three", &recipients).unwrap();

        assert_eq!(sender.sessions().len(), 2);
    }

    #[test]
    fn sender_reads_own_message_from_cache() {
        let sender = client(alice());
        let content = sender.encrypt(&c1(), b"hello", &[bob().public_key().clone()]).unwrap();

        assert_eq!(sender.decrypt(&c1(), &content).unwrap(), b"hello");
    }

    #[test]
    fn outsider_gets_missing_envelope() {
        let sender = client(alice());
        let outsider = client(carol());
        let content = sender.encrypt(&c1(), b"hello", &[bob().public_key().clone()]).unwrap();

        assert_eq!(
            outsider.decrypt(&c1(), &content),
            Err(ClientError::Crypto(CryptoError::MissingEnvelope { recipient: carol().key_id() }))
        );
    }

    #[test]
    fn tampered_content_is_not_adopted() {
        let sender = client(alice());
        let receiver = client(bob());
        let content = sender.encrypt(&c1(), b"hello", &[bob().public_key().clone()]).unwrap();

        let mut tag = *content.sealed.auth_tag();
        tag[0] ^= 0x80;
        let tampered = EncryptedContent {
            sealed: SealedContent::from_parts(
                content.sealed.ciphertext().to_vec(),
                *content.sealed.iv(),
                tag,
            ),
            envelopes: content.envelopes.clone(),
        };

        assert_eq!(
            receiver.decrypt(&c1(), &tampered),
            Err(ClientError::Crypto(CryptoError::AuthenticationFailure))
        );
        assert!(receiver.sessions().is_empty());
    }

    #[test]
    fn read_plaintext_body() {
        let reader = client(bob());
        let body = MessageBody::plaintext("public post");

        assert_eq!(reader.read(&c1(), &body).unwrap(), "public post");
    }

    #[test]
    fn read_rejects_non_utf8() {
        let sender = client(alice());
        let receiver = client(bob());
        let content =
            sender.encrypt(&c1(), &[0xFF, 0xFE, 0xFD], &[bob().public_key().clone()]).unwrap();

        let result = receiver.read(&c1(), &MessageBody::encrypted(&content));
        assert_eq!(result, Err(ClientError::NotUtf8));
    }

    #[test]
    fn handle_send_produces_encrypted_publish() {
        let sender = client(alice());

        let actions = sender
            .handle(ClientEvent::SendMessage {
                conversation: c1(),
                plaintext: b"hello".to_vec(),
                recipients: vec![bob().public_key().clone()],
            })
            .unwrap();

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            ClientAction::Publish { body, .. } if body.is_encrypted()
        ));
    }

    #[test]
    fn handle_forget_evicts() {
        let sender = client(alice());
        sender.encrypt(&c1(), b"hi", &[bob().public_key().clone()]).unwrap();

        let actions =
            sender.handle(ClientEvent::ForgetConversation { conversation: c1() }).unwrap();

        assert!(actions.is_empty());
        assert!(sender.sessions().get(&c1()).is_none());
    }
}
