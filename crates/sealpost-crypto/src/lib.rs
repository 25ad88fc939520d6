//! Sealpost Cryptographic Primitives
//!
//! Hybrid end-to-end encryption for messages and posts. The server and the
//! storage layer only ever see ciphertext, envelopes and password-locked
//! vaults.
//!
//! # Key Lifecycle
//!
//! ```text
//! Registration
//!        │
//!        ▼
//! RSA-2048 Identity Keypair ──► public key published
//!        │
//!        ▼ PBKDF2(password) + AES-256-GCM
//! Vault {ciphertext, salt, iv, kdf} ──► stored server-side
//!
//! Sending
//!        │
//!        ▼
//! Session Key (256-bit, per conversation, memory only)
//!        ├──► AES-256-GCM seal ──► {ciphertext, iv, tag}
//!        └──► RSA-OAEP wrap per recipient ──► {recipient key id → envelope}
//! ```
//!
//! # Security
//!
//! Confidentiality:
//! - Content keys never leave client memory unwrapped
//! - The private key is stored only inside the vault
//!
//! Integrity:
//! - AES-GCM tags are verified before any plaintext is released
//! - Vault tampering is indistinguishable from a wrong password
//!
//! Nonce safety:
//! - IVs are drawn inside the AEAD helper on every seal and cannot be supplied
//!   by callers
//!
//! Not provided: per-message forward secrecy, identity key rotation,
//! multi-device key sync.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod aead;
pub mod cipher;
pub mod content;
pub mod entropy;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod kdf;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod vault;

pub use aead::{IV_LEN, KEY_LEN, TAG_LEN};
pub use cipher::{MAX_CONTENT_LEN, SESSION_KEY_LEN, SealedContent, SessionKey, open, seal};
pub use content::EncryptedContent;
pub use entropy::{Entropy, OsEntropy};
pub use envelope::{Envelope, EnvelopeSet, KeyId, unwrap, wrap};
pub use error::CryptoError;
pub use identity::{IDENTITY_KEY_BITS, IdentityKeypair, PrivateKey, PublicKey};
pub use kdf::{KdfHash, KdfParams, MIN_ITERATIONS, SALT_LEN};
pub use vault::{VaultRecord, lock, rewrap, unlock};
