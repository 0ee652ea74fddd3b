//! Vault record decoding on top of `keyward-crypto`.
//!
//! Turns server sync responses into decrypted records, one field at a time,
//! so a single corrupt field never makes a whole entry unreadable, and
//! encrypts records and new Sends back into the same shapes for upload.
//!
//! # Architecture
//!
//! - **`api`**: serde shapes of cipher, folder and Send responses
//! - **`decoder`**: `CipherDecoder` and per-item key resolution
//! - **`encoder`**: `CipherEncoder`, the inverse, with optional per-item keys
//! - **`records`**: decrypted Login, Card, Identity, SecureNote, field and folder types
//! - **`keyring`**: user key plus organization keys, batch decoding
//! - **`send`**: decrypted Send records, new text Sends and share links
//!
//! # Usage
//!
//! ```rust,ignore
//! use keyward_vault::{KeyRing, api};
//!
//! let sync = api::parse_sync_json(&body)?;
//! let ring = KeyRing::new(user_key);
//! for item in ring.decrypt_ciphers(&sync.ciphers) {
//!     println!("{} ({})", item.name, item.cipher_type.as_str());
//! }
//! ```

pub mod api;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod keyring;
pub mod records;
pub mod send;

pub use api::parse_ciphers_json;
pub use decoder::CipherDecoder;
pub use encoder::CipherEncoder;
pub use error::VaultError;
pub use keyring::KeyRing;
pub use records::{
    CipherType, DecryptedCard, DecryptedCipher, DecryptedField, DecryptedFolder,
    DecryptedIdentity, DecryptedLogin, DecryptedSecureNote, DecryptedUri, FieldType,
};
pub use send::{DecryptedSend, NewTextSend, SendType, TextSendPayload};
