//! Bitwarden-compatible crypto core.
//!
//! Reproduces the Bitwarden key-derivation and CipherString protocol so that
//! data written by the official clients can be read here and vice versa.
//! Every operation is a synchronous pure function over caller-supplied keys
//! and values; nothing here does I/O or holds state.
//!
//! # Architecture
//!
//! - **`primitives`**: thin adapter over PBKDF2, Argon2id, HKDF, HMAC-SHA256, AES-256-CBC and the CSPRNG
//! - **`keys`**: `MasterKey` and `SymmetricCryptoKey` value objects (zeroized on drop)
//! - **`kdf`**: master key derivation, master password hash, key stretching
//! - **`cipher_string`**: `type.iv|data|mac` parsing and serialization
//! - **`cipher`**: MAC-then-decrypt, encrypt, symmetric key wrap/unwrap
//! - **`send`**: Send key material and key derivation, access password hash,
//!   new text Sends, share links
//! - **`account`**: login credential derivation and user key unlock
//! - **`config`**: TOML defaults for the KDF and parse limits
//!
//! # Usage
//!
//! ```rust,ignore
//! use keyward_crypto::{KdfParams, LoginCredentials, account, cipher};
//!
//! let kdf = KdfParams::from_prelogin(0, 600_000, None, None)?;
//! let creds = LoginCredentials::derive("master password", "user@example.com", &kdf)?;
//! // send creds.password_hash() to the server, receive the protected key
//! let user_key = account::unlock_user_key(&creds, &protected_key)?;
//! let name = cipher::decrypt_to_string(&encrypted_name, &user_key)?;
//! ```

pub mod account;
pub mod cipher;
pub mod cipher_string;
pub mod config;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod primitives;
pub mod send;

pub use account::LoginCredentials;
pub use cipher_string::{CipherString, EncryptionType, ParseLimits};
pub use config::CryptoConfig;
pub use error::CryptoError;
pub use kdf::KdfParams;
pub use keys::{MasterKey, SymmetricCryptoKey};
pub use send::{ProtectedTextSend, SendKeyMaterial};
