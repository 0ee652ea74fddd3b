//! Master key derivation and stretching.
//!
//! - PBKDF2-HMAC-SHA256 or Argon2id turn `password + salt` into a 32-byte
//!   [`MasterKey`]. The salt is used exactly as given; lowercasing the
//!   account email is the caller's job (see [`account_salt`]).
//! - The master password hash sent to the server is a single PBKDF2 round
//!   keyed by the master key, salted with the password.
//! - The master key is stretched into a [`SymmetricCryptoKey`] with
//!   HKDF-Expand (no extract step).

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{KEY_LEN, MasterKey, SymmetricCryptoKey};
use crate::primitives;

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 3;
pub const DEFAULT_ARGON2_MEMORY_MIB: u32 = 64;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 4;

/// Prelogin KDF type codes.
pub const KDF_TYPE_PBKDF2: u8 = 0;
pub const KDF_TYPE_ARGON2ID: u8 = 1;

const PASSWORD_HASH_ROUNDS: NonZeroU32 = NonZeroU32::MIN;

/// Account KDF parameters, as announced by the server's prelogin answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KdfParams {
    Pbkdf2 {
        #[serde(default = "default_pbkdf2_iterations")]
        iterations: u32,
    },
    Argon2id {
        #[serde(default = "default_argon2_iterations")]
        iterations: u32,
        #[serde(default = "default_argon2_memory_mib")]
        memory_mib: u32,
        #[serde(default = "default_argon2_parallelism")]
        parallelism: u32,
    },
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::Pbkdf2 {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Map the numeric prelogin fields onto typed parameters.
    ///
    /// Argon2id memory and parallelism fall back to 64 MiB and 4 when the
    /// server leaves them out.
    pub fn from_prelogin(
        kdf_type: u8,
        iterations: u32,
        memory_mib: Option<u32>,
        parallelism: Option<u32>,
    ) -> Result<Self, CryptoError> {
        let params = match kdf_type {
            KDF_TYPE_PBKDF2 => Self::Pbkdf2 { iterations },
            KDF_TYPE_ARGON2ID => Self::Argon2id {
                iterations,
                memory_mib: memory_mib.unwrap_or(DEFAULT_ARGON2_MEMORY_MIB),
                parallelism: parallelism.unwrap_or(DEFAULT_ARGON2_PARALLELISM),
            },
            other => {
                return Err(CryptoError::InvalidKdfParams(format!(
                    "unknown KDF type {other}"
                )));
            }
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject parameter combinations that would silently weaken the key.
    pub fn validate(&self) -> Result<(), CryptoError> {
        match *self {
            Self::Pbkdf2 { iterations } => {
                nonzero(iterations, "PBKDF2 iterations")?;
            }
            Self::Argon2id {
                iterations,
                memory_mib,
                parallelism,
            } => {
                nonzero(iterations, "Argon2id iterations")?;
                nonzero(memory_mib, "Argon2id memory")?;
                nonzero(parallelism, "Argon2id parallelism")?;
                memory_mib.checked_mul(1024).ok_or_else(|| {
                    CryptoError::InvalidKdfParams(format!("Argon2id memory {memory_mib} MiB"))
                })?;
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pbkdf2 { .. } => "pbkdf2",
            Self::Argon2id { .. } => "argon2id",
        }
    }
}

fn nonzero(value: u32, what: &str) -> Result<NonZeroU32, CryptoError> {
    NonZeroU32::new(value)
        .ok_or_else(|| CryptoError::InvalidKdfParams(format!("{what} must be at least 1")))
}

/// Normalize an account email into the KDF salt: trimmed and lowercased.
pub fn account_salt(email: &str) -> String {
    email.trim().to_lowercase()
}

/// PBKDF2-HMAC-SHA256(password, salt, iterations) → 32-byte master key.
pub fn derive_master_key_pbkdf2(
    password: &str,
    salt: &str,
    iterations: u32,
) -> Result<MasterKey, CryptoError> {
    let rounds = nonzero(iterations, "PBKDF2 iterations")?;
    debug!(kdf = "pbkdf2", iterations, "deriving master key");

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    primitives::pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), rounds, &mut *key);
    Ok(MasterKey::new(*key))
}

/// Argon2id master key. The Argon2 salt is `SHA-256(salt)`, not the raw salt.
pub fn derive_master_key_argon2(
    password: &str,
    salt: &str,
    iterations: u32,
    memory_mib: u32,
    parallelism: u32,
) -> Result<MasterKey, CryptoError> {
    KdfParams::Argon2id {
        iterations,
        memory_mib,
        parallelism,
    }
    .validate()?;
    debug!(
        kdf = "argon2id",
        iterations, memory_mib, parallelism, "deriving master key"
    );

    let salt_hash = primitives::sha256(salt.as_bytes());
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    primitives::argon2id(
        password.as_bytes(),
        &salt_hash,
        iterations,
        memory_mib * 1024,
        parallelism,
        &mut *key,
    )?;
    Ok(MasterKey::new(*key))
}

/// Derive the master key with whichever KDF the account uses.
pub fn derive_master_key(
    password: &str,
    salt: &str,
    kdf: &KdfParams,
) -> Result<MasterKey, CryptoError> {
    match *kdf {
        KdfParams::Pbkdf2 { iterations } => derive_master_key_pbkdf2(password, salt, iterations),
        KdfParams::Argon2id {
            iterations,
            memory_mib,
            parallelism,
        } => derive_master_key_argon2(password, salt, iterations, memory_mib, parallelism),
    }
}

/// The value sent to the server instead of the password.
///
/// `PBKDF2-HMAC-SHA256(seed = master_key, salt = password, 1 round)`,
/// standard padded Base64.
pub fn derive_master_password_hash(master_key: &MasterKey, password: &str) -> String {
    let mut hash = Zeroizing::new([0u8; KEY_LEN]);
    primitives::pbkdf2_sha256(
        master_key.as_bytes(),
        password.as_bytes(),
        PASSWORD_HASH_ROUNDS,
        &mut *hash,
    );
    STANDARD.encode(*hash)
}

/// Expand the master key into `enc` and `mac` halves via HKDF-Expand-SHA256.
pub fn stretch_master_key(master_key: &MasterKey) -> Result<SymmetricCryptoKey, CryptoError> {
    let mut enc_key = Zeroizing::new([0u8; KEY_LEN]);
    primitives::hkdf_expand(master_key.as_bytes(), b"enc", &mut *enc_key)?;

    let mut mac_key = Zeroizing::new([0u8; KEY_LEN]);
    primitives::hkdf_expand(master_key.as_bytes(), b"mac", &mut *mac_key)?;

    Ok(SymmetricCryptoKey::new(*enc_key, *mac_key))
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

fn default_argon2_iterations() -> u32 {
    DEFAULT_ARGON2_ITERATIONS
}

fn default_argon2_memory_mib() -> u32 {
    DEFAULT_ARGON2_MEMORY_MIB
}

fn default_argon2_parallelism() -> u32 {
    DEFAULT_ARGON2_PARALLELISM
}
