//! Account unlock composition.
//!
//! Ties the KDF and the cipher together the way a login does:
//! prelogin KDF → master key → password hash (sent to the server) and
//! stretched key (kept locally) → protected user key unwrapped into the
//! working vault key.

use tracing::debug;

use crate::cipher;
use crate::error::CryptoError;
use crate::kdf::{self, KdfParams};
use crate::keys::SymmetricCryptoKey;

/// What a successful key derivation leaves behind.
///
/// The master key itself is dropped (and zeroed) inside [`Self::derive`];
/// only the server-facing hash and the stretched key survive.
pub struct LoginCredentials {
    password_hash: String,
    stretched_key: SymmetricCryptoKey,
}

impl LoginCredentials {
    /// Derive credentials for `email` with the account's KDF.
    ///
    /// The email is normalized with [`kdf::account_salt`] before use.
    pub fn derive(password: &str, email: &str, kdf: &KdfParams) -> Result<Self, CryptoError> {
        let salt = kdf::account_salt(email);
        let master_key = kdf::derive_master_key(password, &salt, kdf)?;
        let password_hash = kdf::derive_master_password_hash(&master_key, password);
        let stretched_key = kdf::stretch_master_key(&master_key)?;
        debug!(kdf = kdf.kind(), "derived login credentials");
        Ok(Self {
            password_hash,
            stretched_key,
        })
    }

    /// Base64 master password hash for the token request.
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn stretched_key(&self) -> &SymmetricCryptoKey {
        &self.stretched_key
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("password_hash", &"[redacted]")
            .field("stretched_key", &self.stretched_key)
            .finish()
    }
}

/// Unwrap the server-delivered protected key into the vault's user key.
pub fn unlock_user_key(
    credentials: &LoginCredentials,
    protected_key: &str,
) -> Result<SymmetricCryptoKey, CryptoError> {
    let user_key = cipher::decrypt_symmetric_key(protected_key, credentials.stretched_key())
        .inspect_err(|e| debug!(error = e.kind(), "failed to unwrap user key"))?;
    debug!("user key unlocked");
    Ok(user_key)
}

/// Wrap `user_key` under a stretched key, e.g. after a password change.
pub fn protect_user_key(
    stretched_key: &SymmetricCryptoKey,
    user_key: &SymmetricCryptoKey,
) -> Result<String, CryptoError> {
    cipher::encrypt_symmetric_key(user_key, stretched_key)
}

/// A new random 64-byte user key.
pub fn generate_symmetric_key() -> SymmetricCryptoKey {
    SymmetricCryptoKey::generate()
}
