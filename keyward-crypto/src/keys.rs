//! Key value objects.
//!
//! Key bytes live in `Zeroizing` buffers, so they are scrubbed when the last
//! owner drops them. Neither type implements `Display`, and their `Debug`
//! output is redacted.

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::primitives;

/// Length of a master key, an encryption key and a MAC key.
pub const KEY_LEN: usize = 32;

/// Length of a serialized [`SymmetricCryptoKey`] (`enc_key || mac_key`).
pub const SYMMETRIC_KEY_LEN: usize = 64;

fn key_array(bytes: &[u8]) -> Result<[u8; KEY_LEN], CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyMaterial {
            expected: KEY_LEN,
            actual: bytes.len(),
        })
}

/// A 32-byte key derived from the master password and account salt.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self::new(key_array(bytes)?))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([redacted])")
    }
}

/// An encryption key and a MAC key, both exactly 32 bytes.
///
/// Immutable once built, so a single instance can be shared across threads
/// by reference.
#[derive(Clone)]
pub struct SymmetricCryptoKey {
    enc_key: Zeroizing<[u8; KEY_LEN]>,
    mac_key: Zeroizing<[u8; KEY_LEN]>,
}

impl SymmetricCryptoKey {
    pub fn new(enc_key: [u8; KEY_LEN], mac_key: [u8; KEY_LEN]) -> Self {
        Self {
            enc_key: Zeroizing::new(enc_key),
            mac_key: Zeroizing::new(mac_key),
        }
    }

    /// Build from separate encryption and MAC key slices.
    pub fn from_parts(enc_key: &[u8], mac_key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self::new(key_array(enc_key)?, key_array(mac_key)?))
    }

    /// Split 64 bytes: `[0, 32)` is the encryption key, `[32, 64)` the MAC key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SYMMETRIC_KEY_LEN {
            return Err(CryptoError::InvalidKeyMaterial {
                expected: SYMMETRIC_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Self::from_parts(&bytes[..KEY_LEN], &bytes[KEY_LEN..])
    }

    /// A fresh random key pair.
    pub fn generate() -> Self {
        Self::new(primitives::random_bytes(), primitives::random_bytes())
    }

    pub fn enc_key(&self) -> &[u8; KEY_LEN] {
        &self.enc_key
    }

    pub fn mac_key(&self) -> &[u8; KEY_LEN] {
        &self.mac_key
    }

    /// `enc_key || mac_key`.
    pub fn to_bytes(&self) -> Zeroizing<[u8; SYMMETRIC_KEY_LEN]> {
        let mut out = Zeroizing::new([0u8; SYMMETRIC_KEY_LEN]);
        out[..KEY_LEN].copy_from_slice(&*self.enc_key);
        out[KEY_LEN..].copy_from_slice(&*self.mac_key);
        out
    }
}

// Plain value equality; MAC checks never go through here.
impl PartialEq for SymmetricCryptoKey {
    fn eq(&self, other: &Self) -> bool {
        *self.enc_key == *other.enc_key && *self.mac_key == *other.mac_key
    }
}

impl Eq for SymmetricCryptoKey {}

impl std::fmt::Debug for SymmetricCryptoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricCryptoKey([redacted])")
    }
}
