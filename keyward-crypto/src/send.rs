//! Keys for shareable Send links.
//!
//! Each Send has 16 random bytes of key material. The link carries that
//! material; the encryption key is derived from it with
//! `HKDF(salt = "bitwarden-send", info = "send")`, and an optional access
//! password is checked through a 100 000-round PBKDF2 hash.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use zeroize::Zeroizing;

use crate::cipher;
use crate::error::CryptoError;
use crate::keys::{KEY_LEN, SYMMETRIC_KEY_LEN, SymmetricCryptoKey};
use crate::primitives;

pub const SEND_KEY_MATERIAL_LEN: usize = 16;

const SEND_KEY_SALT: &[u8] = b"bitwarden-send";
const SEND_KEY_INFO: &[u8] = b"send";
const SEND_PASSWORD_ROUNDS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => unreachable!(),
};

const SEND_HOST_US: &str = "https://send.bitwarden.com/#/send/";
const SEND_HOST_EU: &str = "https://send.bitwarden.eu/#/send/";

/// The 16 raw bytes behind a Send link.
#[derive(Clone)]
pub struct SendKeyMaterial(Zeroizing<[u8; SEND_KEY_MATERIAL_LEN]>);

impl SendKeyMaterial {
    pub fn generate() -> Self {
        Self(Zeroizing::new(primitives::random_bytes()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SEND_KEY_MATERIAL_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyMaterial {
                    expected: SEND_KEY_MATERIAL_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(Zeroizing::new(array)))
    }

    /// Read the key segment of a share link (URL-safe Base64, unpadded).
    pub fn from_url_fragment(fragment: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(fragment.trim().trim_end_matches('='))
                .map_err(|e| {
                    CryptoError::DecryptionFailed(format!("send link key is not base64: {e}"))
                })?,
        );
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEND_KEY_MATERIAL_LEN] {
        &self.0
    }

    /// Standard padded Base64, the form stored (encrypted) on the server.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(*self.0))
    }

    pub fn to_url_fragment(&self) -> String {
        URL_SAFE_NO_PAD.encode(*self.0)
    }
}

impl std::fmt::Debug for SendKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SendKeyMaterial([redacted])")
    }
}

pub fn generate_send_key_material() -> SendKeyMaterial {
    SendKeyMaterial::generate()
}

/// HKDF extract-then-expand to 64 bytes, split into enc and mac halves.
pub fn derive_send_key(material: &SendKeyMaterial) -> Result<SymmetricCryptoKey, CryptoError> {
    let mut full = Zeroizing::new([0u8; SYMMETRIC_KEY_LEN]);
    primitives::hkdf(material.as_bytes(), SEND_KEY_SALT, SEND_KEY_INFO, &mut *full)?;
    SymmetricCryptoKey::from_parts(&full[..KEY_LEN], &full[KEY_LEN..])
}

/// `PBKDF2-HMAC-SHA256(seed = password, salt = key material, 100 000 rounds)`,
/// standard Base64.
pub fn hash_send_password(password: &str, material: &SendKeyMaterial) -> String {
    let mut hash = Zeroizing::new([0u8; KEY_LEN]);
    primitives::pbkdf2_sha256(
        password.as_bytes(),
        material.as_bytes(),
        SEND_PASSWORD_ROUNDS,
        &mut *hash,
    );
    STANDARD.encode(*hash)
}

/// Encrypt the key material for storage on the server.
///
/// The plaintext is the material's Base64 text, not its raw bytes.
pub fn protect_send_key(
    material: &SendKeyMaterial,
    user_key: &SymmetricCryptoKey,
) -> Result<String, CryptoError> {
    cipher::encrypt_string(&material.to_base64(), user_key)
}

/// Inverse of [`protect_send_key`].
pub fn unprotect_send_key(
    protected: &str,
    user_key: &SymmetricCryptoKey,
) -> Result<SendKeyMaterial, CryptoError> {
    let encoded = crate::CipherString::parse(protected)?.decrypt_to_zeroizing_string(user_key)?;
    let bytes = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::DecryptionFailed(format!("send key is not base64: {e}")))?,
    );
    SendKeyMaterial::from_slice(&bytes)
}

/// Build the link a recipient opens: `<base><access_id>/<key>`.
///
/// Official servers map to their dedicated Send hosts; self-hosted servers
/// get `<server>/#/send/`.
pub fn share_url(server_url: &str, access_id: &str, material: &SendKeyMaterial) -> String {
    let base = send_base_url(server_url);
    let key = material.to_url_fragment();
    if access_id.trim().is_empty() {
        format!("{base}/{key}")
    } else {
        format!("{base}{access_id}/{key}")
    }
}

/// Encrypted fields of a new text Send, ready for a create request.
pub struct ProtectedTextSend {
    /// Key material, encrypted under the user key.
    pub key: String,
    pub name: String,
    pub notes: Option<String>,
    pub text: String,
    /// `None` when no access password was set.
    pub password_hash: Option<String>,
    /// Standard Base64 of the key material.
    pub key_base64: Zeroizing<String>,
    /// Link built with a blank access id; the server assigns the real one
    /// on creation (rebuild it with [`share_url`] and [`Self::key_material`]).
    pub share_url: String,
    key_material: SendKeyMaterial,
}

impl ProtectedTextSend {
    pub fn key_material(&self) -> &SendKeyMaterial {
        &self.key_material
    }
}

impl std::fmt::Debug for ProtectedTextSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectedTextSend")
            .field("has_notes", &self.notes.is_some())
            .field("has_password", &self.password_hash.is_some())
            .field("key_base64", &"[redacted]")
            .finish_non_exhaustive()
    }
}

/// Encrypt a new text Send under fresh key material.
///
/// The material is wrapped with `user_key`; name, notes and text are
/// encrypted under the derived Send key. Blank notes and a blank password
/// are left out.
pub fn build_text_send(
    server_url: &str,
    user_key: &SymmetricCryptoKey,
    name: &str,
    text: &str,
    notes: Option<&str>,
    password: Option<&str>,
) -> Result<ProtectedTextSend, CryptoError> {
    let key_material = SendKeyMaterial::generate();
    let send_key = derive_send_key(&key_material)?;
    let not_blank = |v: &&str| !v.trim().is_empty();

    Ok(ProtectedTextSend {
        key: protect_send_key(&key_material, user_key)?,
        name: cipher::encrypt_string(name, &send_key)?,
        notes: notes
            .filter(not_blank)
            .map(|n| cipher::encrypt_string(n, &send_key))
            .transpose()?,
        text: cipher::encrypt_string(text, &send_key)?,
        password_hash: password
            .filter(not_blank)
            .map(|p| hash_send_password(p, &key_material)),
        key_base64: key_material.to_base64(),
        share_url: share_url(server_url, "", &key_material),
        key_material,
    })
}

fn send_base_url(server_url: &str) -> String {
    let normalized = server_url.trim_end_matches('/');
    let lower = normalized.to_lowercase();
    if lower.contains("bitwarden.eu") {
        SEND_HOST_EU.to_string()
    } else if lower.contains("bitwarden.com") {
        SEND_HOST_US.to_string()
    } else {
        format!("{normalized}/#/send/")
    }
}
