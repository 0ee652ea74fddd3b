//! Authenticated encryption over cipher strings.
//!
//! Decryption verifies `HMAC-SHA256(mac_key, iv || data)` in constant time
//! and refuses to touch the ciphertext when it does not match. Encryption
//! always produces type 2 (`AES-256-CBC + HMAC-SHA256`) with a fresh IV.

use zeroize::Zeroizing;

use crate::cipher_string::{CipherString, IV_LEN, MAC_LEN};
use crate::error::CryptoError;
use crate::keys::{SYMMETRIC_KEY_LEN, SymmetricCryptoKey};
use crate::primitives;

impl CipherString {
    /// Encrypt `plaintext` under `key` as a type 2 cipher string.
    pub fn encrypt(plaintext: &[u8], key: &SymmetricCryptoKey) -> Result<Self, CryptoError> {
        Self::encrypt_with_iv(plaintext, key, primitives::random_bytes())
    }

    pub(crate) fn encrypt_with_iv(
        plaintext: &[u8],
        key: &SymmetricCryptoKey,
        iv: [u8; IV_LEN],
    ) -> Result<Self, CryptoError> {
        let data = primitives::aes256_cbc_encrypt(key.enc_key(), &iv, plaintext)?;
        let mac: [u8; MAC_LEN] =
            primitives::hmac_sha256(key.mac_key(), &[iv.as_slice(), data.as_slice()])?;
        Ok(Self::AesCbc256HmacSha256 { iv, data, mac })
    }

    /// Verify (when a MAC is present) and decrypt.
    pub fn decrypt(&self, key: &SymmetricCryptoKey) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        if let Some(mac) = self.mac() {
            let parts = [self.iv().as_slice(), self.data()];
            let verified = primitives::hmac_sha256_verify(key.mac_key(), &parts, mac)?;
            if !verified {
                return Err(CryptoError::MacVerificationFailed);
            }
        }
        primitives::aes256_cbc_decrypt(key.enc_key(), self.iv(), self.data())
    }

    /// Decrypt to a UTF-8 string.
    pub fn decrypt_to_string(&self, key: &SymmetricCryptoKey) -> Result<String, CryptoError> {
        let bytes = self.decrypt(key)?;
        // Borrow-then-copy keeps the only plaintext buffer inside `Zeroizing`
        // when the bytes are not UTF-8.
        std::str::from_utf8(&bytes)
            .map(str::to_owned)
            .map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Decrypt to a zeroizing UTF-8 string (for secrets).
    pub fn decrypt_to_zeroizing_string(
        &self,
        key: &SymmetricCryptoKey,
    ) -> Result<Zeroizing<String>, CryptoError> {
        self.decrypt_to_string(key).map(Zeroizing::new)
    }
}

/// Parse `cipher_string` and decrypt it under `key`.
pub fn decrypt(
    cipher_string: &str,
    key: &SymmetricCryptoKey,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    CipherString::parse(cipher_string)?.decrypt(key)
}

/// Parse, decrypt and check UTF-8.
pub fn decrypt_to_string(
    cipher_string: &str,
    key: &SymmetricCryptoKey,
) -> Result<String, CryptoError> {
    CipherString::parse(cipher_string)?.decrypt_to_string(key)
}

/// Encrypt bytes and serialize as `2.iv|data|mac`.
pub fn encrypt(plaintext: &[u8], key: &SymmetricCryptoKey) -> Result<String, CryptoError> {
    Ok(CipherString::encrypt(plaintext, key)?.to_string())
}

/// Encrypt UTF-8 text and serialize as `2.iv|data|mac`.
pub fn encrypt_string(plaintext: &str, key: &SymmetricCryptoKey) -> Result<String, CryptoError> {
    encrypt(plaintext.as_bytes(), key)
}

/// Unwrap a protected symmetric key.
///
/// The plaintext must be exactly 64 bytes (`enc_key || mac_key`); anything
/// else is [`CryptoError::InvalidKeyLength`].
pub fn decrypt_symmetric_key(
    encrypted_key: &str,
    wrapping_key: &SymmetricCryptoKey,
) -> Result<SymmetricCryptoKey, CryptoError> {
    let bytes = decrypt(encrypted_key, wrapping_key)?;
    if bytes.len() != SYMMETRIC_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength(bytes.len()));
    }
    SymmetricCryptoKey::from_bytes(&bytes)
}

/// Wrap `key` under `wrapping_key` as a type 2 cipher string.
pub fn encrypt_symmetric_key(
    key: &SymmetricCryptoKey,
    wrapping_key: &SymmetricCryptoKey,
) -> Result<String, CryptoError> {
    encrypt(key.to_bytes().as_slice(), wrapping_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_string::EncryptionType;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn key() -> SymmetricCryptoKey {
        SymmetricCryptoKey::new([0x55; 32], [0x66; 32])
    }

    #[test]
    fn roundtrip() {
        let ct = encrypt(b"hello bitwarden world", &key()).unwrap();
        assert!(ct.starts_with("2."));
        assert_eq!(ct.split('|').count(), 3);
        let pt = decrypt(&ct, &key()).unwrap();
        assert_eq!(pt.as_slice(), b"hello bitwarden world");
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let ct = encrypt(b"", &key()).unwrap();
        assert!(decrypt(&ct, &key()).unwrap().is_empty());
    }

    #[test]
    fn fresh_iv_per_encryption() {
        let a = encrypt(b"same", &key()).unwrap();
        let b = encrypt(b"same", &key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn string_wrappers_roundtrip() {
        let ct = encrypt_string("pässwörd ✓", &key()).unwrap();
        assert_eq!(decrypt_to_string(&ct, &key()).unwrap(), "pässwörd ✓");
    }

    #[test]
    fn non_utf8_plaintext_is_reported() {
        let ct = encrypt(&[0xff, 0xfe, 0xfd], &key()).unwrap();
        assert!(matches!(
            decrypt_to_string(&ct, &key()),
            Err(CryptoError::InvalidUtf8)
        ));
    }

    #[test]
    fn tampered_mac_fails_verification() {
        let mut cs = CipherString::encrypt(b"sensitive data", &key()).unwrap();
        if let CipherString::AesCbc256HmacSha256 { mac, .. } = &mut cs {
            mac[0] ^= 0x01;
        }
        assert!(matches!(
            cs.decrypt(&key()),
            Err(CryptoError::MacVerificationFailed)
        ));
    }

    #[test]
    fn tampered_data_fails_verification_not_decryption() {
        let mut cs = CipherString::encrypt(b"sensitive data", &key()).unwrap();
        if let CipherString::AesCbc256HmacSha256 { data, .. } = &mut cs {
            // Break the padding too: without the MAC check first this would
            // surface as a padding error instead.
            let last = data.len() - 1;
            data[last] ^= 0xff;
        }
        assert!(matches!(
            cs.decrypt(&key()),
            Err(CryptoError::MacVerificationFailed)
        ));
    }

    #[test]
    fn wrong_mac_key_fails_verification() {
        let ct = encrypt(b"data", &key()).unwrap();
        let other = SymmetricCryptoKey::new([0x55; 32], [0x67; 32]);
        assert!(matches!(
            decrypt(&ct, &other),
            Err(CryptoError::MacVerificationFailed)
        ));
    }

    #[test]
    fn type0_decrypts_without_mac() {
        let iv = [3u8; 16];
        let data = primitives::aes256_cbc_encrypt(key().enc_key(), &iv, b"legacy").unwrap();
        let legacy = format!("{}|{}", STANDARD.encode(iv), STANDARD.encode(&data));
        assert_eq!(decrypt(&legacy, &key()).unwrap().as_slice(), b"legacy");
    }

    #[test]
    fn type0_with_wrong_key_is_decryption_failure_or_garbage() {
        let iv = [3u8; 16];
        let data = primitives::aes256_cbc_encrypt(key().enc_key(), &iv, b"legacy").unwrap();
        let legacy = format!("0.{}|{}", STANDARD.encode(iv), STANDARD.encode(&data));
        let other = SymmetricCryptoKey::new([0x11; 32], [0x66; 32]);
        match decrypt(&legacy, &other) {
            Err(CryptoError::DecryptionFailed(_)) => {}
            Ok(pt) => assert_ne!(pt.as_slice(), b"legacy"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fixed_iv_produces_known_layout() {
        let cs = CipherString::encrypt_with_iv(b"abc", &key(), [0u8; 16]).unwrap();
        assert_eq!(cs.enc_type(), EncryptionType::AesCbc256HmacSha256);
        assert_eq!(cs.data().len(), 16);
        let wire = cs.to_string();
        assert!(wire.starts_with("2.AAAAAAAAAAAAAAAAAAAAAA==|"));
        assert_eq!(CipherString::parse(&wire).unwrap(), cs);
    }

    #[test]
    fn symmetric_key_unwrap_splits_64_bytes() {
        let raw: [u8; 64] = std::array::from_fn(|i| i as u8);
        let wrapped = encrypt(&raw, &key()).unwrap();
        let unwrapped = decrypt_symmetric_key(&wrapped, &key()).unwrap();
        assert_eq!(unwrapped.enc_key().as_slice(), &raw[..32]);
        assert_eq!(unwrapped.mac_key().as_slice(), &raw[32..]);
    }

    #[test]
    fn symmetric_key_unwrap_rejects_other_lengths() {
        for len in [0usize, 32, 63, 65, 128] {
            let wrapped = encrypt(&vec![7u8; len], &key()).unwrap();
            assert!(
                matches!(
                    decrypt_symmetric_key(&wrapped, &key()),
                    Err(CryptoError::InvalidKeyLength(n)) if n == len
                ),
                "len {len}"
            );
        }
    }

    #[test]
    fn symmetric_key_wrap_roundtrip() {
        let user_key = SymmetricCryptoKey::generate();
        let wrapped = encrypt_symmetric_key(&user_key, &key()).unwrap();
        assert_eq!(decrypt_symmetric_key(&wrapped, &key()).unwrap(), user_key);
    }

    #[test]
    fn shared_key_across_threads() {
        let key = key();
        let wire: Vec<String> = (0..8)
            .map(|i| encrypt_string(&format!("item {i}"), &key).unwrap())
            .collect();
        std::thread::scope(|s| {
            for (i, ct) in wire.iter().enumerate() {
                let key = &key;
                s.spawn(move || {
                    assert_eq!(decrypt_to_string(ct, key).unwrap(), format!("item {i}"));
                });
            }
        });
    }
}
