//! Thin adapter over the pinned primitive crates.
//!
//! Every protocol module goes through these functions rather than touching
//! `aes`, `cbc`, `hmac`, `hkdf`, `pbkdf2`, `argon2` or `rand` directly, so the
//! protocol code can be checked against fixed vectors without caring which
//! implementation sits underneath.

use std::num::NonZeroU32;

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const SHA256_LEN: usize = 32;
pub const AES_BLOCK_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Hashing / key derivation
// ---------------------------------------------------------------------------

/// PBKDF2-HMAC-SHA256 filling `out`.
///
/// `seed` is the PRF key (the "password" input of PBKDF2).
pub fn pbkdf2_sha256(seed: &[u8], salt: &[u8], iterations: NonZeroU32, out: &mut [u8]) {
    pbkdf2::pbkdf2_hmac::<Sha256>(seed, salt, iterations.get(), out);
}

/// Argon2id (version 0x13) filling `out`. `memory_kib` is in KiB.
pub fn argon2id(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    memory_kib: u32,
    parallelism: u32,
    out: &mut [u8],
) -> Result<(), CryptoError> {
    let params = argon2::Params::new(memory_kib, iterations, parallelism, Some(out.len()))
        .map_err(|e| CryptoError::InvalidKdfParams(format!("argon2 params: {e}")))?;

    argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
        .hash_password_into(password, salt, out)
        .map_err(|e| CryptoError::InvalidKdfParams(format!("argon2: {e}")))
}

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    Sha256::digest(data).into()
}

/// HKDF-Expand only: `prk` is used directly as the pseudorandom key.
pub fn hkdf_expand(prk: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
    let hkdf = Hkdf::<Sha256>::from_prk(prk).map_err(|_| CryptoError::InvalidKeyMaterial {
        expected: SHA256_LEN,
        actual: prk.len(),
    })?;
    hkdf.expand(info, out)
        .map_err(|e| CryptoError::InvalidKdfParams(format!("hkdf expand: {e}")))
}

/// Full HKDF (extract with `salt`, then expand with `info`).
pub fn hkdf(ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
    Hkdf::<Sha256>::new(Some(salt), ikm)
        .expand(info, out)
        .map_err(|e| CryptoError::InvalidKdfParams(format!("hkdf expand: {e}")))
}

// ---------------------------------------------------------------------------
// HMAC
// ---------------------------------------------------------------------------

fn hmac_over(key: &[u8], parts: &[&[u8]]) -> Result<HmacSha256, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyMaterial {
        expected: SHA256_LEN,
        actual: key.len(),
    })?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac)
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; SHA256_LEN], CryptoError> {
    Ok(hmac_over(key, parts)?.finalize().into_bytes().into())
}

/// Recompute HMAC-SHA256 over `parts` and compare with `expected` in constant time.
pub fn hmac_sha256_verify(
    key: &[u8],
    parts: &[&[u8]],
    expected: &[u8],
) -> Result<bool, CryptoError> {
    Ok(hmac_over(key, parts)?.verify_slice(expected).is_ok())
}

// ---------------------------------------------------------------------------
// AES-256-CBC / PKCS#7
// ---------------------------------------------------------------------------

/// AES-256-CBC with PKCS#7 padding. `key` must be 32 bytes, `iv` 16.
pub fn aes256_cbc_encrypt(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let encryptor = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
        CryptoError::InvalidKeyMaterial {
            expected: 32,
            actual: key.len(),
        }
    })?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt and strip PKCS#7 padding. Block-length and padding errors are
/// both reported as [`CryptoError::DecryptionFailed`].
pub fn aes256_cbc_decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LEN != 0 {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext length {} is not a positive multiple of {AES_BLOCK_LEN}",
            ciphertext.len()
        )));
    }
    let decryptor = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
        CryptoError::InvalidKeyMaterial {
            expected: 32,
            actual: key.len(),
        }
    })?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed("bad PKCS#7 padding".to_string()))
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// `N` bytes from the thread-local CSPRNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}
