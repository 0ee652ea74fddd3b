//! CipherString wire format: `<type>.<iv>|<data>[|<mac>]`.
//!
//! Supported types:
//! - `0`: AES-256-CBC, `iv|data`, no MAC (legacy)
//! - `2`: AES-256-CBC + HMAC-SHA256, `iv|data|mac`
//!
//! A string with no `.` is read as type 0, which is how the oldest clients
//! wrote it. Each part is Base64; URL-safe characters and missing padding are
//! tolerated on input, output is always standard padded Base64.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

pub const IV_LEN: usize = 16;
pub const MAC_LEN: usize = 32;

/// Protocol ceiling for a whole cipher string and for any single part (1 MiB).
pub const MAX_CIPHER_STRING_LEN: usize = 1024 * 1024;
pub const MAX_PART_LEN: usize = 1024 * 1024;

/// Size bounds applied before any Base64 decoding takes place.
///
/// Values above the protocol ceiling are clamped down to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseLimits {
    #[serde(default = "default_max_len")]
    pub max_cipher_string_len: usize,
    #[serde(default = "default_max_part_len")]
    pub max_part_len: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_cipher_string_len: MAX_CIPHER_STRING_LEN,
            max_part_len: MAX_PART_LEN,
        }
    }
}

impl ParseLimits {
    fn effective(&self) -> (usize, usize) {
        (
            self.max_cipher_string_len.min(MAX_CIPHER_STRING_LEN),
            self.max_part_len.min(MAX_PART_LEN),
        )
    }
}

fn default_max_len() -> usize {
    MAX_CIPHER_STRING_LEN
}

fn default_max_part_len() -> usize {
    MAX_PART_LEN
}

/// The numeric prefix of a cipher string. Only types 0 and 2 are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionType {
    /// Legacy, unauthenticated.
    AesCbc256,
    AesCbc256HmacSha256,
}

impl EncryptionType {
    /// Map a prefix code; anything but 0 or 2 is [`CryptoError::UnsupportedCipherType`].
    pub fn from_code(code: u32) -> Result<Self, CryptoError> {
        match code {
            0 => Ok(Self::AesCbc256),
            2 => Ok(Self::AesCbc256HmacSha256),
            other => Err(CryptoError::UnsupportedCipherType(other)),
        }
    }

    /// The prefix written before the `.`.
    pub fn code(self) -> u8 {
        match self {
            Self::AesCbc256 => 0,
            Self::AesCbc256HmacSha256 => 2,
        }
    }

    fn part_count(self) -> usize {
        match self {
            Self::AesCbc256 => 2,
            Self::AesCbc256HmacSha256 => 3,
        }
    }
}

/// A parsed cipher string. The MAC exists exactly when the type is 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherString {
    AesCbc256 {
        iv: [u8; IV_LEN],
        data: Vec<u8>,
    },
    AesCbc256HmacSha256 {
        iv: [u8; IV_LEN],
        data: Vec<u8>,
        mac: [u8; MAC_LEN],
    },
}

impl CipherString {
    /// Parse with the default 1 MiB limits.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        Self::parse_with_limits(s, &ParseLimits::default())
    }

    /// Parse, rejecting strings or parts above `limits` (capped at 1 MiB).
    pub fn parse_with_limits(s: &str, limits: &ParseLimits) -> Result<Self, CryptoError> {
        let (max_len, max_part_len) = limits.effective();

        if s.trim().is_empty() {
            return Err(malformed("cipher string is blank"));
        }
        if s.len() > max_len {
            return Err(malformed(format!(
                "cipher string too large: {} bytes",
                s.len()
            )));
        }

        let (enc_type, body) = match s.split_once('.') {
            Some((type_str, body)) => {
                let code: u32 = type_str
                    .trim()
                    .parse()
                    .map_err(|_| malformed(format!("invalid type: {type_str:?}")))?;
                (EncryptionType::from_code(code)?, body)
            }
            None => (EncryptionType::AesCbc256, s),
        };

        let parts: Vec<&str> = body.split('|').collect();
        if parts.len() != enc_type.part_count() {
            return Err(malformed(format!(
                "type {} cipher string has {} parts, expected {}",
                enc_type.code(),
                parts.len(),
                enc_type.part_count()
            )));
        }

        let iv = fixed::<IV_LEN>(decode_part(parts[0], "iv", max_part_len)?, "iv")?;
        let data = decode_part(parts[1], "data", max_part_len)?;

        Ok(match enc_type {
            EncryptionType::AesCbc256 => Self::AesCbc256 { iv, data },
            EncryptionType::AesCbc256HmacSha256 => {
                let mac = fixed::<MAC_LEN>(decode_part(parts[2], "mac", max_part_len)?, "mac")?;
                Self::AesCbc256HmacSha256 { iv, data, mac }
            }
        })
    }

    /// The type this string was parsed or encrypted as.
    pub fn enc_type(&self) -> EncryptionType {
        match self {
            Self::AesCbc256 { .. } => EncryptionType::AesCbc256,
            Self::AesCbc256HmacSha256 { .. } => EncryptionType::AesCbc256HmacSha256,
        }
    }

    /// The 16-byte IV.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        match self {
            Self::AesCbc256 { iv, .. } | Self::AesCbc256HmacSha256 { iv, .. } => iv,
        }
    }

    /// The raw ciphertext.
    pub fn data(&self) -> &[u8] {
        match self {
            Self::AesCbc256 { data, .. } | Self::AesCbc256HmacSha256 { data, .. } => data,
        }
    }

    /// The 32-byte MAC; `None` for type 0.
    pub fn mac(&self) -> Option<&[u8; MAC_LEN]> {
        match self {
            Self::AesCbc256 { .. } => None,
            Self::AesCbc256HmacSha256 { mac, .. } => Some(mac),
        }
    }
}

impl FromStr for CipherString {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CipherString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}|{}",
            self.enc_type().code(),
            STANDARD.encode(self.iv()),
            STANDARD.encode(self.data())
        )?;
        if let Some(mac) = self.mac() {
            write!(f, "|{}", STANDARD.encode(mac))?;
        }
        Ok(())
    }
}

fn malformed(msg: impl Into<String>) -> CryptoError {
    CryptoError::MalformedCipherString(msg.into())
}

fn fixed<const N: usize>(bytes: Vec<u8>, name: &str) -> Result<[u8; N], CryptoError> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| malformed(format!("{name} must be {N} bytes, got {len}")))
}

/// Decode one Base64 part, accepting the URL-safe alphabet and missing padding.
fn decode_part(raw: &str, name: &str, max_part_len: usize) -> Result<Vec<u8>, CryptoError> {
    let part = raw.trim();
    if part.is_empty() {
        return Err(malformed(format!("empty {name} part")));
    }
    if part.len() > max_part_len {
        return Err(malformed(format!(
            "{name} part too large: {} bytes",
            part.len()
        )));
    }

    let mut normalized: String = part
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    let padding = (4 - normalized.len() % 4) % 4;
    normalized.extend(std::iter::repeat_n('=', padding));

    STANDARD
        .decode(&normalized)
        .map_err(|e| malformed(format!("invalid base64 in {name}: {e}")))
}
