//! Error types for the crypto core.

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key material: expected {expected} bytes, got {actual}")]
    InvalidKeyMaterial { expected: usize, actual: usize },

    #[error("malformed cipher string: {0}")]
    MalformedCipherString(String),

    #[error("unsupported cipher type {0}")]
    UnsupportedCipherType(u32),

    #[error("MAC verification failed")]
    MacVerificationFailed,

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("invalid symmetric key length: expected 64 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

impl CryptoError {
    /// Short machine-friendly label, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKeyMaterial { .. } => "invalid_key_material",
            Self::MalformedCipherString(_) => "malformed_cipher_string",
            Self::UnsupportedCipherType(_) => "unsupported_cipher_type",
            Self::MacVerificationFailed => "mac_verification_failed",
            Self::DecryptionFailed(_) => "decryption_failed",
            Self::InvalidKeyLength(_) => "invalid_key_length",
            Self::InvalidKdfParams(_) => "invalid_kdf_params",
            Self::InvalidUtf8 => "invalid_utf8",
        }
    }
}
