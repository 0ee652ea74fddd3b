//! Error types for vault record decoding.

use keyward_crypto::CryptoError;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("organization key unavailable for org {0}")]
    OrgKeyUnavailable(String),
}
