//! TOML configuration for the crypto core.
//!
//! ```toml
//! [kdf]
//! type = "argon2id"
//! iterations = 3
//! memory_mib = 64
//! parallelism = 4
//!
//! [limits]
//! max_cipher_string_len = 65536
//! ```

use serde::{Deserialize, Serialize};

use crate::cipher_string::ParseLimits;
use crate::error::CryptoError;
use crate::kdf::KdfParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// KDF used when the caller has no prelogin answer to go on.
    #[serde(default)]
    pub kdf: KdfParams,
    #[serde(default)]
    pub limits: ParseLimits,
}

impl CryptoConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, CryptoError> {
        let config: Self = toml::from_str(s)
            .map_err(|e| CryptoError::InvalidKdfParams(format!("config: {}", e.message())))?;
        config.kdf.validate()?;
        Ok(config)
    }
}
