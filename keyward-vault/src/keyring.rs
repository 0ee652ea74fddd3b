//! Keys needed to read a vault: the user key plus organization keys.

use std::collections::HashMap;

use keyward_crypto::SymmetricCryptoKey;
use tracing::debug;

use crate::api::{CipherResponse, FolderResponse, SendResponse};
use crate::decoder::{self, CipherDecoder};
use crate::encoder;
use crate::error::VaultError;
use crate::records::{DecryptedCipher, DecryptedFolder};
use crate::send::{self, DecryptedSend, NewTextSend, TextSendPayload};

/// Unlocked key material for one account.
///
/// Organization keys arrive RSA-wrapped; unwrapping them is the caller's
/// job, they are handed over here already as symmetric keys.
pub struct KeyRing {
    user_key: SymmetricCryptoKey,
    org_keys: HashMap<String, SymmetricCryptoKey>,
}

impl KeyRing {
    /// A ring holding only the user key.
    pub fn new(user_key: SymmetricCryptoKey) -> Self {
        Self {
            user_key,
            org_keys: HashMap::new(),
        }
    }

    /// Register an unwrapped organization key, replacing any previous one.
    pub fn add_org_key(&mut self, org_id: impl Into<String>, key: SymmetricCryptoKey) {
        self.org_keys.insert(org_id.into(), key);
    }

    /// The user's own symmetric key.
    pub fn user_key(&self) -> &SymmetricCryptoKey {
        &self.user_key
    }

    /// The key for `org_id`, if registered.
    pub fn org_key(&self, org_id: &str) -> Option<&SymmetricCryptoKey> {
        self.org_keys.get(org_id)
    }

    /// The key a cipher's fields (or its item key) are encrypted under.
    ///
    /// An organization cipher whose key is missing is an error rather than
    /// an attempt with the user key, which would only fail every MAC.
    pub fn key_for(&self, cipher: &CipherResponse) -> Result<&SymmetricCryptoKey, VaultError> {
        self.key_for_org(cipher.organization_id.as_deref())
    }

    fn key_for_org(&self, org_id: Option<&str>) -> Result<&SymmetricCryptoKey, VaultError> {
        match org_id {
            Some(org_id) if !org_id.is_empty() => self
                .org_keys
                .get(org_id)
                .ok_or_else(|| VaultError::OrgKeyUnavailable(org_id.to_string())),
            _ => Ok(&self.user_key),
        }
    }

    /// Decrypt one cipher under its organization or user key.
    pub fn decrypt_cipher(&self, cipher: &CipherResponse) -> Result<DecryptedCipher, VaultError> {
        let base_key = self.key_for(cipher)?;
        Ok(decoder::decrypt_cipher(cipher, base_key))
    }

    /// Encrypt a record for upload under its organization or user key.
    ///
    /// With `item_key`, the fields use the item key and the record carries
    /// it wrapped.
    pub fn encrypt_cipher(
        &self,
        cipher: &DecryptedCipher,
        item_key: Option<&SymmetricCryptoKey>,
    ) -> Result<CipherResponse, VaultError> {
        let base_key = self.key_for_org(cipher.organization_id.as_deref())?;
        Ok(encoder::encrypt_cipher(cipher, base_key, item_key)?)
    }

    /// Decrypt a batch. Ciphers whose organization key is unknown are
    /// skipped; deleted ciphers are kept (see [`DecryptedCipher::is_deleted`]).
    pub fn decrypt_ciphers(&self, ciphers: &[CipherResponse]) -> Vec<DecryptedCipher> {
        let mut skipped = 0usize;
        let decrypted: Vec<_> = ciphers
            .iter()
            .filter_map(|c| match self.decrypt_cipher(c) {
                Ok(dc) => Some(dc),
                Err(e) => {
                    debug!(cipher_id = %c.id, error = %e, "skipped cipher");
                    skipped += 1;
                    None
                }
            })
            .collect();
        debug!(
            decrypted = decrypted.len(),
            skipped, "processed ciphers"
        );
        decrypted
    }

    /// Folders are always encrypted under the user key.
    pub fn decrypt_folders(&self, folders: &[FolderResponse]) -> Vec<DecryptedFolder> {
        let decoder = CipherDecoder::new(&self.user_key);
        let decrypted: Vec<_> = folders.iter().map(|f| decoder.decrypt_folder(f)).collect();
        debug!(folders = decrypted.len(), "decrypted folders");
        decrypted
    }

    /// Decrypt one Send; its key is wrapped with the user key.
    pub fn decrypt_send(&self, send: &SendResponse) -> Result<DecryptedSend, VaultError> {
        send::decrypt_send(send, &self.user_key)
    }

    /// Build a new text Send whose key is wrapped with the user key.
    pub fn encrypt_text_send(
        &self,
        new: &NewTextSend<'_>,
        server_url: &str,
    ) -> Result<TextSendPayload, VaultError> {
        send::encrypt_text_send(new, &self.user_key, server_url)
    }

    /// Decrypt a batch of Sends, skipping any whose key cannot be unwrapped.
    pub fn decrypt_sends(&self, sends: &[SendResponse]) -> Vec<DecryptedSend> {
        let mut skipped = 0usize;
        let decrypted: Vec<_> = sends
            .iter()
            .filter_map(|s| match self.decrypt_send(s) {
                Ok(ds) => Some(ds),
                Err(e) => {
                    debug!(send_id = %s.id, error = %e, "skipped send");
                    skipped += 1;
                    None
                }
            })
            .collect();
        debug!(decrypted = decrypted.len(), skipped, "processed sends");
        decrypted
    }
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("user_key", &self.user_key)
            .field("org_keys", &self.org_keys.len())
            .finish()
    }
}
