//! Field-by-field record decryption.
//!
//! A field that fails to parse or decrypt degrades to `None` (or an empty
//! default for text the record cannot do without) and the rest of the record
//! still decodes. Failures are logged at debug with the field name and error
//! kind only.

use keyward_crypto::{CipherString, CryptoError, SymmetricCryptoKey, cipher};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::api::{
    CardResponse, CipherResponse, FieldResponse, FolderResponse, IdentityResponse, LoginResponse,
    SecureNoteResponse,
};
use crate::records::{
    CipherType, DecryptedCard, DecryptedCipher, DecryptedField, DecryptedFolder,
    DecryptedIdentity, DecryptedLogin, DecryptedSecureNote, DecryptedUri, FieldType,
};

/// Decrypts record fields under one key.
#[derive(Clone, Copy)]
pub struct CipherDecoder<'a> {
    key: &'a SymmetricCryptoKey,
}

impl<'a> CipherDecoder<'a> {
    pub fn new(key: &'a SymmetricCryptoKey) -> Self {
        Self { key }
    }

    fn try_decrypt(&self, field: &str, value: Option<&str>) -> Option<Zeroizing<String>> {
        let value = value.filter(|v| !v.trim().is_empty())?;
        CipherString::parse(value)
            .and_then(|cs| cs.decrypt_to_zeroizing_string(self.key))
            .inspect_err(|e: &CryptoError| {
                debug!(field, error = e.kind(), "field decryption failed");
            })
            .ok()
    }

    /// Decrypt an optional field; blank, absent and undecryptable all give `None`.
    pub fn decrypt_string(&self, field: &str, value: Option<&str>) -> Option<String> {
        self.try_decrypt(field, value).map(|s| s.as_str().to_owned())
    }

    /// Like [`Self::decrypt_string`], for secrets.
    pub fn decrypt_sensitive(&self, field: &str, value: Option<&str>) -> Option<Zeroizing<String>> {
        self.try_decrypt(field, value)
    }

    pub fn decrypt_string_or_default(&self, field: &str, value: Option<&str>) -> String {
        self.decrypt_string(field, value).unwrap_or_default()
    }

    pub fn decrypt_login(&self, login: &LoginResponse) -> DecryptedLogin {
        let uris = login
            .uris
            .iter()
            .flatten()
            .filter_map(|u| {
                self.decrypt_string("login.uri", u.uri.as_deref())
                    .map(|uri| DecryptedUri {
                        uri,
                        match_type: u.match_type,
                    })
            })
            .collect();

        DecryptedLogin {
            username: self.decrypt_sensitive("login.username", login.username.as_deref()),
            password: self.decrypt_sensitive("login.password", login.password.as_deref()),
            totp: self.decrypt_sensitive("login.totp", login.totp.as_deref()),
            uris,
        }
    }

    pub fn decrypt_card(&self, card: &CardResponse) -> DecryptedCard {
        DecryptedCard {
            cardholder_name: self
                .decrypt_sensitive("card.cardholder_name", card.cardholder_name.as_deref()),
            brand: self.decrypt_string("card.brand", card.brand.as_deref()),
            number: self.decrypt_sensitive("card.number", card.number.as_deref()),
            exp_month: self.decrypt_sensitive("card.exp_month", card.exp_month.as_deref()),
            exp_year: self.decrypt_sensitive("card.exp_year", card.exp_year.as_deref()),
            code: self.decrypt_sensitive("card.code", card.code.as_deref()),
        }
    }

    pub fn decrypt_identity(&self, ident: &IdentityResponse) -> DecryptedIdentity {
        let d = |field: &str, value: &Option<String>| {
            self.decrypt_sensitive(field, value.as_deref())
        };
        DecryptedIdentity {
            title: d("identity.title", &ident.title),
            first_name: d("identity.first_name", &ident.first_name),
            middle_name: d("identity.middle_name", &ident.middle_name),
            last_name: d("identity.last_name", &ident.last_name),
            address1: d("identity.address1", &ident.address1),
            address2: d("identity.address2", &ident.address2),
            address3: d("identity.address3", &ident.address3),
            city: d("identity.city", &ident.city),
            state: d("identity.state", &ident.state),
            postal_code: d("identity.postal_code", &ident.postal_code),
            country: d("identity.country", &ident.country),
            company: d("identity.company", &ident.company),
            email: d("identity.email", &ident.email),
            phone: d("identity.phone", &ident.phone),
            ssn: d("identity.ssn", &ident.ssn),
            username: d("identity.username", &ident.username),
            passport_number: d("identity.passport_number", &ident.passport_number),
            license_number: d("identity.license_number", &ident.license_number),
        }
    }

    pub fn decrypt_secure_note(&self, note: &SecureNoteResponse) -> DecryptedSecureNote {
        DecryptedSecureNote {
            note_type: note.note_type,
        }
    }

    /// Custom fields. A field without a readable name is dropped; an
    /// unreadable value becomes empty.
    pub fn decrypt_fields(&self, fields: Option<&[FieldResponse]>) -> Vec<DecryptedField> {
        fields
            .unwrap_or_default()
            .iter()
            .filter_map(|f| {
                let name = self.decrypt_string("field.name", f.name.as_deref())?;
                let value = self
                    .decrypt_sensitive("field.value", f.value.as_deref())
                    .unwrap_or_default();
                Some(DecryptedField {
                    name,
                    value,
                    field_type: FieldType::from_u8(f.field_type),
                    linked_id: f.linked_id,
                })
            })
            .collect()
    }

    /// Decrypt every field of `cipher` under this decoder's key.
    ///
    /// Never fails: the per-item key and organization key are resolved by
    /// the caller (see [`decrypt_cipher`] and [`crate::KeyRing`]).
    pub fn decrypt_cipher(&self, cipher: &CipherResponse) -> DecryptedCipher {
        let cipher_type = CipherType::from_u8(cipher.cipher_type);
        trace!(cipher_id = %cipher.id, cipher_type = cipher_type.as_str(), "decrypting cipher");

        let fields = self.decrypt_fields(cipher.fields.as_deref());
        if !fields.is_empty() {
            trace!(cipher_id = %cipher.id, field_count = fields.len(), "decrypted custom fields");
        }

        DecryptedCipher {
            id: cipher.id.clone(),
            organization_id: cipher.organization_id.clone(),
            folder_id: cipher.folder_id.clone(),
            cipher_type,
            name: self.decrypt_string_or_default("name", cipher.name.as_deref()),
            notes: self.decrypt_sensitive("notes", cipher.notes.as_deref()),
            login: cipher.login.as_ref().map(|l| self.decrypt_login(l)),
            card: cipher.card.as_ref().map(|c| self.decrypt_card(c)),
            identity: cipher.identity.as_ref().map(|i| self.decrypt_identity(i)),
            secure_note: cipher
                .secure_note
                .as_ref()
                .map(|n| self.decrypt_secure_note(n)),
            fields,
            favorite: cipher.favorite,
            reprompt: cipher.reprompt,
            revision_date: cipher.revision_date.clone(),
            creation_date: cipher.creation_date.clone(),
            deleted_date: cipher.deleted_date.clone(),
        }
    }

    pub fn decrypt_folder(&self, folder: &FolderResponse) -> DecryptedFolder {
        DecryptedFolder {
            id: folder.id.clone(),
            name: self.decrypt_string_or_default("folder.name", folder.name.as_deref()),
            revision_date: folder.revision_date.clone(),
        }
    }
}

/// Unwrap a cipher's per-item key with `base_key`.
///
/// `Ok(None)` when the cipher has no item key.
pub fn resolve_item_key(
    item_key: Option<&str>,
    base_key: &SymmetricCryptoKey,
) -> Result<Option<SymmetricCryptoKey>, CryptoError> {
    match item_key {
        Some(s) if !s.trim().is_empty() => cipher::decrypt_symmetric_key(s, base_key).map(Some),
        _ => Ok(None),
    }
}

/// Decrypt one cipher whose base key (user or organization) is known.
///
/// When the per-item key cannot be unwrapped the fields are attempted with
/// `base_key` and degrade individually.
pub fn decrypt_cipher(cipher: &CipherResponse, base_key: &SymmetricCryptoKey) -> DecryptedCipher {
    let item_key = resolve_item_key(cipher.key.as_deref(), base_key)
        .inspect_err(|e| {
            debug!(
                cipher_id = %cipher.id,
                error = e.kind(),
                "item key unwrap failed; using base key"
            );
        })
        .ok()
        .flatten();
    let key = item_key.as_ref().unwrap_or(base_key);
    CipherDecoder::new(key).decrypt_cipher(cipher)
}
