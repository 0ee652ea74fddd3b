//! Field-by-field record encryption, the inverse of [`crate::decoder`].
//!
//! Produces the same shapes the server returns, so an encoded record can be
//! posted as a create or update request and read back by [`CipherDecoder`].
//! Blank optional values are left out rather than encrypted. The cipher name
//! is always encrypted, even when empty.
//!
//! [`CipherDecoder`]: crate::decoder::CipherDecoder

use keyward_crypto::{CryptoError, SymmetricCryptoKey, cipher};
use tracing::trace;
use zeroize::Zeroizing;

use crate::api::{
    CardResponse, CipherResponse, FieldResponse, FolderResponse, IdentityResponse, LoginResponse,
    SecureNoteResponse, UriResponse,
};
use crate::records::{
    DecryptedCard, DecryptedCipher, DecryptedField, DecryptedFolder, DecryptedIdentity,
    DecryptedLogin, DecryptedSecureNote,
};

/// Encrypts record fields under one key.
#[derive(Clone, Copy)]
pub struct CipherEncoder<'a> {
    key: &'a SymmetricCryptoKey,
}

impl<'a> CipherEncoder<'a> {
    pub fn new(key: &'a SymmetricCryptoKey) -> Self {
        Self { key }
    }

    pub fn encrypt_string(&self, value: &str) -> Result<String, CryptoError> {
        cipher::encrypt_string(value, self.key)
    }

    /// `None` for absent or blank values.
    pub fn encrypt_optional(&self, value: Option<&str>) -> Result<Option<String>, CryptoError> {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| self.encrypt_string(v))
            .transpose()
    }

    pub fn encrypt_login(&self, login: &DecryptedLogin) -> Result<LoginResponse, CryptoError> {
        let uris = login
            .uris
            .iter()
            .filter(|u| !u.uri.trim().is_empty())
            .map(|u| {
                Ok(UriResponse {
                    uri: Some(self.encrypt_string(&u.uri)?),
                    match_type: u.match_type,
                })
            })
            .collect::<Result<Vec<_>, CryptoError>>()?;

        Ok(LoginResponse {
            username: self.encrypt_optional(login.username.as_deref().map(String::as_str))?,
            password: self.encrypt_optional(login.password.as_deref().map(String::as_str))?,
            totp: self.encrypt_optional(login.totp.as_deref().map(String::as_str))?,
            uris: (!uris.is_empty()).then_some(uris),
        })
    }

    pub fn encrypt_card(&self, card: &DecryptedCard) -> Result<CardResponse, CryptoError> {
        let e = |value: &Option<Zeroizing<String>>| {
            self.encrypt_optional(value.as_deref().map(String::as_str))
        };
        Ok(CardResponse {
            cardholder_name: e(&card.cardholder_name)?,
            brand: self.encrypt_optional(card.brand.as_deref())?,
            number: e(&card.number)?,
            exp_month: e(&card.exp_month)?,
            exp_year: e(&card.exp_year)?,
            code: e(&card.code)?,
        })
    }

    pub fn encrypt_identity(
        &self,
        ident: &DecryptedIdentity,
    ) -> Result<IdentityResponse, CryptoError> {
        let e = |value: &Option<Zeroizing<String>>| {
            self.encrypt_optional(value.as_deref().map(String::as_str))
        };
        Ok(IdentityResponse {
            title: e(&ident.title)?,
            first_name: e(&ident.first_name)?,
            middle_name: e(&ident.middle_name)?,
            last_name: e(&ident.last_name)?,
            address1: e(&ident.address1)?,
            address2: e(&ident.address2)?,
            address3: e(&ident.address3)?,
            city: e(&ident.city)?,
            state: e(&ident.state)?,
            postal_code: e(&ident.postal_code)?,
            country: e(&ident.country)?,
            company: e(&ident.company)?,
            email: e(&ident.email)?,
            phone: e(&ident.phone)?,
            ssn: e(&ident.ssn)?,
            username: e(&ident.username)?,
            passport_number: e(&ident.passport_number)?,
            license_number: e(&ident.license_number)?,
        })
    }

    pub fn encrypt_secure_note(&self, note: &DecryptedSecureNote) -> SecureNoteResponse {
        SecureNoteResponse {
            note_type: note.note_type,
        }
    }

    /// Custom fields. Names are always encrypted; an empty value is sent as
    /// `null`.
    pub fn encrypt_fields(
        &self,
        fields: &[DecryptedField],
    ) -> Result<Vec<FieldResponse>, CryptoError> {
        fields
            .iter()
            .map(|f| {
                Ok(FieldResponse {
                    field_type: f.field_type.as_u8(),
                    name: Some(self.encrypt_string(&f.name)?),
                    value: self.encrypt_optional(Some(f.value.as_str()))?,
                    linked_id: f.linked_id,
                })
            })
            .collect()
    }

    /// Encrypt every field of `cipher` under this encoder's key.
    ///
    /// The result carries no item key; see [`encrypt_cipher`] for that.
    pub fn encrypt_cipher(&self, cipher: &DecryptedCipher) -> Result<CipherResponse, CryptoError> {
        trace!(
            cipher_id = %cipher.id,
            cipher_type = cipher.cipher_type.as_str(),
            "encrypting cipher"
        );

        let fields = self.encrypt_fields(&cipher.fields)?;
        Ok(CipherResponse {
            id: cipher.id.clone(),
            organization_id: cipher.organization_id.clone(),
            folder_id: cipher.folder_id.clone(),
            cipher_type: cipher.cipher_type.as_u8(),
            name: Some(self.encrypt_string(&cipher.name)?),
            notes: self.encrypt_optional(cipher.notes.as_deref().map(String::as_str))?,
            key: None,
            favorite: cipher.favorite,
            reprompt: cipher.reprompt,
            revision_date: cipher.revision_date.clone(),
            creation_date: cipher.creation_date.clone(),
            deleted_date: cipher.deleted_date.clone(),
            login: cipher.login.as_ref().map(|l| self.encrypt_login(l)).transpose()?,
            card: cipher.card.as_ref().map(|c| self.encrypt_card(c)).transpose()?,
            identity: cipher
                .identity
                .as_ref()
                .map(|i| self.encrypt_identity(i))
                .transpose()?,
            secure_note: cipher
                .secure_note
                .as_ref()
                .map(|n| self.encrypt_secure_note(n)),
            fields: (!fields.is_empty()).then_some(fields),
        })
    }

    pub fn encrypt_folder(&self, folder: &DecryptedFolder) -> Result<FolderResponse, CryptoError> {
        Ok(FolderResponse {
            id: folder.id.clone(),
            name: Some(self.encrypt_string(&folder.name)?),
            revision_date: folder.revision_date.clone(),
        })
    }
}

/// Encrypt one cipher for upload.
///
/// With an `item_key`, the fields are encrypted under it and the item key
/// itself is wrapped with `base_key` into the record's `key`.
pub fn encrypt_cipher(
    cipher: &DecryptedCipher,
    base_key: &SymmetricCryptoKey,
    item_key: Option<&SymmetricCryptoKey>,
) -> Result<CipherResponse, CryptoError> {
    match item_key {
        Some(item_key) => {
            let mut encrypted = CipherEncoder::new(item_key).encrypt_cipher(cipher)?;
            encrypted.key = Some(cipher::encrypt_symmetric_key(item_key, base_key)?);
            Ok(encrypted)
        }
        None => CipherEncoder::new(base_key).encrypt_cipher(cipher),
    }
}
