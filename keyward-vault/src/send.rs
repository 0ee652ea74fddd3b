//! Decrypted Send records.
//!
//! The Send's own fields are encrypted under the key derived from its key
//! material, not under the user key; only the material itself is wrapped
//! with the user key.

use keyward_crypto::SymmetricCryptoKey;
use keyward_crypto::send::{self as send_keys, SendKeyMaterial};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::api::{SendResponse, SendTextResponse};
use crate::decoder::CipherDecoder;
use crate::error::VaultError;

const UNTITLED_SEND: &str = "Untitled Send";
const SEND_TYPE_TEXT: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendType {
    Text,
    File,
    Unknown(u8),
}

impl SendType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Text,
            1 => Self::File,
            other => Self::Unknown(other),
        }
    }
}

pub struct DecryptedSend {
    pub id: String,
    pub access_id: String,
    pub send_type: SendType,
    pub name: String,
    pub notes: String,
    pub text: Option<Zeroizing<String>>,
    pub text_hidden: bool,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    pub access_count: u32,
    pub max_access_count: Option<u32>,
    pub has_password: bool,
    pub disabled: bool,
    pub hide_email: bool,
    pub revision_date: Option<String>,
    pub expiration_date: Option<String>,
    pub deletion_date: Option<String>,
    key_material: SendKeyMaterial,
}

impl DecryptedSend {
    pub fn key_material(&self) -> &SendKeyMaterial {
        &self.key_material
    }

    /// Link a recipient opens to view this Send.
    pub fn share_url(&self, server_url: &str) -> String {
        send_keys::share_url(server_url, &self.access_id, &self.key_material)
    }
}

impl std::fmt::Debug for DecryptedSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedSend")
            .field("id", &self.id)
            .field("access_id", &self.access_id)
            .field("send_type", &self.send_type)
            .field("name", &self.name)
            .field("text", &self.text.as_ref().map(|_| "[redacted]"))
            .field("file_name", &self.file_name)
            .field("access_count", &self.access_count)
            .field("has_password", &self.has_password)
            .field("disabled", &self.disabled)
            .field("deletion_date", &self.deletion_date)
            .finish_non_exhaustive()
    }
}

/// Unwrap the Send key with `user_key` and decrypt the Send's fields.
///
/// An unreadable key fails the whole Send; individual fields degrade.
pub fn decrypt_send(
    send: &SendResponse,
    user_key: &SymmetricCryptoKey,
) -> Result<DecryptedSend, VaultError> {
    let key_material = send_keys::unprotect_send_key(&send.key, user_key)?;
    let send_key = send_keys::derive_send_key(&key_material)?;
    let decoder = CipherDecoder::new(&send_key);
    trace!(send_id = %send.id, send_type = send.send_type, "decrypting send");

    let name = decoder
        .decrypt_string("send.name", send.name.as_deref())
        .unwrap_or_else(|| UNTITLED_SEND.to_string());
    let notes = decoder.decrypt_string_or_default("send.notes", send.notes.as_deref());
    let text = send
        .text
        .as_ref()
        .and_then(|t| decoder.decrypt_sensitive("send.text", t.text.as_deref()));
    let file_name = send
        .file
        .as_ref()
        .and_then(|f| f.file_name.as_deref())
        .map(|raw| {
            decoder
                .decrypt_string("send.file_name", Some(raw))
                .unwrap_or_else(|| raw.to_string())
        });

    Ok(DecryptedSend {
        id: send.id.clone(),
        access_id: send.access_id.clone(),
        send_type: SendType::from_u8(send.send_type),
        name,
        notes,
        text,
        text_hidden: send.text.as_ref().and_then(|t| t.hidden).unwrap_or(false),
        file_name,
        file_size: send.file.as_ref().and_then(|f| f.size.clone()),
        access_count: send.access_count,
        max_access_count: send.max_access_count,
        has_password: send.password.is_some(),
        disabled: send.disabled,
        hide_email: send.hide_email.unwrap_or(false),
        revision_date: send.revision_date.clone(),
        expiration_date: send.expiration_date.clone(),
        deletion_date: send.deletion_date.clone(),
        key_material,
    })
}

/// What the user typed for a new text Send.
#[derive(Debug, Default, Clone, Copy)]
pub struct NewTextSend<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub notes: Option<&'a str>,
    pub password: Option<&'a str>,
    /// Zero means unlimited.
    pub max_access_count: Option<u32>,
    pub hide_email: bool,
    pub hide_text: bool,
    /// RFC 3339 timestamp.
    pub deletion_date: &'a str,
    pub expiration_date: Option<&'a str>,
}

/// A create request plus what the sender needs to share it.
pub struct TextSendPayload {
    pub request: SendResponse,
    pub key_base64: Zeroizing<String>,
    /// Built before the server assigns an access id.
    pub share_url: String,
}

impl std::fmt::Debug for TextSendPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSendPayload")
            .field("request", &self.request)
            .field("key_base64", &"[redacted]")
            .field("share_url", &"[redacted]")
            .finish()
    }
}

/// Encrypt a new text Send under fresh key material wrapped with `user_key`.
pub fn encrypt_text_send(
    new: &NewTextSend<'_>,
    user_key: &SymmetricCryptoKey,
    server_url: &str,
) -> Result<TextSendPayload, VaultError> {
    let protected = send_keys::build_text_send(
        server_url,
        user_key,
        new.name,
        new.text,
        new.notes,
        new.password,
    )?;
    debug!(
        has_password = protected.password_hash.is_some(),
        has_expiration = new.expiration_date.is_some(),
        "built text send"
    );

    let request = SendResponse {
        key: protected.key,
        send_type: SEND_TYPE_TEXT,
        name: Some(protected.name),
        notes: protected.notes,
        text: Some(SendTextResponse {
            text: Some(protected.text),
            hidden: Some(new.hide_text),
        }),
        max_access_count: new.max_access_count.filter(|&n| n > 0),
        deletion_date: Some(new.deletion_date.to_string()),
        expiration_date: new.expiration_date.map(str::to_string),
        password: protected.password_hash,
        disabled: false,
        hide_email: Some(new.hide_email),
        ..Default::default()
    };

    Ok(TextSendPayload {
        request,
        key_base64: protected.key_base64,
        share_url: protected.share_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SendFileResponse, SendTextResponse};
    use keyward_crypto::CryptoError;
    use keyward_crypto::cipher::encrypt_string;

    fn user_key() -> SymmetricCryptoKey {
        SymmetricCryptoKey::new([7; 32], [8; 32])
    }

    fn text_send(material: &SendKeyMaterial) -> SendResponse {
        let send_key = send_keys::derive_send_key(material).unwrap();
        SendResponse {
            id: "s1".to_string(),
            access_id: "acc1".to_string(),
            key: send_keys::protect_send_key(material, &user_key()).unwrap(),
            send_type: 0,
            name: Some(encrypt_string("Wifi", &send_key).unwrap()),
            text: Some(SendTextResponse {
                text: Some(encrypt_string("correct horse", &send_key).unwrap()),
                hidden: Some(true),
            }),
            password: Some("hash".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn text_send_decrypts_under_send_key() {
        let material = SendKeyMaterial::generate();
        let ds = decrypt_send(&text_send(&material), &user_key()).unwrap();
        assert_eq!(ds.name, "Wifi");
        assert_eq!(ds.notes, "");
        assert_eq!(ds.text.as_deref().map(String::as_str), Some("correct horse"));
        assert!(ds.text_hidden);
        assert!(ds.has_password);
        assert_eq!(ds.send_type, SendType::Text);
        assert_eq!(ds.key_material().as_bytes(), material.as_bytes());
        assert!(
            ds.share_url("https://vault.bitwarden.com")
                .starts_with("https://send.bitwarden.com/#/send/acc1/")
        );
    }

    #[test]
    fn missing_name_defaults_and_raw_file_name_survives() {
        let material = SendKeyMaterial::generate();
        let send = SendResponse {
            id: "s2".to_string(),
            key: send_keys::protect_send_key(&material, &user_key()).unwrap(),
            send_type: 1,
            name: Some("2.bad|bad|bad".to_string()),
            file: Some(SendFileResponse {
                file_name: Some("report.pdf".to_string()),
                size: Some("1024".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let ds = decrypt_send(&send, &user_key()).unwrap();
        assert_eq!(ds.name, "Untitled Send");
        assert_eq!(ds.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(ds.file_size.as_deref(), Some("1024"));
        assert_eq!(ds.send_type, SendType::File);
    }

    #[test]
    fn new_text_send_reads_back() {
        let new = NewTextSend {
            name: "Wifi",
            text: "correct horse",
            notes: Some("guest"),
            password: Some("hunter2"),
            max_access_count: Some(0),
            hide_text: true,
            deletion_date: "2030-01-01T00:00:00Z",
            ..Default::default()
        };
        let payload = encrypt_text_send(&new, &user_key(), "https://vw.example.org").unwrap();
        let request = &payload.request;
        assert_eq!(request.send_type, 0);
        assert!(request.max_access_count.is_none());
        assert_eq!(request.deletion_date.as_deref(), Some("2030-01-01T00:00:00Z"));
        assert_eq!(request.hide_email, Some(false));

        let ds = decrypt_send(request, &user_key()).unwrap();
        assert_eq!(ds.name, "Wifi");
        assert_eq!(ds.notes, "guest");
        assert_eq!(ds.text.as_deref().map(String::as_str), Some("correct horse"));
        assert!(ds.text_hidden);
        assert!(ds.has_password);
        assert_eq!(ds.key_material().to_base64().as_str(), payload.key_base64.as_str());
        assert_eq!(
            payload.share_url,
            format!("https://vw.example.org/#/send//{}", ds.key_material().to_url_fragment())
        );
        assert_eq!(ds.share_url("https://vw.example.org"), payload.share_url);
    }

    #[test]
    fn new_send_request_serializes_for_upload() {
        let new = NewTextSend {
            name: "n",
            text: "t",
            max_access_count: Some(3),
            deletion_date: "2030-01-01T00:00:00Z",
            ..Default::default()
        };
        let payload = encrypt_text_send(&new, &user_key(), "https://vault.bitwarden.com").unwrap();
        let value = serde_json::to_value(&payload.request).unwrap();
        assert_eq!(value["type"], 0);
        assert_eq!(value["maxAccessCount"], 3);
        assert!(value["password"].is_null());
        assert!(value["notes"].is_null());
        assert_eq!(value["text"]["hidden"], false);
        assert!(!format!("{payload:?}").contains(payload.key_base64.as_str()));
    }

    #[test]
    fn wrong_user_key_fails_the_send() {
        let material = SendKeyMaterial::generate();
        let err = decrypt_send(&text_send(&material), &SymmetricCryptoKey::generate()).unwrap_err();
        assert!(matches!(
            err,
            VaultError::Crypto(CryptoError::MacVerificationFailed)
        ));
    }
}
