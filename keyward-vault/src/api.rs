//! Server response shapes.
//!
//! Official servers send PascalCase keys, Vaultwarden sends camelCase; every
//! field accepts both. String fields holding encrypted data are raw
//! CipherStrings and stay encrypted until they reach the decoder.
//!
//! The same shapes serialize to camelCase, which both servers accept for
//! create and update requests (see [`crate::encoder`]).

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// The parts of a `/sync` answer the decoder consumes.
#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    #[serde(alias = "Folders", default)]
    pub folders: Vec<FolderResponse>,
    #[serde(alias = "Ciphers", default)]
    pub ciphers: Vec<CipherResponse>,
    #[serde(alias = "Sends", default)]
    pub sends: Vec<SendResponse>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FolderResponse {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: Option<String>,
    #[serde(alias = "RevisionDate", alias = "revisionDate", default)]
    pub revision_date: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CipherResponse {
    #[serde(alias = "Id", default)]
    pub id: String,
    #[serde(alias = "OrganizationId", alias = "organizationId", default)]
    pub organization_id: Option<String>,
    #[serde(alias = "FolderId", alias = "folderId", default)]
    pub folder_id: Option<String>,
    #[serde(alias = "Type", alias = "type", rename(serialize = "type"), default)]
    pub cipher_type: u8,
    #[serde(alias = "Name", default)]
    pub name: Option<String>,
    #[serde(alias = "Notes", default)]
    pub notes: Option<String>,
    /// Per-item key, wrapped with the user or organization key.
    #[serde(alias = "Key", default)]
    pub key: Option<String>,
    #[serde(alias = "Favorite", default)]
    pub favorite: bool,
    #[serde(alias = "Reprompt", default)]
    pub reprompt: u8,
    #[serde(alias = "RevisionDate", alias = "revisionDate", default)]
    pub revision_date: Option<String>,
    #[serde(alias = "CreationDate", alias = "creationDate", default)]
    pub creation_date: Option<String>,
    #[serde(alias = "DeletedDate", alias = "deletedDate", default)]
    pub deleted_date: Option<String>,
    #[serde(alias = "Login", default)]
    pub login: Option<LoginResponse>,
    #[serde(alias = "Card", default)]
    pub card: Option<CardResponse>,
    #[serde(alias = "Identity", default)]
    pub identity: Option<IdentityResponse>,
    #[serde(alias = "SecureNote", alias = "secureNote", default)]
    pub secure_note: Option<SecureNoteResponse>,
    #[serde(alias = "Fields", default)]
    pub fields: Option<Vec<FieldResponse>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct LoginResponse {
    #[serde(alias = "Username", default)]
    pub username: Option<String>,
    #[serde(alias = "Password", default)]
    pub password: Option<String>,
    #[serde(alias = "Totp", default)]
    pub totp: Option<String>,
    #[serde(alias = "Uris", default)]
    pub uris: Option<Vec<UriResponse>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct UriResponse {
    #[serde(alias = "Uri", default)]
    pub uri: Option<String>,
    /// 0 Domain, 1 Host, 2 StartsWith, 3 Exact, 4 Regex, 5 Never.
    #[serde(alias = "Match", alias = "match", rename(serialize = "match"), default)]
    pub match_type: Option<u8>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CardResponse {
    #[serde(alias = "CardholderName", alias = "cardholderName", default)]
    pub cardholder_name: Option<String>,
    #[serde(alias = "Brand", default)]
    pub brand: Option<String>,
    #[serde(alias = "Number", default)]
    pub number: Option<String>,
    #[serde(alias = "ExpMonth", alias = "expMonth", default)]
    pub exp_month: Option<String>,
    #[serde(alias = "ExpYear", alias = "expYear", default)]
    pub exp_year: Option<String>,
    #[serde(alias = "Code", default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct IdentityResponse {
    #[serde(alias = "Title", default)]
    pub title: Option<String>,
    #[serde(alias = "FirstName", alias = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(alias = "MiddleName", alias = "middleName", default)]
    pub middle_name: Option<String>,
    #[serde(alias = "LastName", alias = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(alias = "Address1", default)]
    pub address1: Option<String>,
    #[serde(alias = "Address2", default)]
    pub address2: Option<String>,
    #[serde(alias = "Address3", default)]
    pub address3: Option<String>,
    #[serde(alias = "City", default)]
    pub city: Option<String>,
    #[serde(alias = "State", default)]
    pub state: Option<String>,
    #[serde(alias = "PostalCode", alias = "postalCode", default)]
    pub postal_code: Option<String>,
    #[serde(alias = "Country", default)]
    pub country: Option<String>,
    #[serde(alias = "Company", default)]
    pub company: Option<String>,
    #[serde(alias = "Email", default)]
    pub email: Option<String>,
    #[serde(alias = "Phone", default)]
    pub phone: Option<String>,
    #[serde(alias = "Ssn", default)]
    pub ssn: Option<String>,
    #[serde(alias = "Username", default)]
    pub username: Option<String>,
    #[serde(alias = "PassportNumber", alias = "passportNumber", default)]
    pub passport_number: Option<String>,
    #[serde(alias = "LicenseNumber", alias = "licenseNumber", default)]
    pub license_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SecureNoteResponse {
    #[serde(alias = "Type", alias = "type", rename(serialize = "type"), default)]
    pub note_type: u8,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FieldResponse {
    #[serde(alias = "Type", alias = "type", rename(serialize = "type"), default)]
    pub field_type: u8,
    #[serde(alias = "Name", default)]
    pub name: Option<String>,
    #[serde(alias = "Value", default)]
    pub value: Option<String>,
    #[serde(alias = "LinkedId", alias = "linkedId", default)]
    pub linked_id: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SendResponse {
    #[serde(alias = "Id", default)]
    pub id: String,
    #[serde(alias = "AccessId", alias = "accessId", default)]
    pub access_id: String,
    /// Send key material, encrypted (as Base64 text) under the user key.
    #[serde(alias = "Key", default)]
    pub key: String,
    #[serde(alias = "Type", alias = "type", rename(serialize = "type"), default)]
    pub send_type: u8,
    #[serde(alias = "Name", default)]
    pub name: Option<String>,
    #[serde(alias = "Notes", default)]
    pub notes: Option<String>,
    #[serde(alias = "Text", default)]
    pub text: Option<SendTextResponse>,
    #[serde(alias = "File", default)]
    pub file: Option<SendFileResponse>,
    #[serde(alias = "AccessCount", alias = "accessCount", default)]
    pub access_count: u32,
    #[serde(alias = "MaxAccessCount", alias = "maxAccessCount", default)]
    pub max_access_count: Option<u32>,
    #[serde(alias = "RevisionDate", alias = "revisionDate", default)]
    pub revision_date: Option<String>,
    #[serde(alias = "ExpirationDate", alias = "expirationDate", default)]
    pub expiration_date: Option<String>,
    #[serde(alias = "DeletionDate", alias = "deletionDate", default)]
    pub deletion_date: Option<String>,
    /// Access password hash; only its presence matters client-side.
    #[serde(alias = "Password", default)]
    pub password: Option<String>,
    #[serde(alias = "Disabled", default)]
    pub disabled: bool,
    #[serde(alias = "HideEmail", alias = "hideEmail", default)]
    pub hide_email: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SendTextResponse {
    #[serde(alias = "Text", default)]
    pub text: Option<String>,
    #[serde(alias = "Hidden", default)]
    pub hidden: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SendFileResponse {
    #[serde(alias = "Id", default)]
    pub id: Option<String>,
    #[serde(alias = "FileName", alias = "fileName", default)]
    pub file_name: Option<String>,
    #[serde(alias = "Size", default)]
    pub size: Option<String>,
    #[serde(alias = "SizeName", alias = "sizeName", default)]
    pub size_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CiphersPayload {
    List(Vec<CipherResponse>),
    Sync(SyncResponse),
}

/// Parse ciphers from either a bare JSON array or a full sync object.
pub fn parse_ciphers_json(json: &str) -> Result<Vec<CipherResponse>, VaultError> {
    Ok(match serde_json::from_str(json)? {
        CiphersPayload::List(ciphers) => ciphers,
        CiphersPayload::Sync(sync) => sync.ciphers,
    })
}

pub fn parse_sync_json(json: &str) -> Result<SyncResponse, VaultError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_and_camel_case_both_parse() {
        let pascal = r#"[{"Id":"a","Type":1,"Name":"2.x|y|z","OrganizationId":"o",
            "Login":{"Username":"u","Uris":[{"Uri":"2.a|b|c","Match":3}]}}]"#;
        let camel = r#"[{"id":"a","type":1,"name":"2.x|y|z","organizationId":"o",
            "login":{"username":"u","uris":[{"uri":"2.a|b|c","match":3}]}}]"#;
        for json in [pascal, camel] {
            let ciphers = parse_ciphers_json(json).unwrap();
            assert_eq!(ciphers.len(), 1);
            let c = &ciphers[0];
            assert_eq!(c.id, "a");
            assert_eq!(c.cipher_type, 1);
            assert_eq!(c.organization_id.as_deref(), Some("o"));
            let login = c.login.as_ref().unwrap();
            assert_eq!(login.username.as_deref(), Some("u"));
            let uris = login.uris.as_ref().unwrap();
            assert_eq!(uris[0].match_type, Some(3));
        }
    }

    #[test]
    fn sync_object_parses() {
        let json = r#"{"Folders":[{"Id":"f","Name":"2.a|b|c"}],
            "Ciphers":[{"Id":"c1","Type":2,"SecureNote":{"Type":0}}],
            "Sends":[{"Id":"s","AccessId":"acc","Key":"2.k|k|k","Type":0}]}"#;
        let ciphers = parse_ciphers_json(json).unwrap();
        assert_eq!(ciphers.len(), 1);
        assert_eq!(ciphers[0].secure_note.as_ref().unwrap().note_type, 0);

        let sync = parse_sync_json(json).unwrap();
        assert_eq!(sync.folders[0].id, "f");
        assert_eq!(sync.sends[0].access_id, "acc");
    }

    #[test]
    fn missing_optional_fields_default() {
        let ciphers = parse_ciphers_json(r#"[{"id":"x"}]"#).unwrap();
        let c = &ciphers[0];
        assert_eq!(c.cipher_type, 0);
        assert!(!c.favorite);
        assert_eq!(c.reprompt, 0);
        assert!(c.fields.is_none());
    }

    #[test]
    fn field_linked_id() {
        let json = r#"[{"id":"x","fields":[{"type":3,"name":"n","value":null,"linkedId":100}]}]"#;
        let ciphers = parse_ciphers_json(json).unwrap();
        let field = &ciphers[0].fields.as_ref().unwrap()[0];
        assert_eq!(field.field_type, 3);
        assert_eq!(field.linked_id, Some(100));
        assert!(field.value.is_none());
    }

    #[test]
    fn serializes_camel_case_with_wire_type_names() {
        let cipher = CipherResponse {
            cipher_type: 1,
            folder_id: Some("f".to_string()),
            login: Some(LoginResponse {
                uris: Some(vec![UriResponse {
                    uri: Some("2.a|b|c".to_string()),
                    match_type: Some(3),
                }]),
                ..Default::default()
            }),
            fields: Some(vec![FieldResponse {
                field_type: 1,
                ..Default::default()
            }]),
            ..Default::default()
        };
        let value = serde_json::to_value(&cipher).unwrap();
        assert_eq!(value["type"], 1);
        assert_eq!(value["folderId"], "f");
        assert_eq!(value["login"]["uris"][0]["match"], 3);
        assert_eq!(value["fields"][0]["type"], 1);
        assert!(value.get("cipher_type").is_none());

        let back = parse_ciphers_json(&format!("[{value}]")).unwrap();
        assert_eq!(back[0].cipher_type, 1);
        assert_eq!(back[0].folder_id.as_deref(), Some("f"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            parse_ciphers_json("{not json"),
            Err(VaultError::Json(_))
        ));
    }
}
