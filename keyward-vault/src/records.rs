//! Decrypted vault records.
//!
//! `Clone` is not derived on anything holding secrets, so plaintext cannot be
//! copied into places that outlive the record and escape zeroization.

use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherType {
    Login,
    SecureNote,
    Card,
    Identity,
    Unknown(u8),
}

impl CipherType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Login,
            2 => Self::SecureNote,
            3 => Self::Card,
            4 => Self::Identity,
            other => Self::Unknown(other),
        }
    }

    /// The wire code, inverse of [`Self::from_u8`].
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Login => 1,
            Self::SecureNote => 2,
            Self::Card => 3,
            Self::Identity => 4,
            Self::Unknown(other) => *other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::SecureNote => "note",
            Self::Card => "card",
            Self::Identity => "identity",
            Self::Unknown(_) => "unknown",
        }
    }
}

pub struct DecryptedCipher {
    pub id: String,
    pub organization_id: Option<String>,
    pub folder_id: Option<String>,
    pub cipher_type: CipherType,
    /// Empty when the name is missing or fails to decrypt.
    pub name: String,
    pub notes: Option<Zeroizing<String>>,
    pub login: Option<DecryptedLogin>,
    pub card: Option<DecryptedCard>,
    pub identity: Option<DecryptedIdentity>,
    pub secure_note: Option<DecryptedSecureNote>,
    pub fields: Vec<DecryptedField>,
    pub favorite: bool,
    pub reprompt: u8,
    pub revision_date: Option<String>,
    pub creation_date: Option<String>,
    pub deleted_date: Option<String>,
}

impl DecryptedCipher {
    /// In the trash (has a deletion date).
    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }
}

impl std::fmt::Debug for DecryptedCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedCipher")
            .field("id", &self.id)
            .field("organization_id", &self.organization_id)
            .field("folder_id", &self.folder_id)
            .field("cipher_type", &self.cipher_type)
            .field("name", &self.name)
            .field("notes", &self.notes.as_ref().map(|_| "[redacted]"))
            .field("login", &self.login)
            .field("card", &self.card)
            .field("identity", &self.identity)
            .field("secure_note", &self.secure_note)
            .field("fields", &self.fields.len())
            .field("favorite", &self.favorite)
            .field("reprompt", &self.reprompt)
            .field("revision_date", &self.revision_date)
            .field("creation_date", &self.creation_date)
            .field("deleted_date", &self.deleted_date)
            .finish()
    }
}

pub struct DecryptedLogin {
    /// Username is PII, zeroized on drop.
    pub username: Option<Zeroizing<String>>,
    pub password: Option<Zeroizing<String>>,
    pub totp: Option<Zeroizing<String>>,
    pub uris: Vec<DecryptedUri>,
}

impl DecryptedLogin {
    pub fn primary_uri(&self) -> Option<&str> {
        self.uris.first().map(|u| u.uri.as_str())
    }
}

impl std::fmt::Debug for DecryptedLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedLogin")
            .field("username", &self.username.as_ref().map(|_| "[redacted]"))
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("totp", &self.totp.as_ref().map(|_| "[redacted]"))
            .field("uris", &self.uris)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedUri {
    pub uri: String,
    /// Autofill match rule (0 Domain, 1 Host, 2 StartsWith, 3 Exact, 4 Regex, 5 Never).
    pub match_type: Option<u8>,
}

pub struct DecryptedCard {
    pub cardholder_name: Option<Zeroizing<String>>,
    pub brand: Option<String>,
    pub number: Option<Zeroizing<String>>,
    pub exp_month: Option<Zeroizing<String>>,
    pub exp_year: Option<Zeroizing<String>>,
    pub code: Option<Zeroizing<String>>,
}

impl DecryptedCard {
    /// `MM/YY`, or `None` unless both month and year are known.
    pub fn formatted_expiry(&self) -> Option<String> {
        let month = self.exp_month.as_deref()?;
        let year = self.exp_year.as_deref()?;
        Some(format!("{month:0>2}/{}", last_chars(year, 2)))
    }

    /// Last four digits behind a fixed mask. Numbers shorter than four
    /// characters are returned unchanged.
    pub fn masked_number(&self) -> Option<String> {
        let number = self.number.as_deref()?;
        if number.chars().count() < 4 {
            return Some(number.to_string());
        }
        Some(format!("**** **** **** {}", last_chars(number, 4)))
    }
}

fn last_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((i, _)) if n > 0 => &s[i..],
        _ if n == 0 => "",
        _ => s,
    }
}

impl std::fmt::Debug for DecryptedCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedCard")
            .field(
                "cardholder_name",
                &self.cardholder_name.as_ref().map(|_| "[redacted]"),
            )
            .field("brand", &self.brand)
            .field("number", &self.number.as_ref().map(|_| "[redacted]"))
            .field("exp_month", &self.exp_month.as_ref().map(|_| "[redacted]"))
            .field("exp_year", &self.exp_year.as_ref().map(|_| "[redacted]"))
            .field("code", &self.code.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// All identity fields are PII and zeroized on drop.
#[derive(Default)]
pub struct DecryptedIdentity {
    pub title: Option<Zeroizing<String>>,
    pub first_name: Option<Zeroizing<String>>,
    pub middle_name: Option<Zeroizing<String>>,
    pub last_name: Option<Zeroizing<String>>,
    pub address1: Option<Zeroizing<String>>,
    pub address2: Option<Zeroizing<String>>,
    pub address3: Option<Zeroizing<String>>,
    pub city: Option<Zeroizing<String>>,
    pub state: Option<Zeroizing<String>>,
    pub postal_code: Option<Zeroizing<String>>,
    pub country: Option<Zeroizing<String>>,
    pub company: Option<Zeroizing<String>>,
    pub email: Option<Zeroizing<String>>,
    pub phone: Option<Zeroizing<String>>,
    pub ssn: Option<Zeroizing<String>>,
    pub username: Option<Zeroizing<String>>,
    pub passport_number: Option<Zeroizing<String>>,
    pub license_number: Option<Zeroizing<String>>,
}

impl DecryptedIdentity {
    /// Title, first, middle and last name, blanks skipped, space separated.
    pub fn full_name(&self) -> String {
        join_present(
            [
                &self.title,
                &self.first_name,
                &self.middle_name,
                &self.last_name,
            ],
            " ",
        )
    }

    /// Address lines, city, state, postal code and country, comma separated.
    pub fn formatted_address(&self) -> String {
        join_present(
            [
                &self.address1,
                &self.address2,
                &self.address3,
                &self.city,
                &self.state,
                &self.postal_code,
                &self.country,
            ],
            ", ",
        )
    }
}

fn join_present<const N: usize>(parts: [&Option<Zeroizing<String>>; N], sep: &str) -> String {
    parts
        .iter()
        .filter_map(|p| p.as_deref())
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

impl std::fmt::Debug for DecryptedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn r(opt: &Option<Zeroizing<String>>) -> &str {
            if opt.is_some() { "[redacted]" } else { "<none>" }
        }
        f.debug_struct("DecryptedIdentity")
            .field("title", &r(&self.title))
            .field("first_name", &r(&self.first_name))
            .field("middle_name", &r(&self.middle_name))
            .field("last_name", &r(&self.last_name))
            .field("address1", &r(&self.address1))
            .field("address2", &r(&self.address2))
            .field("address3", &r(&self.address3))
            .field("city", &r(&self.city))
            .field("state", &r(&self.state))
            .field("postal_code", &r(&self.postal_code))
            .field("country", &r(&self.country))
            .field("company", &r(&self.company))
            .field("email", &r(&self.email))
            .field("phone", &r(&self.phone))
            .field("ssn", &r(&self.ssn))
            .field("username", &r(&self.username))
            .field("passport_number", &r(&self.passport_number))
            .field("license_number", &r(&self.license_number))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptedSecureNote {
    pub note_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Hidden,
    Boolean,
    Linked,
    Unknown(u8),
}

impl FieldType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Text,
            1 => Self::Hidden,
            2 => Self::Boolean,
            3 => Self::Linked,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Hidden => 1,
            Self::Boolean => 2,
            Self::Linked => 3,
            Self::Unknown(other) => *other,
        }
    }
}

pub struct DecryptedField {
    pub name: String,
    /// Empty when the value is missing or fails to decrypt. Hidden fields
    /// hold secrets, so every value is zeroized.
    pub value: Zeroizing<String>,
    pub field_type: FieldType,
    /// For linked fields, the id of the login/card/identity property.
    pub linked_id: Option<u32>,
}

impl DecryptedField {
    pub fn is_hidden(&self) -> bool {
        self.field_type == FieldType::Hidden
    }

    pub fn is_boolean(&self) -> bool {
        self.field_type == FieldType::Boolean
    }

    pub fn is_linked(&self) -> bool {
        self.field_type == FieldType::Linked
    }
}

impl std::fmt::Debug for DecryptedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedField")
            .field("name", &self.name)
            .field("value", &"[redacted]")
            .field("field_type", &self.field_type)
            .field("linked_id", &self.linked_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFolder {
    pub id: String,
    /// Empty when the name is missing or fails to decrypt.
    pub name: String,
    pub revision_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z(s: &str) -> Option<Zeroizing<String>> {
        Some(Zeroizing::new(s.to_string()))
    }

    fn card(number: Option<&str>, month: Option<&str>, year: Option<&str>) -> DecryptedCard {
        DecryptedCard {
            cardholder_name: None,
            brand: None,
            number: number.and_then(z),
            exp_month: month.and_then(z),
            exp_year: year.and_then(z),
            code: None,
        }
    }

    #[test]
    fn cipher_type_from_u8() {
        assert_eq!(CipherType::from_u8(1), CipherType::Login);
        assert_eq!(CipherType::from_u8(2), CipherType::SecureNote);
        assert_eq!(CipherType::from_u8(3), CipherType::Card);
        assert_eq!(CipherType::from_u8(4), CipherType::Identity);
        assert_eq!(CipherType::from_u8(5), CipherType::Unknown(5));
        assert_eq!(CipherType::Unknown(42).as_str(), "unknown");
        for code in 0..=6 {
            assert_eq!(CipherType::from_u8(code).as_u8(), code);
            assert_eq!(FieldType::from_u8(code).as_u8(), code);
        }
    }

    #[test]
    fn card_expiry_pads_month_and_trims_year() {
        assert_eq!(
            card(None, Some("3"), Some("2027")).formatted_expiry().as_deref(),
            Some("03/27")
        );
        assert_eq!(
            card(None, Some("12"), Some("29")).formatted_expiry().as_deref(),
            Some("12/29")
        );
        assert_eq!(card(None, Some("12"), None).formatted_expiry(), None);
    }

    #[test]
    fn card_number_mask() {
        assert_eq!(
            card(Some("4111111111111234"), None, None)
                .masked_number()
                .as_deref(),
            Some("**** **** **** 1234")
        );
        assert_eq!(
            card(Some("123"), None, None).masked_number().as_deref(),
            Some("123")
        );
        assert_eq!(card(None, None, None).masked_number(), None);
    }

    #[test]
    fn identity_name_and_address_skip_blanks() {
        let identity = DecryptedIdentity {
            title: z("Dr"),
            first_name: z("Ada"),
            middle_name: z(" "),
            last_name: z("Lovelace"),
            address1: z("12 Analytical St"),
            city: z("London"),
            postal_code: z("N1"),
            country: z("UK"),
            ..Default::default()
        };
        assert_eq!(identity.full_name(), "Dr Ada Lovelace");
        assert_eq!(
            identity.formatted_address(),
            "12 Analytical St, London, N1, UK"
        );
        assert_eq!(DecryptedIdentity::default().full_name(), "");
    }

    #[test]
    fn primary_uri_is_first() {
        let login = DecryptedLogin {
            username: None,
            password: None,
            totp: None,
            uris: vec![
                DecryptedUri {
                    uri: "https://a.example".to_string(),
                    match_type: None,
                },
                DecryptedUri {
                    uri: "https://b.example".to_string(),
                    match_type: Some(3),
                },
            ],
        };
        assert_eq!(login.primary_uri(), Some("https://a.example"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let field = DecryptedField {
            name: "pin".to_string(),
            value: Zeroizing::new("9876".to_string()),
            field_type: FieldType::from_u8(1),
            linked_id: None,
        };
        assert!(field.is_hidden());
        let dbg = format!("{field:?}");
        assert!(!dbg.contains("9876"));

        let c = card(Some("4111111111111234"), Some("1"), Some("30"));
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("1234"));
    }
}
