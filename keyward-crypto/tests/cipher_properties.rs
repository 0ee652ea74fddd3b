//! Property tests for the authenticated cipher and the KDF.

use keyward_crypto::cipher;
use keyward_crypto::kdf;
use keyward_crypto::{CipherString, CryptoError, MasterKey, SymmetricCryptoKey};

fn test_key() -> SymmetricCryptoKey {
    SymmetricCryptoKey::new([0x21; 32], [0x42; 32])
}

#[test]
fn known_pbkdf2_vector() {
    let key = kdf::derive_master_key_pbkdf2("password", "user@example.com", 5000).unwrap();
    use base64::Engine;
    assert_eq!(
        base64::engine::general_purpose::STANDARD.encode(key.as_bytes()),
        "pj9prw/OHPleXI6bRdmlaD+saJS4awrMiQsQiDjeu2I="
    );
}

#[test]
fn legacy_string_without_type_has_no_mac() {
    let ct = cipher::encrypt(b"x", &test_key()).unwrap();
    let body = ct.strip_prefix("2.").unwrap();
    let legacy: String = body.splitn(3, '|').take(2).collect::<Vec<_>>().join("|");
    let cs = CipherString::parse(&legacy).unwrap();
    assert!(cs.mac().is_none());
    assert_eq!(cs.enc_type().code(), 0);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn encrypt_decrypt_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let key = test_key();
            let ct = cipher::encrypt(&data, &key).unwrap();
            let pt = cipher::decrypt(&ct, &key).unwrap();
            prop_assert_eq!(pt.as_slice(), data.as_slice());
        }

        #[test]
        fn serialized_form_reparses(data in proptest::collection::vec(any::<u8>(), 0..128)) {
            let cs = CipherString::encrypt(&data, &test_key()).unwrap();
            let reparsed = CipherString::parse(&cs.to_string()).unwrap();
            prop_assert_eq!(reparsed, cs);
        }

        #[test]
        fn data_bit_flip_is_rejected(
            data in proptest::collection::vec(any::<u8>(), 1..256),
            pos in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = test_key();
            let cs = CipherString::encrypt(&data, &key).unwrap();
            let CipherString::AesCbc256HmacSha256 { iv, mut data, mac } = cs else {
                return Err(TestCaseError::fail("expected type 2"));
            };
            let i = pos.index(data.len());
            data[i] ^= 1 << bit;
            let tampered = CipherString::AesCbc256HmacSha256 { iv, data, mac };
            prop_assert!(matches!(
                tampered.decrypt(&key),
                Err(CryptoError::MacVerificationFailed)
            ));
        }

        #[test]
        fn mac_bit_flip_is_rejected(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            pos in 0usize..32,
            bit in 0u8..8,
        ) {
            let key = test_key();
            let cs = CipherString::encrypt(&data, &key).unwrap();
            let CipherString::AesCbc256HmacSha256 { iv, data, mut mac } = cs else {
                return Err(TestCaseError::fail("expected type 2"));
            };
            mac[pos] ^= 1 << bit;
            let tampered = CipherString::AesCbc256HmacSha256 { iv, data, mac };
            prop_assert!(matches!(
                tampered.decrypt(&key),
                Err(CryptoError::MacVerificationFailed)
            ));
        }

        #[test]
        fn password_hash_is_deterministic(
            master in proptest::array::uniform32(any::<u8>()),
            password in ".{0,32}",
        ) {
            let mk = MasterKey::new(master);
            let a = kdf::derive_master_password_hash(&mk, &password);
            let b = kdf::derive_master_password_hash(&mk, &password);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.len(), 44);
        }

        #[test]
        fn stretch_always_yields_two_32_byte_halves(
            master in proptest::array::uniform32(any::<u8>()),
        ) {
            let key = kdf::stretch_master_key(&MasterKey::new(master)).unwrap();
            prop_assert_eq!(key.to_bytes().len(), 64);
            prop_assert_ne!(key.enc_key(), key.mac_key());
        }

        #[test]
        fn parser_never_panics(input in ".{0,200}") {
            let _ = CipherString::parse(&input);
        }
    }
}
