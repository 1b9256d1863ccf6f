//! Integration tests for key derivation and the cipher contract.

use securelookup::crypto::keys::{MAX_PRIMARY_HASH_SIZE, MIN_PRIMARY_HASH_SIZE};
use securelookup::crypto::{derive_primary_hash, derive_symmetric_key, Algorithms, PropertyBag};
use securelookup::errors::ErrorKind;

fn pbkdf2_props() -> PropertyBag {
    PropertyBag::parse("iterations=10").unwrap()
}

#[test]
fn two_stage_derivation_is_deterministic() {
    let algs = Algorithms::shared();
    let kdf = algs.password_hashes.lookup("PBKDF2-HMAC-SHA256").unwrap();
    let props = pbkdf2_props();

    let a = derive_primary_hash(kdf, "pw", 48, b"primary-salt", &props).unwrap();
    let b = derive_primary_hash(kdf, "pw", 48, b"primary-salt", &props).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
    assert_eq!(a.len(), 48);

    let k1 = derive_symmetric_key(kdf, &a, 32, b"secondary-salt", &props).unwrap();
    let k2 = derive_symmetric_key(kdf, &a, 32, b"other-salt", &props).unwrap();
    assert_eq!(k1.len(), 32);
    assert_ne!(*k1, *k2);
}

#[test]
fn primary_hash_size_bounds_are_enforced() {
    let algs = Algorithms::shared();
    let kdf = algs.password_hashes.lookup("PBKDF2-HMAC-SHA256").unwrap();
    let props = pbkdf2_props();

    for size in [MIN_PRIMARY_HASH_SIZE - 1, MAX_PRIMARY_HASH_SIZE + 1] {
        assert!(derive_primary_hash(kdf, "pw", size, b"salt", &props).is_err());
    }
    for size in [MIN_PRIMARY_HASH_SIZE, MAX_PRIMARY_HASH_SIZE] {
        assert!(derive_primary_hash(kdf, "pw", size, b"salt", &props).is_ok());
    }
}

#[test]
fn cipher_rejects_wrong_key() {
    let algs = Algorithms::shared();
    let cipher = algs.ciphers.lookup("ChaCha20-Poly1305").unwrap();
    let sealed = cipher.encrypt(b"hello", &[7u8; 32]).unwrap();

    assert_eq!(
        cipher
            .decrypt(&sealed.data, &[7u8; 32], &sealed.seed, &sealed.tag)
            .unwrap()
            .as_slice(),
        b"hello"
    );
    let err = cipher
        .decrypt(&sealed.data, &[8u8; 32], &sealed.seed, &sealed.tag)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
