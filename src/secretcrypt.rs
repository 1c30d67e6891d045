//! Encryption/decryption using scrypt + XSalsa20Poly1305
//!
//! This module implements password-based encryption using:
//! - scrypt for key derivation from the password
//! - NaCl secretbox (XSalsa20Poly1305) for authenticated encryption
//!
//! Parameters are those of [`Version::V2`](crate::Version::V2). No
//! associated data is authenticated. Callers enforce the non-empty password
//! precondition.

use crate::error::{ErrorCategory, ErrorKind, OvError, Result};
use crate::token::{NONCE_LEN, SALT_LEN, SealedBox, TAG_LEN};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;
use scrypt::{Params, scrypt};
use zeroize::Zeroizing;

/// Length of derived key in bytes
const KEY_LEN: usize = 32;

/// scrypt log2(N) parameter (CPU/memory cost, N = 32768)
const SCRYPT_LOG_N: u8 = 15;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// Derive a 32-byte key from a password and salt using scrypt
pub(crate) fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        OvError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivationFailure,
            format!("failed to create scrypt params: {}", e),
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(password, salt, &params, &mut key[..]).map_err(|e| {
        OvError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivationFailure,
            format!("scrypt key derivation failed: {}", e),
        )
    })?;

    Ok(key)
}

fn cipher(key: &[u8; KEY_LEN]) -> Result<XSalsa20Poly1305> {
    XSalsa20Poly1305::new_from_slice(key).map_err(|e| {
        OvError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CipherFailure,
            format!("derived key rejected by cipher: {}", e),
        )
    })
}

/// Seal plaintext under a password using a fresh random salt and nonce
pub fn seal(password: &[u8], plaintext: &[u8]) -> Result<SealedBox> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_deterministic(password, plaintext, &salt, &nonce)
}

/// Seal plaintext under a password using the provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `seal()` which generates random salt/nonce.
#[doc(hidden)]
pub fn seal_deterministic(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<SealedBox> {
    let key = derive_key(password, salt)?;
    let sealed = cipher(&key)?
        .encrypt(&Nonce::from(*nonce), plaintext)
        .map_err(|e| {
            OvError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                format!("encryption failed: {}", e),
            )
        })?;

    Ok(SealedBox::new(*salt, *nonce, sealed))
}

/// Open a sealed box with a password, re-deriving the key from its salt
pub fn open(password: &[u8], sealed: &SealedBox) -> Result<Vec<u8>> {
    let key = derive_key(password, sealed.salt())?;
    open_with_key(&key, sealed.nonce(), sealed.sealed())
}

/// Any tag mismatch lands here, whatever its cause.
fn open_with_key(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Result<Vec<u8>> {
    if sealed.len() < TAG_LEN {
        return Err(OvError::authentication_failed());
    }
    cipher(key)?
        .decrypt(&Nonce::from(*nonce), sealed)
        .map_err(|_| OvError::authentication_failed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plaintext() {
        let token = seal(b"test", b"").unwrap();
        assert_eq!(token.sealed().len(), TAG_LEN);
        assert_eq!(open(b"test", &token).unwrap(), b"");
    }

    #[test]
    fn test_small_plaintext() {
        let token = seal(b"test", b"hello").unwrap();
        assert_eq!(open(b"test", &token).unwrap(), b"hello");
    }

    #[test]
    fn test_deterministic_encryption() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];

        let t1 = seal_deterministic(b"test", b"hello world", &salt, &nonce).unwrap();
        let t2 = seal_deterministic(b"test", b"hello world", &salt, &nonce).unwrap();

        // Same salt/nonce produces identical output
        assert_eq!(t1, t2);
        assert_eq!(open(b"test", &t1).unwrap(), b"hello world");
    }

    #[test]
    fn test_different_nonce_different_ciphertext() {
        let salt = [1u8; SALT_LEN];

        let t1 = seal_deterministic(b"test", b"hello world", &salt, &[2u8; NONCE_LEN]).unwrap();
        let t2 = seal_deterministic(b"test", b"hello world", &salt, &[3u8; NONCE_LEN]).unwrap();

        assert_ne!(t1.sealed(), t2.sealed());
        assert_eq!(open(b"test", &t1).unwrap(), open(b"test", &t2).unwrap());
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_seal() {
        let t1 = seal(b"test", b"same input").unwrap();
        let t2 = seal(b"test", b"same input").unwrap();

        assert_ne!(t1.salt(), t2.salt());
        assert_ne!(t1.nonce(), t2.nonce());
        assert_ne!(t1.sealed(), t2.sealed());
    }

    #[test]
    fn test_wrong_password() {
        let token = seal(b"correct", b"secret data").unwrap();
        let err = open(b"wrong", &token).expect_err("expected authentication failure");

        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert!(
            err.to_string()
                .contains("corrupt input, tampered-with data, or bad password")
        );
    }

    #[test]
    fn test_every_sealed_byte_is_authenticated() {
        let salt = [9u8; SALT_LEN];
        let nonce = [8u8; NONCE_LEN];
        let token = seal_deterministic(b"test", b"tamper target", &salt, &nonce).unwrap();
        let key = derive_key(b"test", &salt).unwrap();

        for i in 0..token.sealed().len() {
            let mut sealed = token.sealed().to_vec();
            sealed[i] ^= 0x01;
            let err = open_with_key(&key, &nonce, &sealed).expect_err("tampering not detected");
            assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed), "byte {}", i);
        }
    }

    #[test]
    fn test_every_nonce_byte_is_authenticated() {
        let salt = [9u8; SALT_LEN];
        let nonce = [8u8; NONCE_LEN];
        let token = seal_deterministic(b"test", b"tamper target", &salt, &nonce).unwrap();
        let key = derive_key(b"test", &salt).unwrap();

        for i in 0..NONCE_LEN {
            let mut bad_nonce = nonce;
            bad_nonce[i] ^= 0x80;
            let err = open_with_key(&key, &bad_nonce, token.sealed())
                .expect_err("tampering not detected");
            assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed), "byte {}", i);
        }
    }

    #[test]
    fn test_tampered_salt() {
        let token = seal(b"test", b"hello").unwrap();
        let mut salt = *token.salt();
        salt[0] ^= 0xFF;
        let tampered = SealedBox::new(salt, *token.nonce(), token.sealed().to_vec());

        let err = open(b"test", &tampered).expect_err("tampering not detected");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_key_derivation_depends_on_inputs() {
        let k1 = derive_key(b"password1", &[0x42; SALT_LEN]).unwrap();
        let k2 = derive_key(b"password2", &[0x42; SALT_LEN]).unwrap();
        let k3 = derive_key(b"password1", &[0x43; SALT_LEN]).unwrap();
        let k4 = derive_key(b"password1", &[0x42; SALT_LEN]).unwrap();

        assert_ne!(*k1, *k2);
        assert_ne!(*k1, *k3);
        assert_eq!(*k1, *k4);
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();
        let token = seal(b"test", &plaintext).unwrap();
        assert_eq!(open(b"test", &token).unwrap(), plaintext);
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0x42u8; 128 * 1024];
        let token = seal(b"test", &plaintext).unwrap();
        assert_eq!(open(b"test", &token).unwrap(), plaintext);
    }

    #[test]
    fn test_fixed_vector() {
        // Produced by an independent scrypt + XSalsa20Poly1305 implementation.
        let salt = [0x42u8; SALT_LEN];
        let nonce = [0x24u8; NONCE_LEN];

        let token = seal_deterministic(b"test", b"test payload", &salt, &nonce).unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x02,
            0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42,
            0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42,
            0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24,
            0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24,
            0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24,
            0x7b, 0x65, 0xb9, 0x41, 0xad, 0xd0, 0x0b, 0x0f,
            0x75, 0xfd, 0x53, 0x90, 0x06, 0x36, 0xc1, 0x2a,
            0x01, 0x5a, 0x1c, 0xf7, 0x5d, 0x73, 0xbf, 0xf3,
            0xbb, 0x8f, 0x44, 0x2e,
        ];

        assert_eq!(crate::Token::from(token.clone()).to_bytes(), expected);
        assert_eq!(open(b"test", &token).unwrap(), b"test payload");
    }
}
