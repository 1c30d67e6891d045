//! Version 1 tokens, as the original encrypt page produced them
//!
//! PBKDF2-HMAC-SHA256 over the password with a fixed all-zero salt gives a
//! 16-byte AES key. The payload is AES-128-CBC under an all-zero IV with
//! PKCS#7 padding. Nothing in it is random and only the padding is
//! checked, so this module opens tokens but never makes them; new tokens
//! come from [`crate::secretcrypt`].

use crate::error::{ErrorCategory, ErrorKind, OvError, Result};
use crate::token::BLOCK_LEN;
use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Length of derived key in bytes (AES-128)
const KEY_LEN: usize = 16;

/// PBKDF2 iteration count
const PBKDF2_ROUNDS: u32 = 100_000;

const SALT: [u8; 16] = [0u8; 16];

const IV: [u8; BLOCK_LEN] = [0u8; BLOCK_LEN];

fn derive_key(password: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, &SALT, PBKDF2_ROUNDS, &mut key[..]);
    key
}

/// Decrypt version 1 ciphertext blocks with a password
///
/// A wrong password leaves broken padding behind in all but a tiny
/// fraction of cases. The encrypt page only ever sealed text, so a result
/// that is not UTF-8 counts as a failed open too.
pub fn open(password: &[u8], blocks: &[u8]) -> Result<Vec<u8>> {
    let key = derive_key(password);
    let decryptor = Aes128CbcDec::new_from_slices(&key[..], &IV).map_err(|e| {
        OvError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CipherFailure,
            format!("derived key rejected by cipher: {}", e),
        )
    })?;

    let mut plaintext = Zeroizing::new(
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(blocks)
            .map_err(|_| OvError::authentication_failed())?,
    );
    if std::str::from_utf8(&plaintext).is_err() {
        return Err(OvError::authentication_failed());
    }

    Ok(std::mem::take(&mut *plaintext))
}
