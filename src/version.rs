//! Token format versions
//!
//! Every parameter that affects decryption (KDF work factor, field lengths,
//! cipher) is a constant of a version. New parameters mean a new variant;
//! existing variants never change so old tokens keep decoding.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Version {
    /// PBKDF2-HMAC-SHA256 (100 000 rounds, all-zero 16-byte salt) to a
    /// 16-byte key, AES-128-CBC with an all-zero IV and PKCS#7 padding.
    /// The payload is the bare ciphertext. Decode only.
    V1,
    /// scrypt (log2 N = 15, r = 8, p = 1) + XSalsa20Poly1305, 16-byte salt,
    /// 24-byte nonce, no associated data. The payload starts with a
    /// version byte.
    V2,
}

impl Version {
    /// The version new tokens are produced under.
    pub const CURRENT: Version = Version::V2;

    /// Visible tag that prefixes the text form of a token.
    pub fn tag(self) -> &'static str {
        match self {
            Version::V1 => "[OV_v1]",
            Version::V2 => "[OV_v2]",
        }
    }

    /// Leading byte of the binary payload, for versions that carry one.
    pub fn byte(self) -> Option<u8> {
        match self {
            Version::V1 => None,
            Version::V2 => Some(0x02),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Version> {
        match tag {
            "[OV_v1]" => Some(Version::V1),
            "[OV_v2]" => Some(Version::V2),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => f.write_str("v1"),
            Version::V2 => f.write_str("v2"),
        }
    }
}
