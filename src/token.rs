//! Binary token layouts
//!
//! Version 2, the one new tokens use:
//! - version: 1 byte (0x02)
//! - salt: 16 bytes
//! - nonce: 24 bytes
//! - sealed box: variable length (16-byte Poly1305 tag, then ciphertext)
//!
//! Version 1 is bare AES-128-CBC ciphertext, one or more 16-byte blocks.
//! It has no version byte, and salt and IV are fixed by the version.
//!
//! There are no length prefixes. The text form is produced by
//! [`crate::varmor`].

use crate::error::{ErrorCategory, ErrorKind, OvError, Result};
use crate::varmor;
use crate::version::Version;
use std::fmt;
use std::str::FromStr;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 tag at the front of the sealed box
pub const TAG_LEN: usize = 16;

/// AES block length; version 1 payloads are a whole number of blocks
pub const BLOCK_LEN: usize = 16;

/// Version byte, salt and nonce
const HEADER_LEN: usize = 1 + SALT_LEN + NONCE_LEN;

/// Salt, nonce and sealed box of a version 2 token. Holds no secrets:
/// all three are public by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    sealed: Vec<u8>,
}

impl SealedBox {
    pub fn new(salt: [u8; SALT_LEN], nonce: [u8; NONCE_LEN], sealed: Vec<u8>) -> Self {
        Self {
            salt,
            nonce,
            sealed,
        }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Poly1305 tag followed by ciphertext.
    pub fn sealed(&self) -> &[u8] {
        &self.sealed
    }
}

/// A parsed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// AES-128-CBC ciphertext blocks.
    V1(Vec<u8>),
    V2(SealedBox),
}

impl From<SealedBox> for Token {
    fn from(sealed: SealedBox) -> Self {
        Token::V2(sealed)
    }
}

impl Token {
    pub fn version(&self) -> Version {
        match self {
            Token::V1(_) => Version::V1,
            Token::V2(_) => Version::V2,
        }
    }

    pub fn sealed_box(&self) -> Option<&SealedBox> {
        match self {
            Token::V2(sealed) => Some(sealed),
            Token::V1(_) => None,
        }
    }

    /// The binary payload, before base64.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Token::V1(blocks) => blocks.clone(),
            Token::V2(sealed) => {
                let mut output = Vec::with_capacity(HEADER_LEN + sealed.sealed.len());
                output.extend(Version::V2.byte());
                output.extend_from_slice(&sealed.salt);
                output.extend_from_slice(&sealed.nonce);
                output.extend_from_slice(&sealed.sealed);
                output
            }
        }
    }

    /// Slices a binary payload according to the layout of `version`.
    pub fn from_bytes(version: Version, bytes: &[u8]) -> Result<Self> {
        match version {
            Version::V1 => parse_blocks(bytes).map(Token::V1),
            Version::V2 => parse_sealed_box(bytes).map(Token::V2),
        }
    }

    /// Text form: visible version tag plus base64.
    pub fn armor(&self) -> String {
        varmor::wrap(self.version(), &self.to_bytes())
    }

    /// The `(S){base64}(E)` form the encrypt page displays. That form has
    /// no tag and always reads back as version 1, so other versions have
    /// none.
    pub fn display_form(&self) -> Option<String> {
        match self {
            Token::V1(blocks) => Some(varmor::display_form(blocks)),
            Token::V2(_) => None,
        }
    }

    /// Parses the text form. The visible tag picks the layout before
    /// anything is decoded.
    pub fn parse(text: &str) -> Result<Self> {
        let (version, body) = varmor::unwrap(text)?;
        Self::from_bytes(version, &body)
    }
}

fn parse_blocks(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.is_empty() || bytes.len() % BLOCK_LEN != 0 {
        return Err(truncated(
            "input likely truncated: not a whole number of cipher blocks",
        ));
    }
    Ok(bytes.to_vec())
}

fn parse_sealed_box(bytes: &[u8]) -> Result<SealedBox> {
    let mut pos = 0;

    let Some(&version_byte) = bytes.first() else {
        return Err(truncated("input likely truncated while reading version"));
    };
    if Some(version_byte) != Version::V2.byte() {
        return Err(OvError::with_kind(
            ErrorCategory::User,
            ErrorKind::VersionMismatch,
            format!(
                "token tagged {} but payload starts with version byte 0x{:02x}",
                Version::V2,
                version_byte
            ),
        ));
    }
    pos += 1;

    let salt: [u8; SALT_LEN] = bytes
        .get(pos..pos + SALT_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| truncated("input likely truncated while reading salt"))?;
    pos += SALT_LEN;

    let nonce: [u8; NONCE_LEN] = bytes
        .get(pos..pos + NONCE_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| truncated("input likely truncated while reading nonce"))?;
    pos += NONCE_LEN;

    let sealed = &bytes[pos..];
    if sealed.len() < TAG_LEN {
        return Err(truncated(
            "input likely truncated while reading sealed box",
        ));
    }

    Ok(SealedBox::new(salt, nonce, sealed.to_vec()))
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.armor())
    }
}

impl FromStr for Token {
    type Err = OvError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn truncated(msg: &'static str) -> OvError {
    OvError::with_kind(ErrorCategory::User, ErrorKind::TruncatedInput, msg)
}
