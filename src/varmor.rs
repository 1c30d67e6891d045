//! Versioned armoring for binary data
//!
//! Provides standard base64 encoding with a visible version tag. The
//! armored format is:
//! - `[OV_v1]` or `[OV_v2]` followed by padded base64 (`A-Z a-z 0-9 + /`)
//! - Free of whitespace (including newlines)
//! - Pure ASCII, so it survives QR codes and percent-encoding unchanged
//!
//! The encrypt page also shows the payload as `(S){base64}(E)`. That
//! display form is accepted as an alias for version 1.

use crate::error::{ErrorCategory, ErrorKind, OvError, Result};
use crate::version::Version;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Prefix shared by every ovcrypt version tag
const TAG_PREFIX: &str = "[OV_";

const DISPLAY_START: &str = "(S)";
const DISPLAY_END: &str = "(E)";

/// Wrap bytes in armor, returning the armored string
///
/// Format: {version tag}{base64}
pub fn wrap(version: Version, body: &[u8]) -> String {
    format!("{}{}", version.tag(), STANDARD.encode(body))
}

/// Wrap bytes in the `(S)...(E)` display form
pub fn display_form(body: &[u8]) -> String {
    format!("{}{}{}", DISPLAY_START, STANDARD.encode(body), DISPLAY_END)
}

/// Unwrap an armored string, returning the tagged version and original bytes
///
/// Dispatch happens on the visible tag alone; nothing is base64-decoded
/// for an unrecognized tag.
pub fn unwrap(armored: &str) -> Result<(Version, Vec<u8>)> {
    if armored.is_empty() {
        return Err(OvError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input is empty; likely truncated",
        ));
    }

    if let Some((version, encoded)) = split_tag(armored) {
        return Ok((version, decode_body(encoded)?));
    }

    if let Some(encoded) = armored
        .strip_prefix(DISPLAY_START)
        .and_then(|rest| rest.strip_suffix(DISPLAY_END))
    {
        return Ok((Version::V1, decode_body(encoded)?));
    }

    if armored.starts_with(TAG_PREFIX) {
        Err(OvError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringFromFuture,
            "input claims to be an ovcrypt token, but not a version we support",
        ))
    } else {
        Err(OvError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input unrecognized as an ovcrypt token",
        ))
    }
}

fn split_tag(armored: &str) -> Option<(Version, &str)> {
    let end = armored.find(']')?;
    let (tag, rest) = armored.split_at(end + 1);
    Version::from_tag(tag).map(|version| (version, rest))
}

fn decode_body(encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        OvError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
