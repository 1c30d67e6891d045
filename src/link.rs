//! Shareable links
//!
//! A link is the decrypt page address with the percent-encoded token as
//! its fragment: `decrypt.html#%5BOV_v2%5D...`. Browsers never send the
//! fragment to a server, so the token stays on the client.

use crate::error::{ErrorCategory, ErrorKind, OvError, Result};

/// Build a shareable link for `token`, replacing any fragment `base_url`
/// already carries.
pub fn share_link(base_url: &str, token: &str) -> String {
    let base = base_url.split_once('#').map_or(base_url, |(base, _)| base);
    format!("{}#{}", base, urlencoding::encode(token))
}

/// Extract token text from whatever the user pasted.
///
/// Accepts a full link, a bare `#fragment`, a raw token, or the `(S)...(E)`
/// display form. Only fragments are percent-decoded; raw tokens are
/// returned as given (minus surrounding whitespace) and validated later by
/// the codec.
pub fn token_from_input(input: &str) -> Result<String> {
    let input = input.trim();

    let Some((_, fragment)) = input.split_once('#') else {
        return Ok(input.to_string());
    };

    if fragment.is_empty() {
        return Err(OvError::with_kind(
            ErrorCategory::User,
            ErrorKind::LinkInvalid,
            "link has an empty fragment; no encrypted data to decode",
        ));
    }

    let decoded = urlencoding::decode(fragment).map_err(|e| {
        OvError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::LinkInvalid,
            "link fragment is not valid percent-encoded UTF-8",
            e,
        )
    })?;
    tracing::trace!(fragment_len = fragment.len(), "extracted token from link fragment");
    Ok(decoded.into_owned())
}
