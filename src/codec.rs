//! Password in, token text out, and back.
//!
//! `encode` and `decode` are the whole public contract: no I/O, no shared
//! state, safe to call from any number of threads at once. The only cost
//! worth noting is the scrypt work factor, which makes each call take a
//! noticeable fraction of a second.

use crate::error::{OvError, Result};
use crate::legacy;
use crate::secretcrypt;
use crate::token::Token;

/// Encrypt `plaintext` under `password` and return the token text.
///
/// Tokens are always produced under [`Version::CURRENT`](crate::Version::CURRENT).
/// Every call draws a new salt and nonce, so encoding the same input twice
/// yields two different tokens.
pub fn encode(plaintext: &[u8], password: &[u8]) -> Result<String> {
    if password.is_empty() {
        return Err(OvError::missing_password());
    }

    let token = Token::from(secretcrypt::seal(password, plaintext)?);
    let text = token.armor();
    tracing::debug!(
        version = %token.version(),
        plaintext_len = plaintext.len(),
        token_len = text.len(),
        "sealed token"
    );
    Ok(text)
}

/// Recover the plaintext of `token` under `password`.
///
/// Fails with [`ErrorKind::MissingPassword`](crate::ErrorKind::MissingPassword)
/// for an empty password, with a format kind for anything that does not
/// parse as a known token version, and with
/// [`ErrorKind::AuthenticationFailed`](crate::ErrorKind::AuthenticationFailed)
/// when the token does not open. Parsing completes before any key
/// derivation starts. Both versions decode.
pub fn decode(token: &str, password: &[u8]) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(OvError::missing_password());
    }

    let token = Token::parse(token).inspect_err(|e| {
        tracing::debug!(kind = ?e.kind, "token rejected before key derivation");
    })?;

    let opened = match &token {
        Token::V1(blocks) => legacy::open(password, blocks),
        Token::V2(sealed) => secretcrypt::open(password, sealed),
    };
    let plaintext = opened.inspect_err(|e| {
        tracing::debug!(version = %token.version(), kind = ?e.kind, "token did not open");
    })?;

    tracing::debug!(
        version = %token.version(),
        plaintext_len = plaintext.len(),
        "opened token"
    );
    Ok(plaintext)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FailureClass};
    use crate::token::SealedBox;

    /// Produced by the original encrypt page.
    const KNOWN_TOKEN: &str = "[OV_v1]61883g1J/nskSKh2UH2lsQ==";

    fn sealed_box(token: &str) -> SealedBox {
        Token::parse(token).unwrap().sealed_box().cloned().unwrap()
    }

    #[test]
    fn test_known_token() {
        assert_eq!(decode(KNOWN_TOKEN, b"pass").unwrap(), b"my secret");
    }

    #[test]
    fn test_known_token_wrong_password() {
        let err = decode(KNOWN_TOKEN, b"wrong").expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert_eq!(err.class(), FailureClass::Authentication);
    }

    #[test]
    fn test_known_token_display_form() {
        assert_eq!(
            decode("(S)61883g1J/nskSKh2UH2lsQ==(E)", b"pass").unwrap(),
            b"my secret"
        );
    }

    #[test]
    fn test_roundtrip_text() {
        let token = encode("Hello, this is a secret message!".as_bytes(), b"testPassword123")
            .unwrap();
        assert!(token.starts_with("[OV_v2]"));
        assert_eq!(
            decode(&token, b"testPassword123").unwrap(),
            "Hello, this is a secret message!".as_bytes()
        );
    }

    #[test]
    fn test_roundtrip_unicode_password_and_content() {
        let content = "Unicode: 中文 日本語 한국어 русский";
        let password = "unicode密码";
        let token = encode(content.as_bytes(), password.as_bytes()).unwrap();
        assert_eq!(decode(&token, password.as_bytes()).unwrap(), content.as_bytes());
    }

    #[test]
    fn test_roundtrip_empty_plaintext() {
        let token = encode(b"", b"pw").unwrap();
        assert!(decode(&token, b"pw").unwrap().is_empty());
    }

    #[test]
    fn test_two_encodes_differ_but_both_decode() {
        let t1 = encode(b"Secret data", b"pw").unwrap();
        let t2 = encode(b"Secret data", b"pw").unwrap();
        assert_ne!(t1, t2);

        let p1 = sealed_box(&t1);
        let p2 = sealed_box(&t2);
        assert_ne!(p1.nonce(), p2.nonce());
        assert_ne!(p1.salt(), p2.salt());

        assert_eq!(decode(&t1, b"pw").unwrap(), b"Secret data");
        assert_eq!(decode(&t2, b"pw").unwrap(), b"Secret data");
    }

    #[test]
    fn test_wrong_password() {
        let token = encode(b"Secret data", b"correctPassword").unwrap();
        let err = decode(&token, b"wrongPassword").expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert_eq!(err.class(), FailureClass::Authentication);
    }

    #[test]
    fn test_empty_password_on_encode() {
        let err = encode(b"Test content", b"").expect_err("expected missing password");
        assert_eq!(err.kind, Some(ErrorKind::MissingPassword));
    }

    #[test]
    fn test_empty_password_wins_over_bad_token() {
        // The password check comes first, even for input that would not parse.
        let err = decode("garbage", b"").expect_err("expected missing password");
        assert_eq!(err.kind, Some(ErrorKind::MissingPassword));
        assert_eq!(err.class(), FailureClass::MissingPassword);

        let err = decode(KNOWN_TOKEN, b"").expect_err("expected missing password");
        assert_eq!(err.kind, Some(ErrorKind::MissingPassword));
    }

    #[test]
    fn test_garbage_tokens_are_format_errors() {
        for input in [
            "",
            "hello",
            "[OV_v3]AQID",
            "[OV_v1]not base64!",
            "[OV_v1]AQID",
            "[OV_v2]AQID",
            "[OV_v2]",
            "(S)AQID(E)",
        ] {
            let err = decode(input, b"pass").expect_err("expected format error");
            assert_eq!(err.class(), FailureClass::Format, "input {:?}", input);
        }
    }

    #[test]
    fn test_truncated_valid_token() {
        let token = encode(b"my secret", b"pass").unwrap();
        let mut bytes = Token::parse(&token).unwrap().to_bytes();
        bytes.truncate(30);
        let text = crate::varmor::wrap(crate::Version::V2, &bytes);

        let err = decode(&text, b"pass").expect_err("expected format error");
        assert_eq!(err.kind, Some(ErrorKind::TruncatedInput));
    }

    #[test]
    fn test_flipped_version_byte_is_format_error() {
        let token = encode(b"my secret", b"pass").unwrap();
        let mut bytes = Token::parse(&token).unwrap().to_bytes();
        bytes[0] ^= 0x01;
        let text = crate::varmor::wrap(crate::Version::V2, &bytes);

        let err = decode(&text, b"pass").expect_err("expected format error");
        assert_eq!(err.class(), FailureClass::Format);
    }

    #[test]
    fn test_concurrent_calls_are_independent() {
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                std::thread::spawn(move || {
                    let password = [b'p', i];
                    let token = encode(&[i; 10], &password).unwrap();
                    decode(&token, &password).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), vec![i as u8; 10]);
        }
    }
}
