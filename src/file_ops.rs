//! File-level encrypt, decrypt and link operations
//!
//! Thin wrappers that move bytes between files (or stdout) and the codec.
//! Everything written to disk is created with mode 0o600 on Unix and
//! lands via an atomic rename, so a reader never sees a partial file.

use crate::codec;
use crate::error::{ErrorCategory, ErrorKind, OvError, Result};
use crate::flow::{DECRYPTION_FAILED_MESSAGE, DecryptOutcome, DecryptSession};
use crate::link;
use crate::passphrase::PassphraseReader;
use crate::token::Token;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// How an encrypted token is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenForm {
    /// `[OV_v2]...` text.
    Token,
    /// A shareable link on the given decrypt page address.
    Link(String),
}

/// Where the encrypted data to decrypt comes from.
#[derive(Debug, Clone, Copy)]
pub enum TokenSource<'a> {
    /// A file holding a token, link, or display form.
    File(&'a Path),
    /// The same, given directly.
    Text(&'a str),
}

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path`, encrypts it using a password from
/// `passphrase_reader`, and writes the token or link to `output_path`, or to
/// stdout when no output path is given.
pub fn encrypt_file(
    input_path: &Path,
    output_path: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
    form: &TokenForm,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let token = codec::encode(&plaintext, &passphrase)
        .map_err(|e| e.with_context("encryption failed"))?;

    let rendered = match form {
        TokenForm::Token => token,
        TokenForm::Link(base_url) => link::share_link(base_url, &token),
    };

    match output_path {
        Some(path) => write_file_atomic(path, rendered.as_bytes())
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => write_stdout(format!("{}\n", rendered).as_bytes()),
    }
}

/// Decrypt a token with a password
///
/// Each password read from `passphrase_reader` is one attempt. Wrong
/// passwords are retried until `max_attempts` is used up; a missing
/// password or malformed token ends the run at once. Plaintext is only
/// written after a successful attempt.
pub fn decrypt_file(
    source: TokenSource<'_>,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    max_attempts: u32,
) -> Result<()> {
    let input = match source {
        TokenSource::File(path) => read_text(path)?,
        TokenSource::Text(text) => text.to_string(),
    };

    let mut session = DecryptSession::new(input);
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let passphrase = passphrase_reader.read_passphrase()?;

        match session.submit(&passphrase)? {
            DecryptOutcome::Success(plaintext) => {
                return write_file_atomic(output_path, plaintext).map_err(|e| {
                    e.with_context(format!("failed to write to {}", output_path.display()))
                });
            }
            DecryptOutcome::AuthFailure => {
                if attempt < max_attempts {
                    tracing::info!(attempt, "wrong password, asking again");
                    eprintln!("{}", DECRYPTION_FAILED_MESSAGE);
                }
            }
            DecryptOutcome::MissingPassword | DecryptOutcome::FormatError(_) => break,
        }
    }

    match session.into_outcome() {
        Some(DecryptOutcome::MissingPassword) => Err(OvError::missing_password()),
        Some(DecryptOutcome::FormatError(e)) => {
            Err(e.with_context("failed to parse encrypted data"))
        }
        _ => Err(OvError::authentication_failed().with_context("failed to decrypt")),
    }
}

/// Turn a stored token into a shareable link
///
/// The token is parsed (not decrypted) first so a broken file is reported
/// instead of being turned into a broken link.
pub fn link_file(input_path: &Path, base_url: &str) -> Result<String> {
    let text = read_text(input_path)?;
    let token = link::token_from_input(&text)?;
    let parsed = Token::parse(&token).map_err(|e| e.with_context("not a valid token"))?;
    Ok(link::share_link(base_url, &parsed.armor()))
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        OvError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            format!("{} is not valid UTF-8", path.display()),
            e,
        )
    })
}

fn write_stdout(contents: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(contents)
        .and_then(|()| stdout.flush())
        .map_err(|e| {
            OvError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write to stdout",
                e,
            )
        })
}

/// Write a file atomically (tempfile + fsync + rename), 0o600 on Unix
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| io_error("failed to create tempfile", e))?;

    // NamedTempFile already creates the file 0o600 on Unix.
    temp_file
        .write_all(contents)
        .map_err(|e| io_error("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_error("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error("failed to sync file prior to rename", e))?;

    temp_file.persist(path).map_err(|e| {
        OvError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn io_error(msg: &str, err: io::Error) -> OvError {
    OvError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> OvError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    OvError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
