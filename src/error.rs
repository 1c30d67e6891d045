use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No password was supplied. Raised before any key derivation happens.
    MissingPassword,
    /// The token text is not recognizable (missing or foreign version tag).
    ArmoringInvalid,
    /// Base64 decoding of the token payload failed.
    ArmoringDecode,
    /// The token carries an ovcrypt version tag this build does not know.
    ArmoringFromFuture,
    /// The binary payload ended before a fixed-length field could be read.
    TruncatedInput,
    /// The binary version byte disagrees with the visible version tag.
    VersionMismatch,
    /// A shareable link did not carry a usable token in its fragment.
    LinkInvalid,
    /// Authentication failed due to an incorrect password, tampering or
    /// corruption. These causes are deliberately indistinguishable.
    AuthenticationFailed,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Low-level scrypt key derivation failed.
    KeyDerivationFailure,
    /// XSalsa20Poly1305 failed to seal data.
    CipherFailure,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

/// The coarse outcome classes a decrypt front end distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The user has to supply a password first.
    MissingPassword,
    /// The token is malformed, truncated, or of an unknown version.
    Format,
    /// The token parsed but did not authenticate under the given password.
    Authentication,
    /// Anything else (I/O, internal faults).
    Other,
}

impl ErrorKind {
    pub fn class(self) -> FailureClass {
        match self {
            ErrorKind::MissingPassword => FailureClass::MissingPassword,
            ErrorKind::ArmoringInvalid
            | ErrorKind::ArmoringDecode
            | ErrorKind::ArmoringFromFuture
            | ErrorKind::TruncatedInput
            | ErrorKind::VersionMismatch
            | ErrorKind::LinkInvalid => FailureClass::Format,
            ErrorKind::AuthenticationFailed => FailureClass::Authentication,
            ErrorKind::PassphraseUnavailable
            | ErrorKind::KeyDerivationFailure
            | ErrorKind::CipherFailure
            | ErrorKind::Io => FailureClass::Other,
        }
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct OvError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl OvError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    pub(crate) fn missing_password() -> Self {
        Self::with_kind(
            ErrorCategory::User,
            ErrorKind::MissingPassword,
            "a non-empty password is required",
        )
    }

    pub(crate) fn authentication_failed() -> Self {
        Self::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt input, tampered-with data, or bad password",
        )
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Folds the kind tag into the outcome class a decrypt front end shows.
    pub fn class(&self) -> FailureClass {
        self.kind.map_or(FailureClass::Other, ErrorKind::class)
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, OvError>;
