//! Decrypt flow as seen by a front end
//!
//! A [`DecryptSession`] holds the token a user arrived with and walks one
//! attempt at a time through `AwaitingInput -> Decoding -> Done`.
//! Every outcome is terminal for its attempt; submitting another password
//! starts over from `AwaitingInput`.

use crate::codec;
use crate::error::{FailureClass, OvError, Result};
use crate::link;
use zeroize::Zeroizing;

/// Shown when the password field is left empty.
pub const MISSING_PASSWORD_MESSAGE: &str = "Please enter a password";

/// Shown for any authentication failure, whatever its cause.
pub const DECRYPTION_FAILED_MESSAGE: &str = "Decryption failed";

/// Shown when the link or token cannot be parsed.
pub const INVALID_DATA_MESSAGE: &str = "Invalid or unsupported encrypted data";

/// Result of one decrypt attempt.
#[derive(Debug)]
pub enum DecryptOutcome {
    Success(Zeroizing<Vec<u8>>),
    MissingPassword,
    /// Carries the parse error for diagnostics; it never contains secrets.
    FormatError(OvError),
    AuthFailure,
}

impl DecryptOutcome {
    /// Text a front end shows for this outcome, `None` on success.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DecryptOutcome::Success(_) => None,
            DecryptOutcome::MissingPassword => Some(MISSING_PASSWORD_MESSAGE),
            DecryptOutcome::FormatError(_) => Some(INVALID_DATA_MESSAGE),
            DecryptOutcome::AuthFailure => Some(DECRYPTION_FAILED_MESSAGE),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DecryptOutcome::Success(_))
    }

    pub fn plaintext(&self) -> Option<&[u8]> {
        match self {
            DecryptOutcome::Success(plaintext) => Some(plaintext.as_slice()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptState {
    AwaitingInput,
    Decoding,
    /// The attempt finished; see [`DecryptSession::outcome`].
    Done,
}

/// One token, any number of password attempts.
#[derive(Debug)]
pub struct DecryptSession {
    input: String,
    state: DecryptState,
    outcome: Option<DecryptOutcome>,
    attempts: u32,
}

impl DecryptSession {
    /// `input` may be a link, a fragment, a raw token or the display form.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            state: DecryptState::AwaitingInput,
            outcome: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> DecryptState {
        self.state
    }

    /// Outcome of the latest attempt, once it is `Done`.
    pub fn outcome(&self) -> Option<&DecryptOutcome> {
        self.outcome.as_ref()
    }

    /// Number of passwords submitted so far, empty ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run one attempt with `password` and return its terminal outcome.
    ///
    /// Only faults outside the three user-facing outcomes (key derivation
    /// refusing its fixed parameters, for instance) surface as `Err`. The
    /// session is then back in `AwaitingInput` with no outcome.
    pub fn submit(&mut self, password: &[u8]) -> Result<&DecryptOutcome> {
        self.attempt(password, |input, password| {
            link::token_from_input(input).and_then(|token| codec::decode(&token, password))
        })
    }

    /// Gives up the session, keeping the outcome of the latest attempt.
    pub fn into_outcome(self) -> Option<DecryptOutcome> {
        self.outcome
    }

    fn attempt<F>(&mut self, password: &[u8], decode: F) -> Result<&DecryptOutcome>
    where
        F: FnOnce(&str, &[u8]) -> Result<Vec<u8>>,
    {
        self.state = DecryptState::AwaitingInput;
        self.outcome = None;
        self.attempts += 1;

        let outcome = if password.is_empty() {
            DecryptOutcome::MissingPassword
        } else {
            self.state = DecryptState::Decoding;
            tracing::trace!(attempt = self.attempts, "decoding");
            match classify(decode(&self.input, password)) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.state = DecryptState::AwaitingInput;
                    return Err(e);
                }
            }
        };

        tracing::debug!(
            attempt = self.attempts,
            success = outcome.is_success(),
            "decrypt attempt finished"
        );
        self.state = DecryptState::Done;
        Ok(self.outcome.insert(outcome))
    }
}

fn classify(result: Result<Vec<u8>>) -> Result<DecryptOutcome> {
    match result {
        Ok(plaintext) => Ok(DecryptOutcome::Success(Zeroizing::new(plaintext))),
        Err(e) => match e.class() {
            FailureClass::MissingPassword => Ok(DecryptOutcome::MissingPassword),
            FailureClass::Format => Ok(DecryptOutcome::FormatError(e)),
            FailureClass::Authentication => Ok(DecryptOutcome::AuthFailure),
            FailureClass::Other => Err(e),
        },
    }
}
