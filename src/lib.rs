//! ovcrypt - password-encrypted text tokens that travel in a URL fragment
//!
//! [`encode`] seals bytes under a password into a `[OV_v2]...` token;
//! [`decode`] opens one again, older `[OV_v1]` tokens included. Failures
//! are told apart by [`ErrorKind`] / [`FailureClass`]: a missing password,
//! a malformed or unknown-version token, or a token that does not open.

#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod file_ops;
pub mod legacy;
pub mod flow;
pub mod link;
pub mod passphrase;
pub mod secretcrypt;
pub mod token;
pub mod varmor;
pub mod version;

pub use codec::{decode, encode};
pub use error::{ErrorCategory, ErrorKind, FailureClass, OvError, Result};
pub use flow::{DecryptOutcome, DecryptSession, DecryptState};
pub use link::{share_link, token_from_input};
pub use token::{SealedBox, Token};
pub use version::Version;
