//! Error types for the key exchange.
//!
//! Key disagreement is not an error: if the two parties' session keys differ,
//! nothing here reports it. Only the caller can notice, by comparing keys out
//! of band.

use alloc::string::String;
use core::fmt;

use thiserror::Error;

/// Which protocol message failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// `seed || B_A`, sent by Alice in round 1.
    Alice,
    /// `B_B || C`, sent by Bob.
    Bob,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Alice => f.write_str("alice"),
            MessageKind::Bob => f.write_str("bob"),
        }
    }
}

/// Errors returned by parameter construction and the protocol steps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Unknown security level, empty seed, or a level whose constants do not
    /// satisfy the parameter invariants.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The random byte source could not deliver. The step is aborted and no
    /// secret material is returned.
    #[error("random source failure")]
    RandomSourceFailure,

    /// A received message has the wrong length for the active level.
    #[error("malformed {kind} message: expected {expected} bytes, got {actual}")]
    MalformedMessage {
        /// The message that was rejected.
        kind: MessageKind,
        /// Length required by the active level.
        expected: usize,
        /// Length received.
        actual: usize,
    },
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameters(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
