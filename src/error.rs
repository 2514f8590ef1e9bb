//! Error taxonomy shared by the stores and the lending workflow.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which ledger a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Book,
    User,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Book => write!(f, "Book"),
            RecordKind::User => write!(f, "User"),
        }
    }
}

/// Errors returned by the library core
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Malformed input: wrong length, non-alphanumeric, non-positive quantity
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{kind} {code} is already in the library")]
    Duplicate { kind: RecordKind, code: String },

    #[error("{kind} {code} is not in the library")]
    NotFound { kind: RecordKind, code: String },

    /// The operation would break a ledger invariant
    #[error("{0}")]
    Conflict(String),

    #[error("User {user} does not hold book {book}")]
    NotHeld { user: String, book: String },

    #[error("User {0} is not registered; register the user first with `booklend user add {0}`")]
    UserNotRegistered(String),

    #[error("Sorry, there is no available copy of book {0} at this moment")]
    NoCopyAvailable(String),

    #[error("Malformed ledger line {line} in {}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LibraryError::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(kind: RecordKind, code: impl Into<String>) -> Self {
        LibraryError::NotFound {
            kind,
            code: code.into(),
        }
    }

    pub(crate) fn duplicate(kind: RecordKind, code: impl Into<String>) -> Self {
        LibraryError::Duplicate {
            kind,
            code: code.into(),
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
