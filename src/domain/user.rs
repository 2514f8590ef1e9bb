//! User records.
//!
//! The user ledger is one JSON object mapping each user code to the list
//! of book codes the user currently holds:
//!
//! ```json
//! {
//!   "u00001": ["b0001", "b0002"],
//!   "u00002": []
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::book::{is_alnum, BookCode};
use crate::error::{LibraryError, LibraryResult};

pub const USER_CODE_LEN: usize = 6;

/// Six-character alphanumeric user code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserCode(String);

impl UserCode {
    /// Validate and wrap a user code
    pub fn new(code: &str) -> LibraryResult<Self> {
        if code.chars().count() != USER_CODE_LEN {
            return Err(LibraryError::validation(
                "code",
                "User code must have length 6.",
            ));
        }
        if !is_alnum(code) {
            return Err(LibraryError::validation(
                "code",
                "User code must be alphanumeric.",
            ));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Whole user ledger: user code to borrowed book codes.
///
/// Duplicate book codes in one list are allowed (a user may hold two
/// copies of the same title).
pub type UserLedger = BTreeMap<UserCode, Vec<BookCode>>;
