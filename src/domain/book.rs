//! Book records and their ledger line format.
//!
//! One book per line, fields joined by `" $$ "`:
//!
//! ```text
//! code $$ name $$ author $$ quantity $$ available_quantity
//! ```
//!
//! There is no escaping, so a field containing the delimiter cannot be
//! stored. Validation keeps names and authors alphanumeric, which rules
//! that out for records written through the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, LibraryResult};

/// Field delimiter used in the book ledger
pub const FIELD_DELIMITER: &str = " $$ ";

pub const BOOK_CODE_LEN: usize = 5;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_AUTHOR_LEN: usize = 45;

/// Five-character alphanumeric book code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookCode(String);

impl BookCode {
    /// Validate and wrap a book code
    pub fn new(code: &str) -> LibraryResult<Self> {
        if code.chars().count() != BOOK_CODE_LEN {
            return Err(LibraryError::validation(
                "code",
                "Book code must have length 5.",
            ));
        }
        if !is_alnum(code) {
            return Err(LibraryError::validation(
                "code",
                "Book code must be alphanumeric.",
            ));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A book as stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub code: BookCode,
    pub name: String,
    pub author: String,
    /// Total copies owned
    pub quantity: u32,
    /// Copies currently on the shelf, always within `[0, quantity]`
    pub available_quantity: u32,
}

impl Book {
    /// Validate every field and build a record with all copies on the shelf
    pub fn new(code: &str, name: &str, author: &str, quantity: i64) -> LibraryResult<Self> {
        let code = BookCode::new(code)?;

        if name.chars().count() > MAX_NAME_LEN {
            return Err(LibraryError::validation(
                "name",
                "Book name can have maximum length 100.",
            ));
        }
        if !is_alnum(name) {
            return Err(LibraryError::validation(
                "name",
                "Book name must be alphanumeric.",
            ));
        }

        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err(LibraryError::validation(
                "author",
                "Book author can have maximum length 45.",
            ));
        }
        if !is_alnum(author) {
            return Err(LibraryError::validation(
                "author",
                "Book author must be alphanumeric.",
            ));
        }

        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                LibraryError::validation("quantity", "Book quantity must be positive integer.")
            })?;

        Ok(Self {
            code,
            name: name.to_string(),
            author: author.to_string(),
            quantity,
            available_quantity: quantity,
        })
    }

    /// Override the initial shelf count (must stay within `[0, quantity]`)
    pub fn with_available(mut self, available: i64) -> LibraryResult<Self> {
        let available = u32::try_from(available)
            .ok()
            .filter(|a| *a <= self.quantity)
            .ok_or_else(|| {
                LibraryError::validation(
                    "available_quantity",
                    "Book available quantity must be between 0 and quantity.",
                )
            })?;
        self.available_quantity = available;
        Ok(self)
    }

    /// Copies currently out on loan
    pub fn on_loan(&self) -> u32 {
        self.quantity.saturating_sub(self.available_quantity)
    }

    /// Serialize to one ledger line, newline included
    pub fn to_line(&self) -> String {
        let quantity = self.quantity.to_string();
        let available = self.available_quantity.to_string();
        let fields = [
            self.code.as_str(),
            self.name.as_str(),
            self.author.as_str(),
            quantity.as_str(),
            available.as_str(),
        ];
        format!("{}\n", fields.join(FIELD_DELIMITER))
    }

    /// Parse one ledger line (trailing newline optional).
    ///
    /// Field contents are not re-validated; only the shape is checked, so
    /// hand-edited rows still load and can be reported by the audit.
    pub fn from_line(line: &str) -> Result<Self, String> {
        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();

        let [code, name, author, quantity, available] = fields.as_slice() else {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        };

        let quantity: u32 = quantity
            .parse()
            .map_err(|_| format!("invalid quantity: {:?}", quantity))?;
        let available_quantity: u32 = available
            .parse()
            .map_err(|_| format!("invalid available quantity: {:?}", available))?;

        Ok(Self {
            code: BookCode(code.to_string()),
            name: name.to_string(),
            author: author.to_string(),
            quantity,
            available_quantity,
        })
    }
}

/// Non-empty and every character a letter or digit
pub(crate) fn is_alnum(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphanumeric)
}
