//! Cross-ledger consistency checks.
//!
//! For every book, copies on loan (`quantity - available_quantity`) must
//! equal the number of times its code appears across all borrowed lists.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{Book, UserLedger};

/// One inconsistency between the book and user ledgers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// Book ledger and user ledger disagree on how many copies are out
    LoanCountMismatch {
        book: String,
        on_loan: u32,
        recorded: u32,
    },

    /// A user holds a code the book ledger does not know
    UnknownBook { user: String, book: String },

    /// A row with more copies on the shelf than owned
    AvailabilityOutOfRange {
        book: String,
        quantity: u32,
        available: u32,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::LoanCountMismatch {
                book,
                on_loan,
                recorded,
            } => write!(
                f,
                "book {}: {} copies out per book ledger, {} recorded on users",
                book, on_loan, recorded
            ),
            Discrepancy::UnknownBook { user, book } => {
                write!(f, "user {} holds unknown book {}", user, book)
            }
            Discrepancy::AvailabilityOutOfRange {
                book,
                quantity,
                available,
            } => write!(
                f,
                "book {}: {} available but only {} owned",
                book, available, quantity
            ),
        }
    }
}

/// Compare the ledgers; results follow book order, then user order
pub fn audit(books: &[Book], users: &UserLedger) -> Vec<Discrepancy> {
    let mut recorded: HashMap<&str, u32> = HashMap::new();
    for held in users.values() {
        for book in held {
            *recorded.entry(book.as_str()).or_default() += 1;
        }
    }

    let mut found = Vec::new();

    for book in books {
        if book.available_quantity > book.quantity {
            found.push(Discrepancy::AvailabilityOutOfRange {
                book: book.code.to_string(),
                quantity: book.quantity,
                available: book.available_quantity,
            });
            continue;
        }

        let held = recorded.get(book.code.as_str()).copied().unwrap_or(0);
        if held != book.on_loan() {
            found.push(Discrepancy::LoanCountMismatch {
                book: book.code.to_string(),
                on_loan: book.on_loan(),
                recorded: held,
            });
        }
    }

    for (user, held) in users {
        for code in held {
            if !books.iter().any(|b| b.code == *code) {
                found.push(Discrepancy::UnknownBook {
                    user: user.to_string(),
                    book: code.to_string(),
                });
            }
        }
    }

    found
}
