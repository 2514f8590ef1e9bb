//! Ledger-backed stores.
//!
//! # Storage Layout
//!
//! ```text
//! <home>/
//! ├── books.txt        # one book per line, " $$ "-delimited
//! ├── users.json       # { user_code: [book_code, ...] }
//! └── books.txt.lock   # advisory lock (only when locking is enabled)
//! ```
//!
//! The stores do no locking of their own and share no transaction; see
//! [`crate::core::LendingDesk`] for how they are combined.

pub mod books;
pub mod file;
pub mod users;

pub use books::BookStore;
pub use file::{LedgerLock, WriteMode};
pub use users::{ReturnedLoan, UserStore};
