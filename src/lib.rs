//! booklend - flat-file book and user ledgers with a lending workflow
//!
//! Two independent stores back a small lending library:
//! - the book ledger, a text file with one `" $$ "`-delimited record per line
//! - the user ledger, a JSON object mapping user codes to borrowed book codes
//!
//! Lending a book touches both, one after the other, with no shared
//! transaction.
//!
//! # Modules
//!
//! - `domain`: Record types, codes and field validation
//! - `store`: BookStore, UserStore and the whole-file write primitives
//! - `core`: LendingDesk (check-out / check-in) and the ledger audit
//! - `config`: Ledger locations and storage options
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! booklend book add --code b0001 --name Dune --author Herbert --quantity 2
//! booklend user add u00001
//! booklend check-out --user u00001 --book b0001
//! booklend check-in --user u00001 --book b0001
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod store;

// Re-export main types at crate root for convenience
pub use config::LibraryConfig;
pub use core::{Discrepancy, LendingDesk};
pub use domain::{Book, BookCode, UserCode, UserLedger};
pub use error::{LibraryError, LibraryResult, RecordKind};
pub use store::{BookStore, ReturnedLoan, UserStore, WriteMode};
