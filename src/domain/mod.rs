//! Domain types for the book and user ledgers.

pub mod book;
pub mod user;

pub use book::{Book, BookCode};
pub use user::{UserCode, UserLedger};
