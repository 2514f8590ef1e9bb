//! Lending workflow on top of the two stores.
//!
//! This module contains:
//! - LendingDesk: check-out / check-in across the book and user ledgers
//! - audit: cross-ledger consistency report

pub mod audit;
pub mod lending;

pub use audit::{audit, Discrepancy};
pub use lending::LendingDesk;
