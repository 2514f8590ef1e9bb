//! The lending desk: check-out and check-in across both stores.
//!
//! A loan lives in two places, the book's `available_quantity` and the
//! user's borrowed list. Each operation updates them one after the other
//! with no shared transaction, so a crash between the two steps leaves the
//! ledgers out of step. [`LendingDesk::audit`] reports such drift; with
//! compensation enabled a failed second step undoes the first.

use tracing::{info, instrument, warn};

use super::audit::{audit, Discrepancy};
use crate::config::LibraryConfig;
use crate::domain::Book;
use crate::error::{LibraryError, LibraryResult, RecordKind};
use crate::store::{BookStore, LedgerLock, ReturnedLoan, UserStore};

/// Coordinates the book and user stores
#[derive(Debug, Clone)]
pub struct LendingDesk {
    books: BookStore,
    users: UserStore,
    config: LibraryConfig,
}

impl LendingDesk {
    /// Build a desk over the ledgers named in `config`
    pub fn new(config: LibraryConfig) -> Self {
        Self {
            books: config.book_store(),
            users: config.user_store(),
            config,
        }
    }

    pub fn books(&self) -> &BookStore {
        &self.books
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Create both ledgers if missing
    pub async fn initialize(&self) -> LibraryResult<()> {
        self.books.initialize().await?;
        self.users.initialize().await
    }

    /// Take the ledger lock when locking is enabled
    pub async fn lock(&self) -> LibraryResult<Option<LedgerLock>> {
        if self.config.locking {
            LedgerLock::acquire(&self.config.lock_path()).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Give one copy of `book_code` to `user_code`.
    ///
    /// Steps: decrement the book's availability, then append the loan to
    /// the user's list.
    #[instrument(skip(self))]
    pub async fn check_out(&self, user_code: &str, book_code: &str) -> LibraryResult<Book> {
        let _lock = self.lock().await?;

        if self.users.borrowed_books(user_code).await?.is_none() {
            return Err(LibraryError::UserNotRegistered(user_code.to_string()));
        }

        let book = self
            .books
            .find(book_code)
            .await?
            .ok_or_else(|| LibraryError::not_found(RecordKind::Book, book_code))?;
        if book.available_quantity == 0 {
            return Err(LibraryError::NoCopyAvailable(book_code.to_string()));
        }

        let book = self.books.adjust_availability(book_code, -1).await?;

        if let Err(e) = self.users.record_loan(user_code, &book.code).await {
            return Err(self.compensate(e, book_code, 1).await);
        }

        info!(available = book.available_quantity, "Book checked out");
        Ok(book)
    }

    /// Take one copy of `book_code` back from `user_code`.
    ///
    /// Steps: remove the loan from the user's list, then increment the
    /// book's availability.
    #[instrument(skip(self))]
    pub async fn check_in(&self, user_code: &str, book_code: &str) -> LibraryResult<Book> {
        let _lock = self.lock().await?;

        let held = self
            .users
            .borrowed_books(user_code)
            .await?
            .ok_or_else(|| LibraryError::UserNotRegistered(user_code.to_string()))?;
        if !held.iter().any(|b| b.as_str() == book_code) {
            return Err(LibraryError::NotHeld {
                user: user_code.to_string(),
                book: book_code.to_string(),
            });
        }

        let returned = self.users.record_return(user_code, book_code).await?;

        match self.books.adjust_availability(book_code, 1).await {
            Ok(book) => {
                info!(available = book.available_quantity, "Book checked in");
                Ok(book)
            }
            Err(e) => Err(self.restore_loan(e, user_code, &returned).await),
        }
    }

    /// Compare both ledgers and report drift
    pub async fn audit(&self) -> LibraryResult<Vec<Discrepancy>> {
        let books = self.books.list_all().await?;
        let users = self.users.list_all().await?;

        let found = audit(&books, &users);
        if !found.is_empty() {
            warn!(count = found.len(), "Ledgers are inconsistent");
        }
        Ok(found)
    }

    /// Undo an availability change after the user step failed
    async fn compensate(&self, err: LibraryError, book_code: &str, delta: i64) -> LibraryError {
        if !self.config.compensate {
            return err;
        }

        warn!(book = book_code, delta, error = %err, "User step failed, reverting availability");
        if let Err(undo) = self.books.adjust_availability(book_code, delta).await {
            warn!(book = book_code, error = %undo, "Could not revert availability");
        }
        err
    }

    /// Put a returned loan back, at its old position, after the book step failed
    async fn restore_loan(
        &self,
        err: LibraryError,
        user_code: &str,
        loan: &ReturnedLoan,
    ) -> LibraryError {
        if !self.config.compensate {
            return err;
        }

        warn!(user = user_code, book = %loan.book, error = %err, "Book step failed, restoring loan");
        if let Err(undo) = self.users.reinstate_loan(user_code, loan).await {
            warn!(user = user_code, error = %undo, "Could not restore loan");
        }
        err
    }
}
