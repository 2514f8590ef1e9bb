//! User store backed by the JSON user ledger.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::file::{ensure_file, write_ledger, WriteMode};
use crate::domain::{BookCode, UserCode, UserLedger};
use crate::error::{LibraryError, LibraryResult, RecordKind};

/// A loan removed from a borrowed list, with where it sat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnedLoan {
    pub book: BookCode,
    /// Index the code had in the user's list before removal
    pub position: usize,
}

/// JSON-document store of users and their borrowed books
#[derive(Debug, Clone)]
pub struct UserStore {
    /// Path to the user ledger
    path: PathBuf,

    /// How rewrites reach the disk
    write_mode: WriteMode,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>, write_mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            write_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger if none exists
    pub async fn initialize(&self) -> LibraryResult<()> {
        if ensure_file(&self.path, "").await? {
            info!(ledger = %self.path.display(), "Created user ledger");
        }
        Ok(())
    }

    /// The whole ledger.
    ///
    /// A missing, empty, or unparsable document reads as an empty ledger:
    /// a freshly created file and an empty library are the same start state.
    pub async fn list_all(&self) -> LibraryResult<UserLedger> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(ledger = %self.path.display(), "User ledger missing, treating as empty");
                return Ok(UserLedger::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(UserLedger::new());
        }

        match serde_json::from_str(&content) {
            Ok(ledger) => Ok(ledger),
            Err(e) => {
                debug!(error = %e, "User ledger is not valid JSON, treating as empty");
                Ok(UserLedger::new())
            }
        }
    }

    /// Books held by `code`, or `None` when the user is not registered
    pub async fn borrowed_books(&self, code: &str) -> LibraryResult<Option<Vec<BookCode>>> {
        let ledger = self.list_all().await?;
        Ok(ledger
            .into_iter()
            .find(|(user, _)| user.as_str() == code)
            .map(|(_, books)| books))
    }

    /// Register a user with no books
    pub async fn add(&self, code: &str) -> LibraryResult<UserCode> {
        let user = UserCode::new(code)?;
        let mut ledger = self.list_all().await?;

        if ledger.contains_key(&user) {
            return Err(LibraryError::duplicate(RecordKind::User, code));
        }

        ledger.insert(user.clone(), Vec::new());
        self.save(&ledger).await?;

        info!(user = %user, "User added");
        Ok(user)
    }

    /// Remove a user; refused while the user still holds books
    pub async fn delete(&self, code: &str) -> LibraryResult<()> {
        let mut ledger = self.list_all().await?;
        let user = Self::key_for(&ledger, code)?;

        let held = ledger.get(&user).map(Vec::len).unwrap_or(0);
        if held > 0 {
            return Err(LibraryError::Conflict(format!(
                "User {} still holds {} book(s)",
                code, held
            )));
        }

        ledger.remove(&user);
        self.save(&ledger).await?;

        info!(user = %user, "User deleted");
        Ok(())
    }

    /// Append `book_code` to the user's borrowed list
    pub async fn record_loan(&self, user_code: &str, book_code: &BookCode) -> LibraryResult<()> {
        let mut ledger = self.list_all().await?;
        let user = Self::key_for(&ledger, user_code)?;

        if let Some(books) = ledger.get_mut(&user) {
            books.push(book_code.clone());
        }
        self.save(&ledger).await?;

        info!(user = %user, book = %book_code, "Loan recorded");
        Ok(())
    }

    /// Remove one occurrence of `book_code` from the user's borrowed list
    pub async fn record_return(
        &self,
        user_code: &str,
        book_code: &str,
    ) -> LibraryResult<ReturnedLoan> {
        let mut ledger = self.list_all().await?;
        let user = Self::key_for(&ledger, user_code)?;

        let books = ledger
            .get_mut(&user)
            .ok_or_else(|| LibraryError::not_found(RecordKind::User, user_code))?;

        let pos = books
            .iter()
            .position(|b| b.as_str() == book_code)
            .ok_or_else(|| LibraryError::NotHeld {
                user: user_code.to_string(),
                book: book_code.to_string(),
            })?;
        let book = books.remove(pos);

        self.save(&ledger).await?;

        info!(user = %user, book = %book, "Return recorded");
        Ok(ReturnedLoan {
            book,
            position: pos,
        })
    }

    /// Put a returned loan back where it was in the user's list
    pub async fn reinstate_loan(&self, user_code: &str, loan: &ReturnedLoan) -> LibraryResult<()> {
        let mut ledger = self.list_all().await?;
        let user = Self::key_for(&ledger, user_code)?;

        if let Some(books) = ledger.get_mut(&user) {
            let at = loan.position.min(books.len());
            books.insert(at, loan.book.clone());
        }
        self.save(&ledger).await?;

        info!(user = %user, book = %loan.book, position = loan.position, "Loan reinstated");
        Ok(())
    }

    /// Resolve a raw code to the ledger key, or `NotFound`
    fn key_for(ledger: &UserLedger, code: &str) -> LibraryResult<UserCode> {
        ledger
            .keys()
            .find(|u| u.as_str() == code)
            .cloned()
            .ok_or_else(|| LibraryError::not_found(RecordKind::User, code))
    }

    async fn save(&self, ledger: &UserLedger) -> LibraryResult<()> {
        let content = serde_json::to_string_pretty(ledger)?;
        write_ledger(&self.path, &content, self.write_mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (UserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = UserStore::new(temp_dir.path().join("users.json"), WriteMode::Direct);
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    fn book(code: &str) -> BookCode {
        BookCode::new(code).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_ledger_is_empty() {
        let (store, _temp) = create_test_store().await;
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.borrowed_books("u00001").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_json_reads_as_empty() {
        let (store, _temp) = create_test_store().await;
        std::fs::write(store.path(), "not json at all").unwrap();
        assert!(store.list_all().await.unwrap().is_empty());

        // Writing over it produces a valid document again
        store.add("u00001").await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_and_duplicate() {
        let (store, _temp) = create_test_store().await;

        store.add("u00001").await.unwrap();
        assert_eq!(store.borrowed_books("u00001").await.unwrap(), Some(vec![]));

        let err = store.add("u00001").await.unwrap_err();
        assert!(matches!(err, LibraryError::Duplicate { kind: RecordKind::User, .. }));

        let err = store.add("u0001").await.unwrap_err();
        assert!(matches!(err, LibraryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_ledger_is_pretty_printed_json() {
        let (store, _temp) = create_test_store().await;
        store.add("u00001").await.unwrap();
        store.record_loan("u00001", &book("b0001")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "u00001": ["b0001"] }));
    }

    #[tokio::test]
    async fn test_loan_and_return_keep_order_and_duplicates() {
        let (store, _temp) = create_test_store().await;
        store.add("u00001").await.unwrap();

        store.record_loan("u00001", &book("b0001")).await.unwrap();
        store.record_loan("u00001", &book("b0002")).await.unwrap();
        store.record_loan("u00001", &book("b0001")).await.unwrap();

        let returned = store.record_return("u00001", "b0001").await.unwrap();
        assert_eq!(returned.position, 0);
        assert_eq!(
            store.borrowed_books("u00001").await.unwrap(),
            Some(vec![book("b0002"), book("b0001")])
        );
    }

    #[tokio::test]
    async fn test_reinstate_loan_keeps_original_position() {
        let (store, _temp) = create_test_store().await;
        store.add("u00001").await.unwrap();
        for code in ["b0001", "b0002", "b0003"] {
            store.record_loan("u00001", &book(code)).await.unwrap();
        }

        let returned = store.record_return("u00001", "b0002").await.unwrap();
        assert_eq!(returned.position, 1);

        store.reinstate_loan("u00001", &returned).await.unwrap();
        assert_eq!(
            store.borrowed_books("u00001").await.unwrap(),
            Some(vec![book("b0001"), book("b0002"), book("b0003")])
        );
    }

    #[tokio::test]
    async fn test_return_of_book_not_held() {
        let (store, _temp) = create_test_store().await;
        store.add("u00001").await.unwrap();

        let err = store.record_return("u00001", "b0001").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotHeld { .. }));

        let err = store.record_return("u00009", "b0001").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { kind: RecordKind::User, .. }));

        let err = store.record_loan("u00009", &book("b0001")).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { kind: RecordKind::User, .. }));
    }

    #[tokio::test]
    async fn test_delete_requires_empty_list() {
        let (store, _temp) = create_test_store().await;
        store.add("u00001").await.unwrap();
        store.record_loan("u00001", &book("b0001")).await.unwrap();

        let err = store.delete("u00001").await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));

        store.record_return("u00001", "b0001").await.unwrap();
        store.delete("u00001").await.unwrap();
        assert_eq!(store.borrowed_books("u00001").await.unwrap(), None);

        let err = store.delete("u00001").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }
}
