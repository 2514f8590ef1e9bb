//! Book store backed by the flat-text book ledger.
//!
//! Every mutation reads the whole ledger, transforms it in memory and
//! rewrites it. That is O(n) per operation, which is fine at the scale of
//! a small lending library and keeps the file hand-editable.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::file::{append_ledger, ensure_file, write_ledger, WriteMode};
use crate::domain::Book;
use crate::error::{LibraryError, LibraryResult, RecordKind};

/// Flat-file store of book records
#[derive(Debug, Clone)]
pub struct BookStore {
    /// Path to the book ledger
    path: PathBuf,

    /// How rewrites reach the disk
    write_mode: WriteMode,
}

impl BookStore {
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
            info!(ledger = %self.path.display(), "Created book ledger");
        }
        Ok(())
    }

    /// All books in file order
    pub async fn list_all(&self) -> LibraryResult<Vec<Book>> {
        let content = fs::read_to_string(&self.path).await?;

        let books = content
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                Book::from_line(line).map_err(|reason| LibraryError::Parse {
                    path: self.path.clone(),
                    line: idx + 1,
                    reason,
                })
            })
            .collect::<LibraryResult<Vec<_>>>()?;

        debug!(count = books.len(), "Loaded book ledger");
        Ok(books)
    }

    /// Look up a book by code; absence is `None`, not an error
    pub async fn find(&self, code: &str) -> LibraryResult<Option<Book>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|b| b.code.as_str() == code))
    }

    /// Add a new book with every copy on the shelf
    pub async fn add(
        &self,
        code: &str,
        name: &str,
        author: &str,
        quantity: i64,
    ) -> LibraryResult<Book> {
        let book = Book::new(code, name, author, quantity)?;
        self.insert(book).await
    }

    /// Add a new book with an explicit initial shelf count
    pub async fn add_with_available(
        &self,
        code: &str,
        name: &str,
        author: &str,
        quantity: i64,
        available: i64,
    ) -> LibraryResult<Book> {
        let book = Book::new(code, name, author, quantity)?.with_available(available)?;
        self.insert(book).await
    }

    async fn insert(&self, book: Book) -> LibraryResult<Book> {
        if self.find(book.code.as_str()).await?.is_some() {
            return Err(LibraryError::duplicate(RecordKind::Book, book.code.as_str()));
        }

        append_ledger(&self.path, &book.to_line(), self.write_mode).await?;

        info!(book = %book.code, quantity = book.quantity, "Book added");
        Ok(book)
    }

    /// Remove a book; refused while any copy is on loan
    pub async fn delete(&self, code: &str) -> LibraryResult<Book> {
        let mut books = self.list_all().await?;

        let pos = books
            .iter()
            .position(|b| b.code.as_str() == code)
            .ok_or_else(|| LibraryError::not_found(RecordKind::Book, code))?;

        if books[pos].quantity != books[pos].available_quantity {
            return Err(LibraryError::Conflict(format!(
                "Book {} has {} copies that have not been returned",
                code,
                books[pos].on_loan()
            )));
        }

        let removed = books.remove(pos);
        self.rewrite(&books).await?;

        info!(book = %removed.code, "Book deleted");
        Ok(removed)
    }

    /// Move `delta` copies between the shelf and loans.
    ///
    /// `-1` gives a copy out, `+1` takes one back. The result must stay
    /// within `[0, quantity]`.
    pub async fn adjust_availability(&self, code: &str, delta: i64) -> LibraryResult<Book> {
        let mut books = self.list_all().await?;

        let book = books
            .iter_mut()
            .find(|b| b.code.as_str() == code)
            .ok_or_else(|| LibraryError::not_found(RecordKind::Book, code))?;

        let next = i64::from(book.available_quantity) + delta;
        if next < 0 || next > i64::from(book.quantity) {
            return Err(LibraryError::Conflict(format!(
                "Book {} availability would become {} (allowed 0..={})",
                code, next, book.quantity
            )));
        }

        // In range, so it fits in u32
        book.available_quantity = next as u32;
        let updated = book.clone();

        self.rewrite(&books).await?;

        info!(
            book = %updated.code,
            delta,
            available = updated.available_quantity,
            "Book availability adjusted"
        );
        Ok(updated)
    }

    async fn rewrite(&self, books: &[Book]) -> LibraryResult<()> {
        let contents: String = books.iter().map(Book::to_line).collect();
        write_ledger(&self.path, &contents, self.write_mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store(mode: WriteMode) -> (BookStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = BookStore::new(temp_dir.path().join("books.txt"), mode);
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_initialize_creates_empty_ledger() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;
        assert!(store.path().exists());
        assert!(store.list_all().await.unwrap().is_empty());

        // Second call leaves contents alone
        store.add("a1234", "Dune", "Herbert", 1).await.unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_then_find() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;

        store.add("b0001", "Dune", "Herbert", 2).await.unwrap();

        let book = store.find("b0001").await.unwrap().unwrap();
        assert_eq!(book.name, "Dune");
        assert_eq!(book.quantity, 2);
        assert_eq!(book.available_quantity, 2);

        assert!(store.find("zzzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;

        for code in ["c0003", "a0001", "b0002"] {
            store.add(code, "Title", "Author", 1).await.unwrap();
        }
        store.delete("a0001").await.unwrap();

        let codes: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.code.to_string())
            .collect();
        assert_eq!(codes, vec!["c0003", "b0002"]);
    }

    #[tokio::test]
    async fn test_duplicate_add_fails() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;

        store.add("b0001", "Dune", "Herbert", 2).await.unwrap();
        let err = store.add("b0001", "Other", "Someone", 1).await.unwrap_err();
        assert!(matches!(err, LibraryError::Duplicate { kind: RecordKind::Book, .. }));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_add_leaves_ledger_untouched() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;

        let err = store.add("b001", "Dune", "Herbert", 2).await.unwrap_err();
        assert!(matches!(err, LibraryError::Validation { field: "code", .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "");
    }

    #[tokio::test]
    async fn test_add_with_available() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;

        let book = store
            .add_with_available("b0001", "Dune", "Herbert", 4, 1)
            .await
            .unwrap();
        assert_eq!(book.available_quantity, 1);

        let err = store
            .add_with_available("b0002", "Dune", "Herbert", 4, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Validation { field: "available_quantity", .. }
        ));
    }

    #[tokio::test]
    async fn test_adjust_availability_bounds() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;
        store.add("b0001", "Dune", "Herbert", 1).await.unwrap();

        // Already full
        let err = store.adjust_availability("b0001", 1).await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));

        let book = store.adjust_availability("b0001", -1).await.unwrap();
        assert_eq!(book.available_quantity, 0);

        // Nothing left to give
        let err = store.adjust_availability("b0001", -1).await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));

        let book = store.adjust_availability("b0001", 1).await.unwrap();
        assert_eq!(book.available_quantity, 1);

        let err = store.adjust_availability("nope1", -1).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { kind: RecordKind::Book, .. }));
    }

    #[tokio::test]
    async fn test_adjust_touches_only_target_line() {
        let (store, _temp) = create_test_store(WriteMode::Atomic).await;
        store.add("a0001", "First", "Someone", 3).await.unwrap();
        store.add("b0002", "Second", "Someone", 3).await.unwrap();

        store.adjust_availability("b0002", -1).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "a0001 $$ First $$ Someone $$ 3 $$ 3\nb0002 $$ Second $$ Someone $$ 3 $$ 2\n"
        );
    }

    #[tokio::test]
    async fn test_delete_refused_while_on_loan() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;
        store.add("b0001", "Dune", "Herbert", 2).await.unwrap();
        store.adjust_availability("b0001", -1).await.unwrap();

        let err = store.delete("b0001").await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));

        store.adjust_availability("b0001", 1).await.unwrap();
        store.delete("b0001").await.unwrap();
        assert!(store.find("b0001").await.unwrap().is_none());

        let err = store.delete("b0001").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_line_is_parse_error() {
        let (store, _temp) = create_test_store(WriteMode::Direct).await;
        std::fs::write(
            store.path(),
            "b0001 $$ Dune $$ Herbert $$ 2 $$ 2\n\nb0002 $$ Emma $$ Austen $$ 1 $$ 1\n",
        )
        .unwrap();

        match store.list_all().await.unwrap_err() {
            LibraryError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
