//! Ledger File Format Tests
//!
//! The on-disk formats are the external interface: a `" $$ "`-delimited
//! text file for books and a pretty-printed JSON object for users.

use booklend::{BookCode, BookStore, LibraryError, UserStore, WriteMode};
use tempfile::TempDir;

#[tokio::test]
async fn test_book_ledger_lines() {
    let temp_dir = TempDir::new().unwrap();
    let store = BookStore::new(temp_dir.path().join("books.txt"), WriteMode::Direct);
    store.initialize().await.unwrap();

    store.add("a1254", "TheIdiot", "Dostoyevsky", 4).await.unwrap();
    store.add("b0001", "Dune", "Herbert", 2).await.unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(
        raw,
        "a1254 $$ TheIdiot $$ Dostoyevsky $$ 4 $$ 4\nb0001 $$ Dune $$ Herbert $$ 2 $$ 2\n"
    );
}

#[tokio::test]
async fn test_reads_hand_written_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("books.txt");
    // Last line without newline, as an editor might leave it
    std::fs::write(
        &path,
        "a1254 $$ TheIdiot $$ Dostoyevsky $$ 4 $$ 2\nb0001 $$ Dune $$ Herbert $$ 2 $$ 2",
    )
    .unwrap();

    let store = BookStore::new(&path, WriteMode::Direct);
    store.initialize().await.unwrap();

    let books = store.list_all().await.unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].available_quantity, 2);
    assert_eq!(books[1].name, "Dune");

    // A rewrite normalises the final newline
    store.adjust_availability("a1254", 1).await.unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().ends_with("$$ 2 $$ 2\n"));
}

#[tokio::test]
async fn test_wrong_field_count_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("books.txt");
    std::fs::write(&path, "a1254 $$ TheIdiot $$ 4 $$ 2\n").unwrap();

    let store = BookStore::new(&path, WriteMode::Direct);
    let err = store.list_all().await.unwrap_err();
    assert!(matches!(err, LibraryError::Parse { line: 1, .. }));

    // Lookups surface the same error rather than reporting absence
    assert!(store.find("a1254").await.is_err());
}

#[tokio::test]
async fn test_user_ledger_document() {
    let temp_dir = TempDir::new().unwrap();
    let store = UserStore::new(temp_dir.path().join("users.json"), WriteMode::Atomic);
    store.initialize().await.unwrap();

    // Freshly created file is empty, not "{}"
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "");

    store.add("u00002").await.unwrap();
    store.add("u00001").await.unwrap();
    store
        .record_loan("u00001", &BookCode::new("b0001").unwrap())
        .await
        .unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(
        raw,
        "{\n  \"u00001\": [\n    \"b0001\"\n  ],\n  \"u00002\": []\n}"
    );
}

#[tokio::test]
async fn test_reads_existing_user_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("users.json");
    std::fs::write(&path, r#"{"u00001": ["b0001", "b0001"], "u00002": []}"#).unwrap();

    let store = UserStore::new(&path, WriteMode::Direct);
    let held = store.borrowed_books("u00001").await.unwrap().unwrap();
    assert_eq!(held.len(), 2);
    assert_eq!(store.list_all().await.unwrap().len(), 2);
}
