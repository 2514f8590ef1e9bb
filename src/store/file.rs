//! Whole-file ledger writes and the optional advisory lock.
//!
//! Every mutation is read-all, transform, write-all. `WriteMode::Direct`
//! truncates the ledger in place; `WriteMode::Atomic` writes a temporary
//! file next to it and renames it over the ledger, so a crash leaves either
//! the old or the new contents, never a partial file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::{LibraryError, LibraryResult};

/// How ledger files are rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Truncate and write in place; appends go to the end of the file
    #[default]
    Direct,

    /// Write a temp file in the same directory, then rename it over the ledger
    Atomic,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Direct => write!(f, "direct"),
            WriteMode::Atomic => write!(f, "atomic"),
        }
    }
}

/// Create the ledger with `initial` contents if it does not exist yet
pub async fn ensure_file(path: &Path, initial: &str) -> LibraryResult<bool> {
    if fs::try_exists(path).await? {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    fs::write(path, initial).await?;
    Ok(true)
}

/// Replace the whole ledger with `contents`
pub async fn write_ledger(path: &Path, contents: &str, mode: WriteMode) -> LibraryResult<()> {
    match mode {
        WriteMode::Direct => {
            fs::write(path, contents).await?;
        }
        WriteMode::Atomic => {
            let path = path.to_path_buf();
            let contents = contents.to_owned();
            blocking(move || replace_atomically(&path, &contents)).await?;
        }
    }
    Ok(())
}

fn replace_atomically(path: &Path, contents: &str) -> LibraryResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Run blocking file work off the async worker threads
async fn blocking<T, F>(work: F) -> LibraryResult<T>
where
    F: FnOnce() -> LibraryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LibraryError::Io(std::io::Error::other(e)))?
}

/// Append one line to the ledger
pub async fn append_ledger(path: &Path, line: &str, mode: WriteMode) -> LibraryResult<()> {
    match mode {
        WriteMode::Direct => {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(path)
                .await?;

            // Keep a hand-edited last line without newline separate
            let len = file.metadata().await?.len();
            if len > 0 {
                let mut last = [0u8; 1];
                file.seek(std::io::SeekFrom::Start(len - 1)).await?;
                file.read_exact(&mut last).await?;
                if last[0] != b'\n' {
                    file.write_all(b"\n").await?;
                }
            }

            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }
        WriteMode::Atomic => {
            let mut contents = match fs::read_to_string(path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(e.into()),
            };
            if !contents.is_empty() && !contents.ends_with('\n') {
                contents.push('\n');
            }
            contents.push_str(line);
            write_ledger(path, &contents, mode).await?;
        }
    }
    Ok(())
}

/// Exclusive advisory lock on a sidecar file, released on drop
#[derive(Debug)]
pub struct LedgerLock {
    file: File,
    path: PathBuf,
}

impl LedgerLock {
    /// Wait until the lock at `path` is acquired
    pub async fn acquire(path: &Path) -> LibraryResult<Self> {
        let path = path.to_path_buf();
        blocking(move || Self::acquire_blocking(&path)).await
    }

    fn acquire_blocking(path: &Path) -> LibraryResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;

        tracing::debug!(lock = %path.display(), "Ledger lock acquired");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock only if nobody else holds it
    pub fn try_acquire(path: &Path) -> LibraryResult<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
