//! Configuration for ledger locations and storage options.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (`--home`, `--books`, `--users`)
//! 2. Environment variables (BOOKLEND_HOME, BOOKLEND_BOOKS, BOOKLEND_USERS)
//! 3. Config file (.booklend/config.yaml)
//! 4. Defaults (~/.booklend/books.txt, ~/.booklend/users.json)
//!
//! Config file discovery:
//! - Searches current directory and parents for .booklend/config.yaml
//! - `paths.home` is relative to the project root (parent of .booklend/)
//! - `paths.books` / `paths.users` are relative to the resolved home

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::store::{BookStore, UserStore, WriteMode};

pub const BOOKS_FILE: &str = "books.txt";
pub const USERS_FILE: &str = "users.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub lending: LendingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Directory holding both ledgers
    pub home: Option<String>,
    /// Book ledger (relative to home)
    pub books: Option<String>,
    /// User ledger (relative to home)
    pub users: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    pub write_mode: Option<WriteMode>,
    pub locking: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LendingConfig {
    pub compensate: Option<bool>,
}

/// Path overrides coming from flags or environment variables
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub home: Option<PathBuf>,
    pub books: Option<PathBuf>,
    pub users: Option<PathBuf>,
}

impl PathOverrides {
    /// Read BOOKLEND_HOME, BOOKLEND_BOOKS and BOOKLEND_USERS
    pub fn from_env() -> Self {
        Self {
            home: std::env::var_os("BOOKLEND_HOME").map(PathBuf::from),
            books: std::env::var_os("BOOKLEND_BOOKS").map(PathBuf::from),
            users: std::env::var_os("BOOKLEND_USERS").map(PathBuf::from),
        }
    }

    /// Fill unset fields from `fallback`
    fn or(self, fallback: PathOverrides) -> Self {
        Self {
            home: self.home.or(fallback.home),
            books: self.books.or(fallback.books),
            users: self.users.or(fallback.users),
        }
    }
}

/// Resolved configuration with concrete paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Directory holding the ledgers by default
    pub home: PathBuf,
    /// Book ledger path
    pub books_path: PathBuf,
    /// User ledger path
    pub users_path: PathBuf,
    /// How ledger rewrites reach the disk
    pub write_mode: WriteMode,
    /// Hold an exclusive lock around mutating operations
    pub locking: bool,
    /// Undo step one of a loan/return when step two fails
    pub compensate: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl LibraryConfig {
    /// Default layout rooted at `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let home = dir.into();
        Self {
            books_path: home.join(BOOKS_FILE),
            users_path: home.join(USERS_FILE),
            home,
            write_mode: WriteMode::Direct,
            locking: false,
            compensate: false,
            config_file: None,
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }

    pub fn with_compensation(mut self, compensate: bool) -> Self {
        self.compensate = compensate;
        self
    }

    /// Sidecar lock file next to the book ledger
    pub fn lock_path(&self) -> PathBuf {
        let mut path: OsString = self.books_path.clone().into_os_string();
        path.push(".lock");
        PathBuf::from(path)
    }

    pub fn book_store(&self) -> BookStore {
        BookStore::new(&self.books_path, self.write_mode)
    }

    pub fn user_store(&self) -> UserStore {
        UserStore::new(&self.users_path, self.write_mode)
    }

    /// Load configuration from all sources; `flags` take precedence
    pub fn load(flags: PathOverrides) -> Result<Self> {
        let default_home = dirs::home_dir()
            .context("Failed to determine home directory")?
            .join(".booklend");

        let file = match find_config_file() {
            Some(path) => {
                let config = load_config_file(&path)?;
                Some((path, config))
            }
            None => None,
        };

        Ok(resolve(
            flags.or(PathOverrides::from_env()),
            file,
            default_home,
        ))
    }
}

/// Combine overrides, an optional config file and the default home
fn resolve(
    overrides: PathOverrides,
    file: Option<(PathBuf, ConfigFile)>,
    default_home: PathBuf,
) -> LibraryConfig {
    let Some((config_path, config)) = file else {
        let home = overrides.home.unwrap_or(default_home);
        return LibraryConfig {
            books_path: overrides.books.unwrap_or_else(|| home.join(BOOKS_FILE)),
            users_path: overrides.users.unwrap_or_else(|| home.join(USERS_FILE)),
            ..LibraryConfig::in_dir(home)
        };
    };

    // Project root is the parent of .booklend/ (grandparent of config.yaml)
    let base_dir = config_path
        .parent()
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."));

    let home = overrides.home.unwrap_or_else(|| match config.paths.home {
        Some(ref home) => resolve_path(base_dir, home),
        None => default_home,
    });

    let books_path = overrides.books.unwrap_or_else(|| {
        let name = config.paths.books.as_deref().unwrap_or(BOOKS_FILE);
        resolve_path(&home, name)
    });
    let users_path = overrides.users.unwrap_or_else(|| {
        let name = config.paths.users.as_deref().unwrap_or(USERS_FILE);
        resolve_path(&home, name)
    });

    LibraryConfig {
        home,
        books_path,
        users_path,
        write_mode: config.storage.write_mode.unwrap_or_default(),
        locking: config.storage.locking.unwrap_or(false),
        compensate: config.lending.compensate.unwrap_or(false),
        config_file: Some(config_path),
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".booklend").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path_str)
    }
}
