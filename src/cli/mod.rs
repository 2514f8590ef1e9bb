//! Command-line interface for booklend.
//!
//! Provides commands for managing books and users and for lending books
//! out and taking them back.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{LibraryConfig, PathOverrides};
use crate::core::LendingDesk;

pub mod book;
pub mod user;

/// booklend - flat-file library ledgers
#[derive(Parser, Debug)]
#[command(name = "booklend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding books.txt and users.json
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Book ledger path (overrides --home for books)
    #[arg(long, global = true)]
    pub books: Option<PathBuf>,

    /// User ledger path (overrides --home for users)
    #[arg(long, global = true)]
    pub users: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage books
    Book {
        #[command(subcommand)]
        command: book::BookCommands,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: user::UserCommands,
    },

    /// Lend a book to a user
    CheckOut {
        /// User code (6 characters)
        #[arg(short, long)]
        user: String,

        /// Book code (5 characters)
        #[arg(short, long)]
        book: String,
    },

    /// Take a book back from a user
    CheckIn {
        /// User code (6 characters)
        #[arg(short, long)]
        user: String,

        /// Book code (5 characters)
        #[arg(short, long)]
        book: String,
    },

    /// Check that both ledgers agree on outstanding loans
    Audit,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = LibraryConfig::load(PathOverrides {
            home: self.home,
            books: self.books,
            users: self.users,
        })?;

        if let Commands::Config = self.command {
            return show_config(&config);
        }

        let desk = LendingDesk::new(config);
        desk.initialize().await?;

        match self.command {
            Commands::Book { command } => book::execute(&desk, command).await,
            Commands::User { command } => user::execute(&desk, command).await,
            Commands::CheckOut { user, book } => check_out(&desk, &user, &book).await,
            Commands::CheckIn { user, book } => check_in(&desk, &user, &book).await,
            Commands::Audit => run_audit(&desk).await,
            Commands::Config => Ok(()),
        }
    }
}

async fn check_out(desk: &LendingDesk, user: &str, book: &str) -> Result<()> {
    let book = desk.check_out(user, book).await?;
    println!("Book has been given to user.");
    println!("{} copies of {} left on the shelf", book.available_quantity, book.code);
    Ok(())
}

async fn check_in(desk: &LendingDesk, user: &str, book: &str) -> Result<()> {
    let book = desk.check_in(user, book).await?;
    println!("Book has been returned to library.");
    println!("{} copies of {} on the shelf", book.available_quantity, book.code);
    Ok(())
}

async fn run_audit(desk: &LendingDesk) -> Result<()> {
    let found = desk.audit().await?;

    if found.is_empty() {
        println!("Ledgers are consistent");
        return Ok(());
    }

    for discrepancy in &found {
        println!("{}", discrepancy);
    }
    anyhow::bail!("{} discrepancies found", found.len())
}

fn show_config(config: &LibraryConfig) -> Result<()> {
    println!("booklend configuration");
    println!("{}", "=".repeat(50));
    println!();

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!();

    println!("Home:        {}", config.home.display());
    println!("Books:       {}", config.books_path.display());
    println!("Users:       {}", config.users_path.display());
    println!();

    println!("Write mode:  {}", config.write_mode);
    println!("Locking:     {}", config.locking);
    println!("Compensate:  {}", config.compensate);

    Ok(())
}
