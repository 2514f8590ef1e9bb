//! `booklend book` subcommands.

use anyhow::Result;
use clap::Subcommand;

use crate::core::LendingDesk;
use crate::domain::Book;

#[derive(Subcommand, Debug)]
pub enum BookCommands {
    /// List every book in the ledger
    List,

    /// Add a new book
    Add {
        /// Book code (5 alphanumeric characters)
        #[arg(short, long)]
        code: String,

        /// Book name (alphanumeric, up to 100 characters)
        #[arg(short, long)]
        name: String,

        /// Book author (alphanumeric, up to 45 characters)
        #[arg(short, long)]
        author: String,

        /// Copies owned
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,

        /// Copies on the shelf right now (defaults to quantity)
        #[arg(long, allow_negative_numbers = true)]
        available: Option<i64>,
    },

    /// Show one book
    Find {
        /// Book code
        code: String,
    },

    /// Delete a book (all copies must be returned)
    Delete {
        /// Book code
        code: String,
    },
}

/// Execute book subcommands
pub async fn execute(desk: &LendingDesk, command: BookCommands) -> Result<()> {
    match command {
        BookCommands::List => list_books(desk).await,
        BookCommands::Add {
            code,
            name,
            author,
            quantity,
            available,
        } => {
            let _lock = desk.lock().await?;
            match available {
                Some(available) => {
                    desk.books()
                        .add_with_available(&code, &name, &author, quantity, available)
                        .await?
                }
                None => desk.books().add(&code, &name, &author, quantity).await?,
            };
            println!("Book is added.");
            Ok(())
        }
        BookCommands::Find { code } => match desk.books().find(&code).await? {
            Some(book) => {
                print_header();
                print_row(&book);
                Ok(())
            }
            None => anyhow::bail!("The book with code=\"{}\" is not in library.", code),
        },
        BookCommands::Delete { code } => {
            let _lock = desk.lock().await?;
            desk.books().delete(&code).await?;
            println!("Book is deleted.");
            Ok(())
        }
    }
}

async fn list_books(desk: &LendingDesk) -> Result<()> {
    let books = desk.books().list_all().await?;

    if books.is_empty() {
        println!("No books in library");
        return Ok(());
    }

    print_header();
    for book in &books {
        print_row(book);
    }

    println!("\n{} books", books.len());
    Ok(())
}

fn print_header() {
    println!(
        "{:<7} {:<30} {:<20} {:>8} {:>10}",
        "CODE", "NAME", "AUTHOR", "QUANTITY", "AVAILABLE"
    );
    println!("{}", "-".repeat(79));
}

fn print_row(book: &Book) {
    let name = if book.name.chars().count() > 28 {
        format!("{}...", book.name.chars().take(25).collect::<String>())
    } else {
        book.name.clone()
    };

    println!(
        "{:<7} {:<30} {:<20} {:>8} {:>10}",
        book.code, name, book.author, book.quantity, book.available_quantity
    );
}
