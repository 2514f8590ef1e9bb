//! `booklend user` subcommands.

use anyhow::Result;
use clap::Subcommand;

use crate::core::LendingDesk;

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List every user with their borrowed books
    List,

    /// Register a new user
    Add {
        /// User code (6 alphanumeric characters)
        code: String,
    },

    /// Show the books a user currently holds
    Books {
        /// User code
        code: String,
    },

    /// Delete a user (must hold no books)
    Delete {
        /// User code
        code: String,
    },
}

/// Execute user subcommands
pub async fn execute(desk: &LendingDesk, command: UserCommands) -> Result<()> {
    match command {
        UserCommands::List => {
            let users = desk.users().list_all().await?;

            if users.is_empty() {
                println!("No users registered");
                return Ok(());
            }

            println!("{:<8} {}", "USER", "BORROWED");
            println!("{}", "-".repeat(40));
            for (user, books) in &users {
                let codes: Vec<&str> = books.iter().map(|b| b.as_str()).collect();
                println!("{:<8} {}", user, codes.join(", "));
            }
            Ok(())
        }
        UserCommands::Add { code } => {
            let _lock = desk.lock().await?;
            desk.users().add(&code).await?;
            println!("User is added.");
            Ok(())
        }
        UserCommands::Books { code } => match desk.users().borrowed_books(&code).await? {
            Some(books) if books.is_empty() => {
                println!("User {} holds no books", code);
                Ok(())
            }
            Some(books) => {
                for book in books {
                    println!("{}", book);
                }
                Ok(())
            }
            None => anyhow::bail!("User {} is not in database", code),
        },
        UserCommands::Delete { code } => {
            let _lock = desk.lock().await?;
            desk.users().delete(&code).await?;
            println!("User is deleted.");
            Ok(())
        }
    }
}
