use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::cli::config::TokenStore;
use crate::cli::utils::{output_book, output_books, output_error, output_success};
use crate::cli::OutputFormat;
use crate::client::{BookClient, ClientError};

#[derive(Subcommand)]
pub enum BookCommands {
    #[command(about = "List every book in the catalog")]
    List,

    #[command(about = "Show a single book")]
    Get {
        #[arg(help = "Book ID")]
        id: i32,
    },

    #[command(about = "Add a book")]
    Create {
        #[arg(long, help = "Book name")]
        name: String,
        #[arg(long, default_value = "", help = "Book description")]
        description: String,
    },

    #[command(about = "Replace a book's name and description")]
    Update {
        #[arg(help = "Book ID")]
        id: i32,
        #[arg(long, help = "Book name")]
        name: String,
        #[arg(long, help = "Book description")]
        description: String,
    },

    #[command(about = "Delete a book")]
    Remove {
        #[arg(help = "Book ID")]
        id: i32,
        #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle(
    cmd: BookCommands,
    endpoint: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let token = TokenStore::open()?.load()?.map(|t| t.access_token);
    let client = BookClient::new(endpoint, token);

    match execute(cmd, &client, &output_format).await {
        Err(e) => match e.downcast_ref::<ClientError>() {
            Some(ClientError::Unauthorized(message)) => {
                output_error(&output_format, message, Some("UNAUTHORIZED"))?;
                anyhow::bail!("Run `bookshelf auth login --token <token>` with a valid access token")
            }
            Some(client_error) => {
                output_error(&output_format, &client_error.to_string(), client_error.code())?;
                Err(e)
            }
            None => Err(e),
        },
        Ok(()) => Ok(()),
    }
}

async fn execute(
    cmd: BookCommands,
    client: &BookClient,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        BookCommands::List => {
            let books = client.list_books().await?;
            output_books(output_format, &books)
        }
        BookCommands::Get { id } => {
            let book = client.get_book(id).await?;
            output_book(output_format, &book)
        }
        BookCommands::Create { name, description } => {
            let book = client.create_book(&name, &description).await?;
            output_success(
                output_format,
                &format!("Created book {} ({})", book.id, book.name),
                Some(json!({ "book": book })),
            )
        }
        BookCommands::Update { id, name, description } => {
            let book = client.update_book(id, &name, &description).await?;
            output_success(
                output_format,
                &format!("Updated book {}", book.id),
                Some(json!({ "book": book })),
            )
        }
        BookCommands::Remove { id, yes } => {
            if !yes && !confirm(&format!("Are you sure you want to delete book {}?", id))? {
                return output_success(output_format, "Cancelled", None);
            }
            let removed = client.remove_book(id).await?;
            let message = if removed {
                format!("Deleted book {}", id)
            } else {
                format!("Book {} did not exist", id)
            };
            output_success(output_format, &message, Some(json!({ "removed": removed })))
        }
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
