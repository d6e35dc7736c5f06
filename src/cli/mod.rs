pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_ENDPOINT;

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(about = "Bookshelf CLI - manage the book catalog from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "BOOKSHELF_API_URL",
        default_value = DEFAULT_ENDPOINT,
        help = "GraphQL endpoint of the Bookshelf API"
    )]
    pub endpoint: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Access token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Book catalog operations")]
    Books {
        #[command(subcommand)]
        cmd: commands::books::BookCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Books { cmd } => commands::books::handle(cmd, &cli.endpoint, output_format).await,
    }
}
