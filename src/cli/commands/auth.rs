use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{StoredToken, TokenStore};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Store an access token issued by the identity provider")]
    Login {
        #[arg(long, help = "Access token (JWT) for the Bookshelf API audience")]
        token: String,
    },

    #[command(about = "Forget the stored access token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = TokenStore::open()?;

    match cmd {
        AuthCommands::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                anyhow::bail!("Access token must not be empty");
            }
            store.save(&StoredToken::new(token.to_string()))?;
            output_success(&output_format, "Access token saved", None)
        }
        AuthCommands::Logout => {
            let message = if store.clear()? {
                "Logged out"
            } else {
                "No access token was stored"
            };
            output_success(&output_format, message, None)
        }
        AuthCommands::Status => match store.load()? {
            Some(token) => output_success(
                &output_format,
                &format!("Access token stored at {}", token.saved_at.to_rfc3339()),
                Some(json!({ "authenticated": true, "saved_at": token.saved_at })),
            ),
            None => output_success(
                &output_format,
                "Not logged in",
                Some(json!({ "authenticated": false })),
            ),
        },
    }
}
