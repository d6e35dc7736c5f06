use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access token saved by `bookshelf auth login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            saved_at: Utc::now(),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("BOOKSHELF_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("bookshelf")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// File-backed token storage, the CLI counterpart of the browser's local storage
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn open() -> anyhow::Result<Self> {
        Ok(Self::at(get_config_dir()?))
    }

    pub fn at(config_dir: PathBuf) -> Self {
        Self {
            path: config_dir.join("token.json"),
        }
    }

    pub fn load(&self) -> anyhow::Result<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let token: StoredToken = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    pub fn save(&self, token: &StoredToken) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Returns whether a token was present
    pub fn clear(&self) -> anyhow::Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}
