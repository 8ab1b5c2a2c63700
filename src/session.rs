use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    saved_at: DateTime<Utc>,
}

/// File-backed store for the API token.
/// Every command except `login`/`logout` needs a token to be present.
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    /// Opens the store in the data directory, creating it if needed
    pub fn new() -> Result<Self> {
        let base_dir = if let Ok(dir) = std::env::var("NEWSDESK_DATA_DIR") {
            PathBuf::from(dir)
        } else if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
            PathBuf::from(xdg_data).join("newsdesk")
        } else {
            // XDG default
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".local/share/newsdesk")
        };

        Self::at(base_dir)
    }

    pub fn at(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create data directory: {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn session_path(&self) -> PathBuf {
        self.base_dir.join("session.json")
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(anyhow!("Token must not be empty"));
        }

        let session = StoredSession { token: token.to_string(), saved_at: Utc::now() };
        fs::write(self.session_path(), serde_json::to_string_pretty(&session)?)
            .context("Failed to write session file")?;
        Ok(())
    }

    pub fn load_token(&self) -> Result<Option<String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session: StoredSession = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file: {}", path.display()))?;
        Ok(Some(session.token))
    }

    /// The stored token, or an error telling the user to log in
    pub fn require_token(&self) -> Result<String> {
        self.load_token()?
            .ok_or_else(|| anyhow!("Not logged in. Run 'newsdesk login --token <TOKEN>' first."))
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
