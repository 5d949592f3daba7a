// src/config.rs
// =============================================================================
// Settings and the stored GitHub token.
//
// The token lives in a single plain-text file:
//   <config dir>/repo-scribe/credential
//   (e.g. ~/.config/repo-scribe/credential on Linux)
//
// It is read once at startup and handed to the GitHub client. Nothing else
// reads it later, so there is exactly one place that decides which token
// is used.
//
// Precedence: --token / GITHUB_TOKEN  >  stored credential  >  none
// =============================================================================

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::GlobalArgs;

const APP_DIR: &str = "repo-scribe";
const CREDENTIAL_FILE: &str = "credential";

/// The file holding the persisted token
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the platform config directory
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine the config directory"))?;
        Ok(Self::at(dir.join(APP_DIR).join(CREDENTIAL_FILE)))
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored token, or None if nothing (or only whitespace) is stored
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(anyhow!("Refusing to store an empty token"));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "token stored");
        Ok(())
    }

    /// Removes the stored token; returns false if there was none
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// Everything the commands need, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub model: String,
    pub gateway_key: Option<String>,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, store: &CredentialStore) -> Result<Self> {
        let token = match args.token.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Some(t.to_string()),
            _ => store.load()?,
        };

        Ok(Settings {
            api_url: args.api_url.clone(),
            token,
            model: args.model.clone(),
            gateway_key: args.anthropic_api_key.clone(),
        })
    }
}

/// Shows only the first and last characters of a token
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
