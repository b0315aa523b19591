//! Session token storage.
//!
//! The token is an opaque string kept in a file under the data directory
//! and overridable through `RAIDSYNC_TOKEN`. Lookups happen on every
//! request, so a token saved, changed, or cleared mid-session takes effect
//! at the next call. No validation, no refresh, no expiry detection.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

/// Environment variable consulted before the session file.
const TOKEN_ENV: &str = "RAIDSYNC_TOKEN";

/// Stores and looks up the current session token.
#[derive(Debug, Clone)]
pub struct SessionStore {
  path: PathBuf,
}

impl SessionStore {
  /// Session store at the default location.
  pub fn open() -> Result<Self> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(Self::at_path(data_dir.join("raidsync").join("session")))
  }

  /// Session store at an explicit path.
  pub fn at_path(path: PathBuf) -> Self {
    Self { path }
  }

  /// The current token, if any. Reads fresh on every call.
  pub fn current_token(&self) -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
      if !token.is_empty() {
        return Some(token);
      }
    }

    match std::fs::read_to_string(&self.path) {
      Ok(token) => {
        let token = token.trim();
        if token.is_empty() {
          None
        } else {
          Some(token.to_string())
        }
      }
      Err(_) => None,
    }
  }

  /// Persist a token for subsequent commands.
  pub fn save(&self, token: &str) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    std::fs::write(&self.path, token.trim())
      .map_err(|e| eyre!("Failed to write session file {}: {}", self.path.display(), e))
  }

  /// Forget the stored token. Clearing an absent token is fine.
  pub fn clear(&self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(err) => Err(eyre!(
        "Failed to remove session file {}: {}",
        self.path.display(),
        err
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_store(name: &str) -> SessionStore {
    let path = std::env::temp_dir().join(format!(
      "raidsync-test-{}-session-{}",
      std::process::id(),
      name
    ));
    let _ = std::fs::remove_file(&path);
    SessionStore::at_path(path)
  }

  #[test]
  fn test_token_round_trip() {
    std::env::remove_var(TOKEN_ENV);
    let store = temp_store("round-trip");

    assert!(store.current_token().is_none());

    store.save("t-123").unwrap();
    assert_eq!(store.current_token().as_deref(), Some("t-123"));

    store.clear().unwrap();
    assert!(store.current_token().is_none());
  }

  #[test]
  fn test_clear_is_idempotent() {
    let store = temp_store("clear");
    store.clear().unwrap();
    store.clear().unwrap();
  }

  #[test]
  fn test_saved_token_is_trimmed() {
    std::env::remove_var(TOKEN_ENV);
    let store = temp_store("trim");

    store.save("  t-456\n").unwrap();
    assert_eq!(store.current_token().as_deref(), Some("t-456"));
  }
}
