//! API credential lookup.
//!
//! The credential is looked up in the session cache, then the client-side store,
//! and finally requested from the user. Whatever is found is cached for the rest
//! of the session and written back to the store.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, ReviewError};

/// Name the credential is stored under
pub const CREDENTIAL_KEY: &str = "openai_api_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    value: String,
    stored_at: DateTime<Utc>,
}

/// JSON file of named credentials
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredCredential>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn backup_path(&self) -> PathBuf {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".bak");
        PathBuf::from(backup)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .read_all()?
            .remove(key)
            .map(|stored| stored.value)
            .filter(|value| !value.trim().is_empty()))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut all = match self.read_all() {
            Ok(all) => all,
            Err(e) => {
                // Keep the unreadable file around instead of losing its other keys
                let backup = self.backup_path();
                std::fs::rename(&self.path, &backup)?;
                warn!(
                    "Credential store {} is unreadable ({}); moved it to {}",
                    self.path.display(),
                    e,
                    backup.display()
                );
                BTreeMap::new()
            }
        };
        all.insert(
            key.to_string(),
            StoredCredential {
                value: value.to_string(),
                stored_at: Utc::now(),
            },
        );

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        debug!("Stored credential '{}' in {}", key, self.path.display());
        Ok(())
    }
}

/// Interactive source of the credential
#[cfg_attr(test, mockall::automock)]
pub trait CredentialPrompt: Send {
    /// Ask the user; `None` when they cancel
    fn ask(&mut self, message: &str) -> Option<String>;
}

/// Reads the credential from a line on stdin. An empty line cancels.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl CredentialPrompt for StdinPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        print!("{}: ", message);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        Some(line.trim().to_string())
    }
}

/// A prompt whose answer was already read elsewhere (e.g. by the review loop)
#[derive(Debug, Default)]
pub struct AnsweredPrompt(pub Option<String>);

impl CredentialPrompt for AnsweredPrompt {
    fn ask(&mut self, _message: &str) -> Option<String> {
        self.0.take()
    }
}

/// Session cache in front of the store
#[derive(Debug)]
pub struct Credentials {
    store: CredentialStore,
    cached: Option<String>,
}

impl Credentials {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            cached: None,
        }
    }

    /// Cached or stored credential, without asking
    pub fn lookup(&mut self) -> Option<String> {
        if let Some(key) = &self.cached {
            return Some(key.clone());
        }

        let stored = self.store.get(CREDENTIAL_KEY).unwrap_or_else(|e| {
            warn!("Failed to read credential store: {}", e);
            None
        });
        if let Some(key) = &stored {
            debug!("Using stored API credential");
            self.cached = Some(key.clone());
        }
        stored
    }

    /// The API credential, asking for it the first time it is needed.
    ///
    /// Fails with `Cancelled` when the user gives no credential.
    pub fn api_key(&mut self, prompt: &mut dyn CredentialPrompt) -> Result<String> {
        if let Some(key) = self.lookup() {
            return Ok(key);
        }

        let key = prompt
            .ask("Enter your API key (empty to cancel)")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ReviewError::Cancelled("no API key provided".to_string()))?;

        if let Err(e) = self.store.set(CREDENTIAL_KEY, &key) {
            warn!("Failed to persist API credential: {}", e);
        } else {
            info!("API credential saved");
        }
        self.cached = Some(key.clone());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_once_then_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("creds/credentials.json"));

        let mut prompt = MockCredentialPrompt::new();
        prompt
            .expect_ask()
            .times(1)
            .returning(|_| Some("  sk-abc  ".to_string()));

        let mut credentials = Credentials::new(store.clone());
        assert_eq!(credentials.api_key(&mut prompt).unwrap(), "sk-abc");
        assert_eq!(credentials.api_key(&mut prompt).unwrap(), "sk-abc");

        assert_eq!(store.get(CREDENTIAL_KEY).unwrap().as_deref(), Some("sk-abc"));
    }

    #[test]
    fn test_stored_credential_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store.set(CREDENTIAL_KEY, "sk-stored").unwrap();

        let mut prompt = MockCredentialPrompt::new();
        prompt.expect_ask().never();

        let mut credentials = Credentials::new(store);
        assert_eq!(credentials.api_key(&mut prompt).unwrap(), "sk-stored");
    }

    #[test]
    fn test_empty_input_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        let mut prompt = MockCredentialPrompt::new();
        prompt.expect_ask().returning(|_| Some(String::new()));

        let mut credentials = Credentials::new(store.clone());
        assert!(matches!(credentials.api_key(&mut prompt), Err(ReviewError::Cancelled(_))));
        assert_eq!(credentials.lookup(), None);
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap(), None);
    }

    #[test]
    fn test_answered_prompt_is_used_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut credentials = Credentials::new(CredentialStore::new(dir.path().join("credentials.json")));

        let mut answer = AnsweredPrompt(Some("sk-line".to_string()));
        assert_eq!(credentials.api_key(&mut answer).unwrap(), "sk-line");
        assert_eq!(answer.0, None);
        assert_eq!(credentials.lookup().as_deref(), Some("sk-line"));
    }

    #[test]
    fn test_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store.set("other", "value").unwrap();
        store.set(CREDENTIAL_KEY, "sk-1").unwrap();

        assert_eq!(store.get("other").unwrap().as_deref(), Some("value"));
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap().as_deref(), Some("sk-1"));
    }

    #[test]
    fn test_unreadable_store_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = CredentialStore::new(&path);

        store.set(CREDENTIAL_KEY, "sk-new").unwrap();

        let backup = dir.path().join("credentials.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{ not json");
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap().as_deref(), Some("sk-new"));
    }
}
