use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::Arc, sync::RwLock};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Persisted user settings. The auth token lives under this single file's
/// fixed `auth_token` key; its presence is the only "logged in" signal until
/// `/auth/me/` confirms it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserSettings {
    auth_token: Option<String>,
    api_base_url: String,
    confirm_exit_cook_mode: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auth_token: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            confirm_exit_cook_mode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub api_base_url: String,
    pub confirm_exit_cook_mode: bool,
    pub has_token: bool,
}

struct Inner {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<Inner>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        if let Ok(base) = std::env::var("FORKLOG_API_URL") {
            if !base.trim().is_empty() {
                data.api_base_url = base.trim().trim_end_matches('/').to_owned();
            }
        }

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                data: RwLock::new(data),
            }),
        })
    }

    pub fn auth_token(&self) -> Option<String> {
        self.read().auth_token.clone()
    }

    pub fn set_auth_token(&self, token: Option<String>) -> Result<()> {
        let mut guard = self.write();
        guard.auth_token = token.filter(|t| !t.is_empty());
        self.persist(&guard)
    }

    pub fn api_base_url(&self) -> String {
        self.read().api_base_url.clone()
    }

    pub fn confirm_exit_cook_mode(&self) -> bool {
        self.read().confirm_exit_cook_mode
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        let guard = self.read();
        SettingsSnapshot {
            api_base_url: guard.api_base_url.clone(),
            confirm_exit_cook_mode: guard.confirm_exit_cook_mode,
            has_token: guard.auth_token.is_some(),
        }
    }

    pub fn update(&self, api_base_url: Option<String>, confirm_exit: Option<bool>) -> Result<()> {
        let mut guard = self.write();
        if let Some(base) = api_base_url {
            guard.api_base_url = base.trim().trim_end_matches('/').to_owned();
        }
        if let Some(confirm) = confirm_exit {
            guard.confirm_exit_cook_mode = confirm;
        }
        self.persist(&guard)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, UserSettings> {
        self.inner.data.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, UserSettings> {
        self.inner.data.write().unwrap_or_else(|p| p.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.inner.path, serialized).with_context(|| {
            format!("Failed to write settings to {}", self.inner.path.display())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn token_roundtrip_persists() {
        let (dir, store) = store();
        store.set_auth_token(Some("abc123".into())).unwrap();
        assert_eq!(store.auth_token().as_deref(), Some("abc123"));

        let reopened = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(reopened.auth_token().as_deref(), Some("abc123"));

        store.set_auth_token(None).unwrap();
        assert_eq!(store.auth_token(), None);
    }

    #[test]
    fn empty_token_counts_as_cleared() {
        let (_dir, store) = store();
        store.set_auth_token(Some(String::new())).unwrap();
        assert_eq!(store.auth_token(), None);
        assert!(!store.snapshot().has_token);
    }
}
