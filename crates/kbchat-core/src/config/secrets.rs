use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{paths, secrets};
use crate::error::{KbChatError, Result};

/// Process-local secret store backed by a flat `secrets.toml` file.
///
/// Values are read once at startup. An environment variable with the same
/// name as a key takes precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl SecretStore {
    /// Candidate locations, in lookup order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(secrets::LOCAL_SECRETS_DIR).join(secrets::SECRETS_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(paths::CONFIG_DIR).join(secrets::SECRETS_FILE));
        }
        candidates
    }

    /// Load the first secrets file found. A missing file is not an error;
    /// the store is simply empty and only env overrides apply.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::from_path(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut store = Self::from_toml_str(&content).map_err(|e| {
            KbChatError::config(format!("invalid secrets file {}: {e}", path.display()))
        })?;
        store.source = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| KbChatError::config(e.to_string()))?;
        let values = table
            .into_iter()
            .filter_map(|(key, value)| match value {
                toml::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values, source: None })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The file the store was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Look up a secret, preferring the environment over the file.
    /// Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let present = |v: &String| !v.trim().is_empty();
        std::env::var(key)
            .ok()
            .filter(present)
            .or_else(|| self.values.get(key).filter(|v| present(v)).cloned())
    }

    /// Look up a secret that must be present.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| {
            let locations = Self::search_paths()
                .iter()
                .map(|p| format!("  {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n");
            KbChatError::config(format!(
                "API key `{key}` not found. Add `{key} = \"...\"` to a secrets file:\n{locations}\n\
                 or set the `{key}` environment variable."
            ))
        })
    }
}
