// src/auth/mod.rs — API key store for oracle providers
//
// Stores provider API keys in ~/.tourney/auth.json. Environment variables
// always take precedence over stored keys.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::infra::paths;

/// Top-level auth store persisted to ~/.tourney/auth.json.
///
/// Keys are stored as plaintext JSON on disk (chmod 600 on Unix).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthStore {
    /// Map of provider_id -> AuthInfo
    #[serde(default)]
    pub providers: HashMap<String, AuthInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthInfo {
    ApiKey { key: String },
}

impl AuthInfo {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey { key: key.into() }
    }

    /// Return the key to use for Authorization headers.
    pub fn token(&self) -> &str {
        match self {
            Self::ApiKey { key } => key,
        }
    }
}

/// Environment variable consulted for a provider's key, e.g. `OPENAI_API_KEY`.
pub fn env_var_for(provider_id: &str) -> String {
    format!(
        "{}_API_KEY",
        provider_id.to_ascii_uppercase().replace('-', "_")
    )
}

/// Resolve an API key: env var first, then auth.json.
pub fn resolve_api_key(provider_id: &str) -> Option<String> {
    if let Ok(key) = std::env::var(env_var_for(provider_id)) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Some(key);
        }
    }
    match AuthStore::load() {
        Ok(store) => store.get(provider_id).map(|info| info.token().to_string()),
        Err(e) => {
            tracing::warn!("Could not read auth store: {e}");
            None
        }
    }
}

impl AuthStore {
    /// Load auth.json. Returns an empty store if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::auth_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&content)?;
        Ok(store)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&paths::auth_file_path())
    }

    /// Save atomically (write to .tmp then rename, chmod 600).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn get(&self, provider_id: &str) -> Option<&AuthInfo> {
        self.providers.get(provider_id)
    }

    /// Set the auth info for a provider and save immediately.
    pub fn set_and_save(&mut self, provider_id: &str, info: AuthInfo) -> Result<()> {
        self.providers.insert(provider_id.to_string(), info);
        self.save()
    }
}
