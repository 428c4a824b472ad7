// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the TOURNEY_HOME environment variable for isolation.
// When TOURNEY_HOME is set, config and data live under that directory.
// When unset, config uses ~/.tourney/ and data uses XDG_DATA_HOME/tourney.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the TOURNEY_HOME override, if set.
fn tourney_home() -> Option<PathBuf> {
    std::env::var_os("TOURNEY_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $TOURNEY_HOME/ or ~/.tourney/
pub fn config_dir() -> PathBuf {
    if let Some(home) = tourney_home() {
        return home;
    }
    dirs_home().join(".tourney")
}

/// Data directory: $TOURNEY_HOME/data/ or ~/.local/share/tourney/
pub fn data_dir() -> PathBuf {
    if let Some(home) = tourney_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "tourney") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Default match/generation cache file.
pub fn cache_file_path() -> PathBuf {
    data_dir().join("cache.json")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Stored credentials (API keys).
pub fn auth_file_path() -> PathBuf {
    config_dir().join("auth.json")
}

/// Ensure config and data directories exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    for dir in [config_dir(), data_dir()] {
        tokio::fs::create_dir_all(&dir).await?;
    }
    Ok(())
}
