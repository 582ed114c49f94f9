use anyhow::Result;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "freight-admin";

/// Folder the executable runs from, or the working directory.
pub fn resolve_deployment_folder() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return dir.to_path_buf();
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Per-user configuration folder (`~/.config/freight-admin` on Linux).
pub fn resolve_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| resolve_deployment_folder().join("config"))
}

/// Per-user data folder; holds the session store and its key.
pub fn resolve_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| resolve_deployment_folder().join("data"))
}

pub fn default_config_path() -> PathBuf {
    resolve_config_dir().join("freight-admin.toml")
}

pub fn default_session_path() -> PathBuf {
    resolve_data_dir().join("session.json")
}

/// Log folder under the data dir, created on demand.
pub fn resolve_log_folder() -> Result<PathBuf> {
    let log_dir = resolve_data_dir().join("logs");
    ensure_dir(&log_dir)?;
    Ok(log_dir)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("Failed to create folder {:?}: {}", dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_paths_live_under_the_app_folder() {
        assert!(default_config_path().ends_with("freight-admin/freight-admin.toml"));
        assert!(default_session_path().ends_with("freight-admin/session.json"));
    }

    #[test]
    fn ensure_dir_creates_nested_folders() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
