//! Configuration loading and root folder resolution
//!
//! The root folder holds everything the service persists: the SQLite
//! database file and the uploads directory for transient and archived
//! artifacts.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no command-line root folder is given
pub const ROOT_FOLDER_ENV: &str = "SCOLARIS_ROOT_FOLDER";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Ensure the root folder and its uploads subdirectories exist
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    std::fs::create_dir_all(uploads_dir(root))?;
    std::fs::create_dir_all(documents_dir(root))?;
    Ok(())
}

/// Path of the SQLite database file inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("scolaris.db")
}

/// Directory for transient import artifacts
pub fn uploads_dir(root: &Path) -> PathBuf {
    root.join("uploads")
}

/// Directory for archived request documents
pub fn documents_dir(root: &Path) -> PathBuf {
    uploads_dir(root).join("documents")
}

/// Locate the configuration file for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/scolaris/config.toml first, then /etc/scolaris/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("scolaris").join("config.toml"));
        let system_config = PathBuf::from("/etc/scolaris/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("scolaris").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("scolaris"))
        .unwrap_or_else(|| PathBuf::from("./scolaris_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let root = resolve_root_folder(Some(Path::new("/tmp/explicit"))).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn test_derived_paths() {
        let root = Path::new("/var/lib/scolaris");
        assert_eq!(database_path(root), root.join("scolaris.db"));
        assert_eq!(uploads_dir(root), root.join("uploads"));
        assert_eq!(documents_dir(root), root.join("uploads").join("documents"));
    }

    #[test]
    fn test_ensure_root_folder_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("root");
        ensure_root_folder(&root).unwrap();
        assert!(uploads_dir(&root).is_dir());
        assert!(documents_dir(&root).is_dir());
    }
}
