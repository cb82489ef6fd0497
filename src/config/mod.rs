//! Configuration module
//!
//! One TOML file describes the target directory, the external tool
//! locations, the mail settings and the named database connections. The
//! file is loaded and validated once at startup and the resulting struct
//! is passed by reference into the export/import/manager constructors.

mod loader;
mod types;

pub use loader::{load_config, ConfigError, Result};
pub use types::*;

use crate::error::BackupError;
use std::path::{Path, PathBuf};

impl Config {
    /// The expanded target directory
    pub fn target(&self) -> PathBuf {
        expand_tilde(&self.global.target)
    }

    /// Resolved path of an external tool, failing with `MissingBinary`
    /// when it is neither configured nor on PATH
    pub fn binary(&self, name: &str) -> std::result::Result<&PathBuf, BackupError> {
        self.binaries
            .get(name)
            .ok_or_else(|| BackupError::MissingBinary(name.to_string()))
    }

    /// A named connection, or the configured default when `name` is `None`
    pub fn connection(&self, name: Option<&str>) -> Option<&Connection> {
        self.connections
            .get(name.unwrap_or(&self.global.connection))
    }

    /// The configured chmod value as a numeric mode. Validation at load
    /// time guarantees this parses.
    pub fn chmod_mode(&self) -> u32 {
        u32::from_str_radix(self.global.chmod.trim_start_matches("0o"), 8).unwrap_or(0o664)
    }
}

/// Expand tilde (~) in path to home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config(target: &Path) -> Config {
        Config {
            global: GlobalConfig {
                target: target.to_path_buf(),
                connection: "default".to_string(),
                chmod: "0600".to_string(),
                redirect_stderr: true,
                log_directory: PathBuf::from("/tmp/logs"),
                log_level: "info".to_string(),
                log_max_files: 10,
            },
            binaries: Binaries::default(),
            mail: None,
            connections: HashMap::from([(
                "default".to_string(),
                Connection {
                    engine: "mysql".to_string(),
                    host: "localhost".to_string(),
                    database: "app".to_string(),
                    username: "root".to_string(),
                    password: String::new(),
                },
            )]),
        }
    }

    #[test]
    fn test_chmod_mode() {
        let config = test_config(Path::new("/tmp/backups"));
        assert_eq!(config.chmod_mode(), 0o600);
    }

    #[test]
    fn test_binary_missing() {
        let config = test_config(Path::new("/tmp/backups"));
        let err = config.binary("mysqldump").unwrap_err();
        assert!(matches!(err, BackupError::MissingBinary(_)));
    }

    #[test]
    fn test_connection_lookup() {
        let config = test_config(Path::new("/tmp/backups"));
        assert!(config.connection(None).is_some());
        assert!(config.connection(Some("default")).is_some());
        assert!(config.connection(Some("missing")).is_none());
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde(Path::new("~/backups"));
        assert!(!expanded.starts_with("~"));

        let absolute = expand_tilde(Path::new("/var/backups"));
        assert_eq!(absolute, PathBuf::from("/var/backups"));
    }
}
