//! Export orchestrator
//!
//! Owns one driver bound to one connection. Three persistent knobs
//! (compression, retention, recipient) survive across calls; the filename
//! is per-call state and is consumed by `export()` so a stale path cannot
//! leak into the next run.

use crate::config::{Config, Connection};
use crate::drivers::{self, Driver};
use crate::error::Result;
use crate::managers::backup::BackupManager;
use crate::utils::compression::Compression;
use crate::utils::filename::{self, ResolvedTarget};
use std::path::PathBuf;
use tracing::info;

const DEFAULT_TEMPLATE: &str = "backup_{$DATABASE}_{$DATETIME}";

pub struct BackupExport {
    config: Config,
    connection: Connection,
    driver: Box<dyn Driver>,
    manager: BackupManager,
    /// Per-call state, consumed by `export()`
    filename: Option<ResolvedTarget>,
    /// Persistent instance configuration
    compression: Option<Compression>,
    keep: Option<i64>,
    recipient: Option<String>,
}

impl BackupExport {
    pub fn new(config: &Config, connection: &Connection) -> Result<Self> {
        let driver = drivers::for_connection(connection, config)?;
        Ok(Self {
            config: config.clone(),
            connection: connection.clone(),
            driver,
            manager: BackupManager::new(config),
            filename: None,
            compression: None,
            keep: None,
            recipient: None,
        })
    }

    /// Set the output filename. It may be absolute and may contain
    /// patterns; the compression for this call is fixed from its
    /// extension.
    pub fn filename(&mut self, raw: &str) -> Result<&mut Self> {
        let resolved =
            filename::resolve_export_target(raw, &self.connection, &self.config.target())?;
        self.compression = Some(resolved.compression);
        self.filename = Some(resolved);
        Ok(self)
    }

    /// Set the compression used when the filename is synthesized
    pub fn compression(&mut self, compression: Compression) -> &mut Self {
        self.compression = Some(compression);
        self
    }

    /// Number of backups to keep after this export; older ones are rotated
    /// out
    pub fn rotate(&mut self, keep: i64) -> &mut Self {
        self.keep = Some(keep);
        self
    }

    /// Recipient to send the artifact to after a successful export, or
    /// `None` to disable
    pub fn send_to(&mut self, recipient: Option<String>) -> &mut Self {
        self.recipient = recipient;
        self
    }

    /// Export the database, returning the absolute path of the artifact.
    /// The filename setting is consumed; compression, retention and
    /// recipient settings are retained for subsequent calls.
    pub fn export(&mut self) -> Result<PathBuf> {
        let resolved = match self.filename.take() {
            Some(resolved) => resolved,
            None => {
                let extension = self
                    .compression
                    .unwrap_or(Compression::None)
                    .default_extension();
                let template = format!("{}.{}", DEFAULT_TEMPLATE, extension);
                filename::resolve_export_target(
                    &template,
                    &self.connection,
                    &self.config.target(),
                )?
            }
        };

        self.driver.export(&resolved.path)?;
        self.apply_chmod(&resolved.path)?;
        info!("Backup {:?} has been exported", resolved.path);

        if let Some(ref recipient) = self.recipient {
            self.manager
                .send(&resolved.path.to_string_lossy(), recipient)?;
        }
        if let Some(keep) = self.keep {
            self.manager.rotate(keep)?;
        }

        Ok(resolved.path)
    }

    #[cfg(unix)]
    fn apply_chmod(&self, path: &std::path::Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(self.config.chmod_mode());
        std::fs::set_permissions(path, permissions)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_chmod(&self, _path: &std::path::Path) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Binaries, GlobalConfig};
    use crate::error::BackupError;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(target: &Path) -> Config {
        Config {
            global: GlobalConfig {
                target: target.to_path_buf(),
                connection: "default".to_string(),
                chmod: "0664".to_string(),
                redirect_stderr: true,
                log_directory: PathBuf::from("/tmp/logs"),
                log_level: "info".to_string(),
                log_max_files: 10,
            },
            binaries: Binaries::default(),
            mail: None,
            connections: HashMap::new(),
        }
    }

    fn test_connection() -> Connection {
        Connection {
            engine: "mysql".to_string(),
            host: "localhost".to_string(),
            database: "app".to_string(),
            username: "root".to_string(),
            password: String::new(),
        }
    }

    #[test]
    fn test_unsupported_engine_rejected_at_construction() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let mut connection = test_connection();
        connection.engine = "mongodb".to_string();

        let err = BackupExport::new(&config, &connection).map(|_| ()).unwrap_err();
        assert!(matches!(err, BackupError::UnsupportedDriver(_)));
    }

    #[test]
    fn test_filename_sets_compression() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let mut export = BackupExport::new(&config, &test_connection()).unwrap();

        export.filename("backup.sql.bz2").unwrap();
        assert_eq!(export.compression, Some(Compression::Bzip2));
        assert_eq!(
            export.filename.as_ref().unwrap().path,
            temp_dir.path().join("backup.sql.bz2")
        );
    }

    #[test]
    fn test_filename_invalid_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let mut export = BackupExport::new(&config, &test_connection()).unwrap();

        let err = export.filename("backup.zip").map(|_| ()).unwrap_err();
        assert!(matches!(err, BackupError::InvalidExtension(_)));
    }

    #[test]
    fn test_filename_missing_parent_produces_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let mut export = BackupExport::new(&config, &test_connection()).unwrap();

        let raw = temp_dir.path().join("missing/backup.sql");
        let err = export
            .filename(raw.to_str().unwrap())
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, BackupError::InvalidDirectory(_)));
        assert!(!raw.exists());
    }

    #[test]
    fn test_export_without_dump_tool_fails_missing_binary() {
        // Filename synthesis and resolution happen before the driver
        // needs mysqldump, so the failure is MissingBinary and no
        // artifact is left behind
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let mut export = BackupExport::new(&config, &test_connection()).unwrap();

        let err = export.export().unwrap_err();
        assert!(matches!(err, BackupError::MissingBinary(_)));
        assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }
}
