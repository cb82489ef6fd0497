//! Import orchestrator

use crate::config::{Config, Connection};
use crate::drivers::{self, Driver};
use crate::error::{BackupError, Result};
use crate::utils::filename::{self, ResolvedTarget};
use std::path::PathBuf;
use tracing::info;

pub struct BackupImport {
    config: Config,
    driver: Box<dyn Driver>,
    filename: Option<ResolvedTarget>,
}

impl BackupImport {
    pub fn new(config: &Config, connection: &Connection) -> Result<Self> {
        let driver = drivers::for_connection(connection, config)?;
        Ok(Self {
            config: config.clone(),
            driver,
            filename: None,
        })
    }

    /// Set the backup file to import, absolute or relative to the target
    /// directory
    pub fn filename(&mut self, raw: &str) -> Result<&mut Self> {
        let resolved = filename::resolve_import_source(raw, &self.config.target())?;
        self.filename = Some(resolved);
        Ok(self)
    }

    /// Import the backup, returning the path that was used
    pub fn import(&self) -> Result<PathBuf> {
        let resolved = self.filename.as_ref().ok_or(BackupError::MissingFilename)?;
        self.driver.import(&resolved.path)?;
        info!("Backup {:?} has been imported", resolved.path);
        Ok(resolved.path.clone())
    }
}
