//! SQLite driver
//!
//! Export and import go through the engine's own command-line shell
//! against the database file: dump to text with `.dump`, load from text by
//! feeding the SQL back in. Compression is layered as a pipe stage exactly
//! like the MySQL variant. Failure is signaled by the exit code.

use super::Driver;
use crate::config::{Config, Connection};
use crate::error::Result;
use crate::utils::{Pipeline, Stage};
use std::path::Path;
use tracing::info;

pub struct SqliteDriver {
    connection: Connection,
    config: Config,
}

impl SqliteDriver {
    pub fn new(connection: Connection, config: Config) -> Self {
        Self { connection, config }
    }

    fn export_pipeline(&self, path: &Path) -> Result<Pipeline> {
        let compression = super::compression_for(path)?;
        let sqlite3 = self.config.binary("sqlite3")?.clone();
        let compressor = super::compressor_stage(&self.config, compression)?;

        let mut pipeline = Pipeline::new()
            .stage(
                Stage::new(sqlite3)
                    .arg(&self.connection.database)
                    .arg(".dump"),
            )
            .quiet_stderr(self.config.global.redirect_stderr);
        if let Some(stage) = compressor {
            pipeline = pipeline.stage(stage);
        }
        Ok(pipeline.stdout_file(path))
    }

    fn import_pipeline(&self, path: &Path) -> Result<Pipeline> {
        let compression = super::compression_for(path)?;
        let sqlite3 = self.config.binary("sqlite3")?.clone();
        let decompressor = super::decompressor_stage(&self.config, compression, path)?;

        let load = Stage::new(sqlite3).arg(&self.connection.database);

        let pipeline = match decompressor {
            Some(stage) => Pipeline::new().stage(stage).stage(load),
            None => Pipeline::new().stage(load).stdin_file(path),
        };
        Ok(pipeline.quiet_stderr(self.config.global.redirect_stderr))
    }
}

impl Driver for SqliteDriver {
    fn export(&self, path: &Path) -> Result<()> {
        info!("Exporting database `{}` to {:?}", self.connection.database, path);
        let pipeline = self.export_pipeline(path)?;
        super::run_export(pipeline, path)
    }

    fn import(&self, path: &Path) -> Result<()> {
        info!("Importing {:?} into database `{}`", path, self.connection.database);
        super::ensure_readable(path)?;
        self.import_pipeline(path)?.run()
    }
}
