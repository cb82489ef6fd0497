//! MySQL/MariaDB driver
//!
//! Credentials are never put on the command line (they would show up in
//! `ps`); they are written to a transient ini-style defaults file handed
//! to the tool with `--defaults-file`. The temp file is removed on drop,
//! on success and failure alike.

use super::Driver;
use crate::config::{Config, Connection};
use crate::error::Result;
use crate::utils::{Pipeline, Stage};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

pub struct MysqlDriver {
    connection: Connection,
    config: Config,
}

impl MysqlDriver {
    pub fn new(connection: Connection, config: Config) -> Self {
        Self { connection, config }
    }

    /// Store the authentication data in a temporary defaults file under
    /// the given tool section
    fn store_auth(&self, section: &str) -> Result<NamedTempFile> {
        let mut auth = NamedTempFile::new()?;
        write!(
            auth,
            "[{}]\nuser={}\npassword=\"{}\"\nhost={}\n",
            section, self.connection.username, self.connection.password, self.connection.host
        )?;
        auth.flush()?;
        Ok(auth)
    }

    fn export_pipeline(&self, path: &Path, auth: &Path) -> Result<Pipeline> {
        let compression = super::compression_for(path)?;
        // Resolve every binary up front so a missing compressor fails
        // before anything is spawned
        let mysqldump = self.config.binary("mysqldump")?.clone();
        let compressor = super::compressor_stage(&self.config, compression)?;

        let mut pipeline = Pipeline::new()
            .stage(
                Stage::new(mysqldump)
                    .arg(format!("--defaults-file={}", auth.display()))
                    .arg(&self.connection.database),
            )
            .quiet_stderr(self.config.global.redirect_stderr);
        if let Some(stage) = compressor {
            pipeline = pipeline.stage(stage);
        }
        Ok(pipeline.stdout_file(path))
    }

    fn import_pipeline(&self, path: &Path, auth: &Path) -> Result<Pipeline> {
        let compression = super::compression_for(path)?;
        let mysql = self.config.binary("mysql")?.clone();
        let decompressor = super::decompressor_stage(&self.config, compression, path)?;

        let restore = Stage::new(mysql)
            .arg(format!("--defaults-file={}", auth.display()))
            .arg(&self.connection.database);

        let pipeline = match decompressor {
            Some(stage) => Pipeline::new().stage(stage).stage(restore),
            None => Pipeline::new().stage(restore).stdin_file(path),
        };
        Ok(pipeline.quiet_stderr(self.config.global.redirect_stderr))
    }
}

impl Driver for MysqlDriver {
    fn export(&self, path: &Path) -> Result<()> {
        info!("Exporting database `{}` to {:?}", self.connection.database, path);

        let auth = self.store_auth("mysqldump")?;
        let pipeline = self.export_pipeline(path, auth.path())?;
        // The dump tool's exit status is not solely trusted because of the
        // pipe; run_export also verifies the output file exists
        let result = super::run_export(pipeline, path);
        drop(auth);
        result
    }

    fn import(&self, path: &Path) -> Result<()> {
        info!("Importing {:?} into database `{}`", path, self.connection.database);

        super::ensure_readable(path)?;
        let auth = self.store_auth("client")?;
        let pipeline = self.import_pipeline(path, auth.path())?;
        let result = pipeline.run();
        drop(auth);
        result
    }
}
