//! Per-engine drivers turning export/import requests into external tool
//! invocations
//!
//! Each driver is bound at construction to one connection descriptor and
//! holds no other state. Engines differ in how credentials are passed
//! (temp defaults file, connection URI, none) and in how failure is
//! signaled; the trait hides all of that behind one contract.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlDriver;
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;

use crate::config::{Config, Connection};
use crate::error::{BackupError, Result};
use crate::utils::{Compression, Pipeline, Stage};
use std::fs;
use std::path::Path;
use tracing::warn;

pub trait Driver {
    /// Export the database into `path`. A failed export leaves no partial
    /// output file behind.
    fn export(&self, path: &Path) -> Result<()>;

    /// Import the artifact at `path` into the database. The artifact must
    /// already exist and be readable.
    fn import(&self, path: &Path) -> Result<()>;
}

/// Select the driver variant for a connection's reported engine name.
/// Unknown engines are rejected explicitly.
pub fn for_connection(connection: &Connection, config: &Config) -> Result<Box<dyn Driver>> {
    match connection.engine.to_lowercase().as_str() {
        "mysql" | "mariadb" => Ok(Box::new(MysqlDriver::new(connection.clone(), config.clone()))),
        "postgres" | "postgresql" => Ok(Box::new(PostgresDriver::new(
            connection.clone(),
            config.clone(),
        ))),
        "sqlite" | "sqlite3" => Ok(Box::new(SqliteDriver::new(
            connection.clone(),
            config.clone(),
        ))),
        other => Err(BackupError::UnsupportedDriver(other.to_string())),
    }
}

/// Compression implied by an artifact path, from its extension
pub(crate) fn compression_for(path: &Path) -> Result<Compression> {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    crate::utils::compression::extension_of(&name)
        .and_then(crate::utils::compression::compression_of)
        .ok_or_else(|| BackupError::InvalidExtension(name.to_string()))
}

/// Stage compressing stdin to stdout, or `None` for uncompressed targets.
/// Fails with `MissingBinary` before anything is spawned.
pub(crate) fn compressor_stage(config: &Config, compression: Compression) -> Result<Option<Stage>> {
    match compression.binary_name() {
        Some(name) => Ok(Some(Stage::new(config.binary(name)?))),
        None => Ok(None),
    }
}

/// Stage decompressing an artifact to stdout, or `None` when the artifact
/// is plain SQL
pub(crate) fn decompressor_stage(
    config: &Config,
    compression: Compression,
    artifact: &Path,
) -> Result<Option<Stage>> {
    match compression.binary_name() {
        Some(name) => Ok(Some(
            Stage::new(config.binary(name)?).arg("-dc").arg(artifact),
        )),
        None => Ok(None),
    }
}

pub(crate) fn ensure_readable(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BackupError::FileNotReadable(path.to_path_buf()))
    }
}

/// Run an export pipeline and verify the output file exists afterwards.
/// Any failure removes the partial output so a failed export is
/// indistinguishable from "no artifact produced".
pub(crate) fn run_export(pipeline: Pipeline, out: &Path) -> Result<()> {
    let result = pipeline.run();

    match result {
        Ok(()) => {
            // With stdout_file set the file exists from the moment the
            // last stage spawns; this also covers tools writing the
            // artifact themselves
            if out.is_file() {
                Ok(())
            } else {
                Err(BackupError::ProcessFailed(-1))
            }
        }
        Err(e) => {
            if out.exists() {
                if let Err(rm) = fs::remove_file(out) {
                    warn!("Failed to remove partial export {:?}: {}", out, rm);
                }
            }
            Err(e)
        }
    }
}
