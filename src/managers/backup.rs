//! Backup manager - inventory, retention and delivery over the target
//! directory
//!
//! Operates purely on the filesystem (plus the mail collaborator); no
//! database connection is involved. Nothing here takes a lock: concurrent
//! operations against the same target directory must be serialized by the
//! caller.

use crate::config::Config;
use crate::error::{BackupError, Result};
use crate::managers::mailer::Mailer;
use crate::utils::compression::{self, Compression};
use crate::utils::filename;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Read-only view of one artifact, constructed fresh on every scan and
/// immediately stale if the directory changes afterwards
#[derive(Debug, Clone, Serialize)]
pub struct BackupFile {
    pub filename: String,
    pub path: PathBuf,
    pub extension: &'static str,
    pub compression: Compression,
    pub size: u64,
    #[serde(serialize_with = "unix_seconds")]
    pub modified: SystemTime,
}

fn unix_seconds<S: Serializer>(time: &SystemTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    serializer.serialize_u64(secs)
}

pub struct BackupManager {
    target: PathBuf,
    config: Config,
}

impl BackupManager {
    pub fn new(config: &Config) -> Self {
        Self {
            target: config.target(),
            config: config.clone(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// List the artifacts directly under the target directory, newest
    /// first by modification time. Files without a recognized extension
    /// (and subdirectories) are silently skipped. Entries with identical
    /// modification times are ordered by filename.
    pub fn index(&self) -> Result<Vec<BackupFile>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.target)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let Some(extension) = compression::extension_of(&name) else {
                continue;
            };
            let Some(comp) = compression::compression_of(extension) else {
                continue;
            };

            files.push(BackupFile {
                filename: name,
                path: entry.path(),
                extension,
                compression: comp,
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(files)
    }

    /// Delete every artifact beyond the first `keep` of `index()`, i.e.
    /// the oldest excess entries. Returns the deleted entries in index
    /// order. Keeping at least the current count deletes nothing.
    pub fn rotate(&self, keep: i64) -> Result<Vec<BackupFile>> {
        if keep < 0 {
            return Err(BackupError::InvalidRetention(keep));
        }

        let files = self.index()?;
        if files.len() <= keep as usize {
            return Ok(Vec::new());
        }

        let mut deleted = Vec::new();
        for file in files.into_iter().skip(keep as usize) {
            self.remove(&file.path)?;
            info!("Rotated out backup {:?}", file.path);
            deleted.push(file);
        }
        Ok(deleted)
    }

    /// Delete one artifact given an absolute path or a bare filename.
    /// Deleting a file that is already gone is an explicit failure, never
    /// a silent success; callers rely on it to detect stale inventories.
    pub fn delete(&self, file_or_name: &str) -> Result<PathBuf> {
        let path = filename::absolute_path(Path::new(file_or_name), &self.target);
        self.remove(&path)?;
        Ok(path)
    }

    /// Delete every artifact in `index()`, returning the filenames in
    /// index order
    pub fn delete_all(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for file in self.index()? {
            self.remove(&file.path)?;
            deleted.push(file.filename);
        }
        Ok(deleted)
    }

    /// Send one artifact by email
    pub fn send(&self, file_or_name: &str, recipient: &str) -> Result<String> {
        let path = filename::absolute_path(Path::new(file_or_name), &self.target);
        if !path.is_file() {
            return Err(BackupError::FileNotReadable(path));
        }

        let mail = self
            .config
            .mail
            .clone()
            .ok_or_else(|| BackupError::InvalidSender(String::new()))?;
        Mailer::new(mail).send_backup(&path, recipient)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(BackupError::FileNotWritable(path.to_path_buf()));
        }
        fs::remove_file(path).map_err(|e| {
            warn!("Failed to remove {:?}: {}", path, e);
            BackupError::FileNotWritable(path.to_path_buf())
        })
    }
}
