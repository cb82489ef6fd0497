//! Error taxonomy for backup operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Directory {0:?} does not exist or is not writable")]
    InvalidDirectory(PathBuf),

    #[error("File {0:?} already exists")]
    FileAlreadyExists(PathBuf),

    #[error("Filename '{0}' has no valid extension (sql, sql.gz, sql.bz2)")]
    InvalidExtension(String),

    #[error("Invalid compression '{0}' (expected bzip2, gzip or none)")]
    InvalidCompression(String),

    #[error("No filename has been set")]
    MissingFilename,

    #[error("File {0:?} does not exist or is not readable")]
    FileNotReadable(PathBuf),

    #[error("File {0:?} does not exist or is not writable")]
    FileNotWritable(PathBuf),

    #[error("No driver for engine '{0}'")]
    UnsupportedDriver(String),

    #[error("Binary '{0}' not configured and not found on PATH")]
    MissingBinary(String),

    #[error("External tool exited with code {0}")]
    ProcessFailed(i32),

    #[error("Invalid retention count {0}: must be zero or positive")]
    InvalidRetention(i64),

    #[error("Invalid or missing sender address '{0}'")]
    InvalidSender(String),

    #[error("Invalid recipient address '{0}'")]
    InvalidRecipient(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;
