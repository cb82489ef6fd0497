//! Recognized backup extensions and their compression types

use crate::error::BackupError;
use serde::Serialize;
use std::fmt;

/// Valid extensions (longest first, so suffix matching picks `sql.gz`
/// over `sql`) and the compression each one implies.
const VALID_EXTENSIONS: [(&str, Compression); 3] = [
    ("sql.bz2", Compression::Bzip2),
    ("sql.gz", Compression::Gzip),
    ("sql", Compression::None),
];

/// Compression applied to a dump stream. `None` is a recognized state,
/// distinct from an unrecognized extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Bzip2,
    Gzip,
    None,
}

impl Compression {
    /// Parse a compression name as given on the command line
    pub fn from_name(name: &str) -> Result<Self, BackupError> {
        match name {
            "bzip2" => Ok(Compression::Bzip2),
            "gzip" => Ok(Compression::Gzip),
            "none" => Ok(Compression::None),
            other => Err(BackupError::InvalidCompression(other.to_string())),
        }
    }

    /// The extension used when a filename is synthesized rather than
    /// explicitly supplied
    pub fn default_extension(&self) -> &'static str {
        match self {
            Compression::Bzip2 => "sql.bz2",
            Compression::Gzip => "sql.gz",
            Compression::None => "sql",
        }
    }

    /// Name of the external binary handling this compression, if any
    pub fn binary_name(&self) -> Option<&'static str> {
        match self {
            Compression::Bzip2 => Some("bzip2"),
            Compression::Gzip => Some("gzip"),
            Compression::None => None,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::Bzip2 => "bzip2",
            Compression::Gzip => "gzip",
            Compression::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// Returns the longest recognized extension suffix of a filename, or
/// `None` if the suffix is not in the table
pub fn extension_of(filename: &str) -> Option<&'static str> {
    VALID_EXTENSIONS
        .iter()
        .find(|(ext, _)| {
            filename.len() > ext.len() && filename.ends_with(ext) && {
                let boundary = filename.len() - ext.len() - 1;
                filename.as_bytes()[boundary] == b'.'
            }
        })
        .map(|(ext, _)| *ext)
}

/// Table lookup from a recognized extension to its compression
pub fn compression_of(extension: &str) -> Option<Compression> {
    VALID_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, compression)| *compression)
}
