//! Filename pattern substitution and path resolution

use crate::config::Connection;
use crate::error::{BackupError, Result};
use crate::utils::compression::{self, Compression};
use std::path::{Path, PathBuf};

/// A fully resolved export target: absolute path plus the extension and
/// compression derived from it
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub extension: &'static str,
    pub compression: Compression,
}

/// Returns an absolute path: absolute inputs pass through, relative ones
/// are joined onto the target directory. No existence check.
pub fn absolute_path(path: &Path, target: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        target.join(path)
    }
}

/// Substitutes the four supported placeholders. Replacement is literal,
/// case-sensitive, order-independent and non-recursive.
pub fn apply_patterns(template: &str, connection: &Connection) -> String {
    let now = chrono::Local::now();
    let host = if connection.host.is_empty() {
        "localhost"
    } else {
        &connection.host
    };

    let replacements = [
        (
            "{$DATABASE}",
            database_basename(&connection.database).to_string(),
        ),
        ("{$DATETIME}", now.format("%Y%m%d%H%M%S").to_string()),
        ("{$HOSTNAME}", host.to_string()),
        ("{$TIMESTAMP}", now.timestamp().to_string()),
    ];

    // Single pass over the template; replaced text is never rescanned
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while !rest.is_empty() {
        for (pattern, value) in &replacements {
            if let Some(tail) = rest.strip_prefix(pattern) {
                out.push_str(value);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) => out.push(c),
            None => break,
        }
        rest = chars.as_str();
    }
    out
}

/// The database identifier stripped of any path and extension decoration.
/// For file-based engines the identifier is a file path.
pub fn database_basename(database: &str) -> &str {
    let basename = database
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(database);
    match basename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => basename,
    }
}

/// Resolve an export filename: apply patterns, make absolute, and verify
/// the parent directory is writable, the target does not already exist and
/// the extension is recognized. Fixes the compression for the operation.
pub fn resolve_export_target(
    raw: &str,
    connection: &Connection,
    target_dir: &Path,
) -> Result<ResolvedTarget> {
    let filename = apply_patterns(raw, connection);
    let path = absolute_path(Path::new(&filename), target_dir);

    let parent = path
        .parent()
        .ok_or_else(|| BackupError::InvalidDirectory(path.clone()))?;
    if !parent.is_dir() || !dir_is_writable(parent) {
        return Err(BackupError::InvalidDirectory(parent.to_path_buf()));
    }

    if path.exists() {
        return Err(BackupError::FileAlreadyExists(path));
    }

    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let extension = compression::extension_of(&name)
        .ok_or_else(|| BackupError::InvalidExtension(name.to_string()))?;
    // Lookup cannot miss: extension_of only returns table entries
    let compression = compression::compression_of(extension)
        .ok_or_else(|| BackupError::InvalidExtension(extension.to_string()))?;

    Ok(ResolvedTarget {
        path,
        extension,
        compression,
    })
}

/// Resolve an import source: make absolute, verify it is readable and its
/// extension is recognized
pub fn resolve_import_source(raw: &str, target_dir: &Path) -> Result<ResolvedTarget> {
    let path = absolute_path(Path::new(raw), target_dir);

    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let extension = compression::extension_of(&name)
        .ok_or_else(|| BackupError::InvalidExtension(name.to_string()))?;
    let compression = compression::compression_of(extension)
        .ok_or_else(|| BackupError::InvalidExtension(extension.to_string()))?;

    if !path.is_file() {
        return Err(BackupError::FileNotReadable(path));
    }

    Ok(ResolvedTarget {
        path,
        extension,
        compression,
    })
}

fn dir_is_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}
