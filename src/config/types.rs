use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub global: GlobalConfig,
    #[serde(default)]
    pub binaries: Binaries,
    #[serde(default)]
    pub mail: Option<MailConfig>,
    pub connections: HashMap<String, Connection>,
}

/// Global configuration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Directory holding all backup artifacts
    pub target: PathBuf,

    /// Name of the connection used when none is given on the command line
    #[serde(default = "default_connection")]
    pub connection: String,

    /// Octal mode applied to exported files (unix only)
    #[serde(default = "default_chmod")]
    pub chmod: String,

    /// Send the stderr of external tools to the null sink
    #[serde(default = "default_redirect_stderr")]
    pub redirect_stderr: bool,

    /// Logging configuration
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
}

/// Resolved filesystem paths of the external tools. Entries left unset are
/// discovered from PATH at load time; a tool still missing when an
/// operation needs it fails with `MissingBinary`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Binaries {
    #[serde(default)]
    pub mysql: Option<PathBuf>,
    #[serde(default)]
    pub mysqldump: Option<PathBuf>,
    #[serde(default)]
    pub pg_dump: Option<PathBuf>,
    #[serde(default)]
    pub pg_restore: Option<PathBuf>,
    #[serde(default)]
    pub sqlite3: Option<PathBuf>,
    #[serde(default)]
    pub bzip2: Option<PathBuf>,
    #[serde(default)]
    pub gzip: Option<PathBuf>,
}

pub(crate) const BINARY_NAMES: [&str; 7] = [
    "mysql",
    "mysqldump",
    "pg_dump",
    "pg_restore",
    "sqlite3",
    "bzip2",
    "gzip",
];

impl Binaries {
    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        match name {
            "mysql" => self.mysql.as_ref(),
            "mysqldump" => self.mysqldump.as_ref(),
            "pg_dump" => self.pg_dump.as_ref(),
            "pg_restore" => self.pg_restore.as_ref(),
            "sqlite3" => self.sqlite3.as_ref(),
            "bzip2" => self.bzip2.as_ref(),
            "gzip" => self.gzip.as_ref(),
            _ => None,
        }
    }

    pub fn set(&mut self, name: &str, path: PathBuf) {
        match name {
            "mysql" => self.mysql = Some(path),
            "mysqldump" => self.mysqldump = Some(path),
            "pg_dump" => self.pg_dump = Some(path),
            "pg_restore" => self.pg_restore = Some(path),
            "sqlite3" => self.sqlite3 = Some(path),
            "bzip2" => self.bzip2 = Some(path),
            "gzip" => self.gzip = Some(path),
            _ => {}
        }
    }

    /// Fill unset entries from PATH
    pub fn discover(&mut self) {
        for name in BINARY_NAMES {
            if self.get(name).is_none() {
                if let Ok(path) = which::which(name) {
                    self.set(name, path);
                }
            }
        }
    }
}

/// Mail delivery configuration, required only for `send`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// Sender address
    #[serde(default)]
    pub sender: String,

    /// Host name shown in the mail subject
    #[serde(default = "default_mail_host_name")]
    pub host_name: String,

    #[serde(default)]
    pub transport: MailTransportKind,

    /// SMTP relay settings
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Directory the file transport writes messages into
    #[serde(default)]
    pub file_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    #[default]
    Smtp,
    File,
}

/// Descriptor of one named database connection. Read-only to the core;
/// username and password may be empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Connection {
    /// Engine name, dispatched to a driver at runtime
    pub engine: String,

    #[serde(default)]
    pub host: String,

    /// Database name, or the database file path for file-based engines
    pub database: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

// Default value functions

fn default_connection() -> String {
    "default".to_string()
}
fn default_chmod() -> String {
    "0664".to_string()
}
fn default_redirect_stderr() -> bool {
    true
}
fn default_log_directory() -> PathBuf {
    PathBuf::from("~/logs")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_max_files() -> u32 {
    10
}
fn default_mail_host_name() -> String {
    "localhost".to_string()
}
fn default_smtp_host() -> String {
    "localhost".to_string()
}
fn default_smtp_port() -> u16 {
    25
}
