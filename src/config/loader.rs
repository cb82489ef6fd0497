use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file.
///
/// Unset binary paths are discovered from PATH, and the target directory
/// is created once; a target that cannot be created or written is fatal to
/// the whole subsystem.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&contents)?;
    config.binaries.discover();
    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    let target = super::expand_tilde(&config.global.target);

    // Create the target directory once; failure is fatal
    fs::create_dir_all(&target).map_err(|e| {
        ConfigError::ValidationError(format!(
            "Cannot create target directory {:?}: {}",
            target, e
        ))
    })?;

    if !is_writable(&target) {
        return Err(ConfigError::ValidationError(format!(
            "Target directory {:?} is not writable",
            target
        )));
    }

    // The default connection must exist
    if !config.connections.contains_key(&config.global.connection) {
        return Err(ConfigError::ConnectionNotFound(
            config.global.connection.clone(),
        ));
    }

    // Connections need at least an engine and a database
    for (name, connection) in &config.connections {
        if connection.engine.is_empty() || connection.database.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Connection '{}': engine and database are required",
                name
            )));
        }
    }

    // The chmod value must parse as an octal mode
    if u32::from_str_radix(config.global.chmod.trim_start_matches("0o"), 8).is_err() {
        return Err(ConfigError::ValidationError(format!(
            "Invalid chmod value: {}",
            config.global.chmod
        )));
    }

    // The file mail transport needs a directory to write into
    if let Some(ref mail) = config.mail {
        if mail.transport == MailTransportKind::File && mail.file_directory.is_none() {
            return Err(ConfigError::ValidationError(
                "Mail transport 'file' requires mail.file_directory".to_string(),
            ));
        }
    }

    Ok(())
}

/// Probe a directory for writability by creating a scratch file in it
fn is_writable(dir: &Path) -> bool {
    tempfile::tempfile_in(dir).is_ok()
}
