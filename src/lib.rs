//! dbackup library
//!
//! Database backup lifecycle management: exporting artifacts from a live
//! connection through the native dump tool of each engine, importing
//! them back, inventorying the target directory, rotating old artifacts
//! and delivering them by email.

pub mod config;
pub mod drivers;
pub mod error;
pub mod managers;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, Connection};
pub use error::BackupError;
pub use managers::backup::{BackupFile, BackupManager};
pub use managers::export::BackupExport;
pub use managers::import::BackupImport;
pub use managers::logging::{init_console_logging, init_logging, LogGuard};
pub use utils::Compression;
