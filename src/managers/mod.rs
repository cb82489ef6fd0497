pub mod backup;
pub mod export;
pub mod import;
pub mod logging;
pub mod mailer;

pub use backup::{BackupFile, BackupManager};
pub use export::BackupExport;
pub use import::BackupImport;
pub use mailer::Mailer;
