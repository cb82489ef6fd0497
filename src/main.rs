use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbackup::managers::backup::BackupManager;
use dbackup::managers::export::BackupExport;
use dbackup::managers::import::BackupImport;
use dbackup::utils::Compression;
use dbackup::{config, managers};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "dbackup")]
#[command(about = "Database backup lifecycle manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/dbackup/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a backup of a configured database connection
    Export {
        /// Connection to export (defaults to the configured default connection)
        #[arg(long)]
        connection: Option<String>,

        /// Filename or template for the backup artifact
        #[arg(short, long)]
        filename: Option<String>,

        /// Compression to use when no filename is given (bzip2, gzip, none)
        #[arg(short = 'c', long)]
        compression: Option<String>,

        /// After a successful export, keep only this many newest backups
        #[arg(short, long)]
        rotate: Option<i64>,

        /// Email the exported backup to this recipient
        #[arg(short, long)]
        send: Option<String>,
    },

    /// Import a backup artifact into a configured database connection
    Import {
        /// Connection to import into (defaults to the configured default connection)
        #[arg(long)]
        connection: Option<String>,

        /// Backup artifact to import
        #[arg(short, long)]
        filename: String,
    },

    /// List backup artifacts in the target directory
    Index {
        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all but the newest N backup artifacts
    Rotate {
        /// Number of backups to keep
        keep: i64,
    },

    /// Delete a backup artifact from the target directory
    Delete {
        /// Backup to delete (filename or absolute path)
        filename: Option<String>,

        /// Delete every backup in the target directory
        #[arg(long, conflicts_with = "filename")]
        all: bool,
    },

    /// Email a backup artifact to a recipient
    Send {
        /// Backup to send (filename or absolute path)
        filename: String,

        /// Recipient email address
        recipient: String,
    },

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = config::expand_tilde(&cli.config);

    // Validate uses plain console logging so errors stay readable even
    // when the log directory itself is misconfigured.
    if matches!(cli.command, Commands::Validate) {
        managers::logging::init_console_logging();
        return handle_validate(&config_path);
    }

    let config = config::load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // Setup logging with file rotation (must keep guard alive)
    let _log_guard = managers::logging::init_logging(&config.global)?;

    match cli.command {
        Commands::Export { connection, filename, compression, rotate, send } => {
            let conn = config
                .connection(connection.as_deref())
                .with_context(|| connection_error(connection.as_deref(), &config))?;

            let mut export = BackupExport::new(&config, conn)?;
            if let Some(ref raw) = filename {
                export.filename(raw)?;
            }
            if let Some(ref name) = compression {
                export.compression(Compression::from_name(name)?);
            }
            if let Some(keep) = rotate {
                export.rotate(keep);
            }
            export.send_to(send);

            let path = export.export()?;
            println!("✓ Exported backup to {}", path.display());
        }

        Commands::Import { connection, filename } => {
            let conn = config
                .connection(connection.as_deref())
                .with_context(|| connection_error(connection.as_deref(), &config))?;

            let mut import = BackupImport::new(&config, conn)?;
            import.filename(&filename)?;
            let path = import.import()?;
            println!("✓ Imported backup from {}", path.display());
        }

        Commands::Index { json } => {
            let manager = BackupManager::new(&config);
            let files = manager.index()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else if files.is_empty() {
                println!("No backups found in {}", manager.target().display());
            } else {
                println!("{} backup(s) in {}:\n", files.len(), manager.target().display());
                println!(
                    "{:<50} {:>12} {:>10} {:>20}",
                    "FILENAME", "SIZE", "COMPRESSION", "MODIFIED"
                );
                for file in &files {
                    println!(
                        "{:<50} {:>12} {:>10} {:>20}",
                        file.filename,
                        format_size(file.size),
                        file.compression.to_string(),
                        format_time(file.modified),
                    );
                }
            }
        }

        Commands::Rotate { keep } => {
            let manager = BackupManager::new(&config);
            let deleted = manager.rotate(keep)?;

            if deleted.is_empty() {
                println!("Nothing to rotate (keeping up to {} backups)", keep);
            } else {
                for file in &deleted {
                    println!("Deleted {}", file.filename);
                }
                println!("✓ Rotated {} backup(s)", deleted.len());
            }
        }

        Commands::Delete { filename, all } => {
            let manager = BackupManager::new(&config);

            if all {
                let deleted = manager.delete_all()?;
                if deleted.is_empty() {
                    println!("No backups to delete");
                } else {
                    for name in &deleted {
                        println!("Deleted {}", name);
                    }
                    println!("✓ Deleted {} backup(s)", deleted.len());
                }
            } else {
                let filename =
                    filename.context("specify a filename to delete, or pass --all")?;
                let path = manager.delete(&filename)?;
                println!("✓ Deleted {}", path.display());
            }
        }

        Commands::Send { filename, recipient } => {
            let manager = BackupManager::new(&config);
            let subject = manager.send(&filename, &recipient)?;
            println!("✓ Sent \"{}\" to {}", subject, recipient);
        }

        Commands::Validate => unreachable!("handled before config load"),
    }

    Ok(())
}

fn handle_validate(config_path: &PathBuf) -> Result<()> {
    println!("Validating configuration: {}\n", config_path.display());

    match config::load_config(config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Target directory: {}", config.target().display());
            println!("  Default connection: {}", config.global.connection);
            println!("  Connections: {}", config.connections.len());
            for (name, conn) in &config.connections {
                println!("    {} ({}, database {})", name, conn.engine, conn.database);
            }
            if config.mail.is_some() {
                println!("  Mail delivery: configured");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration is invalid:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

fn connection_error(name: Option<&str>, config: &config::Config) -> String {
    match name {
        Some(name) => format!("connection '{}' not found in configuration", name),
        None => format!(
            "default connection '{}' not found in configuration",
            config.global.connection
        ),
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn format_time(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}
