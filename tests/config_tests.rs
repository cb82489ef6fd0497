// Integration tests for configuration loading and validation

use std::fs;
use tempfile::TempDir;

fn write_config(temp_dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, contents).unwrap();
    config_path
}

#[test]
fn test_load_full_config() {
    let temp_dir = TempDir::new().unwrap();

    let config_content = format!(
        r#"
[global]
target = "{target}"
connection = "production"
chmod = "0600"
redirect_stderr = false
log_directory = "{logs}"
log_level = "debug"
log_max_files = 5

[binaries]
mysqldump = "/opt/mysql/bin/mysqldump"

[mail]
sender = "backups@example.com"
host_name = "db01"
transport = "file"
file_directory = "{mail}"

[connections.production]
engine = "mysql"
host = "db.internal"
database = "app"
username = "backup"
password = "secret"

[connections.reports]
engine = "postgres"
host = "pg.internal"
database = "reports"
username = "backup"
"#,
        target = temp_dir.path().join("backups").display(),
        logs = temp_dir.path().join("logs").display(),
        mail = temp_dir.path().display(),
    );

    let config_path = write_config(&temp_dir, &config_content);
    let config = dbackup::config::load_config(&config_path).unwrap();

    assert_eq!(config.global.connection, "production");
    assert_eq!(config.global.chmod, "0600");
    assert!(!config.global.redirect_stderr);
    assert_eq!(config.global.log_level, "debug");
    assert_eq!(config.global.log_max_files, 5);

    // Explicit binary paths are kept over PATH discovery
    assert_eq!(
        config.binaries.mysqldump.as_deref(),
        Some(std::path::Path::new("/opt/mysql/bin/mysqldump"))
    );

    let mail = config.mail.as_ref().unwrap();
    assert_eq!(mail.sender, "backups@example.com");
    assert_eq!(mail.host_name, "db01");

    assert_eq!(config.connections.len(), 2);
    let production = config.connection(None).unwrap();
    assert_eq!(production.engine, "mysql");
    assert_eq!(production.database, "app");
    let reports = config.connection(Some("reports")).unwrap();
    assert_eq!(reports.engine, "postgres");
    assert_eq!(reports.password, "");
}

#[test]
fn test_load_creates_target_directory() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("backups");

    let config_content = format!(
        r#"
[global]
target = "{}"

[connections.default]
engine = "sqlite"
database = "/var/lib/app/app.db"
"#,
        target.display()
    );

    let config_path = write_config(&temp_dir, &config_content);
    assert!(!target.exists());

    dbackup::config::load_config(&config_path).unwrap();
    assert!(target.is_dir());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = dbackup::config::load_config(temp_dir.path().join("missing.toml"));
    assert!(result.is_err());
}

#[test]
fn test_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(&temp_dir, "[global\ntarget = broken");

    let result = dbackup::config::load_config(&config_path);
    assert!(result.is_err());
}

#[test]
fn test_no_connections() {
    let temp_dir = TempDir::new().unwrap();
    let config_content = format!(
        r#"
[global]
target = "{}"
"#,
        temp_dir.path().join("backups").display()
    );

    let config_path = write_config(&temp_dir, &config_content);

    // The default connection "default" cannot exist without a
    // [connections] table
    let result = dbackup::config::load_config(&config_path);
    assert!(result.is_err());
}

#[test]
fn test_connection_missing_database() {
    let temp_dir = TempDir::new().unwrap();
    let config_content = format!(
        r#"
[global]
target = "{}"

[connections.default]
engine = "mysql"
database = ""
"#,
        temp_dir.path().join("backups").display()
    );

    let config_path = write_config(&temp_dir, &config_content);
    assert!(dbackup::config::load_config(&config_path).is_err());
}

#[test]
fn test_smtp_transport_needs_no_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config_content = format!(
        r#"
[global]
target = "{}"

[mail]
sender = "backups@example.com"
smtp_host = "relay.internal"
smtp_port = 2525

[connections.default]
engine = "mysql"
database = "app"
"#,
        temp_dir.path().join("backups").display()
    );

    let config_path = write_config(&temp_dir, &config_content);
    let config = dbackup::config::load_config(&config_path).unwrap();

    let mail = config.mail.unwrap();
    assert_eq!(mail.smtp_host, "relay.internal");
    assert_eq!(mail.smtp_port, 2525);
}
