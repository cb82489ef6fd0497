//! Mail delivery for backup artifacts
//!
//! Builds a message with the artifact as a binary attachment and hands it
//! to the configured transport: a plain SMTP relay, or a file transport
//! that drops the rendered message into a directory (used by tests).

use crate::config::{MailConfig, MailTransportKind};
use crate::error::{BackupError, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox};
use lettre::{FileTransport, Message, SmtpTransport, Transport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct Mailer {
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Send an artifact to `recipient`. Returns the message subject on
    /// success; transport-level responses are logged, not returned.
    pub fn send_backup(&self, path: &Path, recipient: &str) -> Result<String> {
        let sender = self.parse_sender()?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|_| BackupError::InvalidRecipient(recipient.to_string()))?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let subject = format!(
            "Database backup {} from {}",
            filename, self.config.host_name
        );

        let body = fs::read(path).map_err(|_| BackupError::FileNotReadable(path.to_path_buf()))?;
        let content_type = ContentType::parse("application/octet-stream")
            .map_err(|e| BackupError::Mail(e.to_string()))?;
        let attachment = Attachment::new(filename).body(body, content_type);

        let message = Message::builder()
            .from(sender)
            .to(to)
            .subject(&subject)
            .singlepart(attachment)
            .map_err(|e| BackupError::Mail(e.to_string()))?;

        self.dispatch(&message)?;
        info!("Sent backup {:?} to {}", path, recipient);
        Ok(subject)
    }

    fn parse_sender(&self) -> Result<Mailbox> {
        if self.config.sender.is_empty() {
            return Err(BackupError::InvalidSender(self.config.sender.clone()));
        }
        self.config
            .sender
            .parse()
            .map_err(|_| BackupError::InvalidSender(self.config.sender.clone()))
    }

    fn dispatch(&self, message: &Message) -> Result<()> {
        match self.config.transport {
            MailTransportKind::Smtp => {
                let transport = SmtpTransport::builder_dangerous(&self.config.smtp_host)
                    .port(self.config.smtp_port)
                    .build();
                let response = transport
                    .send(message)
                    .map_err(|e| BackupError::Mail(e.to_string()))?;
                tracing::debug!("SMTP response: {:?}", response);
            }
            MailTransportKind::File => {
                let directory: &PathBuf = self
                    .config
                    .file_directory
                    .as_ref()
                    .ok_or_else(|| BackupError::Mail("file transport has no directory".into()))?;
                let transport = FileTransport::new(directory);
                transport
                    .send(message)
                    .map_err(|e| BackupError::Mail(e.to_string()))?;
            }
        }
        Ok(())
    }
}
