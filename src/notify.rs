//! Outbound report delivery.
//!
//! The mail transport itself lives outside this crate. [`LogNotifier`] only
//! logs what would be sent; [`OutboxNotifier`] spools each message into a
//! directory that an external mailer drains.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An outgoing message.
#[derive(Debug, Clone)]
pub struct Message {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Capability to deliver a message to a list of recipients.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Message) -> Result<()>;
}

/// Logs deliveries instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &Message) -> Result<()> {
        let attachments: Vec<&str> = message
            .attachments
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        info!(
            recipients = %message.recipients.join(","),
            subject = %message.subject,
            ?attachments,
            "report delivery (log only)"
        );
        Ok(())
    }
}

/// Envelope written next to the attachments.
#[derive(Serialize)]
struct Envelope<'a> {
    recipients: &'a [String],
    subject: &'a str,
    body: &'a str,
    attachments: Vec<&'a str>,
}

/// Spools each message into its own directory under `dir`:
/// `message.json` plus one file per attachment.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, message: &Message) -> Result<()> {
        let name = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), Uuid::new_v4());
        let spool = self.dir.join(name);
        tokio::fs::create_dir_all(&spool)
            .await
            .map_err(|e| Error::Report(format!("cannot create outbox {}: {e}", spool.display())))?;

        for attachment in &message.attachments {
            let path = spool.join(&attachment.filename);
            tokio::fs::write(&path, &attachment.content)
                .await
                .map_err(|e| Error::Report(format!("cannot write {}: {e}", path.display())))?;
        }

        // Envelope last: a mailer that sees message.json can rely on the
        // attachments already being in place.
        let envelope = Envelope {
            recipients: &message.recipients,
            subject: &message.subject,
            body: &message.body,
            attachments: message
                .attachments
                .iter()
                .map(|a| a.filename.as_str())
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| Error::Report(format!("serialize envelope: {e}")))?;
        tokio::fs::write(spool.join("message.json"), json)
            .await
            .map_err(|e| Error::Report(format!("cannot write envelope: {e}")))?;

        info!(
            outbox = %spool.display(),
            recipients = %message.recipients.join(","),
            "report spooled"
        );
        Ok(())
    }
}
