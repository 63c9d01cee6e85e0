use anyhow::{Context, Result};
use chatdesk_session::{ChatId, Message};
use chrono::{Local, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Serialize)]
struct LogEntry<'a> {
    timestamp: String, // ISO-8601 UTC
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_error: bool,
}

/// Appends every message shown in the terminal to a JSONL file
pub struct TranscriptLogger {
    file_path: PathBuf,
    file: fs::File,
}

impl TranscriptLogger {
    /// Create a new logger in `logs_dir`; the file name is based on the current local time.
    pub async fn new(logs_dir: &Path) -> Result<Self> {
        fs::create_dir_all(logs_dir)
            .await
            .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

        let filename = format!("chatdesk-{}.jsonl", Local::now().format("%Y-%m-%d-%H%M%S"));
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await
            .with_context(|| format!("Failed to open transcript log {}", file_path.display()))?;

        log::debug!("Transcript log at {}", file_path.display());
        Ok(Self { file_path, file })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Append one message. Write failures are reported and otherwise ignored.
    pub async fn log(&mut self, chat_id: Option<&ChatId>, message: &Message) {
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            chat_id: chat_id.map(ChatId::as_str),
            role: message.role.as_str(),
            content: &message.text,
            is_error: message.is_error,
        };

        let mut line = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not serialize transcript entry: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.file.write_all(line.as_bytes()).await {
            log::warn!("Could not write transcript log: {}", e);
        }
    }

    /// Append the messages after the first `already_logged`; returns the new count.
    pub async fn log_since(
        &mut self,
        chat_id: Option<&ChatId>,
        messages: &[Message],
        already_logged: usize,
    ) -> usize {
        for message in messages.iter().skip(already_logged) {
            self.log(chat_id, message).await;
        }
        if let Err(e) = self.file.flush().await {
            log::warn!("Could not flush transcript log: {}", e);
        }
        messages.len()
    }
}
