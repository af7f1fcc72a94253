use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::message::Message;

/// On-disk shape of a saved conversation
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    messages: Vec<Message>,
    timestamp: DateTime<Utc>,
}

/// The ordered message list of one conversation, backed by a JSON file
#[derive(Debug, Clone)]
pub struct ConversationStore {
    path: PathBuf,
    messages: Vec<Message>,
}

impl ConversationStore {
    /// An empty store that will save to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            messages: Vec::new(),
        }
    }

    /// Load a saved conversation. A missing or unreadable file starts a fresh one.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);

        match fs::read_to_string(&store.path) {
            Ok(data) => match serde_json::from_str::<HistoryFile>(&data) {
                Ok(history) => store.messages = history.messages,
                Err(e) => warn!(
                    path = %store.path.display(),
                    error = %e,
                    "ignoring malformed conversation history"
                ),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %store.path.display(),
                error = %e,
                "could not read conversation history"
            ),
        }

        store
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Put a message ahead of everything already stored
    pub fn prepend(&mut self, message: Message) {
        self.messages.insert(0, message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole conversation, replacing the previous file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let history = HistoryFile {
            messages: self.messages.clone(),
            timestamp: Utc::now(),
        };
        let data = serde_json::to_string_pretty(&history)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to save history to {}", self.path.display()))?;
        Ok(())
    }

    /// Forget every message and remove the saved file
    pub fn clear(&mut self) -> Result<()> {
        self.messages.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}
