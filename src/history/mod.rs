mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

pub type ConversationId = i64;

/// Every conversation keyed by id, each an ordered list of formatted turns.
pub type ConversationLog = BTreeMap<ConversationId, Vec<String>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation log I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversation log {path} is not a valid conversation map: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize conversation log: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unsupported history store type: {0}")]
    UnsupportedType(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Reads the whole log. A store that has never been written is empty.
    async fn load(&self) -> Result<ConversationLog, StoreError>;

    /// Replaces the whole log.
    async fn save(&self, log: &ConversationLog) -> Result<(), StoreError>;

    /// Appends `turns` to a conversation, creating it if new, as one
    /// uninterrupted read-modify-write. Returns the conversation's turns.
    async fn append(
        &self,
        conversation_id: ConversationId,
        turns: Vec<String>
    ) -> Result<Vec<String>, StoreError>;

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.load().await?.remove(&conversation_id))
    }
}

pub fn create_history_store(args: &Args) -> Result<Arc<dyn ConversationStore>, StoreError> {
    match args.history_type.trim().to_lowercase().as_str() {
        "file" => Ok(Arc::new(JsonFileStore::new(&args.log_file))),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_history_store(args: &Args) -> Result<Arc<dyn ConversationStore>, StoreError> {
    if args.history_type.eq_ignore_ascii_case("file") {
        info!("Conversation log will be stored in file: {}", args.log_file);
    } else {
        info!("Conversation log will be stored in: {}", args.history_type);
    }
    create_history_store(args)
}

/// Joins prior turns and the new line into the text sent to the model.
///
/// The history block is always followed by a newline, so a fresh
/// conversation yields a prompt that starts with `\n`.
pub fn format_history_for_prompt(turns: &[String], next_line: &str) -> String {
    format!("{}\n{}", turns.join("\n"), next_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn prompt_joins_history_with_newlines() {
        let turns = vec!["you: hi".to_string(), "model: hello".to_string()];
        assert_eq!(
            format_history_for_prompt(&turns, "you: how are you?"),
            "you: hi\nmodel: hello\nyou: how are you?"
        );
    }

    #[test]
    fn prompt_for_new_conversation_starts_with_newline() {
        assert_eq!(format_history_for_prompt(&[], "you: hi"), "\nyou: hi");
    }

    #[test]
    fn factory_rejects_unknown_backends() {
        let args = Args::parse_from(["llama-chat-api", "--history-type", "redis"]);
        assert!(matches!(
            create_history_store(&args),
            Err(StoreError::UnsupportedType(t)) if t == "redis"
        ));
    }

    #[tokio::test]
    async fn factory_builds_memory_store() {
        let args = Args::parse_from(["llama-chat-api", "--history-type", "Memory"]);
        let store = create_history_store(&args).unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
