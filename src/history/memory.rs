use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ ConversationId, ConversationLog, ConversationStore, StoreError };

/// Process-local store; everything is lost on shutdown.
#[derive(Default)]
pub struct MemoryStore {
    log: Mutex<ConversationLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load(&self) -> Result<ConversationLog, StoreError> {
        Ok(self.log.lock().await.clone())
    }

    async fn save(&self, log: &ConversationLog) -> Result<(), StoreError> {
        *self.log.lock().await = log.clone();
        Ok(())
    }

    async fn append(
        &self,
        conversation_id: ConversationId,
        turns: Vec<String>
    ) -> Result<Vec<String>, StoreError> {
        let mut log = self.log.lock().await;
        let entry = log.entry(conversation_id).or_default();
        entry.extend(turns);
        Ok(entry.clone())
    }

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.log.lock().await.get(&conversation_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_replaces_and_append_extends() {
        let store = MemoryStore::new();
        let mut log = ConversationLog::new();
        log.insert(1, vec!["you: x".into()]);
        store.save(&log).await.unwrap();
        assert_eq!(store.load().await.unwrap(), log);

        let turns = store.append(1, vec!["model: y".into()]).await.unwrap();
        assert_eq!(turns, vec!["you: x", "model: y"]);
        assert_eq!(store.get(2).await.unwrap(), None);
    }
}
