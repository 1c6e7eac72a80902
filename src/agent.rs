use crate::cli::Args;
use crate::history::{
    format_history_for_prompt,
    initialize_history_store,
    ConversationId,
    ConversationStore,
    StoreError,
};
use crate::llm::LlmConfig;
use crate::llm::chat::{ new_client as new_chat_client, ChatClient, ModelError };
use crate::models::chat::{ ChatRequest, ChatResponse, LogQuery, LogResponse };

use chrono::Utc;
use log::{ debug, error, info };
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{ AtomicI64, Ordering };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Validation(String),

    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Speaker prefixes written in front of every stored turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnLabels {
    pub user: String,
    pub model: String,
}

impl Default for TurnLabels {
    fn default() -> Self {
        Self {
            user: "you".to_string(),
            model: "model".to_string(),
        }
    }
}

impl TurnLabels {
    pub fn user_turn(&self, text: &str) -> String {
        format!("{}: {}", self.user, text)
    }

    pub fn model_turn(&self, text: &str) -> String {
        format!("{}: {}", self.model, text)
    }
}

#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    history_store: Arc<dyn ConversationStore>,
    labels: TurnLabels,
    last_issued_id: Arc<AtomicI64>,
}

impl ChatAgent {
    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_config = LlmConfig::from_args(args)?;
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}, Timeout={:?}",
            chat_config.llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default"),
            chat_config.timeout
        );

        let history_store = initialize_history_store(args)?;
        let labels = TurnLabels {
            user: args.user_label.clone(),
            model: args.model_label.clone(),
        };

        Ok(Self::with_parts(chat_client, history_store, labels))
    }

    pub fn with_parts(
        chat_client: Arc<dyn ChatClient>,
        history_store: Arc<dyn ConversationStore>,
        labels: TurnLabels
    ) -> Self {
        Self {
            chat_client,
            history_store,
            labels,
            last_issued_id: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn history_store(&self) -> &Arc<dyn ConversationStore> {
        &self.history_store
    }

    /// Sends the prompt, with the conversation so far, to the model and
    /// records both sides of the exchange.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let prompt = match request.prompt {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(AgentError::Validation("prompt is required".to_string()));
            }
        };

        let conversation_id = match request.conversation_id {
            Some(id) => id,
            None => self.next_conversation_id().await?,
        };

        let history = self.history_store.get(conversation_id).await?.unwrap_or_default();
        let user_turn = self.labels.user_turn(&prompt);
        let full_prompt = format_history_for_prompt(&history, &user_turn);
        debug!(
            "Conversation {}: {} prior turns, prompt {} chars",
            conversation_id,
            history.len(),
            full_prompt.len()
        );

        let completion = self.chat_client.complete(&full_prompt).await.map_err(|e| {
            error!("Model call failed for conversation {}: {}", conversation_id, e);
            e
        })?;

        let model_turn = self.labels.model_turn(&completion.response);
        let turns = self.history_store
            .append(conversation_id, vec![user_turn, model_turn]).await
            .map_err(|e| {
                error!("Failed to record turns for conversation {}: {}", conversation_id, e);
                e
            })?;
        info!("Conversation {} now has {} turns", conversation_id, turns.len());

        Ok(ChatResponse {
            conversation_id,
            response: completion.response,
        })
    }

    /// Returns every recorded turn of one conversation.
    pub async fn log(&self, query: LogQuery) -> Result<LogResponse, AgentError> {
        let conversation_id = match query.conversation_id {
            Some(id) if id != 0 => id,
            _ => {
                return Err(AgentError::Validation("conversation_id is required".to_string()));
            }
        };

        let log = self.history_store
            .get(conversation_id).await?
            .ok_or(AgentError::NotFound(conversation_id))?;

        Ok(LogResponse { conversation_id, log })
    }

    /// Issues an id for a conversation the caller did not name.
    ///
    /// Ids start at the current Unix time in seconds and never repeat within
    /// this process; ids already present in the store are skipped.
    ///
    /// The store is consulted before the id is used, not under the guard
    /// that `append` takes. A caller who names the same id in that window
    /// shares the conversation with this request.
    pub async fn next_conversation_id(&self) -> Result<ConversationId, StoreError> {
        let existing = self.history_store.load().await?;
        loop {
            let now = Utc::now().timestamp();
            let previous = self.last_issued_id
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                    Some(now.max(last + 1))
                })
                .unwrap_or_else(|last| last);
            let candidate = now.max(previous + 1);
            if !existing.contains_key(&candidate) {
                return Ok(candidate);
            }
            debug!("Conversation id {} already in use, trying the next one", candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::llm::chat::CompletionResponse;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(ModelError::EmptyResponse);
            }
            Ok(CompletionResponse { response: format!("reply #{}", self.prompts.lock().unwrap().len()) })
        }

        fn get_model(&self) -> String {
            "recording".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent_with(client: Arc<RecordingClient>) -> ChatAgent {
        ChatAgent::with_parts(client, Arc::new(MemoryStore::new()), TurnLabels::default())
    }

    fn ask(id: Option<ConversationId>, prompt: &str) -> ChatRequest {
        ChatRequest { conversation_id: id, prompt: Some(prompt.to_string()) }
    }

    #[tokio::test]
    async fn second_turn_sends_history_to_model() {
        let client = Arc::new(RecordingClient::default());
        let agent = agent_with(client.clone());

        agent.chat(ask(Some(9), "hello")).await.unwrap();
        agent.chat(ask(Some(9), "again")).await.unwrap();

        let prompts = client.prompts.lock().unwrap().clone();
        assert_eq!(prompts[0], "\nyou: hello");
        assert_eq!(prompts[1], "you: hello\nmodel: reply #1\nyou: again");
    }

    #[tokio::test]
    async fn missing_or_empty_prompt_is_rejected_before_touching_store() {
        let client = Arc::new(RecordingClient::default());
        let agent = agent_with(client.clone());

        for prompt in [None, Some(String::new())] {
            let err = agent
                .chat(ChatRequest { conversation_id: Some(1), prompt }).await
                .unwrap_err();
            assert!(matches!(err, AgentError::Validation(_)));
        }
        assert!(client.prompts.lock().unwrap().is_empty());
        assert!(agent.history_store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_prompt_is_accepted_and_recorded() {
        let client = Arc::new(RecordingClient::default());
        let agent = agent_with(client.clone());

        let resp = agent.chat(ask(Some(1), "   ")).await.unwrap();
        assert_eq!(resp.conversation_id, 1);
        assert_eq!(client.prompts.lock().unwrap().as_slice(), ["\nyou:    "]);
        assert_eq!(
            agent.history_store().get(1).await.unwrap(),
            Some(vec!["you:    ".to_string(), "model: reply #1".to_string()])
        );
    }

    #[tokio::test]
    async fn model_failure_records_nothing() {
        let client = Arc::new(RecordingClient { fail: true, ..Default::default() });
        let agent = agent_with(client);

        let err = agent.chat(ask(Some(3), "hi")).await.unwrap_err();
        assert!(matches!(err, AgentError::Model(ModelError::EmptyResponse)));
        assert_eq!(agent.history_store().get(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn omitted_ids_are_unique_even_within_one_second() {
        let agent = agent_with(Arc::new(RecordingClient::default()));
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let resp = agent.chat(ask(None, "hi")).await.unwrap();
            assert!(seen.insert(resp.conversation_id));
        }
    }

    #[tokio::test]
    async fn allocated_ids_skip_stored_conversations() {
        let agent = agent_with(Arc::new(RecordingClient::default()));
        let now = Utc::now().timestamp();
        for id in now..now + 5 {
            agent.history_store().append(id, vec!["you: taken".into()]).await.unwrap();
        }
        let id = agent.next_conversation_id().await.unwrap();
        assert!(id >= now + 5);
    }

    #[tokio::test]
    async fn log_validates_and_reports_missing_conversations() {
        let agent = agent_with(Arc::new(RecordingClient::default()));

        let err = agent.log(LogQuery { conversation_id: None }).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        let err = agent.log(LogQuery { conversation_id: Some(0) }).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        let err = agent.log(LogQuery { conversation_id: Some(77) }).await.unwrap_err();
        assert!(matches!(err, AgentError::NotFound(77)));
    }

    #[tokio::test]
    async fn custom_labels_are_used_in_turns() {
        let labels = TurnLabels { user: "あなた".into(), model: "モデル".into() };
        let agent = ChatAgent::with_parts(
            Arc::new(RecordingClient::default()),
            Arc::new(MemoryStore::new()),
            labels
        );
        agent.chat(ask(Some(5), "こんにちは")).await.unwrap();
        let log = agent.log(LogQuery { conversation_id: Some(5) }).await.unwrap();
        assert_eq!(log.log, vec!["あなた: こんにちは", "モデル: reply #1"]);
    }
}
