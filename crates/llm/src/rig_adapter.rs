use std::sync::Arc;

use futures::StreamExt;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::prelude::CompletionClient;
use rig::providers::gemini;
use rig::streaming::StreamedAssistantContent;
use snafu::{ResultExt, ensure};
use tokio::sync::Mutex;

use super::model::DEFAULT_GEMINI_MODEL;
use super::provider::{
    BoxFuture, ChatSession, CompletionsFailedSnafu, EmptyPromptSnafu, EmptyResponseSnafu,
    HttpClientSnafu, LlmProvider, MissingApiKeySnafu, ProviderConfig, ProviderMessage,
    ProviderResult, Role, SessionConfig,
};

pub const RIG_GEMINI_PROVIDER_ID: &str = "gemini";

pub struct RigProviderAdapter {
    config: ProviderConfig,
}

impl RigProviderAdapter {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "rig-adapter-new",
                provider_id: config.provider_id.clone(),
            }
        );

        Ok(Self { config })
    }

    fn build_client(config: &ProviderConfig) -> ProviderResult<gemini::Client> {
        let mut builder = gemini::Client::builder().api_key(config.api_key.as_str());
        if !config.base_url.is_empty() {
            builder = builder.base_url(config.base_url.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-client",
        })
    }
}

impl LlmProvider for RigProviderAdapter {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    fn name(&self) -> &str {
        "Rig Gemini"
    }

    fn default_model(&self) -> &str {
        DEFAULT_GEMINI_MODEL
    }

    fn open_session(&self, config: SessionConfig) -> ProviderResult<Arc<dyn ChatSession>> {
        let client = Self::build_client(&self.config)?;

        tracing::info!(
            provider_id = %self.config.provider_id,
            model_id = %config.model_id,
            has_preamble = config.preamble.is_some(),
            "opened completion session"
        );

        Ok(Arc::new(RigChatSession {
            client,
            config,
            history: Mutex::new(Vec::new()),
        }))
    }
}

/// Gemini-backed session that replays its own memory on every call.
pub struct RigChatSession {
    client: gemini::Client,
    config: SessionConfig,
    history: Mutex<Vec<ProviderMessage>>,
}

impl RigChatSession {
    fn to_rig_message(message: &ProviderMessage) -> RigMessage {
        match message.role {
            Role::User => RigMessage::user(message.content.clone()),
            Role::Assistant => RigMessage::assistant(message.content.clone()),
        }
    }

    fn prior_turns(history: &[ProviderMessage]) -> Vec<RigMessage> {
        history.iter().map(Self::to_rig_message).collect()
    }

    /// Appends one exchange to memory; blank replies leave memory untouched.
    fn record_exchange(
        history: &mut Vec<ProviderMessage>,
        model_id: &str,
        prompt: &str,
        reply: String,
    ) -> ProviderResult<String> {
        ensure!(
            !reply.trim().is_empty(),
            EmptyResponseSnafu {
                stage: "collect-stream",
                model_id: model_id.to_string(),
            }
        );

        history.push(ProviderMessage::user(prompt));
        history.push(ProviderMessage::assistant(reply.clone()));
        Ok(reply)
    }

    fn text_delta<R>(item: StreamedAssistantContent<R>) -> Option<String>
    where
        R: Clone + Unpin,
    {
        match item {
            StreamedAssistantContent::Text(text) => Some(text.text),
            // Reasoning and tool chunks never reach the transcript.
            _ => None,
        }
    }

    async fn complete(&self, text: &str) -> ProviderResult<String> {
        ensure!(
            !text.trim().is_empty(),
            EmptyPromptSnafu {
                stage: "session-send",
            }
        );

        // Held for the whole exchange so memory only grows in request order.
        let mut history = self.history.lock().await;

        let model = self.client.completion_model(self.config.model_id.clone());
        let prior_turns = Self::prior_turns(&history);
        let mut builder = model
            .completion_request(RigMessage::user(text.to_string()))
            .messages(prior_turns);

        if let Some(preamble) = &self.config.preamble
            && !preamble.trim().is_empty()
        {
            builder = builder.preamble(preamble.clone());
        }

        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        if let Some(max_tokens) = self.config.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let mut stream = builder.stream().await.context(CompletionsFailedSnafu {
            stage: "open-stream",
        })?;

        let mut reply = String::new();
        while let Some(item) = stream.next().await {
            let item = item.context(CompletionsFailedSnafu {
                stage: "stream-chunk",
            })?;
            if let Some(delta) = Self::text_delta(item) {
                reply.push_str(&delta);
            }
        }

        tracing::debug!(
            model_id = %self.config.model_id,
            history_len = history.len(),
            reply_len = reply.len(),
            "completion finished"
        );

        Self::record_exchange(&mut history, &self.config.model_id, text, reply)
    }
}

impl ChatSession for RigChatSession {
    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn history_len<'a>(&'a self) -> BoxFuture<'a, usize> {
        Box::pin(async move { self.history.lock().await.len() })
    }

    fn send_message<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(self.complete(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderError;

    #[test]
    fn adapter_requires_api_key() {
        let result = RigProviderAdapter::new(ProviderConfig::new("gemini", "   ", ""));
        assert!(matches!(
            result,
            Err(ProviderError::MissingApiKey { provider_id, .. }) if provider_id == "gemini"
        ));
    }

    #[test]
    fn adapter_reports_gemini_defaults() {
        let adapter = RigProviderAdapter::new(ProviderConfig::new("gemini", "key", ""))
            .expect("adapter with key");
        assert_eq!(adapter.id(), "gemini");
        assert_eq!(adapter.default_model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn provider_messages_map_to_rig_roles() {
        let user = RigChatSession::to_rig_message(&ProviderMessage::user("hi"));
        let assistant = RigChatSession::to_rig_message(&ProviderMessage::assistant("hello"));
        assert!(matches!(user, RigMessage::User { .. }));
        assert!(matches!(assistant, RigMessage::Assistant { .. }));
    }

    #[test]
    fn prior_turns_replay_in_conversation_order() {
        let history = vec![
            ProviderMessage::user("残業はありますか？"),
            ProviderMessage::assistant("ほとんどありません"),
            ProviderMessage::user("お給料は？"),
        ];

        let turns = RigChatSession::prior_turns(&history);

        assert_eq!(turns.len(), 3);
        assert!(matches!(turns[0], RigMessage::User { .. }));
        assert!(matches!(turns[1], RigMessage::Assistant { .. }));
        assert!(matches!(turns[2], RigMessage::User { .. }));
        assert!(RigChatSession::prior_turns(&[]).is_empty());
    }

    #[test]
    fn successful_exchange_grows_memory_by_one_turn_pair() {
        let mut history = vec![
            ProviderMessage::user("first"),
            ProviderMessage::assistant("first reply"),
        ];

        let reply = RigChatSession::record_exchange(
            &mut history,
            DEFAULT_GEMINI_MODEL,
            "second",
            "second reply".to_string(),
        )
        .expect("non-blank reply");

        assert_eq!(reply, "second reply");
        assert_eq!(
            history,
            vec![
                ProviderMessage::user("first"),
                ProviderMessage::assistant("first reply"),
                ProviderMessage::user("second"),
                ProviderMessage::assistant("second reply"),
            ]
        );
    }

    #[test]
    fn blank_reply_is_rejected_without_touching_memory() {
        let mut history = vec![
            ProviderMessage::user("first"),
            ProviderMessage::assistant("first reply"),
        ];
        let before = history.clone();

        let result = RigChatSession::record_exchange(
            &mut history,
            DEFAULT_GEMINI_MODEL,
            "second",
            " \n\t".to_string(),
        );

        assert!(matches!(
            result,
            Err(ProviderError::EmptyResponse { model_id, .. }) if model_id == DEFAULT_GEMINI_MODEL
        ));
        assert_eq!(history, before);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_any_request() {
        let adapter = RigProviderAdapter::new(ProviderConfig::new("gemini", "key", ""))
            .expect("adapter with key");
        let session = adapter
            .open_session(SessionConfig::new(DEFAULT_GEMINI_MODEL))
            .expect("session");

        let result = session.send_message("   ").await;

        assert!(matches!(result, Err(ProviderError::EmptyPrompt { .. })));
        assert_eq!(session.history_len().await, 0);
    }
}
