//! DocBot: one grounded reply per user message.
//!
//! # Flow
//!
//! 1. Filter: ignore the bot's own messages and echoes of its greeting
//! 2. Append the message to the thread's transcript (locally)
//! 3. Build context from the latest message and the full transcript
//! 4. Render the system prompt with that context
//! 5. Send `[system, ...history]` to the provider
//! 6. Commit the user message and the reply to the transcript cache
//!
//! Nothing is committed when any step fails, so a retried message does not
//! appear twice in the thread.

use std::sync::Arc;

use docbot_config::{AppConfig, MergeOrderConfig};
use docbot_core::error::{Error, Result};
use docbot_core::message::{Conversation, ConversationId, Message, Role};
use docbot_core::provider::{Provider, ProviderRequest, Usage};
use docbot_core::EmbeddingClient;
use docbot_retrieval::fusion::PackedPassage;
use docbot_retrieval::{ContextBudget, ContextFusion, CorpusStore, FusionQuery, MergeOrder};
use tracing::{debug, info};

use crate::prompt::{Persona, PromptTemplate};
use crate::transcript::TranscriptCache;

/// Context fusion configured from `[retrieval]` and `[corpus]`.
pub fn fusion_from_config(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingClient>,
    corpus: Arc<CorpusStore>,
) -> Result<ContextFusion> {
    let budget = ContextBudget::new(config.retrieval.context_budget).ok_or_else(|| Error::Config {
        message: "retrieval.context_budget must be greater than 0".into(),
    })?;
    let merge_order = match config.retrieval.merge_order {
        MergeOrderConfig::LatestMessageFirst => MergeOrder::LatestMessageFirst,
        MergeOrderConfig::TranscriptFirst => MergeOrder::TranscriptFirst,
    };

    Ok(ContextFusion::new(corpus, embedder)
        .with_budget(budget)
        .with_separator(config.retrieval.separator.clone())
        .with_merge_order(merge_order)
        .with_docs_origin(config.corpus.docs_origin.clone()))
}

/// The bot's answer to one message.
#[derive(Debug, Clone)]
pub struct BotReply {
    pub message: Message,
    /// Corpus passages the reply was grounded on.
    pub passages: Vec<PackedPassage>,
    pub usage: Option<Usage>,
}

pub struct DocBot {
    provider: Arc<dyn Provider>,
    fusion: ContextFusion,
    prompt: PromptTemplate,
    persona: Persona,
    transcripts: TranscriptCache,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl DocBot {
    pub fn new(
        provider: Arc<dyn Provider>,
        fusion: ContextFusion,
        prompt: PromptTemplate,
        persona: Persona,
        transcripts: TranscriptCache,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            fusion,
            prompt,
            persona,
            transcripts,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Wire a bot from configuration and already-built collaborators.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        embedder: Arc<dyn EmbeddingClient>,
        corpus: Arc<CorpusStore>,
    ) -> Result<Self> {
        let prompt = PromptTemplate::from_config(&config.bot)?;
        let fusion = fusion_from_config(config, embedder, corpus)?;

        Ok(Self::new(
            provider,
            fusion,
            prompt,
            Persona::from(&config.bot),
            TranscriptCache::from_config(&config.transcripts),
            config.default_model.clone(),
        )
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens))
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn fusion(&self) -> &ContextFusion {
        &self.fusion
    }

    pub fn transcripts(&self) -> &TranscriptCache {
        &self.transcripts
    }

    /// The bot answers everything except itself and its own greeting.
    pub fn should_respond(&self, message: &Message) -> bool {
        message.role != Role::Assistant && message.content != self.persona.first_message
    }

    /// Start (or restart) a thread by posting the greeting into it.
    pub fn start_thread(&self, thread_id: &str) -> Message {
        let greeting =
            Message::assistant(&self.persona.first_message).with_author(&self.persona.name);
        self.transcripts.remove(thread_id);
        self.transcripts.append(thread_id, [greeting.clone()]);
        info!(thread_id, "Thread started");
        greeting
    }

    /// The cached transcript for a thread.
    pub fn thread(&self, thread_id: &str) -> Option<Conversation> {
        self.transcripts.get(thread_id)
    }

    /// Answer `message` in `thread_id`. `Ok(None)` when the filter declines.
    pub async fn respond(&self, thread_id: &str, message: Message) -> Result<Option<BotReply>> {
        if !self.should_respond(&message) {
            debug!(thread_id, "Ignoring message");
            return Ok(None);
        }

        let mut conversation = self
            .transcripts
            .get(thread_id)
            .unwrap_or_else(|| Conversation::with_id(ConversationId::from(thread_id)));
        conversation.push(message.clone());

        let transcript = conversation.transcript();
        let packed = self
            .fusion
            .build(FusionQuery {
                latest: conversation.latest_plaintext(),
                transcript: &transcript,
            })
            .await?;

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(self.prompt.render(&packed.text)));
        messages.extend(conversation.messages.iter().cloned());

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        let reply = response.message.with_author(&self.persona.name);

        self.transcripts.append(thread_id, [message, reply.clone()]);

        info!(
            thread_id,
            model = %response.model,
            passages = packed.passages.len(),
            context_chars = packed.chars(),
            "Reply sent"
        );

        Ok(Some(BotReply {
            message: reply,
            passages: packed.passages,
            usage: response.usage,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, RecordingProvider, StaticEmbedder, corpus};
    use docbot_core::error::ProviderError;
    use std::num::NonZeroUsize;
    use std::time::Duration;

    const TEMPLATE: &str = "You are BOT_USER_NAME.\n---\nBOT_CONTEXT\n---";

    fn persona() -> Persona {
        Persona {
            name: "Docbot".into(),
            escape_word: "Stumped!".into(),
            first_message: "Hi! I'm Docbot.".into(),
        }
    }

    fn bot(provider: Arc<dyn Provider>, embedder: Arc<dyn EmbeddingClient>) -> DocBot {
        let fusion = ContextFusion::new(corpus(), embedder);
        let prompt = PromptTemplate::new(TEMPLATE, &persona()).unwrap();
        let transcripts =
            TranscriptCache::new(NonZeroUsize::new(8).unwrap(), Duration::from_secs(60));
        DocBot::new(provider, fusion, prompt, persona(), transcripts, "test-model")
    }

    #[test]
    fn filter_skips_bot_and_greeting() {
        let bot = bot(
            Arc::new(RecordingProvider::new("ok")),
            Arc::new(StaticEmbedder::new(vec![1.0, 0.0])),
        );
        assert!(bot.should_respond(&Message::user("How do I start?")));
        assert!(!bot.should_respond(&Message::assistant("anything")));
        assert!(!bot.should_respond(&Message::user("Hi! I'm Docbot.")));
    }

    #[tokio::test]
    async fn respond_sends_rendered_prompt_and_history() {
        let provider = Arc::new(RecordingProvider::new("Use threads."));
        let bot = bot(provider.clone(), Arc::new(StaticEmbedder::new(vec![1.0, 0.0])));

        bot.start_thread("t1");
        let reply = bot
            .respond("t1", Message::user("How do threads work?"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.message.content, "Use threads.");
        assert_eq!(reply.message.author.as_deref(), Some("Docbot"));
        assert!(!reply.passages.is_empty());

        let request = provider.last_request().unwrap();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.starts_with("You are Docbot."));
        assert!(request.messages[0].content.contains("Threads hold messages."));
        assert!(!request.messages[0].content.contains("BOT_CONTEXT"));
        assert_eq!(request.messages[1].content, "Hi! I'm Docbot.");
        assert_eq!(request.messages[2].content, "How do threads work?");
    }

    #[tokio::test]
    async fn respond_commits_turn_to_transcript() {
        let bot = bot(
            Arc::new(RecordingProvider::new("Answer")),
            Arc::new(StaticEmbedder::new(vec![1.0, 0.0])),
        );
        bot.respond("t2", Message::user("Question")).await.unwrap();

        let thread = bot.thread("t2").unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread.transcript(), "Question\n\nAnswer");
    }

    #[tokio::test]
    async fn declined_message_is_not_recorded() {
        let provider = Arc::new(RecordingProvider::new("never"));
        let bot = bot(provider.clone(), Arc::new(StaticEmbedder::new(vec![1.0, 0.0])));
        let reply = bot.respond("t3", Message::user("Hi! I'm Docbot.")).await.unwrap();
        assert!(reply.is_none());
        assert!(provider.last_request().is_none());
        assert!(bot.thread("t3").is_none());
    }

    #[tokio::test]
    async fn embedding_failure_aborts_turn() {
        let provider = Arc::new(RecordingProvider::new("never"));
        let bot = bot(provider.clone(), Arc::new(StaticEmbedder::failing()));
        let err = bot.respond("t4", Message::user("Question")).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(provider.last_request().is_none());
        assert!(bot.thread("t4").is_none());
    }

    #[tokio::test]
    async fn provider_failure_leaves_transcript_untouched() {
        let bot = bot(
            Arc::new(FailingProvider(ProviderError::Timeout("slow".into()))),
            Arc::new(StaticEmbedder::new(vec![1.0, 0.0])),
        );
        bot.start_thread("t5");
        let err = bot.respond("t5", Message::user("Question")).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Timeout(_))));
        assert_eq!(bot.thread("t5").unwrap().len(), 1);
    }

    #[test]
    fn from_config_uses_inline_prompt() {
        let mut config = AppConfig::default();
        config.bot.prompt_override = Some("BOT_USER_NAME knows BOT_CONTEXT".into());
        config.embedding.dimensions = 2;
        let bot = DocBot::from_config(
            &config,
            Arc::new(RecordingProvider::new("ok")),
            Arc::new(StaticEmbedder::new(vec![1.0, 0.0])),
            corpus(),
        )
        .unwrap();
        assert_eq!(bot.persona().name, config.bot.name);
        assert_eq!(bot.fusion().budget().max_chars(), config.retrieval.context_budget);
    }

    #[test]
    fn fusion_from_config_applies_retrieval_section() {
        let mut config = AppConfig::default();
        config.retrieval.merge_order = MergeOrderConfig::TranscriptFirst;
        config.retrieval.context_budget = 42;
        let fusion = fusion_from_config(
            &config,
            Arc::new(StaticEmbedder::new(vec![1.0, 0.0])),
            corpus(),
        )
        .unwrap();
        assert_eq!(fusion.budget().max_chars(), 42);
        assert_eq!(fusion.merge_order(), MergeOrder::TranscriptFirst);
        assert_eq!(fusion.corpus().len(), 2);
    }

    #[test]
    fn from_config_rejects_zero_budget() {
        let mut config = AppConfig::default();
        config.bot.prompt_override = Some("BOT_CONTEXT".into());
        config.retrieval.context_budget = 0;
        let result = DocBot::from_config(
            &config,
            Arc::new(RecordingProvider::new("ok")),
            Arc::new(StaticEmbedder::new(vec![1.0, 0.0])),
            corpus(),
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
