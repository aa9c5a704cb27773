use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

use askgita_core::config::Settings;
use askgita_core::error::{Error, Result};
use askgita_core::traits::{AnswerGenerator, Embedder, TranscriptSink, VectorIndex};
use askgita_core::types::{Intent, MatchPolicy};
use askgita_core::ChunkStore;
use askgita_llm::ChatCompletionClient;

use crate::intent::{canned_reply, IntentClassifier};
use crate::prompt::PromptBuilder;
use crate::reply::Reply;
use crate::retriever::{Retriever, TOP_K};
use crate::transcript::{record_now, JsonlTranscript};

/// Everything loaded once at startup and only read afterwards: the embedding
/// model, the corpus index and the chunk texts it points into.
pub struct CorpusContext {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunks: Arc<ChunkStore>,
}

impl CorpusContext {
    /// Assemble a context from already-loaded parts.
    ///
    /// A width mismatch between embedder and index can never produce a useful
    /// query and is rejected here. A row-count mismatch is only logged; ids
    /// are bounds-checked per query.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, chunks: Arc<ChunkStore>) -> Result<Self> {
        if embedder.dim() != index.dim() {
            return Err(Error::DimensionMismatch { expected: index.dim(), actual: embedder.dim() });
        }
        if index.len() != chunks.len() {
            tracing::warn!(index_rows = index.len(), chunks = chunks.len(), "corpus index and chunk store differ in size");
        }
        Ok(Self { embedder, index, chunks })
    }

    pub async fn load(settings: &Settings) -> Result<Self> {
        let chunks = Arc::new(ChunkStore::load(&settings.chunks_path())?);
        let index = askgita_vector::open_index(settings).await?;
        let embedder = askgita_embed::embedder_from_settings(settings)?;

        match askgita_vector::read_meta(settings).await {
            Ok(meta) => {
                if let Some(built_with) = meta.embedder_id.as_deref().filter(|id| *id != embedder.id()) {
                    tracing::warn!(index = built_with, query = embedder.id(), "index was built with a different embedder; retrieval quality will suffer");
                }
                if let Some(fp) = meta.chunks_fingerprint.as_deref().filter(|fp| *fp != chunks.fingerprint()) {
                    tracing::warn!(index = fp, store = chunks.fingerprint(), "chunk store changed since the index was built");
                }
            }
            Err(e) => tracing::debug!(error = %e, "no index metadata available"),
        }

        Self::new(embedder, index, chunks)
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }
    pub fn index(&self) -> &Arc<dyn VectorIndex> { &self.index }
    pub fn chunks(&self) -> &Arc<ChunkStore> { &self.chunks }
}

/// The question-answering pipeline. Each call to [`AskGita::ask`] is an
/// independent exchange; nothing from earlier exchanges reaches the prompt.
pub struct AskGita {
    ctx: Arc<CorpusContext>,
    retriever: Retriever,
    classifier: IntentClassifier,
    prompt: PromptBuilder,
    generator: Arc<dyn AnswerGenerator>,
    transcript: Option<Arc<dyn TranscriptSink>>,
    pending_appends: Mutex<JoinSet<()>>,
}

impl AskGita {
    pub fn new(ctx: Arc<CorpusContext>, generator: Arc<dyn AnswerGenerator>) -> Self {
        let retriever = Retriever::new(ctx.index.clone(), ctx.chunks.clone());
        Self {
            ctx,
            retriever,
            classifier: IntentClassifier::default(),
            prompt: PromptBuilder::default(),
            generator,
            transcript: None,
            pending_appends: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_transcript(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.transcript = Some(sink);
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.classifier = IntentClassifier::new(policy);
        self
    }

    pub fn with_scripture(mut self, scripture: &str) -> Self {
        self.prompt = PromptBuilder::new(scripture);
        self
    }

    /// Wire the hosted model and transcript file named in the settings.
    pub fn from_settings(ctx: Arc<CorpusContext>, settings: &Settings) -> Result<Self> {
        let generator = Arc::new(ChatCompletionClient::from_settings(&settings.llm)?);
        let mut assistant = Self::new(ctx, generator)
            .with_match_policy(settings.intent.match_policy)
            .with_scripture(&settings.corpus.scripture);
        if settings.transcript.enabled {
            assistant = assistant.with_transcript(Arc::new(JsonlTranscript::new(&settings.transcript_path())));
        }
        Ok(assistant)
    }

    pub fn context(&self) -> &Arc<CorpusContext> { &self.ctx }

    pub fn classify(&self, question: &str) -> Intent { self.classifier.classify(question) }

    pub async fn ask(&self, question: &str) -> Result<Reply> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let intent = self.classifier.classify(question);
        if let Some(reply) = canned_reply(intent) {
            tracing::debug!(?intent, "short-circuited");
            return Ok(reply);
        }

        let answer = self.answer(question).await?;
        self.log_exchange(question, &answer);
        Ok(Reply::Answer { text: answer })
    }

    /// Embed, retrieve, prompt and generate, skipping intent detection.
    pub async fn answer(&self, question: &str) -> Result<String> {
        let query = self.ctx.embedder.embed(question)?;
        let chunks = self.retriever.retrieve(&query, TOP_K).await?;
        tracing::debug!(retrieved = chunks.len(), "retrieved context");
        let prompt = self.prompt.build(question, &chunks);
        let answer = self.generator.generate(&prompt).await?;
        tracing::info!(question_chars = question.len(), answer_chars = answer.len(), "answered question");
        Ok(answer)
    }

    /// Wait for transcript appends still in flight. Call before shutting the
    /// runtime down so the last exchange is not lost.
    pub async fn flush_transcript(&self) {
        let mut pending = match self.pending_appends.lock() {
            Ok(mut set) => std::mem::take(&mut *set),
            Err(_) => return,
        };
        while pending.join_next().await.is_some() {}
    }

    // The append runs on its own task so a slow sink never delays the reply.
    fn log_exchange(&self, question: &str, answer: &str) {
        let Some(sink) = self.transcript.clone() else { return };
        let record = record_now(question, answer);
        let Ok(mut pending) = self.pending_appends.lock() else {
            tracing::warn!("transcript queue poisoned; exchange not logged");
            return;
        };
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            if let Err(e) = sink.append(&record).await {
                tracing::warn!(error = %e, "transcript append failed; answer delivered anyway");
            }
        });
    }
}
