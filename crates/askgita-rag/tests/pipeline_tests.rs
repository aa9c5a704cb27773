use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use askgita_core::error::{Error, Result};
use askgita_core::traits::{AnswerGenerator, Embedder, TranscriptSink, VectorIndex};
use askgita_core::types::{ExchangeRecord, Intent, Neighbor};
use askgita_core::ChunkStore;
use askgita_embed::HashEmbedder;
use askgita_rag::intent::SAMPLE_QUESTIONS;
use askgita_rag::{AskGita, CorpusContext, MemoryTranscript, Reply, Retriever, Session, Speaker, TOP_K};
use askgita_vector::FlatIndex;

const DIM: usize = 16;

struct CountingEmbedder { inner: HashEmbedder, calls: AtomicUsize }

impl Embedder for CountingEmbedder {
    fn id(&self) -> &str { self.inner.id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

/// Always answers with the same ids, whatever the query.
struct FixedIndex { ids: Vec<usize>, len: usize, calls: AtomicUsize }

#[async_trait]
impl VectorIndex for FixedIndex {
    fn dim(&self) -> usize { DIM }
    fn len(&self) -> usize { self.len }
    async fn search(&self, _query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ids.iter().take(k).enumerate().map(|(i, &id)| Neighbor { id, distance: i as f32 }).collect())
    }
}

/// Returns the prompt it was given, or fails when the prompt mentions "fail".
struct EchoGenerator { calls: AtomicUsize }

#[async_trait]
impl AnswerGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("fail") { return Err(Error::UpstreamRateLimited("429".into())); }
        Ok(prompt.to_string())
    }
}

struct BrokenSink;

#[async_trait]
impl TranscriptSink for BrokenSink {
    async fn append(&self, _record: &ExchangeRecord) -> Result<()> {
        Err(Error::LogAppendFailed("sheet unavailable".into()))
    }
}

/// Never finishes an append.
struct StalledSink;

#[async_trait]
impl TranscriptSink for StalledSink {
    async fn append(&self, _record: &ExchangeRecord) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

struct Harness {
    embedder: Arc<CountingEmbedder>,
    index: Arc<FixedIndex>,
    generator: Arc<EchoGenerator>,
    assistant: AskGita,
}

fn harness(ids: Vec<usize>, chunks: &[&str]) -> Harness {
    let embedder = Arc::new(CountingEmbedder { inner: HashEmbedder::new(DIM), calls: AtomicUsize::new(0) });
    let index = Arc::new(FixedIndex { ids, len: chunks.len(), calls: AtomicUsize::new(0) });
    let generator = Arc::new(EchoGenerator { calls: AtomicUsize::new(0) });
    let store = Arc::new(ChunkStore::from_chunks(chunks.iter().map(|c| c.to_string()).collect()));
    let ctx = CorpusContext::new(embedder.clone(), index.clone(), store).expect("context");
    let assistant = AskGita::new(Arc::new(ctx), generator.clone());
    Harness { embedder, index, generator, assistant }
}

fn abcd() -> Harness { harness(vec![0, 1, 2, 3], &["A", "B", "C", "D"]) }

impl Harness {
    fn calls(&self) -> (usize, usize, usize) {
        (
            self.embedder.calls.load(Ordering::SeqCst),
            self.index.calls.load(Ordering::SeqCst),
            self.generator.calls.load(Ordering::SeqCst),
        )
    }
}

#[tokio::test]
async fn greeting_short_circuits_with_suggestions() {
    let h = abcd();
    let reply = h.assistant.ask("hello").await.unwrap();
    assert_eq!(reply.intent(), Intent::Greeting);
    let text = reply.render();
    assert!(text.starts_with("Namaste"), "{text}");
    for q in SAMPLE_QUESTIONS { assert!(text.contains(q), "missing sample question {q}"); }
    match &reply {
        Reply::Canned { suggestions, .. } => assert_eq!(suggestions.len(), 4),
        other => panic!("expected canned reply, got {other:?}"),
    }
    assert_eq!(h.calls(), (0, 0, 0), "no embed, retrieve or generate call");
}

#[tokio::test]
async fn thanks_short_circuits_with_suggestions() {
    let h = abcd();
    let reply = h.assistant.ask("Thank you 🙏").await.unwrap();
    assert_eq!(reply.intent(), Intent::Thanks);
    for q in SAMPLE_QUESTIONS { assert!(reply.render().contains(q)); }
    assert_eq!(h.calls(), (0, 0, 0));
}

#[tokio::test]
async fn question_prompt_carries_question_and_chunks_in_order() {
    let h = abcd();
    let question = "How to control the mind?";
    let reply = h.assistant.ask(question).await.unwrap();
    let answer = match reply { Reply::Answer { text } => text, other => panic!("expected answer, got {other:?}") };

    assert!(answer.contains(question));
    let context = answer.find("A\nB\nC\nD").expect("chunks newline-joined in retrieval order");
    assert!(context < answer.find(question).unwrap(), "context precedes the question");
    assert_eq!(h.calls(), (1, 1, 1));
}

#[tokio::test]
async fn transcript_failure_does_not_change_the_answer() {
    let plain = abcd();
    let expected = plain.assistant.ask("What is Karma Yoga?").await.unwrap();

    let h = abcd();
    let assistant = h.assistant.with_transcript(Arc::new(BrokenSink));
    let got = assistant.ask("What is Karma Yoga?").await.expect("answer despite log failure");
    assert_eq!(got, expected);
}

#[tokio::test]
async fn stalled_transcript_does_not_delay_the_answer() {
    let h = abcd();
    let assistant = h.assistant.with_transcript(Arc::new(StalledSink));
    let reply = tokio::time::timeout(Duration::from_secs(5), assistant.ask("What is Karma Yoga?"))
        .await
        .expect("answer returned while the append is still pending")
        .unwrap();
    assert!(reply.render().contains("What is Karma Yoga?"));
}

#[tokio::test]
async fn answered_questions_are_mirrored_to_the_transcript() {
    let h = abcd();
    let sink = Arc::new(MemoryTranscript::new());
    let assistant = h.assistant.with_transcript(sink.clone());

    assistant.ask("hi").await.unwrap();
    let reply = assistant.ask("What is Karma Yoga?").await.unwrap();
    assistant.flush_transcript().await;

    let records = sink.records();
    assert_eq!(records.len(), 1, "only question exchanges are logged");
    assert_eq!(records[0].question, "What is Karma Yoga?");
    assert_eq!(records[0].answer, reply.render());
}

#[tokio::test]
async fn out_of_range_id_is_corrupt_index() {
    let h = harness(vec![0, 7], &["A", "B"]);
    let err = h.assistant.ask("What is dharma?").await.unwrap_err();
    assert!(matches!(err, Error::CorruptIndex { id: 7, len: 2 }), "got {err:?}");
    assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0, "no partial answer is generated");
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let h = abcd();
    assert!(matches!(h.assistant.ask("   ").await, Err(Error::EmptyQuestion)));
    assert_eq!(h.calls(), (0, 0, 0));
}

#[tokio::test]
async fn failed_exchange_does_not_block_the_next() {
    let h = abcd();
    let mut session = Session::new(Arc::new(h.assistant));

    let err = session.ask("Why do plans fail?").await.unwrap_err();
    assert!(matches!(err, Error::UpstreamRateLimited(_)));
    let ok = session.ask("What is Karma Yoga?").await.unwrap();
    assert!(ok.render().contains("What is Karma Yoga?"));

    let speakers: Vec<Speaker> = session.turns().iter().map(|t| t.speaker).collect();
    assert_eq!(speakers, vec![Speaker::You, Speaker::System, Speaker::You, Speaker::GitaAi]);
    assert!(!session.turns()[3].message.contains("Why do plans fail?"), "no carry-over between exchanges");
}

#[tokio::test]
async fn mismatched_embedder_and_index_width_is_rejected() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM + 1));
    let index: Arc<dyn VectorIndex> = Arc::new(FixedIndex { ids: vec![], len: 0, calls: AtomicUsize::new(0) });
    let store = Arc::new(ChunkStore::from_chunks(vec![]));
    let err = CorpusContext::new(embedder, index, store).err().expect("width mismatch");
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

fn flat_retriever(texts: &[&str]) -> (Retriever, HashEmbedder, usize) {
    let embedder = HashEmbedder::new(DIM);
    let vectors = texts.iter().map(|t| embedder.embed(t).unwrap()).collect();
    let index = Arc::new(FlatIndex::from_vectors(DIM, vectors).unwrap());
    let store = Arc::new(ChunkStore::from_chunks(texts.iter().map(|t| t.to_string()).collect()));
    (Retriever::new(index, store), embedder, texts.len())
}

#[tokio::test]
async fn retrieve_returns_k_or_the_whole_small_corpus() {
    let (big, embedder, _) = flat_retriever(&["a mind", "b duty", "c soul", "d peace", "e sacrifice", "f fear"]);
    let q = embedder.embed("the restless mind").unwrap();
    assert_eq!(big.retrieve(&q, TOP_K).await.unwrap().len(), 4);

    let (small, embedder, _) = flat_retriever(&["a mind", "b duty", "c soul"]);
    let q = embedder.embed("the restless mind").unwrap();
    assert_eq!(small.retrieve(&q, TOP_K).await.unwrap().len(), 3);
}

#[tokio::test]
async fn retrieved_ids_always_resolve_and_are_nearest_first() {
    let corpus = ["mind control", "karma yoga", "eternal soul", "inner peace", "devotion", "fearless action", "steady wisdom"];
    let (retriever, embedder, len) = flat_retriever(&corpus);
    let words = ["mind", "peace", "soul", "yoga", "fear", "wisdom", "duty", "krishna", "arjuna", "battle"];
    for (i, a) in words.iter().enumerate() {
        for b in words.iter().skip(i) {
            let q = embedder.embed(&format!("{a} {b}")).unwrap();
            let hits = retriever.retrieve_hits(&q, TOP_K).await.unwrap();
            assert_eq!(hits.len(), TOP_K);
            for hit in &hits {
                assert!(hit.id < len);
                assert_eq!(hit.text, corpus[hit.id]);
            }
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
}

#[tokio::test]
async fn embedding_is_idempotent() {
    let embedder = HashEmbedder::new(DIM);
    let a = embedder.embed("What is the path to peace according to the Gita?").unwrap();
    let b = embedder.embed("What is the path to peace according to the Gita?").unwrap();
    assert_eq!(a, b);
}
