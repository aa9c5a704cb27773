use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use askgita_core::config::Settings;
use askgita_core::ChunkStore;
use askgita_rag::{AskGita, CorpusContext, Session};
use askgita_vector::CorpusIndexWriter;

async fn assistant(settings: &Settings) -> anyhow::Result<AskGita> {
    let ctx = CorpusContext::load(settings).await.context("failed to load the corpus")?;
    Ok(AskGita::from_settings(Arc::new(ctx), settings)?)
}

pub async fn ask(settings: &Settings, question: &str) -> anyhow::Result<()> {
    let assistant = assistant(settings).await?;
    let reply = assistant.ask(question).await?;
    println!("{}", reply.render());
    assistant.flush_transcript().await;
    Ok(())
}

pub async fn chat(settings: &Settings) -> anyhow::Result<()> {
    let assistant = Arc::new(assistant(settings).await?);
    let mut session = Session::new(assistant.clone());
    println!("🕉️  Ask Gita: type a question, /history to review, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                for turn in session.turns() {
                    println!("{}: {}", turn.speaker, turn.message);
                }
            }
            question => match session.ask(question).await {
                Ok(reply) => println!("\nGita AI: {}", reply.render()),
                Err(e) => eprintln!("⚠️  {}", e),
            },
        }
    }
    assistant.flush_transcript().await;
    Ok(())
}

pub async fn build_index(settings: &Settings, chunks: Option<&Path>) -> anyhow::Result<()> {
    let chunks_path = chunks.map(Path::to_path_buf).unwrap_or_else(|| settings.chunks_path());
    let store = ChunkStore::load(&chunks_path)?;
    let embedder = askgita_embed::embedder_from_settings(settings)?;
    let index_dir = settings.index_dir();

    let writer = CorpusIndexWriter::new(&index_dir, &settings.corpus.table).await?;
    let written = writer.write(&store, embedder.as_ref()).await?;
    println!("✅ Indexed {} chunks into {} ({})", written, index_dir.display(), settings.corpus.table);
    Ok(())
}

pub async fn status(settings: &Settings) -> anyhow::Result<()> {
    let chunks_path = settings.chunks_path();
    match ChunkStore::load(&chunks_path) {
        Ok(store) => println!("Chunk store:  {} ({} chunks, fingerprint {})", chunks_path.display(), store.len(), store.fingerprint()),
        Err(e) => println!("Chunk store:  {} unavailable: {}", chunks_path.display(), e),
    }

    let index_dir = settings.index_dir();
    match askgita_vector::open_index(settings).await {
        Ok(index) => println!("Corpus index: {} ({} rows, dim {})", index_dir.display(), index.len(), index.dim()),
        Err(e) => {
            println!("Corpus index: {} unavailable: {}", index_dir.display(), e);
            return Ok(());
        }
    }

    let meta = askgita_vector::read_meta(settings).await?;
    let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    println!("Built with:   {}", show(meta.embedder_id));
    println!("Dimension:    {}", show(meta.dim.map(|d| d.to_string())));
    println!("Chunk count:  {}", show(meta.chunk_count.map(|c| c.to_string())));
    println!("Fingerprint:  {}", show(meta.chunks_fingerprint));
    println!("Metric:       {}", show(meta.metric));
    Ok(())
}
