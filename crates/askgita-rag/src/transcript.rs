//! Transcript sinks: append-only records of answered questions.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use askgita_core::error::{Error, Result};
use askgita_core::traits::TranscriptSink;
use askgita_core::types::ExchangeRecord;

/// Stamp an exchange with the current UTC time.
pub fn record_now(question: &str, answer: &str) -> ExchangeRecord {
    ExchangeRecord {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        question: question.to_string(),
        answer: answer.to_string(),
    }
}

/// One JSON object per line, appended to a file.
pub struct JsonlTranscript {
    path: PathBuf,
    // keeps lines from concurrent sessions in one process from interleaving
    lock: tokio::sync::Mutex<()>,
}

impl JsonlTranscript {
    pub fn new(path: &Path) -> Self { Self { path: path.to_path_buf(), lock: tokio::sync::Mutex::new(()) } }

    pub fn path(&self) -> &Path { &self.path }
}

#[async_trait]
impl TranscriptSink for JsonlTranscript {
    async fn append(&self, record: &ExchangeRecord) -> Result<()> {
        let failed = |e: std::io::Error| Error::LogAppendFailed(format!("{}: {}", self.path.display(), e));
        let mut line = serde_json::to_string(record).map_err(|e| Error::LogAppendFailed(e.to_string()))?;
        line.push('\n');
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(failed)?;
        }
        let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(&self.path).await.map_err(failed)?;
        file.write_all(line.as_bytes()).await.map_err(failed)?;
        file.flush().await.map_err(failed)?;
        Ok(())
    }
}

/// Keeps records in memory; handy for tests and embedding in other hosts.
#[derive(Default)]
pub struct MemoryTranscript { records: Mutex<Vec<ExchangeRecord>> }

impl MemoryTranscript {
    pub fn new() -> Self { Self::default() }

    pub fn records(&self) -> Vec<ExchangeRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranscriptSink for MemoryTranscript {
    async fn append(&self, record: &ExchangeRecord) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| Error::LogAppendFailed("transcript lock poisoned".into()))?;
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jsonl_appends_one_record_per_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("transcript.jsonl");
        let sink = JsonlTranscript::new(&path);
        sink.append(&record_now("q1", "a1")).await.unwrap();
        sink.append(&record_now("q2", "line\nbreak")).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let records: Vec<ExchangeRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "q1");
        assert_eq!(records[1].answer, "line\nbreak");
        assert!(chrono::DateTime::parse_from_rfc3339(&records[0].timestamp).is_ok());
    }

    #[tokio::test]
    async fn jsonl_reports_unwritable_path() {
        let tmp = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let sink = JsonlTranscript::new(tmp.path());
        let err = sink.append(&record_now("q", "a")).await.unwrap_err();
        assert!(matches!(err, Error::LogAppendFailed(_)));
    }
}
