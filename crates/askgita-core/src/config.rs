//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_LLM__MODEL`). Relative paths in
//! the settings are resolved against the directory the config was loaded from.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::MatchPolicy;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load `config.toml` and its environment overlay from `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir: dir.to_path_buf() })
    }

    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self { figment, base_dir: base_dir.to_path_buf() }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the typed settings, filling in defaults and the API key fallback.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.base_dir = self.base_dir.clone();
        if settings.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            settings.llm.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        }
        if env::var("APP_USE_FAKE_EMBEDDINGS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
        {
            settings.embedding.fake = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub intent: IntentSettings,
    pub llm: LlmSettings,
    pub transcript: TranscriptSettings,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub chunks_path: String,
    pub index_dir: String,
    pub table: String,
    pub scripture: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            chunks_path: "data/gita_chunks.json".to_string(),
            index_dir: "data/indexes/lancedb".to_string(),
            table: "gita_chunks".to_string(),
            scripture: "Bhagavad Gita".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub max_len: usize,
    pub fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: "models/all-MiniLM-L6-v2".to_string(), max_len: 256, fake: false }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Load every vector into memory and scan exactly instead of querying Lance.
    pub in_memory: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentSettings {
    pub match_policy: MatchPolicy,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    pub enabled: bool,
    pub path: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self { enabled: true, path: "data/transcript.jsonl".to_string() }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.corpus.table.trim().is_empty() {
            return Err(Error::InvalidConfig("corpus.table must not be empty".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be positive".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::InvalidConfig("llm.model must not be empty".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::InvalidConfig("llm.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn chunks_path(&self) -> PathBuf { resolve_with_base(&self.base_dir, &self.corpus.chunks_path) }
    pub fn index_dir(&self) -> PathBuf { resolve_with_base(&self.base_dir, &self.corpus.index_dir) }
    pub fn model_dir(&self) -> PathBuf { resolve_with_base(&self.base_dir, &self.embedding.model_dir) }
    pub fn transcript_path(&self) -> PathBuf { resolve_with_base(&self.base_dir, &self.transcript.path) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
