use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use askgita_core::config::LlmSettings;
use askgita_core::error::{Error, Result};
use askgita_core::traits::AnswerGenerator;

/// Sends each prompt as a single user message with streaming disabled and
/// returns the trimmed text of the first choice.
pub struct ChatCompletionClient {
    endpoint: String,
    model: String,
    client: Client,
}

impl ChatCompletionClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        let mut auth = HeaderValue::from_str(&auth)
            .map_err(|_| Error::InvalidConfig("API key contains characters not allowed in a header".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            client,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("llm.api_key (or OPENAI_API_KEY) must be set".into()))?;
        Self::new(&settings.base_url, key, &settings.model, Duration::from_secs(settings.timeout_secs))
    }

    pub fn model(&self) -> &str { &self.model }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            stream: false,
        };
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => Error::UpstreamRateLimited(text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::UpstreamUnavailable(format!("authentication rejected ({}): {}", status, text))
                }
                _ => Error::UpstreamUnavailable(format!("endpoint returned {}: {}", status, text)),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to parse completion response: {}", e)))?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(Error::EmptyCompletion)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::EmptyCompletion);
        }
        Ok(answer.to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
