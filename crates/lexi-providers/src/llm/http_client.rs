use async_trait::async_trait;
use lexi_domain::error::{Error, Result};
use lexi_domain::ports::services::LlmClient;
use lexi_domain::value_objects::{ModelTier, ProcessingSettings};
use serde::{Deserialize, Serialize};

/// Per-tier model name mapping and endpoint/credentials for an
/// OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct HttpLlmConfig {
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model name for [`ModelTier::Speed`].
    pub speed_model: String,
    /// Model name for [`ModelTier::Balanced`].
    pub balanced_model: String,
    /// Model name for [`ModelTier::Quality`].
    pub quality_model: String,
}

/// Reqwest-backed [`LlmClient`] talking to an OpenAI-compatible
/// chat-completions endpoint. Sentence extraction is requested as a
/// strict newline-separated list in the system prompt; the minimal-prompt
/// variant (tier 3) drops the formatting instructions that ask for
/// dialogue/fragment handling, asking only for "split into sentences".
pub struct HttpLlmClient {
    http: reqwest::Client,
    config: HttpLlmConfig,
}

impl HttpLlmClient {
    /// Build a new client from `config`.
    #[must_use]
    pub fn new(config: HttpLlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Speed => &self.config.speed_model,
            ModelTier::Balanced => &self.config.balanced_model,
            ModelTier::Quality => &self.config.quality_model,
        }
    }

    async fn complete(&self, model: &str, system_prompt: &str, user_text: &str) -> Result<Vec<String>> {
        let request = ChatRequest {
            model: model.to_owned(),
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: system_prompt.to_owned(),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: user_text.to_owned(),
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if !response.status().is_success() {
            let retryable = response.status().is_server_error() || response.status().as_u16() == 429;
            return Err(Error::llm(
                format!("llm endpoint returned {}", response.status()),
                if retryable { "RATE_LIMIT" } else { "API_ERROR" },
                retryable,
            ));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("failed to parse llm response: {e}"), "API_ERROR", true))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::llm("llm response had no choices", "API_ERROR", true))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

fn classify_transport_error(err: &reqwest::Error) -> Error {
    let retryable = err.is_timeout() || err.is_connect();
    Error::llm(format!("llm request failed: {err}"), "TRANSPORT_ERROR", retryable)
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn extract_sentences(
        &self,
        tier: ModelTier,
        chunk_text: &str,
        settings: &ProcessingSettings,
    ) -> Result<Vec<String>> {
        let system_prompt = format!(
            "Split the following French text into complete sentences, one per line. \
             Target roughly {} words per sentence, minimum {} words. {}",
            settings.sentence_length,
            settings.min_sentence_length,
            if settings.ignore_dialogue {
                "Discard dialogue-style lines."
            } else {
                ""
            }
        );
        self.complete(self.model_for(tier), &system_prompt, chunk_text).await
    }

    async fn extract_sentences_minimal(&self, tier: ModelTier, chunk_text: &str) -> Result<Vec<String>> {
        self.complete(
            self.model_for(tier),
            "Split the following text into sentences, one per line.",
            chunk_text,
        )
        .await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
