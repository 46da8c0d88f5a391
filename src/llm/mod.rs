mod blocking;
mod streaming;

use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{AppError, Result};

pub use blocking::BlockingCompletion;
pub use streaming::StreamingCompletion;

pub const STOP_SEQUENCES: [&str; 2] = ["<|end_of_text|>", "<|eot_id|>"];
pub const TEMPERATURE: f32 = 0.7;
pub const TOP_P: f32 = 0.95;
pub const FREQUENCY_PENALTY: f32 = 0.0;
pub const PRESENCE_PENALTY: f32 = 0.0;

const PROMPT_PREFIX: &str = "Summarise the following text using the fewest possible words\n, ";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    pub stop: Vec<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: usize,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl ChatRequest {
    pub fn new(config: &LlmConfig, user_prompt: String) -> Self {
        ChatRequest {
            model: config.model.clone(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: config.system_prompt.clone(),
                },
                Message {
                    role: "user".into(),
                    content: user_prompt,
                },
            ],
            stream: config.mode == CompletionMode::Streaming,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: config.max_tokens,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        }
    }
}

/// Where completion requests go, and with which credentials.
pub struct Endpoint {
    client: Client,
    url: String,
    api_token: String,
}

impl Endpoint {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::LlmError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Endpoint {
            client,
            url: completions_url(&config.server),
            api_token: config.api_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn post(&self, request: &ChatRequest) -> RequestBuilder {
        self.client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(request)
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let response = self
            .post(request)
            .send()
            .await
            .map_err(|e| AppError::LlmError(format!("Failed to reach {}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(AppError::LlmError(format!(
                "Completion endpoint returned {status}: {body}"
            )));
        }
        Ok(response)
    }
}

/// How the completion body is consumed.
#[async_trait]
pub trait CompletionStrategy: Send + Sync {
    async fn complete(&self, endpoint: &Endpoint, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionMode {
    /// Accumulate server-sent content deltas
    Streaming,
    /// Read a single, complete response
    Blocking,
}

impl CompletionMode {
    pub fn strategy(self) -> Box<dyn CompletionStrategy> {
        match self {
            CompletionMode::Streaming => Box::new(StreamingCompletion),
            CompletionMode::Blocking => Box::new(BlockingCompletion),
        }
    }
}

pub fn completions_url(server: &str) -> String {
    format!("{}/chat/completions", server.trim_end_matches('/'))
}

/// Text forwarded to the model for a given token budget.
///
/// Anything within `budget` characters goes through untouched. Longer text is
/// cut to its first `budget * chars_per_token` characters, a rule of thumb for
/// how many characters a token covers rather than a tokenizer count.
pub fn truncate_for_budget(text: &str, budget: usize, chars_per_token: usize) -> &str {
    if text.chars().count() <= budget {
        return text;
    }

    let limit = budget.saturating_mul(chars_per_token);
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(content: &str) -> String {
    let mut result = String::with_capacity(content.len() + PROMPT_PREFIX.len());
    result.push_str(PROMPT_PREFIX);
    result.push_str(content);
    result
}

/// Summarise `text` with the configured model and completion mode.
pub async fn summarize(config: &LlmConfig, text: &str) -> Result<String> {
    let content = truncate_for_budget(text, config.max_tokens, config.chars_per_token);
    if content.len() < text.len() {
        tracing::info!(
            original_chars = text.chars().count(),
            sent_chars = content.chars().count(),
            "site text truncated to fit the token budget"
        );
    }

    let request = ChatRequest::new(config, build_prompt(content));
    let endpoint = Endpoint::new(config).inspect_err(|e| {
        tracing::error!(error = %e, "Error creating completion client for summariser");
    })?;

    tracing::debug!(endpoint = endpoint.url(), model = %config.model, mode = ?config.mode, "requesting summary");

    match config.mode.strategy().complete(&endpoint, &request).await {
        Ok(summary) => {
            tracing::debug!(chars = summary.chars().count(), "Finished receiving response from LLM");
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(error = %e, "Error with chat completion for summariser");
            Err(e)
        }
    }
}
