use clap::Parser;
use reqwest::Url;

use crate::app::output::OutputFormat;
use crate::error::{AppError, Result};
use crate::llm::CompletionMode;
use crate::scraper::{ExtractionKind, ExtractionPolicy};

pub const DEFAULT_SITE: &str = "https://github.com/PuerkitoBio/goquery";
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:1337/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-instruct";
pub const DEFAULT_TOKEN: &str = "fake-token";
pub const DEFAULT_MAX_TOKENS: usize = 4096;
/// Rough characters-per-token ratio used to size the text sent to the model.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 2;
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert at summarising text in a concise manner for intelligent social media users.";

/// Fetch a web page and summarise its text with an OpenAI-compatible model.
#[derive(Debug, Parser)]
#[command(name = "page-summarizer", version, about)]
pub struct Cli {
    /// Page to summarise
    #[arg(env = "SUMMARIZER_SITE", default_value = DEFAULT_SITE)]
    pub url: String,

    /// Bearer token for the completion endpoint
    #[arg(long, env = "SUMMARIZER_API_TOKEN", default_value = DEFAULT_TOKEN, hide_env_values = true)]
    pub token: String,

    /// Base URL of the OpenAI-compatible API (without /chat/completions)
    #[arg(long, env = "SUMMARIZER_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    #[arg(long, env = "SUMMARIZER_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Token budget; also used as the completion's max_tokens
    #[arg(long, env = "SUMMARIZER_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: usize,

    /// Characters forwarded per budget token once the text exceeds the budget
    #[arg(long, default_value_t = DEFAULT_CHARS_PER_TOKEN)]
    pub chars_per_token: usize,

    #[arg(long, env = "SUMMARIZER_MODE", value_enum, default_value_t = CompletionMode::Streaming)]
    pub mode: CompletionMode,

    /// Which elements are dropped before text extraction
    #[arg(long, value_enum, default_value_t = ExtractionKind::Aggressive)]
    pub extraction: ExtractionKind,

    /// Additional tag name to drop (repeatable)
    #[arg(long = "block-tag")]
    pub block_tags: Vec<String>,

    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_token: String,
    pub server: String,
    pub model: String,
    pub max_tokens: usize,
    pub chars_per_token: usize,
    pub mode: CompletionMode,
    pub system_prompt: String,
}

impl LlmConfig {
    /// Default model settings, pointed at `server`.
    pub fn with_server(server: impl Into<String>) -> Self {
        LlmConfig {
            api_token: DEFAULT_TOKEN.to_string(),
            server: server.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            mode: CompletionMode::Streaming,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub site_url: String,
    pub llm: LlmConfig,
    pub extraction: ExtractionPolicy,
    pub output: OutputFormat,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.max_tokens == 0 {
            return Err(AppError::ConfigError("max tokens must be greater than zero".to_string()));
        }
        if cli.chars_per_token == 0 {
            return Err(AppError::ConfigError(
                "chars per token must be greater than zero".to_string(),
            ));
        }
        validate_http_url("site url", &cli.url)?;
        validate_http_url("server", &cli.server)?;

        let extraction = ExtractionPolicy::from_kind(cli.extraction).with_extra_tags(cli.block_tags);

        Ok(Config {
            site_url: cli.url,
            llm: LlmConfig {
                api_token: cli.token,
                server: cli.server,
                model: cli.model,
                max_tokens: cli.max_tokens,
                chars_per_token: cli.chars_per_token,
                mode: cli.mode,
                system_prompt: cli.system_prompt,
            },
            extraction,
            output: cli.output,
        })
    }
}

fn validate_http_url(what: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| AppError::ConfigError(format!("Invalid {what}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::ConfigError(format!(
            "Invalid {what}: unsupported scheme {other}"
        ))),
    }
}
