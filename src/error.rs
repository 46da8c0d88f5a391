/// Exit status used for every failure, whatever its kind.
pub const EXIT_FAILURE: u8 = 4;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to fetch data: {0}")]
    FetchError(String),

    #[error("Error parsing content: {0}")]
    ParseError(String),

    #[error("LLM processing error: {0}")]
    LlmError(String),

    /// The completion stream broke off; `partial` holds what arrived before it did.
    #[error("LLM stream interrupted: {message}")]
    StreamError { message: String, partial: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        EXIT_FAILURE
    }

    /// Text accumulated before a stream failure, if any.
    pub fn partial_summary(&self) -> Option<&str> {
        match self {
            AppError::StreamError { partial, .. } => Some(partial.as_str()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
