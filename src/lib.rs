pub mod app;
pub mod config;
pub mod error;
pub mod llm;
pub mod scraper;

pub use app::{run, Report};
pub use config::{Config, LlmConfig};
pub use error::{AppError, Result, EXIT_FAILURE};
