use clap::ValueEnum;

use crate::app::models::Report;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary followed by the reduction line
    Text,
    /// The full report as pretty-printed JSON
    Json,
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| AppError::ParseError(format!("Failed to encode report: {e}"))),
    }
}

// Counts are characters; the "words" wording is kept as users know it.
pub fn render_text(report: &Report) -> String {
    format!(
        "{}\nThe original site contains {} words, the summary contains {} words. Saved {:.6} %",
        report.summary, report.original_chars, report.summary_chars, report.reduction_percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report::new("https://example.com", &"a".repeat(200), "A short summary.".to_string())
    }

    #[test]
    fn text_output_prints_summary_then_ratio() {
        let text = render(&report(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "A short summary.\nThe original site contains 200 words, the summary contains 16 words. Saved 92.000000 %"
        );
    }

    #[test]
    fn json_output_carries_every_field() {
        let json: serde_json::Value =
            serde_json::from_str(&render(&report(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["summary"], "A short summary.");
        assert_eq!(json["original_chars"], 200);
        assert_eq!(json["summary_chars"], 16);
        assert!(json["summarized_at"].is_string());
    }
}
