use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub url: String,
    pub summary: String,
    pub original_chars: usize,
    pub summary_chars: usize,
    pub reduction_percent: f64,
    pub summarized_at: DateTime<Utc>,
}

impl Report {
    pub fn new(url: &str, original: &str, summary: String) -> Self {
        let original_chars = original.chars().count();
        let summary_chars = summary.chars().count();

        Report {
            url: url.to_string(),
            summary,
            original_chars,
            summary_chars,
            reduction_percent: reduction_percent(original_chars, summary_chars),
            summarized_at: Utc::now(),
        }
    }
}

/// Share of the original length saved by the summary, in percent.
/// Negative when the summary is the longer of the two; zero for an empty original.
pub fn reduction_percent(original_chars: usize, summary_chars: usize) -> f64 {
    if original_chars == 0 {
        return 0.0;
    }
    let reduction = original_chars as f64 - summary_chars as f64;
    reduction / original_chars as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_uses_character_counts() {
        let report = Report::new("https://example.com", "éééééééééé", "éé".to_string());
        assert_eq!(report.original_chars, 10);
        assert_eq!(report.summary_chars, 2);
        assert!((report.reduction_percent - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn longer_summary_gives_negative_reduction() {
        assert!((reduction_percent(4, 5) + 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_original_does_not_divide_by_zero() {
        assert_eq!(reduction_percent(0, 12), 0.0);
    }
}
