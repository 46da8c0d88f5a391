use std::time::Instant;

use crate::app::models::Report;
use crate::config::Config;
use crate::error::Result;
use crate::llm::summarize;
use crate::scraper::scrape_site;

/// Scrape the configured site, then summarise what it says.
///
/// Errors are already logged by the step that raised them. A failed scrape
/// returns before the completion endpoint is contacted.
pub async fn run(config: &Config) -> Result<Report> {
    let fetch_start = Instant::now();
    let site_text = scrape_site(&config.site_url, &config.extraction).await?;
    tracing::debug!(elapsed = ?fetch_start.elapsed(), "site text obtained");

    let llm_start = Instant::now();
    let summary = summarize(&config.llm, &site_text).await?;
    tracing::debug!(elapsed = ?llm_start.elapsed(), text = %summary, "summary text obtained");

    Ok(Report::new(&config.site_url, &site_text, summary))
}
