use std::process::ExitCode;

use page_summarizer::{app::output::render, config::Config, run, EXIT_FAILURE};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    // Failures were logged where they happened.
    let report = match run(&config).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(partial) = e.partial_summary().filter(|p| !p.is_empty()) {
                tracing::warn!(partial = %partial, "summary was cut short by the stream failure");
            }
            return ExitCode::from(e.exit_code());
        }
    };

    match render(&report, config.output) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to render report");
            ExitCode::from(e.exit_code())
        }
    }
}
