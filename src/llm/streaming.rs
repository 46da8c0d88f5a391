use async_trait::async_trait;
use serde::Deserialize;

use super::{ChatRequest, CompletionStrategy, Endpoint};
use crate::error::{AppError, Result};

const DONE_MARKER: &str = "[DONE]";

/// Reads the completion as server-sent events and concatenates the content deltas.
pub struct StreamingCompletion;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Done,
}

/// Splits a byte stream into lines, holding back a trailing partial line
/// until the chunk that completes it arrives.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line));
        }
        lines
    }

    fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(decode_line(&self.pending))
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Applies one event-stream line to the summary being built.
fn apply_line(line: &str, summary: &mut String) -> Result<Flow> {
    let Some(data) = line.strip_prefix("data:") else {
        // comments, `event:`/`id:` fields and blank separators carry no content
        return Ok(Flow::Continue);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(Flow::Continue);
    }
    if data == DONE_MARKER {
        return Ok(Flow::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| AppError::StreamError {
        message: format!("Malformed stream chunk: {e}"),
        partial: summary.clone(),
    })?;

    if let Some(error) = chunk.error {
        return Err(AppError::StreamError {
            message: format!("Endpoint reported an error mid-stream: {error}"),
            partial: summary.clone(),
        });
    }

    if let Some(content) = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
    {
        summary.push_str(&content);
    }
    Ok(Flow::Continue)
}

#[async_trait]
impl CompletionStrategy for StreamingCompletion {
    async fn complete(&self, endpoint: &Endpoint, request: &ChatRequest) -> Result<String> {
        let mut request = request.clone();
        request.stream = true;

        let mut response = endpoint.send(&request).await?;

        let mut summary = String::new();
        let mut lines = LineBuffer::default();
        let mut events = 0usize;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    return Err(AppError::StreamError {
                        message: format!("Failed to read stream: {e}"),
                        partial: summary,
                    });
                }
            };

            for line in lines.push(&chunk) {
                if apply_line(&line, &mut summary)? == Flow::Done {
                    tracing::debug!(events, "stream finished");
                    return Ok(summary);
                }
                events += 1;
            }
        }

        if let Some(line) = lines.finish() {
            apply_line(&line, &mut summary)?;
        }

        tracing::debug!(events, "stream closed without a done marker");
        Ok(summary)
    }
}
