use async_trait::async_trait;

use super::{ChatRequest, CompletionStrategy, Endpoint};
use crate::error::{AppError, Result};

/// One request, one response: the first choice's message is the summary.
pub struct BlockingCompletion;

#[async_trait]
impl CompletionStrategy for BlockingCompletion {
    async fn complete(&self, endpoint: &Endpoint, request: &ChatRequest) -> Result<String> {
        let mut request = request.clone();
        request.stream = false;

        let res = endpoint.send(&request).await?;

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::LlmError(format!("Malformed completion payload: {e}")))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::LlmError("Invalid response format from LLM".to_string()))?
            .to_string();

        Ok(reply)
    }
}
