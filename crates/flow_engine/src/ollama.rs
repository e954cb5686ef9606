//! Local Ollama chat client with NDJSON streaming.
//!
//! Streaming responses arrive as newline-delimited JSON objects that may be
//! split across HTTP chunks. `StreamAccumulator` buffers the incomplete tail
//! line between chunks; a complete line that fails to parse is dropped and
//! the stream continues, so one malformed frame never kills a response.

use crate::generation::{ChatMessage, ChatProvider, StreamingChatProvider};
use async_trait::async_trait;
use flow_common::{ProviderConfig, ProviderError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize)]
struct GenerationOptions {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    num_ctx: u32,
    num_predict: u32,
}

impl GenerationOptions {
    fn from_config(cfg: &ProviderConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            top_p: 0.9,
            top_k: 40,
            num_ctx: 8192,
            num_predict: cfg.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: GenerationOptions,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Reassembles NDJSON chat frames from raw byte chunks.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    pending: String,
    text: String,
    done: bool,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one HTTP chunk. Returns true once a `done` frame has been seen.
    pub fn push_chunk(&mut self, bytes: &[u8]) -> bool {
        self.pending.push_str(&String::from_utf8_lossy(bytes));
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            self.consume_line(line.trim());
        }
        self.done
    }

    /// Flush a trailing frame that arrived without a newline.
    pub fn finish(&mut self) {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.consume_line(line.trim());
        }
    }

    fn consume_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        match serde_json::from_str::<ChatChunk>(line) {
            Ok(chunk) => {
                if let Some(m) = chunk.message {
                    self.text.push_str(&m.content);
                }
                if chunk.done {
                    self.done = true;
                }
            }
            Err(e) => {
                // Malformed frame, skip and keep streaming.
                debug!(error = %e, "skipping unparsable stream line");
            }
        }
    }

    /// Full text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Chat client for a local Ollama daemon.
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
    options: GenerationOptions,
}

impl OllamaClient {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            host: cfg.host.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            options: GenerationOptions::from_config(cfg),
        }
    }

    fn options(&self) -> GenerationOptions {
        self.options.clone()
    }

    /// Liveness probe against the model listing endpoint.
    pub async fn is_available(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.host))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ProviderError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let req = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: self.options(),
        };

        let resp = self
            .http
            .post(format!("{}/api/chat", self.host))
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        let resp = Self::check_status(resp).await?;

        let chunk: ChatChunk = resp
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(chunk.message.map(|m| m.content).unwrap_or_default())
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options(),
        };

        let resp = self
            .http
            .post(format!("{}/api/generate", self.host))
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        let resp = Self::check_status(resp).await?;

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        Ok(body.response)
    }
}

#[async_trait]
impl StreamingChatProvider for OllamaClient {
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, ProviderError> {
        let req = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
            options: self.options(),
        };

        let resp = self
            .http
            .post(format!("{}/api/chat", self.host))
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        let resp = Self::check_status(resp).await?;

        let mut acc = StreamAccumulator::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| ProviderError::Stream(e.to_string()))?;
            let before = acc.text().len();
            let done = acc.push_chunk(&bytes);
            if acc.text().len() > before {
                on_text(acc.text());
            }
            if done {
                break;
            }
        }
        acc.finish();

        Ok(acc.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_handles_split_lines() {
        let mut acc = StreamAccumulator::new();
        // One frame split across two chunks.
        acc.push_chunk(br#"{"message":{"content":"Ho"#);
        assert_eq!(acc.text(), "");
        acc.push_chunk("la\"},\"done\":false}\n".as_bytes());
        assert_eq!(acc.text(), "Hola");
    }

    #[test]
    fn accumulator_skips_malformed_lines() {
        let mut acc = StreamAccumulator::new();
        acc.push_chunk(b"{\"message\":{\"content\":\"a\"},\"done\":false}\n");
        acc.push_chunk(b"esto no es json\n");
        acc.push_chunk(b"{\"message\":{\"content\":\"b\"},\"done\":true}\n");
        assert_eq!(acc.text(), "ab");
        assert!(acc.is_done());
    }

    #[test]
    fn accumulator_detects_done() {
        let mut acc = StreamAccumulator::new();
        let done = acc.push_chunk(b"{\"message\":{\"content\":\"fin\"},\"done\":true}\n");
        assert!(done);
    }

    #[test]
    fn accumulator_finish_flushes_tail_without_newline() {
        let mut acc = StreamAccumulator::new();
        acc.push_chunk(b"{\"message\":{\"content\":\"cola\"},\"done\":true}");
        assert_eq!(acc.text(), "");
        acc.finish();
        assert_eq!(acc.text(), "cola");
        assert!(acc.is_done());
    }

    #[test]
    fn accumulator_multiple_frames_in_one_chunk() {
        let mut acc = StreamAccumulator::new();
        acc.push_chunk(
            b"{\"message\":{\"content\":\"uno \"},\"done\":false}\n{\"message\":{\"content\":\"dos\"},\"done\":false}\n",
        );
        assert_eq!(acc.text(), "uno dos");
        assert!(!acc.is_done());
    }

    #[test]
    fn options_carry_configured_sampling() {
        let cfg = ProviderConfig {
            temperature: 0.3,
            max_tokens: 512,
            ..Default::default()
        };
        let opts = GenerationOptions::from_config(&cfg);
        assert!((opts.temperature - 0.3).abs() < f64::EPSILON);
        assert_eq!(opts.num_predict, 512);
        assert_eq!(opts.num_ctx, 8192);
    }

    #[test]
    fn host_trailing_slash_is_trimmed() {
        let cfg = ProviderConfig {
            host: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = OllamaClient::from_config(&cfg);
        assert_eq!(client.host, "http://localhost:11434");
    }
}
