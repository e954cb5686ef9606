//! Remote OpenAI-compatible fallback client.
//!
//! Used at most once per generation, only after the local provider fails.
//! The API key is read from an env var at call time, never stored in config,
//! so a missing key is a per-request error rather than a startup failure.

use crate::generation::{ChatMessage, ChatProvider};
use async_trait::async_trait;
use flow_common::{ProviderConfig, ProviderError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key_env: String,
    temperature: f64,
    max_tokens: u32,
}

impl RemoteClient {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: cfg.fallback_url.trim_end_matches('/').to_string(),
            model: cfg.fallback_model.clone(),
            api_key_env: cfg.api_key_env.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }

    fn api_key(&self) -> Result<String, ProviderError> {
        std::env::var(&self.api_key_env)
            .map_err(|_| ProviderError::MissingApiKey(self.api_key_env.clone()))
    }
}

#[async_trait]
impl ChatProvider for RemoteClient {
    fn name(&self) -> &str {
        "remote"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let key = self.api_key()?;
        let req = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let body: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Http("empty choices in completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_typed_error() {
        let cfg = ProviderConfig {
            api_key_env: "FLOWASSIST_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        let client = RemoteClient::from_config(&cfg);
        match client.api_key() {
            Err(ProviderError::MissingApiKey(var)) => {
                assert_eq!(var, "FLOWASSIST_TEST_KEY_THAT_IS_NOT_SET");
            }
            other => panic!("expected MissingApiKey, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn completion_response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hola"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hola");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let cfg = ProviderConfig {
            fallback_url: "https://api.openai.com/v1/".to_string(),
            ..Default::default()
        };
        let client = RemoteClient::from_config(&cfg);
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }
}
