//! Generation fallback: local provider first, remote provider exactly once.
//!
//! The engine only reaches here when the deterministic router could not
//! finish an utterance. The local provider is tried first (streaming when
//! configured); on any local failure the remote provider is called exactly
//! once. A second failure is terminal and becomes an error response with
//! remediation steps, never a panic or a retry loop.

use crate::ollama::OllamaClient;
use crate::remote::RemoteClient;
use async_trait::async_trait;
use flow_common::{Message, ProviderConfig, ProviderError, Response, ResponseKind, Role};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One chat turn on the wire. Role strings match both the Ollama and the
/// OpenAI-compatible chat schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            }
            .to_string(),
            content: m.text.clone(),
        }
    }
}

/// A chat completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Full chat completion, returning the final text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;

    /// Single-prompt completion. Defaults to a one-message chat.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.chat(&[ChatMessage::user(prompt)]).await
    }
}

/// A chat backend that can stream.
///
/// `on_text` receives the CUMULATIVE text so far on every call, not the
/// delta; callers can render it directly without concatenating.
#[async_trait]
pub trait StreamingChatProvider: ChatProvider {
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, ProviderError>;
}

/// Error text shown when both providers fail.
fn terminal_error_text(local: &ProviderError, remote: &ProviderError) -> String {
    format!(
        "No pude generar una respuesta.\n\
         - Proveedor local: {}\n\
         - Proveedor remoto: {}\n\
         Verifica que Ollama esté corriendo (`ollama serve`) o configura la \
         clave del proveedor remoto.",
        local, remote
    )
}

/// Local-then-remote generation with single-retry semantics.
pub struct GenerationEngine {
    local: Box<dyn StreamingChatProvider>,
    remote: Box<dyn ChatProvider>,
    streaming: bool,
}

impl GenerationEngine {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self {
            local: Box::new(OllamaClient::from_config(cfg)),
            remote: Box::new(RemoteClient::from_config(cfg)),
            streaming: cfg.streaming,
        }
    }

    /// Test seam: inject arbitrary providers.
    pub fn with_providers(
        local: Box<dyn StreamingChatProvider>,
        remote: Box<dyn ChatProvider>,
        streaming: bool,
    ) -> Self {
        Self {
            local,
            remote,
            streaming,
        }
    }

    /// Conversational generation over a prepared message window.
    ///
    /// Never returns an Err: provider failures degrade to an error response
    /// so the session loop stays alive.
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        on_text: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Response {
        let local_err = if self.streaming {
            match self.local.chat_stream(messages, on_text).await {
                Ok(text) => return Response::info(text),
                Err(e) => e,
            }
        } else {
            match self.local.chat(messages).await {
                Ok(text) => {
                    on_text(&text);
                    return Response::info(text);
                }
                Err(e) => e,
            }
        };

        warn!(provider = self.local.name(), error = %local_err, "local generation failed, trying remote");

        match self.remote.chat(messages).await {
            Ok(text) => {
                info!(provider = self.remote.name(), "remote fallback succeeded");
                on_text(&text);
                Response::info(text)
            }
            Err(remote_err) => {
                warn!(provider = self.remote.name(), error = %remote_err, "remote fallback failed");
                Response::error(terminal_error_text(&local_err, &remote_err))
            }
        }
    }

    /// One-shot analysis completion with the same fallback ladder.
    pub async fn analyze(&self, prompt: &str) -> Response {
        let local_err = match self.local.complete(prompt).await {
            Ok(text) => return Response::new(ResponseKind::Analysis, text),
            Err(e) => e,
        };

        warn!(provider = self.local.name(), error = %local_err, "local analysis failed, trying remote");

        match self.remote.complete(prompt).await {
            Ok(text) => Response::new(ResponseKind::Analysis, text),
            Err(remote_err) => Response::error(terminal_error_text(&local_err, &remote_err)),
        }
    }
}
