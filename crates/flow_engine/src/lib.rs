//! Conversational dispatch engine for the business dashboard assistant.
//!
//! Pipeline: classify an utterance, extract typed entities, route it through
//! the deterministic dispatcher, and only fall back to LLM generation
//! (local Ollama first, remote once) when no deterministic outcome exists.
//! The session controller owns the conversation state machine around that
//! pipeline.

pub mod classifier;
pub mod extractor;
pub mod generation;
pub mod ollama;
pub mod patterns;
pub mod prompt;
pub mod remote;
pub mod router;
pub mod services;
pub mod session;

pub use classifier::classify;
pub use extractor::extract;
pub use generation::{ChatMessage, ChatProvider, GenerationEngine, StreamingChatProvider};
pub use ollama::{OllamaClient, StreamAccumulator};
pub use remote::RemoteClient;
pub use router::{route, GenerationTask, RouteOutcome};
pub use services::{ChartService, DashboardData, DashboardStats, ReportService, Services};
pub use session::{ConversationSession, SessionController, SessionEvent};
