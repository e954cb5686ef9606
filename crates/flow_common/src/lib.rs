//! Shared types for the conversational dispatch engine.
//!
//! This crate holds the data model exchanged between the engine and the UI
//! shell: utterances, intents, typed entity bags, messages, responses and
//! configuration. It is I/O-free apart from config file load/save.

pub mod config;
pub mod entities;
pub mod error;
pub mod intent;
pub mod message;
pub mod response;

pub use config::{AssistantConfig, ProviderConfig, VoiceConfig};
pub use entities::{
    ChartKind, DataSubject, EntityBag, Panel, QueryType, RecordKind, ReportFormat, TimeRange,
};
pub use error::{ProviderError, SessionError};
pub use intent::{Intent, IntentKind, MAX_CONFIDENCE};
pub use message::{Message, Origin, PendingConfirmation, Role, Utterance, WidgetState};
pub use response::{
    ChartSpec, RecordDraft, ReportHandle, ReportSpec, Response, ResponseKind, SideEffect,
};
