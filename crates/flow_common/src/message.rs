//! Conversation primitives: utterances, messages, widget state and the
//! pending-confirmation slot.
//!
//! The message log is the only mutable shared resource in a session, with a
//! single writer (the session controller). Everything created during a
//! request/response cycle (utterance, intent, entities) is discarded once the
//! resulting messages are appended.

use crate::entities::{EntityBag, RecordKind};
use crate::intent::Intent;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an utterance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Typed,
    Spoken,
}

/// One raw user input. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub origin: Origin,
}

impl Utterance {
    pub fn typed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            origin: Origin::Typed,
        }
    }

    pub fn spoken(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            origin: Origin::Spoken,
        }
    }
}

/// Speaker role in the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name for chat endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry in the conversation log.
///
/// An assistant message produced by streaming always carries the full
/// concatenated text, never a partial chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntityBag>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            intent: None,
            entities: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            intent: None,
            entities: None,
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_entities(mut self, entities: EntityBag) -> Self {
        self.entities = Some(entities);
        self
    }
}

/// Assistant widget state, driven by the session state machine.
///
/// `Idle → Listening → Thinking → Speaking → Idle`; voice or provider errors
/// force an immediate return to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
}

impl std::fmt::Display for WidgetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        };
        write!(f, "{}", s)
    }
}

/// A record creation held open because entities are missing.
///
/// At most one may be outstanding per session. The next utterance first
/// tries to fill the missing fields before any fresh classification runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub record_type: RecordKind,
    pub amount: Option<f64>,
    pub concept: Option<String>,
    pub destination: Option<String>,
    pub date: NaiveDate,
    /// The utterance that opened this confirmation, kept for audit text.
    pub original: String,
}

impl PendingConfirmation {
    /// Amount and concept are the two hard requirements for record creation.
    pub fn is_complete(&self) -> bool {
        self.amount.is_some() && self.concept.is_some()
    }

    /// Names of still-missing required fields, for the clarification question.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("monto");
        }
        if self.concept.is_none() {
            missing.push("concepto");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_completeness_requires_amount_and_concept() {
        let mut pending = PendingConfirmation {
            record_type: RecordKind::Gasto,
            amount: None,
            concept: Some("gasolina".to_string()),
            destination: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            original: "registra un gasto".to_string(),
        };
        assert!(!pending.is_complete());
        assert_eq!(pending.missing_fields(), vec!["monto"]);

        pending.amount = Some(5000.0);
        assert!(pending.is_complete());
        assert!(pending.missing_fields().is_empty());
    }

    #[test]
    fn messages_get_unique_ids() {
        let a = Message::user("hola");
        let b = Message::user("hola");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn widget_state_defaults_to_idle() {
        assert_eq!(WidgetState::default(), WidgetState::Idle);
    }
}
