//! Responses returned by the dispatch router and generation fallback.
//!
//! A response is text plus a kind, optionally carrying a side effect the UI
//! shell executes (navigation, record creation, chart, export). The engine
//! never performs side effects itself.

use crate::entities::{ChartKind, DataSubject, Panel, RecordKind, ReportFormat, TimeRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the UI should render a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Success,
    Info,
    /// Clarification question; a pending confirmation is outstanding.
    Question,
    Chart,
    Analysis,
    Error,
}

/// A fully specified record ready for the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub record_type: RecordKind,
    pub amount: f64,
    pub concept: String,
    pub destination: String,
    pub date: NaiveDate,
    /// Audit note citing the utterance this came from.
    pub note: String,
}

/// Request handed to the opaque chart service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartKind,
    pub data_source: DataSubject,
    pub time_range: TimeRange,
}

/// Request handed to the opaque report service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub format: ReportFormat,
    pub subject: Option<DataSubject>,
    pub time_range: TimeRange,
}

/// Opaque result of a report export, surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHandle {
    pub filename: String,
    pub size_bytes: u64,
}

/// Side effect the UI shell must execute for this response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SideEffect {
    Navigate { panel: Panel },
    CreateRecord { draft: RecordDraft },
    ShowChart { spec: ChartSpec, handle: String },
    ReportExported { report: ReportHandle },
}

/// Router/fallback output for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_effect: Option<SideEffect>,
}

impl Response {
    pub fn new(kind: ResponseKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            side_effect: None,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(ResponseKind::Success, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(ResponseKind::Info, text)
    }

    pub fn question(text: impl Into<String>) -> Self {
        Self::new(ResponseKind::Question, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(ResponseKind::Error, text)
    }

    pub fn with_side_effect(mut self, effect: SideEffect) -> Self {
        self.side_effect = Some(effect);
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }
}
