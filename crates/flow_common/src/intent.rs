//! Intent model for the conversational dispatch engine.
//!
//! An intent is the classified purpose of an utterance, drawn from a fixed
//! closed set. Classification is deterministic: regex tables first, keyword
//! scoring second, `Other` as the terminal fallback.

use serde::{Deserialize, Serialize};

/// Confidence ceiling for regex matches. Classification never claims 1.0.
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Closed set of intents the dispatcher understands.
///
/// Declaration order matters: the classifier walks intents in this order and
/// breaks keyword-score ties in favor of the first declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Move to another dashboard panel ("ir a ventas")
    Navigate,
    /// Create a record conversationally ("registra un gasto de 5000")
    CreateRecord,
    /// Read-only question over live data ("cuántos clientes tengo")
    QueryData,
    /// Build a visualization ("gráfica de ventas del mes")
    GenerateChart,
    /// Export a report ("exporta reporte en pdf")
    ExportReport,
    /// Open-ended analysis, delegated to the LLM with a structured prompt
    Analyze,
    /// Usage question ("qué puedes hacer")
    Help,
    /// Anything unclassified; falls through to the generation fallback
    Other,
}

impl IntentKind {
    /// All intents in classifier precedence order.
    pub const ORDERED: [IntentKind; 8] = [
        IntentKind::Navigate,
        IntentKind::CreateRecord,
        IntentKind::QueryData,
        IntentKind::GenerateChart,
        IntentKind::ExportReport,
        IntentKind::Analyze,
        IntentKind::Help,
        IntentKind::Other,
    ];
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Navigate => "navigate",
            Self::CreateRecord => "create_record",
            Self::QueryData => "query_data",
            Self::GenerateChart => "generate_chart",
            Self::ExportReport => "export_report",
            Self::Analyze => "analyze",
            Self::Help => "help",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Result of classifying one utterance. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Always within `[0.0, MAX_CONFIDENCE]`.
    pub confidence: f64,
    /// The text span a regex matched, if classification came from a regex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_span: Option<String>,
}

impl Intent {
    pub fn new(kind: IntentKind, confidence: f64) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
            matched_span: None,
        }
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.matched_span = Some(span.into());
        self
    }

    /// The terminal fallback: unclassified input.
    pub fn other() -> Self {
        Self::new(IntentKind::Other, 0.0)
    }
}
