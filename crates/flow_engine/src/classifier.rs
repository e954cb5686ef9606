//! Deterministic intent classifier.
//!
//! Regex tables first, keyword occurrence scoring second, `Other` last.
//! Pure function of the input text and the static pattern table; it never
//! fails, the worst case is `Other` at confidence 0.

use crate::patterns::PATTERN_TABLE;
use flow_common::{Intent, IntentKind, MAX_CONFIDENCE};
use tracing::debug;

/// Baseline confidence for any regex match.
const REGEX_BASELINE: f64 = 0.7;
/// Bonus for having matched a specific pattern at all.
const SPECIFICITY_BONUS: f64 = 0.1;
/// Per-keyword-occurrence score weight.
const KEYWORD_WEIGHT: f64 = 0.3;
/// Ceiling for keyword-derived confidence.
const KEYWORD_CAP: f64 = 0.9;

/// Classify one utterance.
///
/// Walks intents in table order; the first regex match anywhere wins
/// immediately. Only when no regex in the whole table matches does keyword
/// scoring run, picking the intent with the most keyword occurrences
/// (first-declared wins ties). No keyword hit at all yields `Other`.
pub fn classify(text: &str) -> Intent {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return Intent::other();
    }

    // Pass 1: regexes, in declaration order. First match wins.
    for entry in PATTERN_TABLE.iter() {
        for re in &entry.regexes {
            if let Some(m) = re.find(&normalized) {
                let confidence = REGEX_BASELINE
                    + (m.len() as f64 / 100.0).min(0.2)
                    + SPECIFICITY_BONUS;
                let intent = Intent::new(entry.kind, confidence.min(MAX_CONFIDENCE))
                    .with_span(m.as_str());
                debug!(intent = %entry.kind, span = m.as_str(), "regex classification");
                return intent;
            }
        }
    }

    // Pass 2: keyword occurrence scoring. Ties break to the first declared.
    let mut best: Option<(IntentKind, usize)> = None;
    for entry in PATTERN_TABLE.iter() {
        let score: usize = entry
            .keywords
            .iter()
            .map(|kw| normalized.matches(kw).count())
            .sum();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((entry.kind, score));
        }
    }

    match best {
        Some((kind, score)) => {
            let confidence = (score as f64 * KEYWORD_WEIGHT).min(KEYWORD_CAP);
            debug!(intent = %kind, score, "keyword classification");
            Intent::new(kind, confidence)
        }
        None => Intent::other(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigate_by_regex() {
        let intent = classify("ir a ventas");
        assert_eq!(intent.kind, IntentKind::Navigate);
        assert!(intent.confidence >= REGEX_BASELINE);
        assert_eq!(intent.matched_span.as_deref(), Some("ir a"));
    }

    #[test]
    fn create_record_by_regex() {
        let intent = classify("registra un gasto de 5000 para gasolina");
        assert_eq!(intent.kind, IntentKind::CreateRecord);
        assert!(intent.confidence > 0.7);
    }

    #[test]
    fn query_by_regex() {
        let intent = classify("cuántos clientes tengo");
        assert_eq!(intent.kind, IntentKind::QueryData);
    }

    #[test]
    fn chart_and_export_and_analyze() {
        assert_eq!(
            classify("muéstrame una gráfica de ventas").kind,
            IntentKind::GenerateChart
        );
        assert_eq!(
            classify("exporta el reporte en pdf").kind,
            IntentKind::ExportReport
        );
        assert_eq!(classify("analiza las ventas del mes").kind, IntentKind::Analyze);
    }

    #[test]
    fn unclassified_falls_to_other() {
        let intent = classify("qwerty zzz");
        assert_eq!(intent.kind, IntentKind::Other);
        assert_eq!(intent.confidence, 0.0);
        assert!(intent.matched_span.is_none());
    }

    #[test]
    fn empty_input_is_other() {
        assert_eq!(classify("   ").kind, IntentKind::Other);
    }

    #[test]
    fn confidence_always_in_bounds() {
        for text in [
            "ir a ventas",
            "registra un gasto de 5000 para gasolina y algo muy largo que estira el span",
            "gasto gasto gasto gasto gasto",
            "",
        ] {
            let c = classify(text).confidence;
            assert!((0.0..=MAX_CONFIDENCE).contains(&c), "confidence {} for {:?}", c, text);
        }
    }

    #[test]
    fn regex_beats_keyword_overlap() {
        // "gasto" is a CreateRecord keyword, but the query regex must win
        // because regexes always take priority over keyword scoring.
        let intent = classify("cuántos gastos tengo este mes");
        assert_eq!(intent.kind, IntentKind::QueryData);
        assert!(intent.matched_span.is_some());
    }

    #[test]
    fn keyword_tie_breaks_to_first_declared() {
        // One occurrence each of a CreateRecord keyword and an ExportReport
        // keyword, no regex match: CreateRecord is declared earlier.
        let intent = classify("quisiera algo del ingreso y del excel");
        assert_eq!(intent.kind, IntentKind::CreateRecord);
        assert!((intent.confidence - KEYWORD_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn keyword_confidence_is_capped() {
        let intent = classify("gasto gasto gasto gasto gasto gasto quisiera");
        assert!(intent.confidence <= KEYWORD_CAP);
    }
}
