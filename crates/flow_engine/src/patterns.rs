//! Static pattern table driving intent classification.
//!
//! One ordered entry per intent: a list of regexes tried first, then a
//! keyword list used for occurrence scoring when no regex matches anywhere.
//! Declaration order is the precedence order and the keyword tie-break, so
//! changing the order here changes classification. The table is data, not
//! code: dispatch logic never embeds a pattern.

use flow_common::IntentKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns for a single intent.
pub struct IntentPatterns {
    pub kind: IntentKind,
    pub regexes: Vec<Regex>,
    pub keywords: &'static [&'static str],
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern table regex"))
        .collect()
}

/// The classification table, compiled once. Input is lower-cased and trimmed
/// before matching, so every pattern is written in lower case.
pub static PATTERN_TABLE: Lazy<Vec<IntentPatterns>> = Lazy::new(|| {
    vec![
        IntentPatterns {
            kind: IntentKind::Navigate,
            regexes: compile(&[
                r"\b(?:ir|ve|vamos|ll[eé]vame)\s+a(?:l)?\b",
                r"\babr(?:e|ir)\b",
                r"\bmu[eé]strame\s+(?:el\s+)?panel\b",
                r"\bpanel\s+de\b",
            ]),
            keywords: &["panel", "navega", "abrir", "dashboard"],
        },
        IntentPatterns {
            kind: IntentKind::CreateRecord,
            regexes: compile(&[
                r"\b(?:registra|registrar|crea|crear|agrega|agregar|a[ñn]ade|anota|apunta)\b",
                r"\bnuev[oa]\s+(?:gasto|ingreso|abono|venta|registro)\b",
                r"\bgast[eé]\b",
                r"\bpag(?:a|u[eé])\b",
            ]),
            keywords: &["gasto", "ingreso", "abono", "registro", "nuevo"],
        },
        IntentPatterns {
            kind: IntentKind::QueryData,
            regexes: compile(&[
                r"\bcu[aá]nt[oa]s?\b",
                r"\btotal\s+de\b",
                r"\bpromedio\b",
                r"\b(?:busca|encuentra|filtra)\b",
            ]),
            keywords: &["total", "suma", "cuantos", "cuanto", "busca"],
        },
        IntentPatterns {
            kind: IntentKind::GenerateChart,
            regexes: compile(&[
                r"\bgr[aá]fic[ao]s?\b",
                r"\bvisualizaci[oó]n\b",
            ]),
            keywords: &["grafica", "gráfica", "chart", "visualiza"],
        },
        IntentPatterns {
            kind: IntentKind::ExportReport,
            regexes: compile(&[
                r"\bexport(?:a|ar)\b",
                r"\bdescarga(?:r)?\s+(?:el\s+)?reporte\b",
                r"\breporte\b.*\b(?:pdf|excel|csv)\b",
            ]),
            keywords: &["reporte", "exporta", "pdf", "excel", "csv"],
        },
        IntentPatterns {
            kind: IntentKind::Analyze,
            regexes: compile(&[
                r"\banaliza(?:r)?\b",
                r"\ban[aá]lisis\b",
                r"\btendencias?\b",
                r"\bpredic(?:e|ci[oó]n)\b",
            ]),
            keywords: &["analiza", "tendencia", "recomienda", "insights"],
        },
        IntentPatterns {
            kind: IntentKind::Help,
            regexes: compile(&[
                r"\bayuda\b",
                r"\bqu[eé]\s+puedes\s+hacer\b",
                r"\bc[oó]mo\s+(?:te\s+uso|funciona)\b",
            ]),
            keywords: &["ayuda", "help"],
        },
    ]
});
