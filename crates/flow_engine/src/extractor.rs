//! Intent-scoped entity extraction.
//!
//! Each sub-extractor is pure and total: it either finds its entity or
//! returns `None` (dates and time ranges default instead). The chain run for
//! an utterance is fixed by the intent kind. `today` is threaded in so
//! relative dates ("ayer") are deterministic under test.

use chrono::{Duration, NaiveDate};
use flow_common::{
    ChartKind, DataSubject, EntityBag, IntentKind, Panel, PendingConfirmation, QueryType,
    RecordKind, ReportFormat, TimeRange,
};
use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT_CURRENCY_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d{1,3}(?:,\d{3})*(?:\.\d+)?|\d+(?:\.\d+)?)").unwrap());
static AMOUNT_CURRENCY_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:pesos|d[oó]lares|usd|mxn)\b").unwrap());
static AMOUNT_PREPOSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:de|por)\s+\$?(\d+(?:\.\d+)?)\b").unwrap());
static AMOUNT_TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s+(?:para|por)\b").unwrap());
static BARE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\$?\s*(\d{1,3}(?:,\d{3})*(?:\.\d+)?|\d+(?:\.\d+)?)\s*$").unwrap());

static ABSOLUTE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap());
static LAST_N_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[uú]ltim[oa]s?\s+(\d+)\s+d[ií]as").unwrap());

static CONCEPT_POSITIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\bpara\b|\bconcepto\s*:?|\bde\b)\s+([a-záéíóúñü]+(?:\s+[a-záéíóúñü]+){0,2})")
        .unwrap()
});

/// Words that end or invalidate a positional concept capture.
const STOP_WORDS: &[&str] = &[
    "de", "del", "el", "la", "los", "las", "un", "una", "que", "mi", "tu", "este", "esta", "y",
    "o", "en", "con", "por", "para", "al", "hoy", "ayer",
];

/// Domain words that are never concepts themselves.
const NON_CONCEPT_WORDS: &[&str] = &[
    "gasto", "gastos", "ingreso", "ingresos", "abono", "abonos", "venta", "ventas", "registro",
    "pesos", "dolares", "dólares", "usd", "mxn", "tipo",
];

/// Fixed concept vocabulary scanned when no positional match lands.
const CONCEPT_VOCABULARY: &[&str] = &[
    "gasolina", "comida", "renta", "nómina", "nomina", "luz", "agua", "internet", "viáticos",
    "viaticos", "mantenimiento", "publicidad", "transporte", "oficina",
];

/// Ordered panel keyword table. First hit wins, so the two-word vault names
/// come before anything that could shadow them.
const PANEL_KEYWORDS: &[(&str, Panel)] = &[
    ("bóveda monte", Panel::BovedaMonte),
    ("boveda monte", Panel::BovedaMonte),
    ("bóveda usa", Panel::BovedaUsa),
    ("boveda usa", Panel::BovedaUsa),
    ("dashboard", Panel::Dashboard),
    ("inicio", Panel::Dashboard),
    ("gya", Panel::Gya),
    ("venta", Panel::Ventas),
    ("cliente", Panel::Clientes),
    ("distribuidor", Panel::Distribuidores),
    ("almacén", Panel::Almacen),
    ("almacen", Panel::Almacen),
    ("inventario", Panel::Almacen),
    ("reporte", Panel::Reportes),
    ("analytics", Panel::Analytics),
];

const DESTINATION_KEYWORDS: &[(&str, &str)] = &[
    ("bóveda monte", "Bóveda Monte"),
    ("boveda monte", "Bóveda Monte"),
    ("bóveda usa", "Bóveda USA"),
    ("boveda usa", "Bóveda USA"),
    ("almacén", "Almacén"),
    ("almacen", "Almacén"),
];

const SUBJECT_KEYWORDS: &[(&str, DataSubject)] = &[
    ("venta", DataSubject::Ventas),
    ("gasto", DataSubject::Gastos),
    ("ingreso", DataSubject::Ingresos),
    ("cliente", DataSubject::Clientes),
    ("distribuidor", DataSubject::Distribuidores),
    ("gya", DataSubject::Gya),
];

/// Run the extraction chain for the given intent.
pub fn extract(text: &str, kind: IntentKind, today: NaiveDate) -> EntityBag {
    let t = text.trim().to_lowercase();

    match kind {
        IntentKind::Navigate => EntityBag::Navigate {
            panel: extract_panel(&t),
        },
        IntentKind::CreateRecord => EntityBag::CreateRecord {
            record_type: extract_record_kind(&t),
            amount: extract_amount(&t),
            concept: extract_concept(&t),
            destination: extract_destination(&t),
            date: extract_date(&t, today),
        },
        IntentKind::QueryData => EntityBag::Query {
            query_type: extract_query_type(&t),
            subject: extract_subject(&t),
            time_range: extract_time_range(&t),
        },
        IntentKind::GenerateChart => EntityBag::Chart {
            chart_type: extract_chart_kind(&t),
            data_source: extract_subject(&t).unwrap_or(DataSubject::Ventas),
            time_range: extract_time_range(&t),
        },
        IntentKind::ExportReport => EntityBag::Export {
            format: extract_format(&t),
            subject: extract_subject(&t),
            time_range: extract_time_range(&t),
        },
        IntentKind::Analyze => EntityBag::Analyze {
            query: text.trim().to_string(),
        },
        IntentKind::Help | IntentKind::Other => EntityBag::Empty,
    }
}

/// Fill the missing fields of a pending confirmation from a follow-up reply.
///
/// Only absent fields are touched; already-confirmed values never change.
/// Bare replies get lenient treatment: a lone number fills the amount and a
/// short word-only reply fills the concept, since clarification answers
/// rarely repeat the sentence context the normal patterns expect.
pub fn fill_pending(pending: &mut PendingConfirmation, reply: &str) {
    let t = reply.trim().to_lowercase();

    if pending.amount.is_none() {
        pending.amount = extract_amount(&t).or_else(|| bare_amount(&t));
    }
    if pending.concept.is_none() {
        pending.concept = extract_concept(&t).or_else(|| bare_concept(&t));
    }
    if pending.destination.is_none() {
        pending.destination = extract_destination(&t);
    }
}

/// Amount: four patterns tried in order, first hit wins.
pub fn extract_amount(t: &str) -> Option<f64> {
    for re in [
        &*AMOUNT_CURRENCY_SYMBOL,
        &*AMOUNT_CURRENCY_WORD,
        &*AMOUNT_PREPOSITION,
        &*AMOUNT_TRAILING,
    ] {
        if let Some(caps) = re.captures(t) {
            let raw = caps[1].replace(',', "");
            if let Ok(v) = raw.parse::<f64>() {
                return Some(v);
            }
        }
    }
    None
}

fn bare_amount(t: &str) -> Option<f64> {
    BARE_AMOUNT
        .captures(t)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
}

/// Date: relative keywords before the absolute `DD/MM/YYYY` pattern, always
/// defaulting to today. Never returns an absent date.
pub fn extract_date(t: &str, today: NaiveDate) -> NaiveDate {
    if contains_word(t, "hoy") {
        return today;
    }
    if contains_word(t, "ayer") {
        return today - Duration::days(1);
    }
    if contains_word(t, "mañana") || contains_word(t, "manana") {
        return today + Duration::days(1);
    }

    if let Some(caps) = ABSOLUTE_DATE.captures(t) {
        let (d, m, y) = (
            caps[1].parse::<u32>().unwrap_or(0),
            caps[2].parse::<u32>().unwrap_or(0),
            caps[3].parse::<i32>().unwrap_or(0),
        );
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return date;
        }
    }

    today
}

/// Time range: ordered keyword checks with an all-time default. The
/// `últimos N días` pattern comes last so the fixed keywords keep priority.
pub fn extract_time_range(t: &str) -> TimeRange {
    if contains_word(t, "hoy") {
        return TimeRange::Today;
    }
    if contains_word(t, "ayer") {
        return TimeRange::Yesterday;
    }
    if t.contains("esta semana") {
        return TimeRange::ThisWeek;
    }
    if t.contains("mes pasado") {
        return TimeRange::LastMonth;
    }
    if t.contains("este mes") {
        return TimeRange::ThisMonth;
    }
    if t.contains("este año") {
        return TimeRange::ThisYear;
    }
    if t.contains("trimestre") {
        return TimeRange::Quarter;
    }
    if let Some(caps) = LAST_N_DAYS.captures(t) {
        if let Ok(n) = caps[1].parse::<u32>() {
            return TimeRange::LastDays(n);
        }
    }
    TimeRange::AllTime
}

pub fn extract_panel(t: &str) -> Option<Panel> {
    PANEL_KEYWORDS
        .iter()
        .find(|(kw, _)| contains_keyword(t, kw))
        .map(|(_, p)| *p)
}

pub fn extract_destination(t: &str) -> Option<String> {
    DESTINATION_KEYWORDS
        .iter()
        .find(|(kw, _)| contains_keyword(t, kw))
        .map(|(_, d)| d.to_string())
}

/// Concept: positional `para|de|concepto: X` capture trimmed at stop words,
/// falling back to a fixed vocabulary scan.
pub fn extract_concept(t: &str) -> Option<String> {
    for caps in CONCEPT_POSITIONAL.captures_iter(t) {
        let candidate: Vec<&str> = caps[1]
            .split_whitespace()
            .take_while(|w| !STOP_WORDS.contains(w))
            .collect();
        match candidate.first() {
            Some(first) if !NON_CONCEPT_WORDS.contains(first) => {
                return Some(candidate.join(" "));
            }
            _ => continue,
        }
    }

    CONCEPT_VOCABULARY
        .iter()
        .find(|word| t.contains(*word))
        .map(|w| w.to_string())
}

fn bare_concept(t: &str) -> Option<String> {
    let words: Vec<&str> = t.split_whitespace().collect();
    let all_letters = !words.is_empty()
        && words.len() <= 3
        && words.iter().all(|w| w.chars().all(|c| c.is_alphabetic()));
    if all_letters && !NON_CONCEPT_WORDS.contains(&words[0]) {
        Some(words.join(" "))
    } else {
        None
    }
}

pub fn extract_record_kind(t: &str) -> RecordKind {
    if t.contains("ingreso") {
        RecordKind::Ingreso
    } else if t.contains("abono") {
        RecordKind::Abono
    } else {
        RecordKind::Gasto
    }
}

pub fn extract_query_type(t: &str) -> QueryType {
    if t.contains("cuánt") || t.contains("cuant") {
        QueryType::Count
    } else if t.contains("total") || t.contains("suma") {
        QueryType::Sum
    } else if t.contains("promedio") || t.contains("media") {
        QueryType::Avg
    } else if t.contains("busca") || t.contains("encuentra") || t.contains("filtra") {
        QueryType::Find
    } else {
        QueryType::General
    }
}

pub fn extract_subject(t: &str) -> Option<DataSubject> {
    SUBJECT_KEYWORDS
        .iter()
        .find(|(kw, _)| contains_keyword(t, kw))
        .map(|(_, s)| *s)
}

pub fn extract_chart_kind(t: &str) -> ChartKind {
    if t.contains("barra") {
        ChartKind::Bar
    } else if t.contains("pastel") || t.contains("pie") {
        ChartKind::Pie
    } else {
        ChartKind::Line
    }
}

pub fn extract_format(t: &str) -> ReportFormat {
    if t.contains("excel") || t.contains("xlsx") {
        ReportFormat::Excel
    } else if t.contains("csv") {
        ReportFormat::Csv
    } else {
        ReportFormat::Pdf
    }
}

/// Keyword tables match stem prefixes ("venta" covers "ventas"), but only at
/// the start of a word, so "venta" never fires inside "inventario".
fn contains_keyword(t: &str, kw: &str) -> bool {
    t.match_indices(kw).any(|(i, _)| {
        t[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphabetic())
    })
}

fn contains_word(t: &str, word: &str) -> bool {
    t.split(|c: char| !c.is_alphanumeric() && c != 'ñ' && c != 'á' && c != 'é' && c != 'í'
        && c != 'ó' && c != 'ú')
        .any(|w| w == word)
}
