//! Total dispatch over classified utterances.
//!
//! Every intent/entity combination maps to exactly one outcome: a finished
//! response (possibly carrying a side effect for the UI shell), or a
//! generation task for the provider fallback. The router itself performs no
//! I/O beyond the injected service seams and never fails the session.

use crate::services::Services;
use flow_common::{
    ChartSpec, DataSubject, EntityBag, Intent, Panel, PendingConfirmation, QueryType,
    RecordDraft, RecordKind, ReportSpec, Response, ResponseKind, SideEffect,
};
use chrono::NaiveDate;
use tracing::info;

/// Work the router could not finish deterministically.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationTask {
    /// Free-form conversation over the session history.
    Conversation,
    /// One-shot analysis over the given query.
    Analysis { query: String },
}

/// Result of routing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Done(Response),
    Generate(GenerationTask),
}

/// Route a classified utterance. `pending` is written when a record creation
/// is missing required fields; filling it is the session's job on the next
/// utterance.
pub fn route(
    text: &str,
    intent: &Intent,
    entities: EntityBag,
    pending: &mut Option<PendingConfirmation>,
    services: &Services,
) -> RouteOutcome {
    info!(intent = %intent.kind, confidence = intent.confidence, "routing utterance");

    match entities {
        EntityBag::Navigate { panel } => RouteOutcome::Done(navigate(panel)),
        EntityBag::CreateRecord {
            record_type,
            amount,
            concept,
            destination,
            date,
        } => RouteOutcome::Done(create_record(
            text,
            record_type,
            amount,
            concept,
            destination,
            date,
            pending,
        )),
        EntityBag::Query {
            query_type,
            subject,
            time_range,
        } => match query_type {
            QueryType::General => RouteOutcome::Generate(GenerationTask::Conversation),
            _ => RouteOutcome::Done(query(query_type, subject, time_range, services)),
        },
        EntityBag::Chart {
            chart_type,
            data_source,
            time_range,
        } => {
            let spec = ChartSpec {
                chart_type,
                data_source,
                time_range,
            };
            RouteOutcome::Done(chart(spec, services))
        }
        EntityBag::Export {
            format,
            subject,
            time_range,
        } => {
            let spec = ReportSpec {
                format,
                subject,
                time_range,
            };
            RouteOutcome::Done(export(spec, services))
        }
        EntityBag::Analyze { query } => {
            RouteOutcome::Generate(GenerationTask::Analysis { query })
        }
        // Help and Other both go to the model; the system context lists the
        // supported commands, so usage questions get a grounded answer.
        EntityBag::Empty => RouteOutcome::Generate(GenerationTask::Conversation),
    }
}

fn navigate(panel: Option<Panel>) -> Response {
    match panel {
        Some(p) => Response::success(format!("Abriendo {}.", p.label()))
            .with_side_effect(SideEffect::Navigate { panel: p }),
        None => {
            let names: Vec<&str> = Panel::ALL.iter().map(|p| p.label()).collect();
            Response::info(format!(
                "¿A qué panel quieres ir? Tengo: {}.",
                names.join(", ")
            ))
        }
    }
}

fn create_record(
    text: &str,
    record_type: RecordKind,
    amount: Option<f64>,
    concept: Option<String>,
    destination: Option<String>,
    date: NaiveDate,
    pending: &mut Option<PendingConfirmation>,
) -> Response {
    match (amount, concept) {
        (Some(amount), Some(concept)) => {
            *pending = None;
            record_created(record_type, amount, concept, destination, date, text)
        }
        (amount, concept) => {
            let held = PendingConfirmation {
                record_type,
                amount,
                concept,
                destination,
                date,
                original: text.to_string(),
            };
            let question = clarification_question(&held);
            *pending = Some(held);
            question
        }
    }
}

/// Build the success response (and side effect) for a fully specified record.
pub(crate) fn record_created(
    record_type: RecordKind,
    amount: f64,
    concept: String,
    destination: Option<String>,
    date: NaiveDate,
    source_text: &str,
) -> Response {
    let destination = destination.unwrap_or_else(|| "General".to_string());
    let text = format!(
        "{} de ${:.2} por \"{}\" registrado en {}.",
        record_type.label(),
        amount,
        concept,
        destination
    );
    let draft = RecordDraft {
        record_type,
        amount,
        concept,
        destination,
        date,
        note: format!("Creado por asistente: \"{}\"", source_text),
    };
    Response::success(text).with_side_effect(SideEffect::CreateRecord { draft })
}

/// The question asked while a confirmation stays open.
pub(crate) fn clarification_question(pending: &PendingConfirmation) -> Response {
    Response::question(format!(
        "Para registrar el {} me falta: {}. ¿Me lo das?",
        pending.record_type.label().to_lowercase(),
        pending.missing_fields().join(" y ")
    ))
}

fn query(
    query_type: QueryType,
    subject: Option<DataSubject>,
    time_range: flow_common::TimeRange,
    services: &Services,
) -> Response {
    let subject = subject.unwrap_or(DataSubject::Ventas);
    let result = match query_type {
        QueryType::Count => services
            .data
            .count(subject, time_range)
            .map(|n| format!("Tienes {} {} en ese periodo.", n, subject.label())),
        QueryType::Sum => services
            .data
            .sum(subject, time_range)
            .map(|v| format!("El total de {} es ${:.2}.", subject.label(), v)),
        QueryType::Avg => services
            .data
            .average(subject, time_range)
            .map(|v| format!("El promedio de {} es ${:.2}.", subject.label(), v)),
        QueryType::Find => services.data.find(subject, time_range).map(|rows| {
            if rows.is_empty() {
                format!("No encontré {} en ese periodo.", subject.label())
            } else {
                let shown: Vec<&str> = rows.iter().take(5).map(String::as_str).collect();
                format!("Esto encontré:\n{}", shown.join("\n"))
            }
        }),
        // General is handled by the caller before reaching here.
        QueryType::General => Ok(String::new()),
    };

    match result {
        Ok(text) => Response::success(text),
        Err(e) => Response::error(format!("No pude consultar los datos: {}", e)),
    }
}

fn chart(spec: ChartSpec, services: &Services) -> Response {
    match services.charts.generate(&spec) {
        Ok(handle) => Response::new(
            ResponseKind::Chart,
            format!("Aquí tienes la gráfica de {}.", spec.data_source.label()),
        )
        .with_side_effect(SideEffect::ShowChart { spec, handle }),
        Err(e) => Response::error(format!("No pude generar la gráfica: {}", e)),
    }
}

fn export(spec: ReportSpec, services: &Services) -> Response {
    match services.reports.export(&spec) {
        Ok(report) => Response::success(format!("Reporte exportado: {}.", report.filename))
            .with_side_effect(SideEffect::ReportExported { report }),
        Err(e) => Response::error(format!("No pude exportar el reporte: {}", e)),
    }
}
