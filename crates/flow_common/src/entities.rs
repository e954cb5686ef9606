//! Typed entity bags, one variant per intent kind.
//!
//! The original duck-typed bag silently dropped fields at the router
//! boundary; here every intent gets a fixed, typed field set. An absent
//! entity is an explicit `None`, never a missing key. Dates are always
//! defaulted, never absent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Dashboard panels the assistant can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Dashboard,
    Gya,
    Ventas,
    Clientes,
    Distribuidores,
    BovedaUsa,
    BovedaMonte,
    Almacen,
    Reportes,
    Analytics,
}

impl Panel {
    /// All panels, in the order they are listed to the user.
    pub const ALL: [Panel; 10] = [
        Panel::Dashboard,
        Panel::Gya,
        Panel::Ventas,
        Panel::Clientes,
        Panel::Distribuidores,
        Panel::BovedaUsa,
        Panel::BovedaMonte,
        Panel::Almacen,
        Panel::Reportes,
        Panel::Analytics,
    ];

    /// Navigation target id used by the UI shell.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Gya => "gya",
            Self::Ventas => "ventas",
            Self::Clientes => "clientes",
            Self::Distribuidores => "distribuidores",
            Self::BovedaUsa => "bovedaUsa",
            Self::BovedaMonte => "bovedaMonte",
            Self::Almacen => "almacen",
            Self::Reportes => "reportes",
            Self::Analytics => "analytics",
        }
    }

    /// Human-facing label (Spanish, matches the dashboard).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Gya => "GYA",
            Self::Ventas => "Ventas",
            Self::Clientes => "Clientes",
            Self::Distribuidores => "Distribuidores",
            Self::BovedaUsa => "Bóveda USA",
            Self::BovedaMonte => "Bóveda Monte",
            Self::Almacen => "Almacén",
            Self::Reportes => "Reportes",
            Self::Analytics => "Analytics",
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of financial record a CREATE_RECORD utterance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Gasto,
    Ingreso,
    Abono,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gasto => "Gasto",
            Self::Ingreso => "Ingreso",
            Self::Abono => "Abono",
        }
    }
}

/// What a QUERY_DATA utterance is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Count,
    Sum,
    Find,
    Avg,
    #[default]
    General,
}

/// Collections a query, chart or report can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSubject {
    Ventas,
    Gastos,
    Ingresos,
    Clientes,
    Distribuidores,
    Gya,
}

impl DataSubject {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ventas => "ventas",
            Self::Gastos => "gastos",
            Self::Ingresos => "ingresos",
            Self::Clientes => "clientes",
            Self::Distribuidores => "distribuidores",
            Self::Gya => "gya",
        }
    }
}

/// Reporting window. `AllTime` is the extractor default, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    Quarter,
    LastDays(u32),
    #[default]
    AllTime,
}

/// Chart shapes the chart service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Pie,
}

/// Export formats the report service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Excel,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// Entities extracted from one utterance, shaped by its intent.
///
/// Every intent maps to exactly one variant; `Empty` covers Help/Other where
/// nothing is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum EntityBag {
    Navigate {
        panel: Option<Panel>,
    },
    CreateRecord {
        record_type: RecordKind,
        amount: Option<f64>,
        concept: Option<String>,
        destination: Option<String>,
        date: NaiveDate,
    },
    Query {
        query_type: QueryType,
        subject: Option<DataSubject>,
        time_range: TimeRange,
    },
    Chart {
        chart_type: ChartKind,
        data_source: DataSubject,
        time_range: TimeRange,
    },
    Export {
        format: ReportFormat,
        subject: Option<DataSubject>,
        time_range: TimeRange,
    },
    Analyze {
        query: String,
    },
    Empty,
}

impl EntityBag {
    /// True when no entity was extracted at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_roundtrip_labels() {
        for p in Panel::ALL {
            assert!(!p.as_str().is_empty());
            assert!(!p.label().is_empty());
        }
    }

    #[test]
    fn defaults_match_extractor_contract() {
        assert_eq!(RecordKind::default(), RecordKind::Gasto);
        assert_eq!(TimeRange::default(), TimeRange::AllTime);
        assert_eq!(QueryType::default(), QueryType::General);
        assert_eq!(ReportFormat::default().extension(), "pdf");
    }

    #[test]
    fn entity_bag_serializes_with_intent_tag() {
        let bag = EntityBag::Navigate {
            panel: Some(Panel::Ventas),
        };
        let json = serde_json::to_string(&bag).unwrap();
        assert!(json.contains("\"intent\":\"navigate\""));
        assert!(json.contains("\"ventas\""));
    }
}
