//! Trait seams to the dashboard's data, chart and report backends.
//!
//! The engine never owns business data. Queries, charts and exports go
//! through these traits so the UI shell (or a test) decides what actually
//! backs them. All methods are synchronous: the real backends are in-memory
//! dashboard stores, and keeping these seams sync keeps the router pure.

use flow_common::{ChartSpec, DataSubject, ReportHandle, ReportSpec, TimeRange};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Aggregate dashboard figures injected into generation prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_ventas: f64,
    pub total_gastos: f64,
    pub total_ingresos: f64,
    pub clientes: u64,
    pub distribuidores: u64,
}

/// Read access to dashboard collections.
pub trait DashboardData: Send + Sync {
    fn count(&self, subject: DataSubject, range: TimeRange) -> anyhow::Result<u64>;
    fn sum(&self, subject: DataSubject, range: TimeRange) -> anyhow::Result<f64>;
    fn average(&self, subject: DataSubject, range: TimeRange) -> anyhow::Result<f64>;
    /// Short human-readable summaries of matching records, newest first.
    fn find(&self, subject: DataSubject, range: TimeRange) -> anyhow::Result<Vec<String>>;
    fn stats(&self) -> anyhow::Result<DashboardStats>;
}

/// Opaque chart generation; returns a handle the UI resolves to a widget.
pub trait ChartService: Send + Sync {
    fn generate(&self, spec: &ChartSpec) -> anyhow::Result<String>;
}

/// Opaque report export.
pub trait ReportService: Send + Sync {
    fn export(&self, spec: &ReportSpec) -> anyhow::Result<ReportHandle>;
}

/// Bundle of backend handles passed to the router and session.
#[derive(Clone)]
pub struct Services {
    pub data: Arc<dyn DashboardData>,
    pub charts: Arc<dyn ChartService>,
    pub reports: Arc<dyn ReportService>,
}

impl Services {
    pub fn new(
        data: Arc<dyn DashboardData>,
        charts: Arc<dyn ChartService>,
        reports: Arc<dyn ReportService>,
    ) -> Self {
        Self {
            data,
            charts,
            reports,
        }
    }
}
