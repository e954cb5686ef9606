//! Prompt builders for the generation fallback.
//!
//! The system context grounds the model in live dashboard figures so
//! free-form answers stay anchored to real numbers instead of inventing
//! them. All prompts are Spanish, matching the product surface.

use crate::services::DashboardStats;
use flow_common::Panel;

/// System message for conversational generation.
pub fn system_context(stats: &DashboardStats, current_panel: Option<Panel>) -> String {
    let panel = current_panel.map(|p| p.label()).unwrap_or("Dashboard");
    format!(
        "Eres el asistente del panel de control financiero de la empresa. \
         Respondes siempre en español, de forma breve y directa.\n\
         Datos actuales del negocio:\n\
         - Ventas totales: ${:.2}\n\
         - Gastos totales: ${:.2}\n\
         - Ingresos totales: ${:.2}\n\
         - Clientes registrados: {}\n\
         - Distribuidores: {}\n\
         Panel actual: {}.\n\
         Si te piden acciones que no puedes ejecutar, explica qué comandos \
         sí entiendes (navegar, registrar gastos, consultar datos, gráficas, \
         reportes).",
        stats.total_ventas,
        stats.total_gastos,
        stats.total_ingresos,
        stats.clientes,
        stats.distribuidores,
        panel,
    )
}

/// One-shot prompt for ANALYZE requests.
pub fn analysis_prompt(query: &str, stats: &DashboardStats) -> String {
    format!(
        "Analiza los datos del negocio y responde en español.\n\
         Cifras actuales: ventas ${:.2}, gastos ${:.2}, ingresos ${:.2}, \
         {} clientes, {} distribuidores.\n\
         Petición del usuario: {}\n\
         Da un análisis concreto con números y, si aplica, una recomendación.",
        stats.total_ventas,
        stats.total_gastos,
        stats.total_ingresos,
        stats.clientes,
        stats.distribuidores,
        query,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_context_includes_stats_and_panel() {
        let stats = DashboardStats {
            total_ventas: 1500.0,
            total_gastos: 300.5,
            ..Default::default()
        };
        let ctx = system_context(&stats, Some(Panel::Ventas));
        assert!(ctx.contains("$1500.00"));
        assert!(ctx.contains("$300.50"));
        assert!(ctx.contains("Panel actual: Ventas"));
    }

    #[test]
    fn system_context_defaults_to_dashboard_panel() {
        let ctx = system_context(&DashboardStats::default(), None);
        assert!(ctx.contains("Panel actual: Dashboard"));
    }

    #[test]
    fn analysis_prompt_embeds_query() {
        let p = analysis_prompt("tendencia de ventas", &DashboardStats::default());
        assert!(p.contains("tendencia de ventas"));
    }
}
