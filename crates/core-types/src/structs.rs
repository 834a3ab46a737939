use crate::record::Record;
use serde::Serialize;

/// Flat trading summary derived from `trade_orders` and closed `positions`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TradingStats {
    pub total_trades: i64,
    pub buy_count: i64,
    pub sell_count: i64,
    /// Realized P&L summed over closed positions.
    pub total_pnl: f64,
    pub avg_pnl_percent: f64,
    pub wins: i64,
    pub losses: i64,
    /// Percentage of closed positions with `pnl > 0`, or `0.0` when none are closed.
    pub win_rate: f64,
}

/// Everything the dashboard landing page shows in one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub portfolio: Option<Record>,
    pub stats: TradingStats,
    pub open_positions: Vec<Record>,
    pub recent_trades: Vec<Record>,
}

/// News, analyses and trades over a shared date range, each newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimelineData {
    pub news: Vec<Record>,
    pub analyses: Vec<Record>,
    pub trades: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a database round-trip probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            database: Some("connected".to_string()),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            database: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
