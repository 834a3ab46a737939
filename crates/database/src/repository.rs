use crate::error::DbError;
use crate::executor::Executor;
use crate::query::{DateRange, Predicate, SelectQuery, Statement};
use core_types::{
    DashboardSummary, HealthReport, PositionStatus, Record, Table, TimelineData, Value,
};
use std::sync::Arc;

pub const DEFAULT_NEWS_LIMIT: i64 = 20;
pub const DEFAULT_ANALYSES_LIMIT: i64 = 20;
pub const DEFAULT_TRADES_LIMIT: i64 = 50;
pub const DEFAULT_POSITION_HISTORY_LIMIT: i64 = 50;
pub const DEFAULT_PORTFOLIO_HISTORY_LIMIT: i64 = 100;
pub const DEFAULT_EVENTS_LIMIT: i64 = 100;
pub const DEFAULT_FILTERED_LIMIT: i64 = 100;
pub const DEFAULT_TIMELINE_LIMIT: i64 = 100;
/// Number of trades shown on the dashboard summary.
pub const RECENT_TRADES_LIMIT: i64 = 5;

/// The `DbRepository` provides the read-only query surface of the dashboard.
/// It encapsulates all SQL and row shaping; callers only see records and
/// view-models.
#[derive(Clone)]
pub struct DbRepository {
    executor: Arc<dyn Executor>,
}

impl DbRepository {
    /// Creates a new `DbRepository` over a shared database handle.
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Runs a statement and shapes every row into a column-keyed record.
    /// Failures are logged here and returned unchanged.
    pub(crate) async fn fetch_all(&self, statement: Statement) -> Result<Vec<Record>, DbError> {
        match self.executor.execute(&statement).await {
            Ok(rows) => Ok(rows.into_records()),
            Err(e) => {
                tracing::error!(error = %e, sql = %statement.sql, "DB query error.");
                Err(e)
            }
        }
    }

    /// First record of the result, or `None` when there are no rows.
    pub(crate) async fn fetch_one(&self, statement: Statement) -> Result<Option<Record>, DbError> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }

    async fn find_by_id(&self, table: Table, id: Value) -> Result<Option<Record>, DbError> {
        let query = SelectQuery::from(table).filter(Predicate::eq("id", id));
        self.fetch_one(query.render()).await
    }

    async fn newest(&self, table: Table, limit: i64) -> Result<Vec<Record>, DbError> {
        let query = SelectQuery::from(table).newest_first().limit(limit);
        self.fetch_all(query.render()).await
    }

    // --- News ---

    pub async fn get_news(&self, limit: Option<i64>) -> Result<Vec<Record>, DbError> {
        self.newest(Table::News, limit.unwrap_or(DEFAULT_NEWS_LIMIT)).await
    }

    pub async fn get_news_by_id(&self, id: impl Into<Value>) -> Result<Option<Record>, DbError> {
        self.find_by_id(Table::News, id.into()).await
    }

    // --- Analyses ---

    pub async fn get_analyses(&self, limit: Option<i64>) -> Result<Vec<Record>, DbError> {
        self.newest(Table::Analyses, limit.unwrap_or(DEFAULT_ANALYSES_LIMIT)).await
    }

    pub async fn get_analysis_by_id(&self, id: impl Into<Value>) -> Result<Option<Record>, DbError> {
        self.find_by_id(Table::Analyses, id.into()).await
    }

    /// Analyses with the title, source and sentiment of the news item they
    /// reference. A dangling `news_id` yields null news columns, not a missing row.
    pub async fn get_analyses_with_news(&self, limit: Option<i64>) -> Result<Vec<Record>, DbError> {
        let query = SelectQuery::from(Table::Analyses)
            .alias("a")
            .columns(&[
                "a.*",
                "n.title AS news_title",
                "n.source AS news_source",
                "n.sentiment AS news_sentiment",
            ])
            .left_join(Table::News, "n", "a.news_id = n.id")
            .newest_first()
            .limit(limit.unwrap_or(DEFAULT_ANALYSES_LIMIT));
        self.fetch_all(query.render()).await
    }

    // --- Trades ---

    pub async fn get_trades(
        &self,
        symbol: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Record>, DbError> {
        let mut query = SelectQuery::from(Table::TradeOrders);
        if let Some(symbol) = symbol.filter(|s| !s.is_empty()) {
            query = query.filter(Predicate::eq("symbol", symbol));
        }
        let query = query
            .newest_first()
            .limit(limit.unwrap_or(DEFAULT_TRADES_LIMIT));
        self.fetch_all(query.render()).await
    }

    pub async fn get_trade_by_id(&self, id: impl Into<Value>) -> Result<Option<Record>, DbError> {
        self.find_by_id(Table::TradeOrders, id.into()).await
    }

    // --- Positions ---

    /// Every open position, newest first. Not limited.
    pub async fn get_open_positions(&self) -> Result<Vec<Record>, DbError> {
        let query = SelectQuery::from(Table::Positions)
            .filter(Predicate::eq("status", PositionStatus::Open.as_str()))
            .newest_first();
        self.fetch_all(query.render()).await
    }

    pub async fn get_position_history(&self, limit: Option<i64>) -> Result<Vec<Record>, DbError> {
        self.newest(Table::Positions, limit.unwrap_or(DEFAULT_POSITION_HISTORY_LIMIT))
            .await
    }

    pub async fn get_position_by_id(&self, id: impl Into<Value>) -> Result<Option<Record>, DbError> {
        self.find_by_id(Table::Positions, id.into()).await
    }

    pub async fn get_positions_filtered(
        &self,
        range: &DateRange,
        limit: Option<i64>,
    ) -> Result<Vec<Record>, DbError> {
        let query = SelectQuery::from(Table::Positions)
            .date_filter(range)
            .newest_first()
            .limit(limit.unwrap_or(DEFAULT_FILTERED_LIMIT));
        self.fetch_all(query.render()).await
    }

    // --- Portfolio ---

    pub async fn get_latest_portfolio(&self) -> Result<Option<Record>, DbError> {
        let query = SelectQuery::from(Table::PortfolioSnapshots)
            .newest_first()
            .limit(1);
        self.fetch_one(query.render()).await
    }

    pub async fn get_portfolio_history(&self, limit: Option<i64>) -> Result<Vec<Record>, DbError> {
        self.newest(
            Table::PortfolioSnapshots,
            limit.unwrap_or(DEFAULT_PORTFOLIO_HISTORY_LIMIT),
        )
        .await
    }

    // --- Events ---

    pub async fn get_event_logs(
        &self,
        event_type: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Record>, DbError> {
        let mut query = SelectQuery::from(Table::SystemEvents);
        if let Some(event_type) = event_type.filter(|t| !t.is_empty()) {
            query = query.filter(Predicate::eq("event_type", event_type));
        }
        let query = query
            .newest_first()
            .limit(limit.unwrap_or(DEFAULT_EVENTS_LIMIT));
        self.fetch_all(query.render()).await
    }

    // --- Composites ---

    /// Latest portfolio, trading stats, open positions and the five newest
    /// trades, fetched concurrently. Any failing part fails the whole summary.
    pub async fn get_dashboard_summary(&self) -> Result<DashboardSummary, DbError> {
        let (portfolio, stats, open_positions, recent_trades) = tokio::try_join!(
            self.get_latest_portfolio(),
            self.get_trading_stats(),
            self.get_open_positions(),
            self.get_trades(None, Some(RECENT_TRADES_LIMIT)),
        )?;

        Ok(DashboardSummary {
            portfolio,
            stats,
            open_positions,
            recent_trades,
        })
    }

    /// News, analyses and trades over the same date range and limit, fetched
    /// concurrently. System events are not part of the timeline.
    pub async fn get_timeline_data(
        &self,
        range: &DateRange,
        limit: Option<i64>,
    ) -> Result<TimelineData, DbError> {
        let limit = limit.unwrap_or(DEFAULT_TIMELINE_LIMIT);
        let timeline_query = |table: Table| {
            SelectQuery::from(table)
                .date_filter(range)
                .newest_first()
                .limit(limit)
                .render()
        };

        let (news, analyses, trades) = tokio::try_join!(
            self.fetch_all(timeline_query(Table::News)),
            self.fetch_all(timeline_query(Table::Analyses)),
            self.fetch_all(timeline_query(Table::TradeOrders)),
        )?;

        Ok(TimelineData {
            news,
            analyses,
            trades,
        })
    }

    // --- Generic ---

    /// Runs `query` narrowed to `range` on its timestamp column.
    pub async fn query_with_date_filter(
        &self,
        query: SelectQuery,
        range: &DateRange,
    ) -> Result<Vec<Record>, DbError> {
        self.fetch_all(query.date_filter(range).render()).await
    }

    /// Round-trips `SELECT 1`. Never fails; errors are reported in the result.
    pub async fn health_check(&self) -> HealthReport {
        match self.fetch_one(Statement::new("SELECT 1")).await {
            Ok(_) => HealthReport::healthy(),
            Err(e) => HealthReport::unhealthy(e.to_string()),
        }
    }
}
