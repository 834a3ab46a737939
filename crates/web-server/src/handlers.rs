use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use core_types::{DashboardSummary, HealthReport, Record, TimelineData, TradingStats, Value};
use database::DateRange;
use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysesParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
    /// Join each analysis with the news item it refers to.
    #[serde(default)]
    pub with_news: bool,
}

#[derive(Debug, Deserialize)]
pub struct TradesParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

impl DateRangeParams {
    fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Reads an optional query-string value. An empty value (`?symbol=`) counts
/// as absent, the same as leaving the parameter out.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

fn found(record: Option<Record>, what: &str, id: &str) -> Result<Json<Record>, AppError> {
    record
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
}

/// # GET /api/health
/// Always 200; the body says whether the database answered.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.db_repo.health_check().await)
}

/// # GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.db_repo.get_dashboard_summary().await?))
}

/// # GET /api/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<TradingStats>, AppError> {
    Ok(Json(state.db_repo.get_trading_stats().await?))
}

/// # GET /api/timeline?start_date=&end_date=&limit=
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<TimelineData>, AppError> {
    let timeline = state
        .db_repo
        .get_timeline_data(&params.range(), params.limit)
        .await?;
    Ok(Json(timeline))
}

/// # GET /api/news
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.db_repo.get_news(params.limit).await?))
}

/// # GET /api/news/:id
pub async fn get_news_item(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Record>, AppError> {
    let record = state.db_repo.get_news_by_id(Value::from_param(&id)).await?;
    found(record, "News item", &id)
}

/// # GET /api/analyses?limit=&with_news=
pub async fn get_analyses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalysesParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    let analyses = if params.with_news {
        state.db_repo.get_analyses_with_news(params.limit).await?
    } else {
        state.db_repo.get_analyses(params.limit).await?
    };
    Ok(Json(analyses))
}

/// # GET /api/analyses/:id
pub async fn get_analysis(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Record>, AppError> {
    let record = state.db_repo.get_analysis_by_id(Value::from_param(&id)).await?;
    found(record, "Analysis", &id)
}

/// # GET /api/trades?symbol=&limit=
pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TradesParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    let trades = state
        .db_repo
        .get_trades(params.symbol.as_deref(), params.limit)
        .await?;
    Ok(Json(trades))
}

/// # GET /api/trades/:id
pub async fn get_trade(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Record>, AppError> {
    let record = state.db_repo.get_trade_by_id(Value::from_param(&id)).await?;
    found(record, "Trade", &id)
}

/// # GET /api/positions/open
pub async fn get_open_positions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.db_repo.get_open_positions().await?))
}

/// # GET /api/positions/history
pub async fn get_position_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.db_repo.get_position_history(params.limit).await?))
}

/// # GET /api/positions?start_date=&end_date=&limit=
pub async fn get_positions_filtered(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    let positions = state
        .db_repo
        .get_positions_filtered(&params.range(), params.limit)
        .await?;
    Ok(Json(positions))
}

/// # GET /api/positions/:id
pub async fn get_position(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Record>, AppError> {
    let record = state.db_repo.get_position_by_id(Value::from_param(&id)).await?;
    found(record, "Position", &id)
}

/// # GET /api/portfolio/latest
pub async fn get_latest_portfolio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Record>, AppError> {
    state
        .db_repo
        .get_latest_portfolio()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No portfolio snapshot recorded yet".to_string()))
}

/// # GET /api/portfolio/history
pub async fn get_portfolio_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.db_repo.get_portfolio_history(params.limit).await?))
}

/// # GET /api/events?event_type=&limit=
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsParams>,
) -> Result<Json<Vec<Record>>, AppError> {
    let events = state
        .db_repo
        .get_event_logs(params.event_type.as_deref(), params.limit)
        .await?;
    Ok(Json(events))
}
