use crate::error::DbError;
use crate::query::{Predicate, SelectQuery};
use crate::repository::DbRepository;
use core_types::{OrderSide, PositionStatus, Record, Table, TradingStats};

impl DbRepository {
    /// Trade counts by side plus realized P&L and win rate over closed positions.
    ///
    /// All four aggregates are computed by the database and fetched concurrently.
    pub async fn get_trading_stats(&self) -> Result<TradingStats, DbError> {
        let total_trades = SelectQuery::from(Table::TradeOrders).columns(&["COUNT(*) AS total"]);

        let by_side = SelectQuery::from(Table::TradeOrders)
            .columns(&["side", "COUNT(*) AS count"])
            .group_by("side");

        let pnl = SelectQuery::from(Table::Positions)
            .columns(&[
                "SUM(pnl) AS total_pnl",
                "AVG(pnl_percent) AS avg_pnl_percent",
            ])
            .filter(Predicate::eq("status", PositionStatus::Closed.as_str()));

        let outcomes = SelectQuery::from(Table::Positions)
            .columns(&[
                "SUM(CASE WHEN pnl > 0 THEN 1 ELSE 0 END) AS wins",
                "SUM(CASE WHEN pnl <= 0 THEN 1 ELSE 0 END) AS losses",
                "COUNT(*) AS total",
            ])
            .filter(Predicate::eq("status", PositionStatus::Closed.as_str()));

        let (total_row, side_rows, pnl_row, outcome_row) = tokio::try_join!(
            self.fetch_one(total_trades.render()),
            self.fetch_all(by_side.render()),
            self.fetch_one(pnl.render()),
            self.fetch_one(outcomes.render()),
        )?;

        Ok(assemble_stats(
            total_row.as_ref(),
            &side_rows,
            pnl_row.as_ref(),
            outcome_row.as_ref(),
        ))
    }
}

/// Builds the flat summary from the raw aggregate rows. NULL aggregates
/// (sums and averages over no rows) and absent sides count as zero.
pub fn assemble_stats(
    total_row: Option<&Record>,
    side_rows: &[Record],
    pnl_row: Option<&Record>,
    outcome_row: Option<&Record>,
) -> TradingStats {
    let (mut buy_count, mut sell_count) = (0, 0);
    for row in side_rows {
        let side = row.get("side").and_then(|v| v.as_str()).unwrap_or_default();
        match side.parse::<OrderSide>() {
            Ok(OrderSide::Buy) => buy_count = int(Some(row), "count"),
            Ok(OrderSide::Sell) => sell_count = int(Some(row), "count"),
            Err(e) => tracing::warn!(error = %e, "Ignoring trades with an unknown side."),
        }
    }

    let wins = int(outcome_row, "wins");
    let losses = int(outcome_row, "losses");
    let closed = int(outcome_row, "total");

    let win_rate = if closed > 0 {
        wins as f64 / closed as f64 * 100.0
    } else {
        0.0
    };

    TradingStats {
        total_trades: int(total_row, "total"),
        buy_count,
        sell_count,
        total_pnl: float(pnl_row, "total_pnl"),
        avg_pnl_percent: float(pnl_row, "avg_pnl_percent"),
        wins,
        losses,
        win_rate,
    }
}

fn int(row: Option<&Record>, column: &str) -> i64 {
    row.and_then(|r| r.get(column))
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
}

fn float(row: Option<&Record>, column: &str) -> f64 {
    row.and_then(|r| r.get(column))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}
