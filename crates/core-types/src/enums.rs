use crate::error::CoreError;
use std::fmt;
use std::str::FromStr;

/// The side of a trade order as stored in the `side` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl FromStr for OrderSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(CoreError::InvalidInput("side".to_string(), other.to_string())),
        }
    }
}

/// Lifecycle state of a position. Only closed positions carry realized P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::Closed => "closed",
        }
    }
}

/// The telemetry tables written by the trading bot.
///
/// Table names only ever reach SQL through this enum, so no caller-supplied
/// string is interpolated into a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    News,
    Analyses,
    TradeOrders,
    Positions,
    PortfolioSnapshots,
    SystemEvents,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::News => "news_monitoring",
            Table::Analyses => "llm_analysis",
            Table::TradeOrders => "trade_orders",
            Table::Positions => "positions",
            Table::PortfolioSnapshots => "portfolio_snapshots",
            Table::SystemEvents => "system_events",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing_is_exact() {
        assert_eq!("buy".parse::<OrderSide>(), Ok(OrderSide::Buy));
        assert_eq!("sell".parse::<OrderSide>(), Ok(OrderSide::Sell));
        assert!("BUY".parse::<OrderSide>().is_err());
    }

    #[test]
    fn test_side_parse_error_names_the_value() {
        let err = "short".parse::<OrderSide>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid input for side: short");
        assert_eq!(PositionStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::News.to_string(), "news_monitoring");
        assert_eq!(Table::Analyses.name(), "llm_analysis");
        assert_eq!(Table::SystemEvents.name(), "system_events");
    }
}
