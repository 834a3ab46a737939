pub mod enums;
pub mod error;
pub mod record;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, PositionStatus, Table};
pub use error::CoreError;
pub use record::{Record, Rows, Value};
pub use structs::{DashboardSummary, HealthReport, HealthStatus, TimelineData, TradingStats};
