//! # Panoptico Database Crate
//!
//! This crate is the read-only data-access layer over the trading bot's
//! telemetry database (news, LLM analyses, trade orders, positions,
//! portfolio snapshots and system events).
//!
//! ## Architectural Principles
//!
//! - **Read Path Only:** Nothing here writes. The bot that produces the
//!   telemetry owns the schema and every row's lifecycle.
//! - **Structured Queries:** Statements are built with [`SelectQuery`] and
//!   rendered once, with every user-supplied value bound as a positional
//!   argument.
//! - **Swappable Transport:** The repository talks to an [`Executor`]. The
//!   remote libSQL client and the local SQLite pool both implement it, and so
//!   can a test double.
//!
//! ## Public API
//!
//! - `connect`: Opens the database named by the configuration, or fails with a
//!   configuration error.
//! - `DbRepository`: All named accessors, aggregates and composites.
//! - `DateRange` / `SelectQuery` / `apply_date_filter`: The query builder.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod executor;
pub mod local;
pub mod query;
pub mod remote;
pub mod repository;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::DbError;
pub use executor::Executor;
pub use local::LocalExecutor;
pub use query::{apply_date_filter, DateRange, Predicate, SelectQuery, Statement};
pub use remote::RemoteExecutor;
pub use repository::DbRepository;
pub use stats::assemble_stats;
