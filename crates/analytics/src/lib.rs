//! # CPA Analytics
//!
//! The aggregation side of reporting: turns users, their cycles and the
//! cycles' profiles into per-user summary rows.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic over a Seam:** The `AggregationEngine` knows nothing about
//!   Postgres. It reads through the `CycleSource` trait, which the `database`
//!   crate implements over a pooled connection and `memory::MemoryStore`
//!   implements for tests.
//! - **All or Nothing:** A failing read aborts the whole aggregation. Callers
//!   never see a partial set of rows.
//!
//! ## Public API
//!
//! - `AggregationEngine`: `aggregate` a scope over a window, `rank` the result.
//! - `CycleSource` / `SessionProvider`: the data-access seam.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod memory;
pub mod source;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AggregationEngine, Totals, summarize};
pub use error::AnalyticsError;
pub use source::{CycleSource, SessionProvider};
