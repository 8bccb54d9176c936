//! # CPA Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database holding users, cycles and profiles.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application sees
//!   `DbRepository` methods and domain types from `core-types`.
//! - **Runtime-Checked Queries:** Queries are built with `sqlx::query_as` and
//!   `FromRow` row structs, then converted into domain types.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a `PgPool`.
//!   Reporting runs check out one dedicated connection each (`ReportSession`).
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and schema.
//! - `DbRepository`: users, cycles, profile updates; also the `SessionProvider`
//!   used by the reporting pipeline.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod queries;
pub mod repository;
pub mod rows;
pub mod session;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;
pub use session::ReportSession;
