//! # CPA Mailer
//!
//! Runs a reporting pass end to end and delivers the result.
//!
//! A `Dispatcher` opens a data session, aggregates the requested `Scope` over
//! the configured window, renders the rows to PDF and hands the document to a
//! `ReportTransport`. The transport is SMTP in production (`SmtpTransport`),
//! a directory for one-off CLI runs (`FileDropTransport`) and an in-memory
//! recorder in tests (`MemoryTransport`).

pub mod dispatcher;
pub mod error;
pub mod transport;

pub use dispatcher::{DispatchOutcome, Dispatcher, subject_for};
pub use error::MailerError;
pub use transport::{FileDropTransport, MemoryTransport, OutgoingReport, ReportTransport, SmtpTransport};
