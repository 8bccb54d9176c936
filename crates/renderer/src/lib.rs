//! # CPA Report Renderer
//!
//! Turns an ordered sequence of `SummaryRow`s into a single PDF document.
//!
//! Pagination is computed first as a plain `Layout` value that depends only on
//! the number of rows; the PDF is then drawn from it. The renderer never sorts
//! or filters: row order in the document is the order it was given.

pub mod error;
pub mod layout;
pub mod pdf;

pub use error::RenderError;
pub use layout::Layout;
pub use pdf::{RenderOptions, RenderedReport, ReportRenderer, format_amount};
