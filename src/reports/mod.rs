//! Reports module for ledgerdesk
//!
//! Renders saved report definitions against the current rows of their
//! database, including per-row formula columns and aggregate formula rows.

pub mod aggregate;
pub mod render;

pub use aggregate::{aggregate, AggregateFunction};
pub use render::{ColumnType, RenderedColumn, RenderedFormulaRow, RenderedReport, ReportMetadata};
