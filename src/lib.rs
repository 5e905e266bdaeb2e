//! ledgerdesk - user-defined tabular databases with formula reports
//!
//! This library lets a user declare a table schema, import rows into it from
//! CSV or JSON with validation and duplicate detection, and define reports
//! that project those rows through per-row formulas and aggregate summary
//! rows.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration, capacity ceilings and path management
//! - `error`: Custom error types
//! - `models`: Core data models (schemas, cell values, databases, reports)
//! - `formula`: Arithmetic expressions used by formula columns
//! - `storage`: JSON file storage layer
//! - `audit`: Audit logging system
//! - `services`: Business logic layer (schema checks, import, reports)
//! - `reports`: Report rendering and aggregation
//! - `export`: CSV, JSON and YAML export of rendered reports
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `ledgerdesk` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use ledgerdesk::config::{LedgerPaths, Settings};
//! use ledgerdesk::storage::Storage;
//! use ledgerdesk::services::ImportService;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths, &settings)?;
//! let preview = ImportService::new(&storage)
//!     .with_limits(settings.limits())
//!     .preview_import(database_id, &rows)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod formula;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
