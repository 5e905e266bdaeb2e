//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod database;
pub mod history;
pub mod report;

pub use database::{handle_db_command, DbCommands};
pub use history::handle_history_command;
pub use report::{handle_report_command, ExportFormat, ReportCommands};
