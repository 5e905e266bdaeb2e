//! Configuration module for ledgerdesk
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence
//! - Capacity ceilings for the row store

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{Settings, StoreLimits};
