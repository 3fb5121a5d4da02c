//! Utility modules shared by the front end and the checker.
//!
//! This module contains common utilities used throughout the codebase:
//! - Error types and diagnostics
//! - Source location tracking
//! - Pretty printing of trees, tables and diagnostics

pub mod errors;
pub mod location;
pub mod pretty;

// Re-exports
pub use errors::*;
pub use location::{SourceLocation, SourceMap, Span};
pub use pretty::{ast_tree, render_diagnostic, symbol_tables, PrettyPrint};
