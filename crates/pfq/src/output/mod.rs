//! Output formatting utilities for the pfq CLI.
//!
//! This module provides functions for formatting engine results as tables or
//! JSON. It is organized into submodules by result type:
//!
//! - [`parse`] - Parser state (parse)
//! - [`suggestions`] - Suggestion groups (suggest)
//! - [`tokens`] - Token lists (view, add, edit, remove, toggle, release)
//! - [`diagnostics`] - Catalog diagnostics (check)

mod diagnostics;
mod parse;
mod suggestions;
mod tokens;

pub use diagnostics::{format_diagnostics_json, format_diagnostics_table};
pub use parse::{format_parse_json, format_parse_table};
pub use suggestions::{format_suggestions_json, format_suggestions_table};
pub use tokens::{format_token_list_json, format_token_list_table};
