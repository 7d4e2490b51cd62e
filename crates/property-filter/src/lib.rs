//! Property filter query engine.
//!
//! Turns text typed into a filter input into structured, boolean-combinable
//! filter tokens, offers context-sensitive suggestions while typing, and
//! supports editing committed tokens through drafts. The engine only builds
//! a query descriptor; applying it to data is up to the caller.
//!
//! # Input Syntax
//!
//! ## Property Expressions
//! - `State = Running` - property label, operator, value
//! - `State = Stopped, Stopping` - several values for enum operators
//! - `Size >= 10` - operators are matched longest first
//!
//! ## Operators
//! - `=`, `!=` - equals, does not equal
//! - `:`, `!:` - contains, does not contain
//! - `^`, `!^` - starts with, does not start with
//! - `>`, `<`, `>=`, `<=` - comparisons
//!
//! ## Free Text
//! - `web` - matches any property (default operator `:`)
//! - `!: web` or `!web` - negated, when `!:` is an allowed free-text operator
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use property_filter::{
//!     ComparisonOperator, FilterConfig, FilterController, FilterEngine, FilteringOption,
//!     FilteringProperty, OptionCatalog, Query, ControllerEvent,
//! };
//!
//! let engine = FilterEngine::new(
//!     vec![FilteringProperty::new("state", "State")
//!         .with_operators([ComparisonOperator::Equals, ComparisonOperator::NotEquals])],
//!     &HashMap::new(),
//!     OptionCatalog::new(vec![FilteringOption::new("state", "2").with_label("Running")]),
//!     FilterConfig::default(),
//! );
//!
//! let mut controller = FilterController::new();
//! controller.focus(&engine);
//! controller.set_text(&engine, "State != Running");
//!
//! let Some(ControllerEvent::Change(query)) = controller.submit(&engine, &Query::default())
//! else {
//!     panic!("expected a committed token");
//! };
//! let view = engine.view(&query, false);
//! assert_eq!(query.token_count(), 1);
//! assert!(view.show_remove_all);
//! assert_eq!(engine.format(&query.iter_tokens().next().unwrap().1), "State != Running");
//! ```

mod catalog;
mod config;
mod controller;
mod diagnostics;
mod engine;
mod error;
mod format;
mod operator;
mod parser;
mod query;
mod registry;
mod suggest;
mod view;

pub use catalog::{
    AsyncStatus, Catalog, FilteringOption, LoadItemsDetail, LoadRequest, LoadResponse,
    LoadTracker, OptionCatalog,
};
pub use config::{FilterConfig, FilterStrings, FreeTextFiltering, GroupText};
pub use controller::{ControllerEvent, ControllerState, Draft, FilterController};
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
pub use engine::FilterEngine;
pub use error::{CatalogError, CatalogResult, QueryError, QueryResult};
pub use format::{FormattedToken, TokenFormatter};
pub use operator::{
    match_operator, match_operator_prefix, ComparisonOperator, TokenType, TokenValue,
};
pub use parser::{ParseStep, ParserState, TextParser};
pub use query::{Operation, OperationTarget, Query, QueryItem, Token, TokenGroup, TokenIndex};
pub use registry::{
    ExtendedOperator, FilteringProperty, FormContext, FormHandle, InternalOperator,
    InternalProperty, OperatorDefinition, OperatorForm, OperatorSpec, PropertyDefinition,
    PropertyRegistry, ValueFormatter,
};
pub use suggest::{
    ListStatus, RetryAffordance, Suggestion, SuggestionEngine, SuggestionGroup, SuggestionKind,
    Suggestions,
};
pub use view::{token_list, ShowMoreToggle, TokenListItem, TokenListView, TokenView};
