//! Error types for catalog loading and query edits.

use std::fmt;

use thiserror::Error;

use crate::query::TokenIndex;

/// A specialized Result type for catalog and configuration loading.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A specialized Result type for fallible query edits.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while loading a property catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// An operator symbol outside the supported set.
    #[error("unknown operator: {symbol}")]
    UnknownOperator {
        /// The unrecognized symbol.
        symbol: String,
    },

    /// A property key that is not in the registry.
    #[error("{}", format_unknown_property(.key, .suggestion.as_deref()))]
    UnknownProperty {
        /// The key that was looked up.
        key: String,
        /// The closest known key, if one is close enough.
        suggestion: Option<String>,
    },

    /// The catalog document could not be decoded.
    #[error("invalid catalog: {message}")]
    Invalid {
        /// Decoder message.
        message: String,
    },
}

fn format_unknown_property(key: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("unknown property '{key}'. Did you mean '{s}'?"),
        None => format!("unknown property '{key}'"),
    }
}

impl CatalogError {
    /// Creates an unknown operator error.
    pub fn unknown_operator(symbol: impl Into<String>) -> Self {
        CatalogError::UnknownOperator {
            symbol: symbol.into(),
        }
    }

    /// Creates an unknown property error.
    pub fn unknown_property(key: impl Into<String>, suggestion: Option<String>) -> Self {
        CatalogError::UnknownProperty {
            key: key.into(),
            suggestion,
        }
    }

    /// Creates an invalid catalog error.
    pub fn invalid(message: impl fmt::Display) -> Self {
        CatalogError::Invalid {
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::invalid(err)
    }
}

/// Errors returned by the `try_*` query edits.
///
/// The plain edits panic on these conditions instead: an index that does not
/// exist means the caller and the query are out of sync.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The index does not address a token in the query.
    #[error("token index {index} out of range (query has {len} top-level items)")]
    IndexOutOfRange {
        /// The offending index.
        index: TokenIndex,
        /// Number of top-level items in the query.
        len: usize,
    },

    /// The index addresses a group where a token was expected, or the reverse.
    #[error("item at {index} is not a {expected}")]
    WrongItemKind {
        /// The offending index.
        index: TokenIndex,
        /// What the operation expected to find.
        expected: &'static str,
    },
}

impl QueryError {
    /// Creates an out-of-range error.
    pub fn out_of_range(index: TokenIndex, len: usize) -> Self {
        QueryError::IndexOutOfRange { index, len }
    }

    /// Creates a wrong item kind error.
    pub fn wrong_kind(index: TokenIndex, expected: &'static str) -> Self {
        QueryError::WrongItemKind { index, expected }
    }
}
