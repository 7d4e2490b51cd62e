//! Comparison operators and token values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CatalogError;

/// A comparison operator symbol.
///
/// The set is fixed: `=`, `!=`, `:`, `!:`, `^`, `!^`, `>`, `<`, `>=`, `<=`.
/// Operators serialize as their symbol so catalogs and queries stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComparisonOperator {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `:`
    Contains,
    /// `!:`
    NotContains,
    /// `^`
    StartsWith,
    /// `!^`
    NotStartsWith,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<=`
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// All operators, in canonical display order.
    pub const ALL: [ComparisonOperator; 10] = [
        ComparisonOperator::Equals,
        ComparisonOperator::NotEquals,
        ComparisonOperator::Contains,
        ComparisonOperator::NotContains,
        ComparisonOperator::StartsWith,
        ComparisonOperator::NotStartsWith,
        ComparisonOperator::GreaterThanOrEqual,
        ComparisonOperator::LessThanOrEqual,
        ComparisonOperator::LessThan,
        ComparisonOperator::GreaterThan,
    ];

    /// Returns the operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "=",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::Contains => ":",
            ComparisonOperator::NotContains => "!:",
            ComparisonOperator::StartsWith => "^",
            ComparisonOperator::NotStartsWith => "!^",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThanOrEqual => "<=",
        }
    }

    /// Returns the default human description of the operator.
    pub fn description(self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "Equals",
            ComparisonOperator::NotEquals => "Does not equal",
            ComparisonOperator::Contains => "Contains",
            ComparisonOperator::NotContains => "Does not contain",
            ComparisonOperator::StartsWith => "Starts with",
            ComparisonOperator::NotStartsWith => "Does not start with",
            ComparisonOperator::GreaterThan => "Greater than",
            ComparisonOperator::LessThan => "Less than",
            ComparisonOperator::GreaterThanOrEqual => "Greater than or equal",
            ComparisonOperator::LessThanOrEqual => "Less than or equal",
        }
    }

    /// Looks up an operator by its exact symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ComparisonOperator {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s.trim()).ok_or_else(|| CatalogError::unknown_operator(s))
    }
}

impl Serialize for ComparisonOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for ComparisonOperator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether an operator takes a single value or a list of values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// A single scalar value.
    #[default]
    String,
    /// A list of values chosen from the property's options.
    Enum,
}

/// The value carried by a token.
///
/// Deserializes untagged: a JSON string is [`TokenValue::Text`], an array of
/// strings is [`TokenValue::List`], and anything else is kept as
/// [`TokenValue::Custom`] for extended operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    /// A scalar value.
    Text(String),
    /// A list of values, in selection order.
    List(Vec<String>),
    /// An operator-specific value shape owned by a custom form.
    Custom(serde_json::Value),
}

impl TokenValue {
    /// Returns the empty value for a token type (`""` or `[]`).
    pub fn empty(token_type: TokenType) -> Self {
        match token_type {
            TokenType::String => TokenValue::Text(String::new()),
            TokenType::Enum => TokenValue::List(Vec::new()),
        }
    }

    /// Creates a text value.
    pub fn text(value: impl Into<String>) -> Self {
        TokenValue::Text(value.into())
    }

    /// Creates a list value.
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TokenValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Returns true for `""`, `[]` and `null`.
    pub fn is_empty(&self) -> bool {
        match self {
            TokenValue::Text(s) => s.is_empty(),
            TokenValue::List(values) => values.is_empty(),
            TokenValue::Custom(value) => value.is_null(),
        }
    }

    /// Returns the scalar value, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TokenValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the values, if this is a list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TokenValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Returns true if the value's shape fits the token type.
    pub fn fits(&self, token_type: TokenType) -> bool {
        matches!(
            (self, token_type),
            (TokenValue::Text(_), TokenType::String) | (TokenValue::List(_), TokenType::Enum)
        )
    }
}

impl Default for TokenValue {
    fn default() -> Self {
        TokenValue::Text(String::new())
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::Text(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        TokenValue::Text(value)
    }
}

impl From<Vec<String>> for TokenValue {
    fn from(values: Vec<String>) -> Self {
        TokenValue::List(values)
    }
}

/// Returns the longest operator in `allowed` that `text` starts with.
///
/// Trying longer symbols first keeps `!=` from being read as `!` plus `=`,
/// and `>=` from being read as `>` with a residual `=`.
pub fn match_operator(allowed: &[ComparisonOperator], text: &str) -> Option<ComparisonOperator> {
    allowed
        .iter()
        .copied()
        .filter(|op| text.starts_with(op.symbol()))
        .max_by_key(|op| op.symbol().len())
}

/// Returns the operator prefix being typed, if `text` could still become one
/// of the `allowed` operators.
///
/// Blank text is an empty prefix: the user has typed a property and nothing
/// after it yet.
pub fn match_operator_prefix(allowed: &[ComparisonOperator], text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return Some(String::new());
    }
    allowed
        .iter()
        .any(|op| op.symbol().starts_with(text))
        .then(|| text.to_string())
}
