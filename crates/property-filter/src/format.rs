//! Token formatting.
//!
//! Formatting is pure: it reads the token, the registry and the option
//! catalog, and never changes any of them. It runs on every render.

use serde::Serialize;

use crate::catalog::OptionCatalog;
use crate::config::FilterStrings;
use crate::operator::{ComparisonOperator, TokenValue};
use crate::query::Token;
use crate::registry::{InternalProperty, PropertyRegistry};

/// The display parts of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedToken {
    /// Property label, or the "all properties" label for free text.
    pub property_label: String,
    /// Operator symbol.
    pub operator: String,
    /// Operator description.
    pub operator_description: String,
    /// Formatted value.
    pub value: String,
    /// The full display text.
    pub text: String,
}

/// Renders tokens to display text.
pub struct TokenFormatter<'a> {
    registry: &'a PropertyRegistry,
    catalog: &'a OptionCatalog,
    strings: &'a FilterStrings,
}

impl<'a> TokenFormatter<'a> {
    /// Creates a formatter.
    pub fn new(
        registry: &'a PropertyRegistry,
        catalog: &'a OptionCatalog,
        strings: &'a FilterStrings,
    ) -> Self {
        Self {
            registry,
            catalog,
            strings,
        }
    }

    /// Renders `token` as `"<property> <operator> <value>"`.
    ///
    /// Free-text tokens render as just the value for `:`, and as
    /// `"<operator> <value>"` for other operators. A token whose property is
    /// no longer registered renders with its raw key.
    pub fn format(&self, token: &Token) -> String {
        self.format_parts(token).text
    }

    /// Renders `token` into its display parts.
    pub fn format_parts(&self, token: &Token) -> FormattedToken {
        let property = token
            .property_key
            .as_deref()
            .and_then(|key| self.registry.get(key));
        let value = self.format_value(
            property,
            token.property_key.as_deref(),
            token.operator,
            &token.value,
        );
        let operator = token.operator.symbol().to_string();

        let (property_label, text) = match (&token.property_key, property) {
            (Some(_), Some(p)) => (
                p.label.clone(),
                format!("{} {} {}", p.label, operator, value),
            ),
            (Some(key), None) => (key.clone(), format!("{key} {operator} {value}")),
            (None, _) if token.operator == ComparisonOperator::Contains => {
                (self.strings.all_properties.clone(), value.clone())
            }
            (None, _) => (
                self.strings.all_properties.clone(),
                format!("{operator} {value}"),
            ),
        };

        FormattedToken {
            property_label,
            operator_description: self.strings.operator_description(token.operator),
            operator,
            value,
            text,
        }
    }

    /// Formats a value.
    ///
    /// The first available source wins: the operator's (or property's)
    /// formatter, the option label from the catalog, then the raw value.
    /// List values are formatted one entry at a time and joined with `", "`.
    pub fn format_value(
        &self,
        property: Option<&InternalProperty>,
        property_key: Option<&str>,
        operator: ComparisonOperator,
        value: &TokenValue,
    ) -> String {
        let formatter = property.and_then(|p| p.formatter(operator));
        let single = |raw: &str| -> String {
            if let Some(formatter) = formatter {
                return formatter.format(&TokenValue::text(raw));
            }
            property_key
                .and_then(|key| self.catalog.label_for(key, raw))
                .unwrap_or(raw)
                .to_string()
        };

        match value {
            TokenValue::Text(raw) => single(raw.as_str()),
            TokenValue::List(values) => values
                .iter()
                .map(|v| single(v.as_str()))
                .collect::<Vec<_>>()
                .join(", "),
            TokenValue::Custom(custom) => match formatter {
                Some(formatter) => formatter.format(value),
                None => custom.to_string(),
            },
        }
    }
}
