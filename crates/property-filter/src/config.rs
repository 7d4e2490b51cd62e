//! Engine configuration.
//!
//! Every field has a serde default so a host can deserialize a partial
//! document (TOML or JSON) and get the stock behavior for the rest.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::operator::ComparisonOperator;

/// Engine switches and display strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Free-text token settings.
    pub free_text_filtering: FreeTextFiltering,

    /// Hide the and/or controls between tokens.
    pub hide_operations: bool,

    /// Allow one level of token groups in the query.
    pub enable_token_groups: bool,

    /// Number of top-level tokens shown before "show more".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<usize>,

    /// The property list itself is loaded lazily, so free-text typing also
    /// issues load requests.
    pub async_properties: bool,

    /// Labels for custom property groups.
    pub custom_group_text: Vec<GroupText>,

    /// Display strings.
    pub strings: FilterStrings,
}

/// Settings for tokens with no property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeTextFiltering {
    /// Reject free-text tokens entirely.
    pub disabled: bool,

    /// Operators a free-text token may use.
    pub operators: Vec<ComparisonOperator>,

    /// Operator used when free text is committed without one.
    pub default_operator: ComparisonOperator,
}

impl Default for FreeTextFiltering {
    fn default() -> Self {
        Self {
            disabled: false,
            operators: vec![ComparisonOperator::Contains],
            default_operator: ComparisonOperator::Contains,
        }
    }
}

impl FreeTextFiltering {
    /// Allowed free-text operators, always including the default operator.
    pub fn allowed_operators(&self) -> Vec<ComparisonOperator> {
        let mut operators = vec![self.default_operator];
        for op in &self.operators {
            if !operators.contains(op) {
                operators.push(*op);
            }
        }
        operators
    }
}

/// Labels for one custom property group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupText {
    /// The group id used in `FilteringProperty::group`.
    pub group: String,
    /// Label of the properties group in suggestions.
    pub properties: String,
    /// Label of the values group in suggestions.
    pub values: String,
}

/// Display strings used in suggestions and token descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterStrings {
    /// Label of the default properties group.
    pub properties: String,
    /// Label of the default values group.
    pub values: String,
    /// Label of the operators group.
    pub operators: String,
    /// Prefix of the "use entered text" suggestion.
    pub use_entered_text: String,
    /// Property label shown for free-text tokens.
    pub all_properties: String,
    /// Label of the expand toggle.
    pub show_more: String,
    /// Label of the collapse toggle.
    pub show_fewer: String,
    /// Label of the retry affordance when loading failed.
    pub retry: String,
    /// Operator description overrides, keyed by symbol.
    pub operator_descriptions: HashMap<ComparisonOperator, String>,
}

impl Default for FilterStrings {
    fn default() -> Self {
        Self {
            properties: "Properties".to_string(),
            values: "Values".to_string(),
            operators: "Operators".to_string(),
            use_entered_text: "Use:".to_string(),
            all_properties: "All properties".to_string(),
            show_more: "Show more".to_string(),
            show_fewer: "Show fewer".to_string(),
            retry: "Retry".to_string(),
            operator_descriptions: HashMap::new(),
        }
    }
}

impl FilterStrings {
    /// Returns the description of an operator, honoring overrides.
    pub fn operator_description(&self, operator: ComparisonOperator) -> String {
        self.operator_descriptions
            .get(&operator)
            .cloned()
            .unwrap_or_else(|| operator.description().to_string())
    }
}

impl FilterConfig {
    /// Returns the group text for a custom group id.
    pub fn group_text(&self, group: &str) -> Option<&GroupText> {
        self.custom_group_text.iter().find(|g| g.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert!(!config.hide_operations);
        assert!(!config.enable_token_groups);
        assert_eq!(config.token_limit, None);
        assert_eq!(
            config.free_text_filtering.default_operator,
            ComparisonOperator::Contains
        );
        assert_eq!(config.strings.properties, "Properties");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: FilterConfig =
            serde_json::from_str(r#"{"token_limit": 2, "strings": {"values": "Werte"}}"#).unwrap();
        assert_eq!(config.token_limit, Some(2));
        assert_eq!(config.strings.values, "Werte");
        assert_eq!(config.strings.properties, "Properties");
    }

    #[test]
    fn test_free_text_allowed_operators_include_default() {
        let free_text = FreeTextFiltering {
            disabled: false,
            operators: vec![ComparisonOperator::NotContains],
            default_operator: ComparisonOperator::Contains,
        };
        assert_eq!(
            free_text.allowed_operators(),
            vec![ComparisonOperator::Contains, ComparisonOperator::NotContains]
        );
    }

    #[test]
    fn test_operator_description_override() {
        let mut strings = FilterStrings::default();
        strings
            .operator_descriptions
            .insert(ComparisonOperator::Equals, "Is".to_string());
        assert_eq!(strings.operator_description(ComparisonOperator::Equals), "Is");
        assert_eq!(
            strings.operator_description(ComparisonOperator::NotEquals),
            "Does not equal"
        );
    }
}
