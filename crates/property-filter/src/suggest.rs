//! Suggestion engine: context-sensitive completions for the input text.
//!
//! What is suggested depends on how far the parser got:
//!
//! - free text: properties whose label contains the text, plus values of
//!   every property whose label or raw value contains it
//! - property without operator: that property's operators
//! - property and operator: that property's values narrowed by the rest
//!
//! A "use entered text" entry is appended whenever the text would commit to a
//! token. How the list is displayed and navigated is up to the host.

use serde::Serialize;

use crate::catalog::{AsyncStatus, FilteringOption, OptionCatalog};
use crate::config::FilterConfig;
use crate::format::TokenFormatter;
use crate::operator::{ComparisonOperator, TokenValue};
use crate::parser::{ParseStep, ParserState};
use crate::registry::{InternalProperty, PropertyRegistry};

/// What selecting a suggestion means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    /// Inserts a property label.
    Property,
    /// Inserts an operator after the property.
    Operator,
    /// Commits a property expression.
    Value,
    /// Commits the text as typed.
    EnteredText,
}

/// One completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// What selecting it means.
    pub kind: SuggestionKind,
    /// Text that replaces the input when selected.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Text shown before the label, e.g. `"State ="` for value entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_prefix: Option<String>,
    /// Secondary text, e.g. the operator description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Label of the group the entry belongs to.
    pub group_label: String,
    /// Selecting only inserts text and keeps the list open.
    pub keep_open_on_select: bool,
}

/// Entries sharing a group label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionGroup {
    /// Group label.
    pub label: String,
    /// Entries, in rank order.
    pub options: Vec<Suggestion>,
}

/// Retry descriptor shown when loading failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryAffordance {
    /// Property whose load failed, `None` for the property list.
    pub property_key: Option<String>,
    /// Label of the retry control.
    pub label: String,
}

/// Loading state of the list, derived from the caller's async status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ListStatus {
    /// Nothing is loading.
    Finished,
    /// Nothing requested yet.
    Pending,
    /// More entries are on the way; cached entries are provisional.
    Loading,
    /// Loading failed.
    Error {
        /// How to retry.
        retry: RetryAffordance,
    },
}

/// The ranked, grouped completions for one input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    /// Text the entries were narrowed by (for highlighting).
    pub filter_text: String,
    /// Groups in display order.
    pub groups: Vec<SuggestionGroup>,
    /// The "use entered text" entry, listed after all groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entered_text: Option<Suggestion>,
    /// Loading state.
    pub status: ListStatus,
}

impl Suggestions {
    /// All entries in display order, the entered-text entry last.
    pub fn flatten(&self) -> Vec<&Suggestion> {
        self.groups
            .iter()
            .flat_map(|g| g.options.iter())
            .chain(self.entered_text.iter())
            .collect()
    }

    /// Entry at a flattened index.
    pub fn get(&self, index: usize) -> Option<&Suggestion> {
        self.flatten().into_iter().nth(index)
    }

    /// Number of entries, counting the entered-text entry.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.options.len()).sum::<usize>()
            + usize::from(self.entered_text.is_some())
    }

    /// Returns true if there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes suggestions from a parser state.
pub struct SuggestionEngine<'a> {
    registry: &'a PropertyRegistry,
    catalog: &'a OptionCatalog,
    config: &'a FilterConfig,
}

impl<'a> SuggestionEngine<'a> {
    /// Creates an engine.
    pub fn new(
        registry: &'a PropertyRegistry,
        catalog: &'a OptionCatalog,
        config: &'a FilterConfig,
    ) -> Self {
        Self {
            registry,
            catalog,
            config,
        }
    }

    /// Suggestions for the parsed input.
    pub fn suggest(&self, state: &ParserState<'_>) -> Suggestions {
        let (filter_text, groups) = match (state.step(), state.property, state.operator) {
            (ParseStep::Property, Some(property), Some(operator)) => (
                state.filter_text.clone(),
                vec![self.value_group(property, operator, state)],
            ),
            (ParseStep::Operator, Some(property), _) => {
                let prefix = state.operator_prefix.clone().unwrap_or_default();
                (
                    format!("{} {}", property.label, prefix).trim_end().to_string(),
                    vec![self.operator_group(property, &prefix)],
                )
            }
            _ => (state.filter_text.clone(), self.free_text_groups(state)),
        };
        let groups: Vec<SuggestionGroup> = groups
            .into_iter()
            .filter(|g| !g.options.is_empty())
            .collect();

        let entered_text = self.entered_text(state, &groups);
        let status = self.status(state);
        tracing::trace!(
            text = state.raw.as_str(),
            groups = groups.len(),
            entered = entered_text.is_some(),
            "computed suggestions"
        );

        Suggestions {
            filter_text,
            groups,
            entered_text,
            status,
        }
    }

    fn formatter(&self) -> TokenFormatter<'a> {
        TokenFormatter::new(self.registry, self.catalog, &self.config.strings)
    }

    fn free_text_groups(&self, state: &ParserState<'_>) -> Vec<SuggestionGroup> {
        let text = state.filter_text.as_str();
        let mut groups = Vec::new();

        // Properties can not follow a negated free-text operator.
        if state.operator != Some(ComparisonOperator::NotContains) {
            groups.extend(self.property_groups(text));
        }
        if !text.is_empty() {
            groups.extend(self.all_value_groups(text, state.operator));
        }
        groups
    }

    fn property_groups(&self, text: &str) -> Vec<SuggestionGroup> {
        let needle = text.to_lowercase();
        let mut groups: Vec<SuggestionGroup> = Vec::new();

        for property in self.registry.iter() {
            if !property.label.to_lowercase().contains(&needle) {
                continue;
            }
            let group_label = self.properties_group_label(property);
            let operators = property.allowed_operators();
            // With a single operator there is nothing to choose, so insert it.
            let value = match operators.as_slice() {
                [only] => format!("{} {} ", property.label, only),
                _ => format!("{} ", property.label),
            };
            push_to_group(
                &mut groups,
                Suggestion {
                    kind: SuggestionKind::Property,
                    value,
                    label: property.label.clone(),
                    label_prefix: None,
                    description: None,
                    group_label,
                    keep_open_on_select: true,
                },
            );
        }
        groups
    }

    fn all_value_groups(
        &self,
        text: &str,
        free_text_operator: Option<ComparisonOperator>,
    ) -> Vec<SuggestionGroup> {
        let formatter = self.formatter();
        let mut groups: Vec<SuggestionGroup> = Vec::new();

        for option in self.catalog.iter() {
            let Some(property) = self.registry.get(&option.property_key) else {
                continue;
            };
            if !option.matches(text) {
                continue;
            }
            let operator = free_text_operator
                .filter(|op| property.allows(*op))
                .unwrap_or(property.default_operator);
            let prefix = format!("{} {}", property.label, operator);
            let display = self.option_label(&formatter, property, operator, option);
            push_to_group(
                &mut groups,
                Suggestion {
                    kind: SuggestionKind::Value,
                    value: format!("{prefix} {}", option.value),
                    label: format!("{prefix} {display}"),
                    label_prefix: Some(prefix),
                    description: None,
                    group_label: self.values_group_label(property),
                    keep_open_on_select: false,
                },
            );
        }
        groups
    }

    fn operator_group(&self, property: &InternalProperty, prefix: &str) -> SuggestionGroup {
        let strings = &self.config.strings;
        let options = property
            .allowed_operators()
            .into_iter()
            .filter(|op| op.symbol().starts_with(prefix))
            .map(|op| Suggestion {
                kind: SuggestionKind::Operator,
                value: format!("{} {} ", property.label, op),
                label: format!("{} {}", property.label, op),
                label_prefix: None,
                description: Some(strings.operator_description(op)),
                group_label: strings.operators.clone(),
                keep_open_on_select: true,
            })
            .collect();
        SuggestionGroup {
            label: strings.operators.clone(),
            options,
        }
    }

    fn value_group(
        &self,
        property: &InternalProperty,
        operator: ComparisonOperator,
        state: &ParserState<'_>,
    ) -> SuggestionGroup {
        let formatter = self.formatter();
        let prefix = format!("{} {}", property.label, operator);
        let chosen = &state.chosen_values;

        let options = self
            .catalog
            .for_property(&property.key)
            .filter(|o| o.matches(&state.filter_text))
            .filter(|o| {
                !chosen
                    .iter()
                    .any(|c| c == &o.value || c == o.display_label())
            })
            .map(|option| {
                let mut values: Vec<&str> = chosen.iter().map(String::as_str).collect();
                values.push(&option.value);
                Suggestion {
                    kind: SuggestionKind::Value,
                    value: format!("{prefix} {}", values.join(", ")),
                    label: self.option_label(&formatter, property, operator, option),
                    label_prefix: Some(prefix.clone()),
                    description: None,
                    group_label: property.group_values_label.clone(),
                    keep_open_on_select: false,
                }
            })
            .collect();

        SuggestionGroup {
            label: property.group_values_label.clone(),
            options,
        }
    }

    fn option_label(
        &self,
        formatter: &TokenFormatter<'_>,
        property: &InternalProperty,
        operator: ComparisonOperator,
        option: &FilteringOption,
    ) -> String {
        match property.formatter(operator) {
            Some(_) => formatter.format_value(
                Some(property),
                Some(&property.key),
                operator,
                &TokenValue::text(option.value.as_str()),
            ),
            None => option.display_label().to_string(),
        }
    }

    fn entered_text(
        &self,
        state: &ParserState<'_>,
        groups: &[SuggestionGroup],
    ) -> Option<Suggestion> {
        let text = state.raw.trim();
        if text.is_empty() {
            return None;
        }
        let commits = match state.step() {
            ParseStep::Property => true,
            ParseStep::Operator => !self.config.free_text_filtering.disabled,
            ParseStep::FreeText => {
                !self.config.free_text_filtering.disabled && !state.filter_text.is_empty()
            }
        };
        if !commits {
            return None;
        }
        let top = groups.iter().flat_map(|g| g.options.iter()).next();
        if top.is_some_and(|s| s.value.trim() == text) {
            return None;
        }
        Some(Suggestion {
            kind: SuggestionKind::EnteredText,
            value: text.to_string(),
            label: format!("{} {}", self.config.strings.use_entered_text, text),
            label_prefix: None,
            description: None,
            group_label: String::new(),
            keep_open_on_select: false,
        })
    }

    fn status(&self, state: &ParserState<'_>) -> ListStatus {
        let (key, status) = match state.property {
            Some(property) => (Some(property.key.clone()), self.catalog.status(&property.key)),
            None if self.config.async_properties => (None, self.catalog.properties_status()),
            None => (None, None),
        };
        match status.unwrap_or(AsyncStatus::Finished) {
            AsyncStatus::Finished => ListStatus::Finished,
            AsyncStatus::Pending => ListStatus::Pending,
            AsyncStatus::Loading => ListStatus::Loading,
            AsyncStatus::Error => ListStatus::Error {
                retry: RetryAffordance {
                    property_key: key,
                    label: self.config.strings.retry.clone(),
                },
            },
        }
    }

    fn properties_group_label(&self, property: &InternalProperty) -> String {
        property
            .group
            .as_deref()
            .map(|g| {
                self.config
                    .group_text(g)
                    .map_or_else(|| g.to_string(), |t| t.properties.clone())
            })
            .unwrap_or_else(|| self.config.strings.properties.clone())
    }

    fn values_group_label(&self, property: &InternalProperty) -> String {
        property
            .group
            .as_deref()
            .map(|g| {
                self.config
                    .group_text(g)
                    .map_or_else(|| g.to_string(), |t| t.values.clone())
            })
            .unwrap_or_else(|| self.config.strings.values.clone())
    }
}

fn push_to_group(groups: &mut Vec<SuggestionGroup>, suggestion: Suggestion) {
    match groups.iter_mut().find(|g| g.label == suggestion.group_label) {
        Some(group) => group.options.push(suggestion),
        None => groups.push(SuggestionGroup {
            label: suggestion.group_label.clone(),
            options: vec![suggestion],
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::GroupText;
    use crate::diagnostics::Diagnostics;
    use crate::operator::TokenType;
    use crate::parser::TextParser;
    use crate::registry::{ExtendedOperator, FilteringProperty};

    use ComparisonOperator::*;

    struct Fixture {
        registry: PropertyRegistry,
        catalog: OptionCatalog,
        config: FilterConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = PropertyRegistry::new(
                vec![
                    FilteringProperty::new("string", "string")
                        .with_operators([Equals, NotEquals, Contains, NotContains]),
                    FilteringProperty::new("state", "State").with_operators([
                        ExtendedOperator::new(Equals).with_token_type(TokenType::Enum),
                        ExtendedOperator::new(NotEquals),
                    ]),
                    FilteringProperty::new("tag", "Tag")
                        .with_default_operator(Contains)
                        .with_operators([Contains]),
                    FilteringProperty::new("instance-type", "Instance type").with_group("ec2"),
                ],
                &HashMap::new(),
                &Diagnostics::new(),
            );
            let catalog = OptionCatalog::new(vec![
                FilteringOption::new("state", "0").with_label("Stopped"),
                FilteringOption::new("state", "1").with_label("Stopping"),
                FilteringOption::new("state", "2").with_label("Running"),
                FilteringOption::new("string", "value1"),
                FilteringOption::new("string", "value2"),
            ]);
            Self {
                registry,
                catalog,
                config: FilterConfig::default(),
            }
        }

        fn suggest(&self, text: &str) -> Suggestions {
            let parser = TextParser::new(&self.registry, &self.config.free_text_filtering)
                .with_options(&self.catalog);
            let state = parser.parse(text);
            SuggestionEngine::new(&self.registry, &self.catalog, &self.config).suggest(&state)
        }
    }

    fn values(suggestions: &Suggestions) -> Vec<String> {
        suggestions.flatten().iter().map(|s| s.value.clone()).collect()
    }

    // ==================== Free text ====================

    #[test]
    fn test_empty_text_lists_properties() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("");
        assert_eq!(suggestions.groups[0].label, "Properties");
        let labels: Vec<&str> = suggestions.groups[0]
            .options
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["string", "State", "Tag"]);
        assert!(suggestions.entered_text.is_none());
    }

    #[test]
    fn test_custom_group_labels() {
        let mut fixture = Fixture::new();
        fixture.config.custom_group_text = vec![GroupText {
            group: "ec2".to_string(),
            properties: "EC2 properties".to_string(),
            values: "EC2 values".to_string(),
        }];
        let suggestions = fixture.suggest("Inst");
        assert_eq!(suggestions.groups.len(), 1);
        assert_eq!(suggestions.groups[0].label, "EC2 properties");
        assert!(suggestions.groups[0].options[0].keep_open_on_select);
    }

    #[test]
    fn test_single_operator_property_inserts_operator() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("ag");
        assert_eq!(suggestions.groups[0].options[0].value, "Tag : ");
    }

    #[test]
    fn test_free_text_matches_values_of_all_properties() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("run");
        let group = suggestions
            .groups
            .iter()
            .find(|g| g.label == "Values")
            .unwrap();
        assert_eq!(group.options.len(), 1);
        assert_eq!(group.options[0].value, "State = 2");
        assert_eq!(group.options[0].label, "State = Running");
        assert_eq!(suggestions.entered_text.as_ref().unwrap().label, "Use: run");
    }

    #[test]
    fn test_negated_free_text_skips_properties() {
        let mut fixture = Fixture::new();
        fixture.config.free_text_filtering.operators = vec![Contains, NotContains];
        let suggestions = fixture.suggest("!: val");
        assert!(suggestions.groups.iter().all(|g| g.label != "Properties"));
        assert_eq!(
            suggestions.groups[0].options[0].value,
            "string !: value1"
        );
    }

    // ==================== Operators ====================

    #[test]
    fn test_operator_step_lists_allowed_operators() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("State ");
        assert_eq!(suggestions.groups.len(), 1);
        assert_eq!(suggestions.groups[0].label, "Operators");
        assert_eq!(values(&suggestions)[..2], ["State = ", "State != "]);
        assert_eq!(
            suggestions.groups[0].options[1].description.as_deref(),
            Some("Does not equal")
        );
    }

    #[test]
    fn test_operator_prefix_narrows() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("string !");
        let operators: Vec<&str> = suggestions.groups[0]
            .options
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(operators, vec!["string !=", "string !:"]);
    }

    // ==================== Values ====================

    #[test]
    fn test_value_step_narrows_by_filter_text() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("State = Stop");
        let group = &suggestions.groups[0];
        assert_eq!(group.label, "State values");
        let labels: Vec<&str> = group.options.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Stopped", "Stopping"]);
        assert_eq!(group.options[0].value, "State = 0");
        assert_eq!(group.options[0].label_prefix.as_deref(), Some("State ="));
    }

    #[test]
    fn test_enum_step_excludes_chosen_values() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("State = 1, Stop");
        let group = &suggestions.groups[0];
        assert_eq!(group.options.len(), 1);
        assert_eq!(group.options[0].value, "State = 1, 0");
    }

    #[test]
    fn test_entered_text_deduplicated_against_top_entry() {
        let fixture = Fixture::new();
        let suggestions = fixture.suggest("State = 2");
        assert_eq!(values(&suggestions), vec!["State = 2"]);
        assert!(suggestions.entered_text.is_none());
    }

    #[test]
    fn test_disabled_free_text_suppresses_entered_text() {
        let mut fixture = Fixture::new();
        fixture.config.free_text_filtering.disabled = true;
        assert!(fixture.suggest("hello").entered_text.is_none());
        assert!(fixture.suggest("string = hello").entered_text.is_some());
    }

    #[test]
    fn test_enum_label_with_comma_is_one_value() {
        let mut fixture = Fixture::new();
        fixture.catalog = OptionCatalog::new(vec![
            FilteringOption::new("state", "0").with_label("Stopped"),
            FilteringOption::new("state", "3").with_label("Stopped, degraded"),
        ]);

        let suggestions = fixture.suggest("State = Stopped, degraded");
        let offered: Vec<&str> = suggestions.groups[0]
            .options
            .iter()
            .map(|s| s.value.as_str())
            .collect();
        assert_eq!(offered, vec!["State = 3"]);

        let suggestions = fixture.suggest("State = Stopped, degraded, Stop");
        let offered: Vec<&str> = suggestions.groups[0]
            .options
            .iter()
            .map(|s| s.value.as_str())
            .collect();
        assert_eq!(offered, vec!["State = Stopped, degraded, 0"]);
    }

    // ==================== Status ====================

    #[test]
    fn test_error_status_offers_retry() {
        let mut fixture = Fixture::new();
        fixture.catalog.set_status("state", AsyncStatus::Error);
        let suggestions = fixture.suggest("State = ");
        assert_eq!(
            suggestions.status,
            ListStatus::Error {
                retry: RetryAffordance {
                    property_key: Some("state".to_string()),
                    label: "Retry".to_string(),
                }
            }
        );
    }

    #[test]
    fn test_loading_status_keeps_cached_options() {
        let mut fixture = Fixture::new();
        fixture.catalog.set_status("state", AsyncStatus::Loading);
        let suggestions = fixture.suggest("State = ");

        assert_eq!(suggestions.status, ListStatus::Loading);
        assert_eq!(suggestions.groups[0].label, "State values");
        let labels: Vec<&str> = suggestions.groups[0]
            .options
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Stopped", "Stopping", "Running"]);
    }

    #[test]
    fn test_sync_properties_are_finished() {
        let fixture = Fixture::new();
        assert_eq!(fixture.suggest("string = ").status, ListStatus::Finished);
        assert_eq!(fixture.suggest("abc").status, ListStatus::Finished);
    }
}
