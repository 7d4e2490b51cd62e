//! Token list view model.
//!
//! Turns a query into what a host renders under the input: formatted tokens,
//! operation controls between siblings, the show-more toggle and the
//! remove-all control.

use serde::Serialize;

use crate::config::FilterConfig;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::format::TokenFormatter;
use crate::query::{Operation, Query, QueryItem, Token, TokenIndex};

/// One rendered token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    /// Where the token lives in the query.
    pub index: TokenIndex,
    /// Full display text.
    pub text: String,
    /// Property label, or the "all properties" label.
    pub property_label: String,
    /// Operator symbol.
    pub operator: String,
    /// Formatted value.
    pub value_label: String,
    /// Whether a remove control is shown.
    pub removable: bool,
    /// Operation joining this token to its previous sibling.
    pub operation: Operation,
    /// Whether the operation control is shown.
    pub show_operation: bool,
}

/// A top-level entry of the token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TokenListItem {
    /// A leaf token.
    Token(TokenView),
    /// A token group.
    Group {
        /// Top-level index of the group.
        index: usize,
        /// Operation joining the group to its previous sibling.
        operation: Operation,
        /// Whether the operation control is shown.
        show_operation: bool,
        /// Tokens inside the group.
        tokens: Vec<TokenView>,
    },
}

/// The show-more / show-fewer control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowMoreToggle {
    /// Whether all items are currently visible.
    pub expanded: bool,
    /// Control label.
    pub label: String,
}

/// Everything a host needs to render the token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenListView {
    /// Visible items.
    pub items: Vec<TokenListItem>,
    /// Number of top-level items hidden by the token limit.
    pub hidden_count: usize,
    /// Toggle, present only when the limit hides something.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<ShowMoreToggle>,
    /// Whether the remove-all control is shown.
    pub show_remove_all: bool,
}

/// Builds the token list for `query`.
///
/// The token limit counts top-level items, so a group counts once. The view
/// is display only: collapsing never changes the query.
pub fn token_list(
    query: &Query,
    formatter: &TokenFormatter<'_>,
    config: &FilterConfig,
    diagnostics: &Diagnostics,
    expanded: bool,
) -> TokenListView {
    if config.hide_operations && query.has_groups() {
        diagnostics.warn_once(
            DiagnosticCode::HideOperationsWithGroups,
            "hide_operations is ignored for queries with token groups",
        );
    }
    let show_operations = !config.hide_operations || query.has_groups();

    let limit = config.token_limit.unwrap_or(usize::MAX);
    let visible = if expanded {
        query.len()
    } else {
        query.len().min(limit)
    };
    let hidden_count = query.len() - visible;

    let items = query
        .tokens
        .iter()
        .take(visible)
        .enumerate()
        .map(|(i, item)| {
            let show_operation = show_operations && i > 0;
            match item {
                QueryItem::Token(token) => TokenListItem::Token(token_view(
                    formatter,
                    token,
                    TokenIndex::Top(i),
                    query.operation,
                    show_operation,
                )),
                QueryItem::Group(group) => TokenListItem::Group {
                    index: i,
                    operation: query.operation,
                    show_operation,
                    tokens: group
                        .tokens
                        .iter()
                        .enumerate()
                        .map(|(j, token)| {
                            token_view(
                                formatter,
                                token,
                                TokenIndex::Nested { group: i, token: j },
                                group.operation,
                                show_operations && j > 0,
                            )
                        })
                        .collect(),
                },
            }
        })
        .collect();

    let overflows = config.token_limit.is_some_and(|limit| query.len() > limit);
    let toggle = overflows.then(|| ShowMoreToggle {
        expanded,
        label: if expanded {
            config.strings.show_fewer.clone()
        } else {
            config.strings.show_more.clone()
        },
    });

    TokenListView {
        items,
        hidden_count,
        toggle,
        show_remove_all: !query.is_empty(),
    }
}

fn token_view(
    formatter: &TokenFormatter<'_>,
    token: &Token,
    index: TokenIndex,
    operation: Operation,
    show_operation: bool,
) -> TokenView {
    let parts = formatter.format_parts(token);
    TokenView {
        index,
        text: parts.text,
        property_label: parts.property_label,
        operator: parts.operator,
        value_label: parts.value,
        removable: true,
        operation,
        show_operation,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::catalog::{FilteringOption, OptionCatalog};
    use crate::operator::ComparisonOperator::*;
    use crate::query::TokenGroup;
    use crate::registry::{FilteringProperty, PropertyRegistry};

    fn registry() -> PropertyRegistry {
        PropertyRegistry::new(
            vec![FilteringProperty::new("state", "State").with_operators([Equals, NotEquals])],
            &HashMap::new(),
            &Diagnostics::new(),
        )
    }

    fn query() -> Query {
        Query::from_tokens(
            Operation::And,
            [
                Token::property("state", Equals, "0"),
                Token::property("state", NotEquals, "1"),
                Token::free_text(Contains, "web"),
            ],
        )
    }

    fn render(query: &Query, config: &FilterConfig, expanded: bool) -> TokenListView {
        let registry = registry();
        let catalog = OptionCatalog::new(vec![
            FilteringOption::new("state", "0").with_label("Stopped"),
        ]);
        let formatter = TokenFormatter::new(&registry, &catalog, &config.strings);
        token_list(query, &formatter, config, &Diagnostics::new(), expanded)
    }

    fn token(item: &TokenListItem) -> &TokenView {
        match item {
            TokenListItem::Token(view) => view,
            TokenListItem::Group { .. } => panic!("expected a token"),
        }
    }

    #[test]
    fn test_renders_formatted_tokens() {
        let view = render(&query(), &FilterConfig::default(), false);
        assert_eq!(view.items.len(), 3);
        assert_eq!(token(&view.items[0]).text, "State = Stopped");
        assert_eq!(token(&view.items[2]).text, "web");
        assert!(view.toggle.is_none());
        assert!(view.show_remove_all);
    }

    #[test]
    fn test_first_token_has_no_operation_control() {
        let view = render(&query(), &FilterConfig::default(), false);
        assert!(!token(&view.items[0]).show_operation);
        assert!(token(&view.items[1]).show_operation);
        assert_eq!(token(&view.items[1]).operation, Operation::And);
    }

    #[test]
    fn test_hide_operations() {
        let config = FilterConfig {
            hide_operations: true,
            ..FilterConfig::default()
        };
        let view = render(&query(), &config, false);
        assert!(view.items.iter().all(|i| !token(i).show_operation));
    }

    #[test]
    fn test_hide_operations_ignored_with_groups() {
        let config = FilterConfig {
            hide_operations: true,
            ..FilterConfig::default()
        };
        let mut query = query();
        query.tokens.push(QueryItem::Group(TokenGroup {
            operation: Operation::Or,
            tokens: vec![
                Token::free_text(Contains, "a"),
                Token::free_text(Contains, "b"),
            ],
        }));

        let registry = registry();
        let catalog = OptionCatalog::default();
        let formatter = TokenFormatter::new(&registry, &catalog, &config.strings);
        let diagnostics = Diagnostics::new();
        let view = token_list(&query, &formatter, &config, &diagnostics, false);

        assert!(diagnostics.contains(DiagnosticCode::HideOperationsWithGroups));
        match &view.items[3] {
            TokenListItem::Group {
                show_operation,
                tokens,
                ..
            } => {
                assert!(show_operation);
                assert!(!tokens[0].show_operation);
                assert!(tokens[1].show_operation);
                assert_eq!(tokens[1].operation, Operation::Or);
                assert_eq!(tokens[1].index, TokenIndex::Nested { group: 3, token: 1 });
            }
            TokenListItem::Token(_) => panic!("expected a group"),
        }
    }

    #[test]
    fn test_token_limit_collapses_and_expands() {
        let config = FilterConfig {
            token_limit: Some(1),
            ..FilterConfig::default()
        };
        let query = query();

        let collapsed = render(&query, &config, false);
        assert_eq!(collapsed.items.len(), 1);
        assert_eq!(collapsed.hidden_count, 2);
        assert_eq!(collapsed.toggle.as_ref().unwrap().label, "Show more");

        let expanded = render(&query, &config, true);
        assert_eq!(expanded.items.len(), 3);
        assert_eq!(expanded.hidden_count, 0);
        assert_eq!(expanded.toggle.as_ref().unwrap().label, "Show fewer");
    }

    #[test]
    fn test_empty_query() {
        let view = render(&Query::default(), &FilterConfig::default(), false);
        assert!(view.items.is_empty());
        assert!(!view.show_remove_all);
    }
}
