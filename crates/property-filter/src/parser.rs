//! Greedy parser for filter input text.

use crate::catalog::OptionCatalog;
use crate::config::FreeTextFiltering;
use crate::operator::{match_operator, match_operator_prefix, ComparisonOperator, TokenType};
use crate::registry::{InternalProperty, PropertyRegistry};

/// How far the parser got through the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStep {
    /// No property label matched; the text is a free-text candidate.
    FreeText,
    /// A property matched and an operator is (possibly) being typed.
    Operator,
    /// Property and operator matched; the rest narrows values.
    Property,
}

/// Best-effort decomposition of the input text.
///
/// This is ephemeral: it is recomputed from the raw text on every keystroke
/// and never stored in a query.
#[derive(Debug, Clone)]
pub struct ParserState<'a> {
    /// The text that was parsed.
    pub raw: String,
    /// Matched property, `None` for free text.
    pub property: Option<&'a InternalProperty>,
    /// Matched operator. For free text this is an explicit free-text
    /// operator such as `!:`, if one was typed.
    pub operator: Option<ComparisonOperator>,
    /// Operator characters typed so far when no full operator matched yet.
    pub operator_prefix: Option<String>,
    /// Residual text used to narrow value suggestions.
    pub filter_text: String,
    /// Values already listed before the last comma (enum operators only).
    pub chosen_values: Vec<String>,
}

impl ParserState<'_> {
    /// Returns the parse step.
    pub fn step(&self) -> ParseStep {
        match (self.property, self.operator) {
            (Some(_), Some(_)) => ParseStep::Property,
            (Some(_), None) => ParseStep::Operator,
            (None, _) => ParseStep::FreeText,
        }
    }

    /// Returns true if the text is a property expression (property and
    /// operator matched).
    pub fn is_property_expression(&self) -> bool {
        self.step() == ParseStep::Property
    }

    /// Token type of the matched operator on the matched property.
    pub fn token_type(&self) -> TokenType {
        match (self.property, self.operator) {
            (Some(property), Some(operator)) => property.token_type(operator),
            _ => TokenType::String,
        }
    }
}

/// Parser for filter input text.
///
/// The parser is greedy and never backtracks between steps:
///
/// ```text
/// input      ::= property_expr | free_text
/// property_expr ::= LABEL ws* OPERATOR ws* value?
///              | LABEL ws* OPERATOR_PREFIX?
/// free_text  ::= FREE_TEXT_OPERATOR? ws* value
/// ```
///
/// 1. `LABEL` is the longest property label the input starts with
///    (case-sensitive). Label matching happens before any operator matching,
///    so a label containing operator characters still wins.
/// 2. `OPERATOR` is the longest operator symbol valid for that property
///    (`!=` before `=`, `>=` before `>`).
/// 3. The trimmed remainder is the value filter text. For enum operators the
///    remainder is split on commas: earlier entries are already chosen values
///    and the last one narrows the next value. With an option catalog, a run
///    of comma-separated parts that spells a known label or value (such as
///    `Portland, OR`) is kept as one entry, longest run first.
/// 4. Without a label match, the input is free text, optionally starting with
///    a free-text operator. When `!:` is allowed, a bare leading `!` is read
///    as `!:`.
///
/// This is a pragmatic longest-match heuristic rather than a formal grammar:
/// a property label that is also a value of another property is always read
/// as the property.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use property_filter::{
///     ComparisonOperator, Diagnostics, FilteringProperty, FreeTextFiltering, ParseStep,
///     PropertyRegistry, TextParser,
/// };
///
/// let diagnostics = Diagnostics::new();
/// let registry = PropertyRegistry::new(
///     vec![FilteringProperty::new("state", "State")
///         .with_operators([ComparisonOperator::Equals, ComparisonOperator::NotEquals])],
///     &HashMap::new(),
///     &diagnostics,
/// );
/// let free_text = FreeTextFiltering::default();
/// let parser = TextParser::new(&registry, &free_text);
///
/// let state = parser.parse("State != Running");
/// assert_eq!(state.step(), ParseStep::Property);
/// assert_eq!(state.operator, Some(ComparisonOperator::NotEquals));
/// assert_eq!(state.filter_text, "Running");
/// ```
pub struct TextParser<'a> {
    registry: &'a PropertyRegistry,
    free_text: &'a FreeTextFiltering,
    options: Option<&'a OptionCatalog>,
}

impl<'a> TextParser<'a> {
    /// Creates a parser over a registry and free-text settings.
    pub fn new(registry: &'a PropertyRegistry, free_text: &'a FreeTextFiltering) -> Self {
        Self {
            registry,
            free_text,
            options: None,
        }
    }

    /// Uses known options to keep values containing commas intact.
    pub fn with_options(mut self, options: &'a OptionCatalog) -> Self {
        self.options = Some(options);
        self
    }

    /// Parses the whole input text.
    pub fn parse(&self, text: &str) -> ParserState<'a> {
        let state = match self.registry.match_label(text) {
            Some(property) => self
                .parse_property(text, property)
                .unwrap_or_else(|| self.parse_free_text(text)),
            None => self.parse_free_text(text),
        };
        tracing::trace!(
            text,
            step = ?state.step(),
            property = state.property.map(|p| p.key.as_str()),
            operator = ?state.operator,
            "parsed filter text"
        );
        state
    }

    /// Parses the text after a matched label. Returns `None` when the rest is
    /// neither an operator nor the start of one.
    fn parse_property(
        &self,
        text: &str,
        property: &'a InternalProperty,
    ) -> Option<ParserState<'a>> {
        let rest = text[property.label.len()..].trim_start();
        let allowed = property.allowed_operators();

        if let Some(operator) = match_operator(&allowed, rest) {
            let value = rest[operator.symbol().len()..].trim();
            let (chosen_values, filter_text) = match property.token_type(operator) {
                TokenType::Enum => split_enum_values(value, |part| {
                    self.is_known_value(&property.key, part)
                }),
                TokenType::String => (Vec::new(), value.to_string()),
            };
            return Some(ParserState {
                raw: text.to_string(),
                property: Some(property),
                operator: Some(operator),
                operator_prefix: None,
                filter_text,
                chosen_values,
            });
        }

        let prefix = match_operator_prefix(&allowed, rest)?;
        Some(ParserState {
            raw: text.to_string(),
            property: Some(property),
            operator: None,
            operator_prefix: Some(prefix),
            filter_text: String::new(),
            chosen_values: Vec::new(),
        })
    }

    fn parse_free_text(&self, text: &str) -> ParserState<'a> {
        let (operator, value) = if self.free_text.disabled {
            (None, text.trim())
        } else {
            self.match_free_text_operator(text.trim_start())
        };
        ParserState {
            raw: text.to_string(),
            property: None,
            operator,
            operator_prefix: None,
            filter_text: value.to_string(),
            chosen_values: Vec::new(),
        }
    }

    fn is_known_value(&self, property_key: &str, text: &str) -> bool {
        let Some(options) = self.options else {
            return false;
        };
        options.for_property(property_key).any(|o| {
            o.value.eq_ignore_ascii_case(text)
                || o.label.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(text))
        })
    }

    fn match_free_text_operator<'t>(&self, text: &'t str) -> (Option<ComparisonOperator>, &'t str) {
        let allowed = self.free_text.allowed_operators();
        if let Some(operator) = match_operator(&allowed, text) {
            return (Some(operator), text[operator.symbol().len()..].trim());
        }
        if allowed.contains(&ComparisonOperator::NotContains) {
            if let Some(rest) = text.strip_prefix('!') {
                return (Some(ComparisonOperator::NotContains), rest.trim());
            }
        }
        (None, text.trim())
    }
}

/// Splits an enum value list: `"a, b, c"` gives `(["a", "b"], "c")`.
///
/// Starting at each part, the longest run of parts that `is_known` accepts
/// is taken as a single value. The final entry is the filter text even when
/// it names a known value.
fn split_enum_values(value: &str, is_known: impl Fn(&str) -> bool) -> (Vec<String>, String) {
    let mut bounds = vec![0];
    bounds.extend(value.match_indices(',').map(|(i, _)| i + 1));
    let parts = bounds.len();
    let run = |from: usize, to: usize| {
        let end = if to == parts { value.len() } else { bounds[to] - 1 };
        value[bounds[from]..end].trim()
    };

    let mut chosen = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + 2..=parts)
            .rev()
            .find(|&end| is_known(run(start, end)))
            .unwrap_or(start + 1);
        let entry = run(start, end);
        if end == parts {
            return (chosen, entry.to_string());
        }
        if !entry.is_empty() {
            chosen.push(entry.to_string());
        }
        start = end;
    }
}
