//! The engine facade.
//!
//! [`FilterEngine`] owns the normalized registry, the option catalog and the
//! configuration, and exposes the stateless operations: parse, suggest,
//! format, render the token list, and turn input text into a token.

use std::collections::HashMap;

use crate::catalog::{Catalog, OptionCatalog};
use crate::config::FilterConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{CatalogError, CatalogResult};
use crate::format::TokenFormatter;
use crate::operator::{TokenType, TokenValue};
use crate::parser::{ParseStep, ParserState, TextParser};
use crate::query::{Query, Token};
use crate::registry::{FilteringProperty, InternalProperty, PropertyDefinition, PropertyRegistry};
use crate::suggest::{SuggestionEngine, Suggestions};
use crate::view::{token_list, TokenListView};

/// Registry, options and configuration bound together.
#[derive(Debug)]
pub struct FilterEngine {
    registry: PropertyRegistry,
    catalog: OptionCatalog,
    config: FilterConfig,
    diagnostics: Diagnostics,
}

impl FilterEngine {
    /// Creates an engine, normalizing `properties` against `definitions`.
    pub fn new(
        properties: Vec<FilteringProperty>,
        definitions: &HashMap<String, PropertyDefinition>,
        catalog: OptionCatalog,
        config: FilterConfig,
    ) -> Self {
        let diagnostics = Diagnostics::new();
        let registry = PropertyRegistry::new(properties, definitions, &diagnostics);
        tracing::debug!(
            properties = registry.len(),
            options = catalog.len(),
            diagnostics = diagnostics.len(),
            "filter engine ready"
        );
        Self {
            registry,
            catalog,
            config,
            diagnostics,
        }
    }

    /// Creates an engine from a catalog document.
    pub fn from_catalog(catalog: &Catalog, config: FilterConfig) -> Self {
        Self::new(
            catalog.properties.clone(),
            &catalog.property_definitions,
            catalog.option_catalog(),
            config,
        )
    }

    /// The property registry.
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// The option catalog.
    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    /// Mutable access to the option catalog, for hosts pushing new options.
    pub fn catalog_mut(&mut self) -> &mut OptionCatalog {
        &mut self.catalog
    }

    /// The configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Parses input text.
    pub fn parse(&self, text: &str) -> ParserState<'_> {
        TextParser::new(&self.registry, &self.config.free_text_filtering)
            .with_options(&self.catalog)
            .parse(text)
    }

    /// Suggestions for input text.
    pub fn suggest(&self, text: &str) -> Suggestions {
        let state = self.parse(text);
        SuggestionEngine::new(&self.registry, &self.catalog, &self.config).suggest(&state)
    }

    /// A formatter over this engine's registry and options.
    pub fn formatter(&self) -> TokenFormatter<'_> {
        TokenFormatter::new(&self.registry, &self.catalog, &self.config.strings)
    }

    /// Renders a token as display text.
    pub fn format(&self, token: &Token) -> String {
        self.formatter().format(token)
    }

    /// Renders the token list of `query`.
    pub fn view(&self, query: &Query, expanded: bool) -> TokenListView {
        token_list(
            query,
            &self.formatter(),
            &self.config,
            &self.diagnostics,
            expanded,
        )
    }

    /// Looks up a property by key, with a "did you mean" hint on failure.
    pub fn lookup_property(&self, key: &str) -> CatalogResult<&InternalProperty> {
        self.registry
            .get(key)
            .ok_or_else(|| CatalogError::unknown_property(key, self.registry.similar_key(key)))
    }

    /// The token that committing `text` would produce.
    ///
    /// Property expressions map typed values to option values by label, so
    /// `"State = Stopped"` commits the raw value behind `Stopped`. Text that
    /// names a property but no operator, and plain text, commit as free text
    /// unless free-text filtering is disabled. Blank free text commits
    /// nothing.
    pub fn token_from_text(&self, text: &str) -> Option<Token> {
        let state = self.parse(text);
        let free_text = &self.config.free_text_filtering;

        match state.step() {
            ParseStep::Property => {
                let property = state.property?;
                let operator = state.operator?;
                let value = match property.token_type(operator) {
                    TokenType::Enum => {
                        let mut values: Vec<String> = Vec::new();
                        let typed = state
                            .chosen_values
                            .iter()
                            .map(String::as_str)
                            .chain(Some(state.filter_text.as_str()).filter(|t| !t.is_empty()));
                        for value in typed {
                            let value = self.match_value(&property.key, value);
                            if !values.contains(&value) {
                                values.push(value);
                            }
                        }
                        TokenValue::List(values)
                    }
                    TokenType::String => {
                        TokenValue::Text(self.match_value(&property.key, &state.filter_text))
                    }
                };
                Some(Token::property(property.key.clone(), operator, value))
            }
            ParseStep::Operator if !free_text.disabled => Some(Token::free_text(
                free_text.default_operator,
                text.trim(),
            )),
            ParseStep::FreeText if !free_text.disabled && !state.filter_text.is_empty() => {
                Some(Token::free_text(
                    state.operator.unwrap_or(free_text.default_operator),
                    state.filter_text.as_str(),
                ))
            }
            _ => None,
        }
    }

    /// Maps typed text to an option value: exact label, then label ignoring
    /// case, then raw value. Unknown text is kept as typed.
    fn match_value(&self, property_key: &str, text: &str) -> String {
        let options = || self.catalog.for_property(property_key);
        let lower = text.to_lowercase();
        options()
            .find(|o| o.label.as_deref() == Some(text))
            .or_else(|| {
                options().find(|o| o.label.as_deref().is_some_and(|l| l.to_lowercase() == lower))
            })
            .or_else(|| options().find(|o| o.value == text))
            .map_or_else(|| text.to_string(), |o| o.value.clone())
    }
}
