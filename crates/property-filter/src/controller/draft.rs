//! Draft copy of a token being edited in place.
//!
//! A draft is copied from the query when the editor opens, edited freely, and
//! either written back with [`Draft::commit`] or thrown away with
//! [`Draft::cancel`]. The committed query is never touched in between.

use crate::config::FreeTextFiltering;
use crate::error::{QueryError, QueryResult};
use crate::operator::{ComparisonOperator, TokenType, TokenValue};
use crate::query::{Query, Token, TokenIndex};
use crate::registry::PropertyRegistry;

/// An uncommitted copy of the token at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    index: TokenIndex,
    original: Token,
    token: Token,
}

impl Draft {
    /// Copies the token at `index`.
    ///
    /// # Panics
    ///
    /// Panics if there is no token at `index`.
    pub fn open(query: &Query, index: TokenIndex) -> Self {
        Self::try_open(query, index).unwrap_or_else(|e| panic!("Draft::open: {e}"))
    }

    /// Copies the token at `index`, failing if there is none.
    pub fn try_open(query: &Query, index: TokenIndex) -> QueryResult<Self> {
        let token = query
            .token(index)
            .ok_or_else(|| QueryError::out_of_range(index, query.len()))?;
        Ok(Self {
            index,
            original: token.clone(),
            token: token.clone(),
        })
    }

    /// Where the edited token lives.
    pub fn index(&self) -> TokenIndex {
        self.index
    }

    /// The token as it was when the draft was opened.
    pub fn original(&self) -> &Token {
        &self.original
    }

    /// The edited token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Returns true if the draft differs from the original token.
    pub fn is_dirty(&self) -> bool {
        self.token != self.original
    }

    /// Changes the property (`None` for free text).
    ///
    /// The operator is kept if the new property allows it and falls back to
    /// the property's default operator otherwise. The value is always reset.
    pub fn set_property(
        &mut self,
        registry: &PropertyRegistry,
        free_text: &FreeTextFiltering,
        property_key: Option<&str>,
    ) {
        let current = self.token.operator;
        let operator = match property_key.and_then(|key| registry.get(key)) {
            Some(property) if property.allows(current) => current,
            Some(property) => property.default_operator,
            None if free_text.allowed_operators().contains(&current) => current,
            None => free_text.default_operator,
        };
        self.token.property_key = property_key.map(str::to_string);
        self.token.operator = operator;
        self.token.value = TokenValue::empty(self.token_type(registry, operator));
    }

    /// Changes the operator.
    ///
    /// The value survives if both operators take the same token type;
    /// otherwise it resets to the new type's empty value.
    pub fn set_operator(&mut self, registry: &PropertyRegistry, operator: ComparisonOperator) {
        let old_type = self.token_type(registry, self.token.operator);
        let new_type = self.token_type(registry, operator);
        self.token.operator = operator;
        if old_type != new_type {
            self.token.value = TokenValue::empty(new_type);
        }
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: TokenValue) {
        self.token.value = value;
    }

    /// Selects an option value.
    ///
    /// For enum operators this toggles membership, keeping selection order.
    /// For string operators it replaces the value.
    pub fn select_value(&mut self, registry: &PropertyRegistry, value: &str) {
        match self.token_type(registry, self.token.operator) {
            TokenType::Enum => {
                let mut values = self
                    .token
                    .value
                    .as_list()
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                match values.iter().position(|v| v == value) {
                    Some(i) => {
                        values.remove(i);
                    }
                    None => values.push(value.to_string()),
                }
                self.token.value = TokenValue::List(values);
            }
            TokenType::String => self.token.value = TokenValue::text(value),
        }
    }

    /// Writes the draft back over the token it was opened from.
    ///
    /// # Panics
    ///
    /// Panics if `query` no longer has a token at the draft's index.
    pub fn commit(self, query: &Query) -> Query {
        tracing::debug!(index = %self.index, dirty = self.is_dirty(), "committing draft");
        query.replace(self.index, self.token)
    }

    /// Throws the draft away, returning the untouched original.
    pub fn cancel(self) -> Token {
        tracing::debug!(index = %self.index, "discarding draft");
        self.original
    }

    fn token_type(&self, registry: &PropertyRegistry, operator: ComparisonOperator) -> TokenType {
        self.token
            .property_key
            .as_deref()
            .and_then(|key| registry.get(key))
            .map(|p| p.token_type(operator))
            .unwrap_or_default()
    }
}
