//! Token and query model.
//!
//! A [`Query`] is plain data. Every edit returns a new `Query` and leaves the
//! receiver untouched, so hosts can compare the old and new values to detect
//! edits that changed nothing.
//!
//! Edits that receive an index which does not exist panic: that is a caller
//! bug, not user input. Hosts that forward indices from elsewhere can use the
//! `try_*` variants instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::operator::{ComparisonOperator, TokenValue};

/// Boolean operation joining sibling tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// All siblings must match.
    #[default]
    And,
    /// Any sibling may match.
    Or,
}

impl Operation {
    /// Returns the other operation.
    pub fn toggled(self) -> Self {
        match self {
            Operation::And => Operation::Or,
            Operation::Or => Operation::And,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::And => "and",
            Operation::Or => "or",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed filter criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Property key, `None` for a free-text token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_key: Option<String>,
    /// Comparison operator.
    pub operator: ComparisonOperator,
    /// Value: text, a list for enum operators, or a custom shape.
    pub value: TokenValue,
}

impl Token {
    /// Creates a property token.
    pub fn property(
        key: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<TokenValue>,
    ) -> Self {
        Self {
            property_key: Some(key.into()),
            operator,
            value: value.into(),
        }
    }

    /// Creates a free-text token.
    pub fn free_text(operator: ComparisonOperator, value: impl Into<TokenValue>) -> Self {
        Self {
            property_key: None,
            operator,
            value: value.into(),
        }
    }

    /// Returns true if the token has no property.
    pub fn is_free_text(&self) -> bool {
        self.property_key.is_none()
    }
}

/// A nested group of tokens with its own operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenGroup {
    /// Operation joining the group's tokens.
    #[serde(default)]
    pub operation: Operation,
    /// Tokens of the group. Groups nest one level only.
    pub tokens: Vec<Token>,
}

/// A top-level entry of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryItem {
    /// A nested group.
    Group(TokenGroup),
    /// A leaf token.
    Token(Token),
}

impl QueryItem {
    /// Returns the token, if this item is a leaf.
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            QueryItem::Token(token) => Some(token),
            QueryItem::Group(_) => None,
        }
    }

    /// Returns the group, if this item is a group.
    pub fn as_group(&self) -> Option<&TokenGroup> {
        match self {
            QueryItem::Group(group) => Some(group),
            QueryItem::Token(_) => None,
        }
    }
}

impl From<Token> for QueryItem {
    fn from(token: Token) -> Self {
        QueryItem::Token(token)
    }
}

impl From<TokenGroup> for QueryItem {
    fn from(group: TokenGroup) -> Self {
        QueryItem::Group(group)
    }
}

/// Address of a token inside a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenIndex {
    /// A top-level token.
    Top(usize),
    /// A token inside a top-level group.
    Nested {
        /// Index of the group in the query.
        group: usize,
        /// Index of the token in the group.
        token: usize,
    },
}

impl fmt::Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenIndex::Top(i) => write!(f, "{i}"),
            TokenIndex::Nested { group, token } => write!(f, "{group}.{token}"),
        }
    }
}

/// Which operation an operation edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationTarget {
    /// The query's own operation.
    Root,
    /// The operation of the group at this top-level index.
    Group(usize),
}

/// The full filter: tokens plus the operation joining them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Operation joining top-level items.
    #[serde(default)]
    pub operation: Operation,
    /// Top-level items.
    #[serde(default)]
    pub tokens: Vec<QueryItem>,
}

impl Query {
    /// Creates an empty query with the given operation.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            tokens: Vec::new(),
        }
    }

    /// Creates a flat query from leaf tokens.
    pub fn from_tokens(operation: Operation, tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            operation,
            tokens: tokens.into_iter().map(QueryItem::Token).collect(),
        }
    }

    /// Number of top-level items.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of leaf tokens, counting tokens inside groups.
    pub fn token_count(&self) -> usize {
        self.tokens
            .iter()
            .map(|item| match item {
                QueryItem::Token(_) => 1,
                QueryItem::Group(group) => group.tokens.len(),
            })
            .sum()
    }

    /// Returns true if any top-level item is a group.
    pub fn has_groups(&self) -> bool {
        self.tokens.iter().any(|item| matches!(item, QueryItem::Group(_)))
    }

    /// Iterates leaf tokens with their indices, groups flattened in order.
    pub fn iter_tokens(&self) -> impl Iterator<Item = (TokenIndex, &Token)> {
        self.tokens.iter().enumerate().flat_map(|(i, item)| {
            let entries: Vec<(TokenIndex, &Token)> = match item {
                QueryItem::Token(token) => vec![(TokenIndex::Top(i), token)],
                QueryItem::Group(group) => group
                    .tokens
                    .iter()
                    .enumerate()
                    .map(|(j, token)| (TokenIndex::Nested { group: i, token: j }, token))
                    .collect(),
            };
            entries
        })
    }

    /// Returns the token at `index`.
    pub fn token(&self, index: TokenIndex) -> Option<&Token> {
        match index {
            TokenIndex::Top(i) => self.tokens.get(i).and_then(QueryItem::as_token),
            TokenIndex::Nested { group, token } => self
                .tokens
                .get(group)
                .and_then(QueryItem::as_group)
                .and_then(|g| g.tokens.get(token)),
        }
    }

    /// Appends a top-level token.
    pub fn add(&self, token: Token) -> Query {
        let mut next = self.clone();
        next.tokens.push(QueryItem::Token(token));
        next
    }

    /// Replaces the token at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not address a token.
    pub fn replace(&self, index: TokenIndex, token: Token) -> Query {
        self.try_replace(index, token)
            .unwrap_or_else(|e| panic!("Query::replace: {e}"))
    }

    /// Replaces the token at `index`, or reports why it cannot.
    pub fn try_replace(&self, index: TokenIndex, token: Token) -> QueryResult<Query> {
        let mut next = self.clone();
        *next.token_slot(index)? = token;
        Ok(next)
    }

    /// Removes the token at `index`. A group left empty is removed as well.
    ///
    /// The query's operation is kept even when the last token goes away.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not address a token.
    pub fn remove(&self, index: TokenIndex) -> Query {
        self.try_remove(index)
            .unwrap_or_else(|e| panic!("Query::remove: {e}"))
    }

    /// Removes the token at `index`, or reports why it cannot.
    pub fn try_remove(&self, index: TokenIndex) -> QueryResult<Query> {
        let mut next = self.clone();
        next.token_slot(index)?;
        match index {
            TokenIndex::Top(i) => {
                next.tokens.remove(i);
            }
            TokenIndex::Nested { group, token } => {
                let emptied = match &mut next.tokens[group] {
                    QueryItem::Group(g) => {
                        g.tokens.remove(token);
                        g.tokens.is_empty()
                    }
                    QueryItem::Token(_) => false,
                };
                if emptied {
                    next.tokens.remove(group);
                }
            }
        }
        Ok(next)
    }

    /// Removes every item, keeping the operation.
    pub fn remove_all(&self) -> Query {
        Query::new(self.operation)
    }

    /// Sets the operation of the query or of one group.
    ///
    /// Targeting a group changes only that group, never the parent.
    ///
    /// # Panics
    ///
    /// Panics if `target` names an index that is not a group.
    pub fn set_operation(&self, target: OperationTarget, operation: Operation) -> Query {
        self.try_set_operation(target, operation)
            .unwrap_or_else(|e| panic!("Query::set_operation: {e}"))
    }

    /// Sets an operation, or reports why it cannot.
    pub fn try_set_operation(
        &self,
        target: OperationTarget,
        operation: Operation,
    ) -> QueryResult<Query> {
        let mut next = self.clone();
        match target {
            OperationTarget::Root => next.operation = operation,
            OperationTarget::Group(i) => next.group_mut(i)?.operation = operation,
        }
        Ok(next)
    }

    /// Returns the current operation of a target.
    pub fn operation_of(&self, target: OperationTarget) -> Option<Operation> {
        match target {
            OperationTarget::Root => Some(self.operation),
            OperationTarget::Group(i) => self
                .tokens
                .get(i)
                .and_then(QueryItem::as_group)
                .map(|g| g.operation),
        }
    }

    /// Appends a token to an existing group, or turns the top-level token at
    /// `index` into a group holding it and the new token.
    ///
    /// The new group takes the query's operation toggled, so grouping under
    /// `and` yields an `or` group, the usual reason to group at all.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn add_to_group(&self, index: usize, token: Token) -> Query {
        self.try_add_to_group(index, token)
            .unwrap_or_else(|e| panic!("Query::add_to_group: {e}"))
    }

    /// Groups a token, or reports why it cannot.
    pub fn try_add_to_group(&self, index: usize, token: Token) -> QueryResult<Query> {
        let mut next = self.clone();
        let len = next.tokens.len();
        let item = next
            .tokens
            .get_mut(index)
            .ok_or_else(|| QueryError::out_of_range(TokenIndex::Top(index), len))?;
        let wrapped = match &mut *item {
            QueryItem::Group(group) => {
                group.tokens.push(token);
                None
            }
            QueryItem::Token(existing) => Some(TokenGroup {
                operation: self.operation.toggled(),
                tokens: vec![existing.clone(), token],
            }),
        };
        if let Some(group) = wrapped {
            *item = QueryItem::Group(group);
        }
        Ok(next)
    }

    /// Moves a nested token out of its group to the top level, right after
    /// the group. A group left with a single token is unwrapped.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not address a nested token.
    pub fn release(&self, index: TokenIndex) -> Query {
        self.try_release(index)
            .unwrap_or_else(|e| panic!("Query::release: {e}"))
    }

    /// Releases a nested token, or reports why it cannot.
    pub fn try_release(&self, index: TokenIndex) -> QueryResult<Query> {
        let TokenIndex::Nested { group, token } = index else {
            return Err(QueryError::wrong_kind(index, "nested token"));
        };
        let mut next = self.clone();
        let released = next.token_slot(index)?.clone();
        let g = next.group_mut(group)?;
        g.tokens.remove(token);
        match g.tokens.len() {
            0 => {
                next.tokens[group] = QueryItem::Token(released);
            }
            1 => {
                let remaining = g.tokens.remove(0);
                next.tokens[group] = QueryItem::Token(remaining);
                next.tokens.insert(group + 1, QueryItem::Token(released));
            }
            _ => next.tokens.insert(group + 1, QueryItem::Token(released)),
        }
        Ok(next)
    }

    fn token_slot(&mut self, index: TokenIndex) -> QueryResult<&mut Token> {
        let len = self.tokens.len();
        match index {
            TokenIndex::Top(i) => match self.tokens.get_mut(i) {
                Some(QueryItem::Token(token)) => Ok(token),
                Some(QueryItem::Group(_)) => Err(QueryError::wrong_kind(index, "token")),
                None => Err(QueryError::out_of_range(index, len)),
            },
            TokenIndex::Nested { group, token } => {
                let g = match self.tokens.get_mut(group) {
                    Some(QueryItem::Group(g)) => g,
                    Some(QueryItem::Token(_)) => return Err(QueryError::wrong_kind(index, "group")),
                    None => return Err(QueryError::out_of_range(index, len)),
                };
                g.tokens
                    .get_mut(token)
                    .ok_or_else(|| QueryError::out_of_range(index, len))
            }
        }
    }

    fn group_mut(&mut self, index: usize) -> QueryResult<&mut TokenGroup> {
        let len = self.tokens.len();
        match self.tokens.get_mut(index) {
            Some(QueryItem::Group(group)) => Ok(group),
            Some(QueryItem::Token(_)) => {
                Err(QueryError::wrong_kind(TokenIndex::Top(index), "group"))
            }
            None => Err(QueryError::out_of_range(TokenIndex::Top(index), len)),
        }
    }
}
