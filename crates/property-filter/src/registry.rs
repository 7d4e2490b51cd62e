//! Property registry: normalizes the caller's catalog of filterable properties.
//!
//! The registry resolves labels, operator lists, token types, value
//! formatters and custom forms once, so the parser and suggestion engine only
//! ever see validated [`InternalProperty`] values.
//!
//! # Override precedence
//!
//! Operator settings are merged from four places, highest priority first:
//!
//! 1. the per-operator entry of a [`PropertyDefinition`]
//! 2. the property-level fields of a [`PropertyDefinition`]
//! 3. the inline [`ExtendedOperator`] on the property
//! 4. the inline property-level fields of [`FilteringProperty`]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::catalog::FilteringOption;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::operator::{ComparisonOperator, TokenType, TokenValue};

/// Maximum Levenshtein distance to consider a key as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

type FormatFn = dyn Fn(&TokenValue) -> String + Send + Sync;

/// Turns a raw value into display text.
#[derive(Clone)]
pub struct ValueFormatter(Arc<FormatFn>);

impl ValueFormatter {
    /// Wraps a formatting function.
    pub fn new(f: impl Fn(&TokenValue) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Formats a value.
    pub fn format(&self, value: &TokenValue) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for ValueFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueFormatter(..)")
    }
}

/// Context handed to a custom operator form.
#[derive(Debug)]
pub struct FormContext<'a> {
    /// The property being edited, or `None` for free text.
    pub property: Option<&'a InternalProperty>,
    /// The operator whose form is rendered.
    pub operator: ComparisonOperator,
    /// Known options for the property.
    pub options: Vec<&'a FilteringOption>,
}

/// A custom value editor supplied for one operator.
///
/// The engine never interprets the value a form produces. It hands over the
/// current draft value and applies whatever the form reports through
/// `on_change`.
pub trait OperatorForm: Send + Sync {
    /// Renders the editor for `value`, reporting edits through `on_change`.
    fn render(
        &self,
        value: &TokenValue,
        on_change: &mut dyn FnMut(TokenValue),
        context: &FormContext<'_>,
    );
}

/// Shared handle to an [`OperatorForm`].
#[derive(Clone)]
pub struct FormHandle(Arc<dyn OperatorForm>);

impl FormHandle {
    /// Wraps a form implementation.
    pub fn new(form: impl OperatorForm + 'static) -> Self {
        Self(Arc::new(form))
    }

    /// Delegates to the wrapped form.
    pub fn render(
        &self,
        value: &TokenValue,
        on_change: &mut dyn FnMut(TokenValue),
        context: &FormContext<'_>,
    ) {
        self.0.render(value, on_change, context);
    }
}

impl fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FormHandle(..)")
    }
}

/// An operator with optional per-operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedOperator {
    /// The operator symbol.
    pub operator: ComparisonOperator,

    /// Scalar or list values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,

    /// Custom value formatting.
    #[serde(skip)]
    pub format: Option<ValueFormatter>,

    /// Custom value editor.
    #[serde(skip)]
    pub form: Option<FormHandle>,
}

impl ExtendedOperator {
    /// Creates an operator entry with no custom settings.
    pub fn new(operator: ComparisonOperator) -> Self {
        Self {
            operator,
            token_type: None,
            format: None,
            form: None,
        }
    }

    /// Sets the token type.
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = Some(token_type);
        self
    }

    /// Sets the value formatter.
    pub fn with_format(mut self, format: ValueFormatter) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the custom form.
    pub fn with_form(mut self, form: FormHandle) -> Self {
        self.form = Some(form);
        self
    }
}

/// An operator entry as written in a catalog: a bare symbol or an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorSpec {
    /// A bare symbol such as `"!="`.
    Symbol(ComparisonOperator),
    /// An operator with settings.
    Extended(ExtendedOperator),
}

impl OperatorSpec {
    /// Returns the operator symbol.
    pub fn operator(&self) -> ComparisonOperator {
        match self {
            OperatorSpec::Symbol(op) => *op,
            OperatorSpec::Extended(ext) => ext.operator,
        }
    }
}

impl From<ComparisonOperator> for OperatorSpec {
    fn from(op: ComparisonOperator) -> Self {
        OperatorSpec::Symbol(op)
    }
}

impl From<ExtendedOperator> for OperatorSpec {
    fn from(ext: ExtendedOperator) -> Self {
        OperatorSpec::Extended(ext)
    }
}

/// A filterable property as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteringProperty {
    /// Unique, stable id.
    pub key: String,

    /// Label typed and displayed for the property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_label: Option<String>,

    /// Label of the property's values group in suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_values_label: Option<String>,

    /// Custom group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Allowed operators, in declaration order.
    #[serde(default)]
    pub operators: Vec<OperatorSpec>,

    /// Operator used when none is chosen. Defaults to `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<ComparisonOperator>,

    /// Token type for operators that do not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,

    /// Value formatter for operators that do not set one.
    #[serde(skip)]
    pub format_value: Option<ValueFormatter>,
}

impl FilteringProperty {
    /// Creates a property with both labels set and no operators.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            key: key.into(),
            group_values_label: Some(format!("{label} values")),
            property_label: Some(label),
            group: None,
            operators: Vec::new(),
            default_operator: None,
            token_type: None,
            format_value: None,
        }
    }

    /// Sets the values group label.
    pub fn with_group_values_label(mut self, label: impl Into<String>) -> Self {
        self.group_values_label = Some(label.into());
        self
    }

    /// Sets the custom group id.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Appends operators.
    pub fn with_operators<I, O>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OperatorSpec>,
    {
        self.operators.extend(operators.into_iter().map(Into::into));
        self
    }

    /// Sets the default operator.
    pub fn with_default_operator(mut self, operator: ComparisonOperator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    /// Sets the property-level token type.
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = Some(token_type);
        self
    }

    /// Sets the property-level value formatter.
    pub fn with_format_value(mut self, format: ValueFormatter) -> Self {
        self.format_value = Some(format);
        self
    }
}

/// Caller-side overrides for a property, keyed by property key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Token type for all operators of the property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,

    /// Value formatter for all operators of the property.
    #[serde(skip)]
    pub format_value: Option<ValueFormatter>,

    /// Per-operator overrides.
    #[serde(default)]
    pub operators: HashMap<ComparisonOperator, OperatorDefinition>,
}

/// Caller-side overrides for one operator of one property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorDefinition {
    /// Token type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,

    /// Value formatter.
    #[serde(skip)]
    pub format: Option<ValueFormatter>,

    /// Custom value editor.
    #[serde(skip)]
    pub form: Option<FormHandle>,
}

/// An operator of a registered property with all overrides applied.
#[derive(Debug, Clone)]
pub struct InternalOperator {
    /// The operator symbol.
    pub operator: ComparisonOperator,
    /// Resolved token type.
    pub token_type: TokenType,
    /// Resolved value formatter.
    pub format: Option<ValueFormatter>,
    /// Resolved custom form.
    pub form: Option<FormHandle>,
}

/// A validated property.
#[derive(Debug, Clone)]
pub struct InternalProperty {
    /// Unique key.
    pub key: String,
    /// Property label (the key when none was supplied).
    pub label: String,
    /// Values group label (the key when none was supplied).
    pub group_values_label: String,
    /// Custom group id.
    pub group: Option<String>,
    /// Operator used when none is chosen.
    pub default_operator: ComparisonOperator,
    operators: Vec<InternalOperator>,
}

impl InternalProperty {
    /// Resolved operators, in declaration order.
    pub fn operators(&self) -> &[InternalOperator] {
        &self.operators
    }

    /// Allowed operator symbols, in declaration order.
    pub fn allowed_operators(&self) -> Vec<ComparisonOperator> {
        self.operators.iter().map(|o| o.operator).collect()
    }

    /// Returns true if the property accepts `operator`.
    pub fn allows(&self, operator: ComparisonOperator) -> bool {
        self.operators.iter().any(|o| o.operator == operator)
    }

    /// Returns the resolved settings for `operator`.
    pub fn operator(&self, operator: ComparisonOperator) -> Option<&InternalOperator> {
        self.operators.iter().find(|o| o.operator == operator)
    }

    /// Token type of `operator` on this property (`string` if not allowed).
    pub fn token_type(&self, operator: ComparisonOperator) -> TokenType {
        self.operator(operator)
            .map(|o| o.token_type)
            .unwrap_or_default()
    }

    /// Value formatter of `operator` on this property.
    pub fn formatter(&self, operator: ComparisonOperator) -> Option<&ValueFormatter> {
        self.operator(operator).and_then(|o| o.format.as_ref())
    }

    /// Custom form of `operator` on this property.
    pub fn form(&self, operator: ComparisonOperator) -> Option<&FormHandle> {
        self.operator(operator).and_then(|o| o.form.as_ref())
    }
}

/// Normalized, validated set of filterable properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    properties: Vec<InternalProperty>,
    by_key: HashMap<String, usize>,
}

impl PropertyRegistry {
    /// Builds a registry, reporting configuration defects to `diagnostics`.
    ///
    /// Defects never fail construction: a missing label falls back to the
    /// key, a property without operators gets its default operator, and a
    /// duplicate key keeps the first declaration.
    pub fn new(
        properties: Vec<FilteringProperty>,
        definitions: &HashMap<String, PropertyDefinition>,
        diagnostics: &Diagnostics,
    ) -> Self {
        let mut registry = Self::default();

        for property in properties {
            if registry.by_key.contains_key(&property.key) {
                diagnostics.warn_once(
                    DiagnosticCode::DuplicateProperty,
                    format!(
                        "property key '{}' is declared more than once; keeping the first",
                        property.key
                    ),
                );
                continue;
            }
            let internal = resolve_property(property, definitions, diagnostics);
            registry
                .by_key
                .insert(internal.key.clone(), registry.properties.len());
            registry.properties.push(internal);
        }

        let mut unknown: Vec<&String> = definitions
            .keys()
            .filter(|key| !registry.by_key.contains_key(*key))
            .collect();
        unknown.sort();
        for key in unknown {
            diagnostics.warn_once(
                DiagnosticCode::UnknownPropertyDefinition,
                format!("property definition '{key}' has no matching property and is ignored"),
            );
        }

        registry
    }

    /// Looks up a property by key.
    pub fn get(&self, key: &str) -> Option<&InternalProperty> {
        self.by_key.get(key).map(|&i| &self.properties[i])
    }

    /// Iterates properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &InternalProperty> {
        self.properties.iter()
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if no property is registered.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns the property whose label is the longest prefix of `text`.
    ///
    /// Matching is case-sensitive. Picking the longest label makes
    /// `"string-other"` win over `"string"`, and lets a label that contains
    /// operator characters (`"string!="`) win over a shorter label followed by
    /// an operator. Equal-length ties keep declaration order.
    pub fn match_label(&self, text: &str) -> Option<&InternalProperty> {
        let mut best: Option<&InternalProperty> = None;
        for property in &self.properties {
            if property.label.is_empty() || !text.starts_with(property.label.as_str()) {
                continue;
            }
            if best.map_or(true, |b| property.label.len() > b.label.len()) {
                best = Some(property);
            }
        }
        best
    }

    /// Finds the closest key to `key` for "did you mean" hints.
    pub fn similar_key(&self, key: &str) -> Option<String> {
        let key_lower = key.to_lowercase();
        let (best, distance) = self
            .properties
            .iter()
            .map(|p| (p.key.as_str(), levenshtein(&key_lower, &p.key.to_lowercase())))
            .min_by_key(|(_, d)| *d)?;

        // Only suggest if the distance is within threshold and not an exact match
        (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then(|| best.to_string())
    }
}

fn resolve_property(
    property: FilteringProperty,
    definitions: &HashMap<String, PropertyDefinition>,
    diagnostics: &Diagnostics,
) -> InternalProperty {
    let key = property.key;

    let label = property.property_label.unwrap_or_else(|| {
        diagnostics.warn_once(
            DiagnosticCode::MissingPropertyLabel,
            format!("property '{key}' has no property_label; using the key"),
        );
        key.clone()
    });
    let group_values_label = property.group_values_label.unwrap_or_else(|| {
        diagnostics.warn_once(
            DiagnosticCode::MissingGroupValuesLabel,
            format!("property '{key}' has no group_values_label; using the key"),
        );
        key.clone()
    });

    let default_operator = property
        .default_operator
        .unwrap_or(ComparisonOperator::Equals);

    let mut specs = property.operators;
    if specs.is_empty() {
        diagnostics.warn_once(
            DiagnosticCode::MissingOperators,
            format!("property '{key}' declares no operators; assuming '{default_operator}'"),
        );
    }
    if !specs.iter().any(|s| s.operator() == default_operator) {
        specs.insert(0, OperatorSpec::Symbol(default_operator));
    }

    let definition = definitions.get(&key);
    let mut operators: Vec<InternalOperator> = Vec::with_capacity(specs.len());
    for spec in specs {
        if operators.iter().any(|o| o.operator == spec.operator()) {
            continue;
        }
        operators.push(resolve_operator(
            spec,
            property.token_type,
            property.format_value.as_ref(),
            definition,
        ));
    }

    InternalProperty {
        key,
        label,
        group_values_label,
        group: property.group,
        default_operator,
        operators,
    }
}

fn resolve_operator(
    spec: OperatorSpec,
    inline_token_type: Option<TokenType>,
    inline_format: Option<&ValueFormatter>,
    definition: Option<&PropertyDefinition>,
) -> InternalOperator {
    let inline = match spec {
        OperatorSpec::Symbol(op) => ExtendedOperator::new(op),
        OperatorSpec::Extended(ext) => ext,
    };
    let operator = inline.operator;
    let op_override = definition.and_then(|d| d.operators.get(&operator));

    let token_type = op_override
        .and_then(|o| o.token_type)
        .or_else(|| definition.and_then(|d| d.token_type))
        .or(inline.token_type)
        .or(inline_token_type)
        .unwrap_or_default();

    let format = op_override
        .and_then(|o| o.format.clone())
        .or_else(|| definition.and_then(|d| d.format_value.clone()))
        .or(inline.format)
        .or_else(|| inline_format.cloned());

    let form = op_override.and_then(|o| o.form.clone()).or(inline.form);

    InternalOperator {
        operator,
        token_type,
        format,
        form,
    }
}
