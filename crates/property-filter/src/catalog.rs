//! Option catalog, async load status and load requests.
//!
//! The engine never fetches anything. It describes what it would like loaded
//! ([`LoadItemsDetail`]) and later receives options as a plain data update.
//! Each request carries an id from [`LoadTracker`]; only a response to the
//! most recent request is applied, so a slow response to an older query can
//! not overwrite options for the current one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogResult;
use crate::operator::ComparisonOperator;
use crate::query::Query;
use crate::registry::{FilteringProperty, PropertyDefinition};

/// A known value of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteringOption {
    /// Key of the property the value belongs to.
    pub property_key: String,
    /// Raw value stored in tokens.
    pub value: String,
    /// Display label for the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FilteringOption {
    /// Creates an option without a label.
    pub fn new(property_key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_key: property_key.into(),
            value: value.into(),
            label: None,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label if present, otherwise the raw value.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }

    /// Case-insensitive substring match against the raw value or the label.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return true;
        }
        let needle = text.to_lowercase();
        self.value.to_lowercase().contains(&needle)
            || self
                .label
                .as_ref()
                .is_some_and(|l| l.to_lowercase().contains(&needle))
    }
}

/// Loading state of a lazily loaded option list, as set by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsyncStatus {
    /// Nothing requested yet.
    Pending,
    /// A request is in flight.
    Loading,
    /// The last request failed.
    Error,
    /// All pages are loaded.
    #[default]
    Finished,
}

/// Parameters of a load request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadItemsDetail {
    /// Property whose values are wanted, or `None` for all properties.
    pub filtering_property: Option<String>,
    /// Operator typed so far.
    pub filtering_operator: Option<ComparisonOperator>,
    /// Text narrowing the values.
    pub filtering_text: String,
    /// The response starts a new result list.
    pub first_page: bool,
    /// The response repeats the previous page (retry).
    pub same_page: bool,
}

/// A load request tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Monotonically increasing id.
    pub id: u64,
    /// What to load.
    pub detail: LoadItemsDetail,
}

/// The caller's answer to a [`LoadRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResponse {
    /// Id of the request being answered.
    pub request_id: u64,
    /// Options of the page.
    pub options: Vec<FilteringOption>,
    /// Status after this page.
    pub status: AsyncStatus,
}

/// Issues request ids and remembers the latest request.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    next_id: u64,
    latest: Option<LoadRequest>,
}

impl LoadTracker {
    /// Creates a tracker with no request issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags `detail` with the next id and records it as the latest request.
    pub fn issue(&mut self, detail: LoadItemsDetail) -> LoadRequest {
        self.next_id += 1;
        let request = LoadRequest {
            id: self.next_id,
            detail,
        };
        tracing::debug!(
            id = request.id,
            property = ?request.detail.filtering_property,
            "issuing load request"
        );
        self.latest = Some(request.clone());
        request
    }

    /// The most recent request.
    pub fn latest(&self) -> Option<&LoadRequest> {
        self.latest.as_ref()
    }

    /// Returns the request `response` answers, if it is the latest one.
    pub fn accept(&self, response: &LoadResponse) -> Option<&LoadRequest> {
        match &self.latest {
            Some(request) if request.id == response.request_id => Some(request),
            _ => {
                tracing::debug!(id = response.request_id, "dropping stale load response");
                None
            }
        }
    }
}

/// Known options plus per-property loading status.
#[derive(Debug, Clone, Default)]
pub struct OptionCatalog {
    options: Vec<FilteringOption>,
    statuses: HashMap<String, AsyncStatus>,
    properties_status: Option<AsyncStatus>,
}

impl OptionCatalog {
    /// Creates a catalog of synchronously known options.
    pub fn new(options: Vec<FilteringOption>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Marks a property as lazily loaded with the given status.
    pub fn with_status(mut self, property_key: impl Into<String>, status: AsyncStatus) -> Self {
        self.statuses.insert(property_key.into(), status);
        self
    }

    /// Replaces all options.
    pub fn set_options(&mut self, options: Vec<FilteringOption>) {
        self.options = options;
    }

    /// Sets the status of a lazily loaded property.
    pub fn set_status(&mut self, property_key: impl Into<String>, status: AsyncStatus) {
        self.statuses.insert(property_key.into(), status);
    }

    /// Sets the status of the lazily loaded property list.
    pub fn set_properties_status(&mut self, status: AsyncStatus) {
        self.properties_status = Some(status);
    }

    /// Status of a property, `None` for synchronously known properties.
    pub fn status(&self, property_key: &str) -> Option<AsyncStatus> {
        self.statuses.get(property_key).copied()
    }

    /// Status of the property list, `None` when it is not loaded lazily.
    pub fn properties_status(&self) -> Option<AsyncStatus> {
        self.properties_status
    }

    /// Returns true if the property's options are loaded lazily.
    pub fn is_async(&self, property_key: &str) -> bool {
        self.statuses.contains_key(property_key)
    }

    /// All options, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FilteringOption> {
        self.options.iter()
    }

    /// Options of one property.
    pub fn for_property<'a>(
        &'a self,
        property_key: &'a str,
    ) -> impl Iterator<Item = &'a FilteringOption> + 'a {
        self.options
            .iter()
            .filter(move |o| o.property_key == property_key)
    }

    /// Display label of a raw value.
    pub fn label_for(&self, property_key: &str, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.property_key == property_key && o.value == value)
            .and_then(|o| o.label.as_deref())
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns true if there are no options.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Applies a response page for `request`.
    ///
    /// A first page replaces the options in scope of the request (one
    /// property, or everything for property-less requests); later pages and
    /// retries append, skipping values already present.
    pub fn apply(
        &mut self,
        request: &LoadRequest,
        options: Vec<FilteringOption>,
        status: AsyncStatus,
    ) {
        let scope = request.detail.filtering_property.as_deref();
        if request.detail.first_page {
            match scope {
                Some(key) => self.options.retain(|o| o.property_key != key),
                None => self.options.clear(),
            }
        }
        for option in options {
            let exists = self
                .options
                .iter()
                .any(|o| o.property_key == option.property_key && o.value == option.value);
            if !exists {
                self.options.push(option);
            }
        }
        match scope {
            Some(key) => self.set_status(key, status),
            None => self.set_properties_status(status),
        }
    }
}

/// A complete catalog document: properties, options, overrides, statuses
/// and an optional starting query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Filterable properties.
    pub properties: Vec<FilteringProperty>,
    /// Known values.
    pub options: Vec<FilteringOption>,
    /// Overrides keyed by property key.
    pub property_definitions: HashMap<String, PropertyDefinition>,
    /// Lazily loaded properties and their status.
    pub async_status: HashMap<String, AsyncStatus>,
    /// Starting query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
}

impl Catalog {
    /// Parses a catalog from JSON.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the option catalog part of the document.
    pub fn option_catalog(&self) -> OptionCatalog {
        let mut catalog = OptionCatalog::new(self.options.clone());
        for (key, status) in &self.async_status {
            catalog.set_status(key.clone(), *status);
        }
        catalog
    }
}
