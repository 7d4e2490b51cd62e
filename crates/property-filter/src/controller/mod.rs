//! Editing controller.
//!
//! The state machine that turns user events into query edits:
//!
//! ```text
//! Closed ──focus──▶ Suggesting ──select value / submit──▶ ClosedAfterCommit
//!   ▲                   │   ▲                                   │
//!   └──────blur─────────┘   └────────────type──────────────────┘
//!
//! any ──open_editor──▶ EditingExisting(draft) ──commit / cancel──▶ Closed
//! ```
//!
//! The controller never owns the query. Every call that edits receives the
//! current [`Query`] and reports the edited one through
//! [`ControllerEvent::Change`], so hosts decide how to store it. Load
//! requests for lazily loaded properties are reported the same way.

mod draft;

pub use draft::Draft;

use crate::catalog::{FilteringOption, LoadItemsDetail, LoadRequest, LoadResponse, LoadTracker};
use crate::diagnostics::DiagnosticCode;
use crate::engine::FilterEngine;
use crate::operator::{ComparisonOperator, TokenValue};
use crate::query::{Operation, OperationTarget, Query, TokenIndex};
use crate::registry::FormContext;
use crate::suggest::Suggestions;
use crate::view::TokenListView;

/// Where the controller is in the editing lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ControllerState {
    /// Input not focused, nothing open.
    #[default]
    Closed,
    /// Suggestions are open for the input text.
    Suggesting,
    /// An existing token is being edited through a draft.
    EditingExisting(Draft),
    /// A token was just committed; suggestions reopen on the next keystroke.
    ClosedAfterCommit,
}

/// Notification for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The query changed.
    Change(Query),
    /// Options for a lazily loaded property are wanted.
    LoadItems(LoadRequest),
}

/// Coordinates token creation, in-place editing, removal and operation
/// toggles.
#[derive(Debug, Clone, Default)]
pub struct FilterController {
    state: ControllerState,
    text: String,
    focused: bool,
    expanded: bool,
    tracker: LoadTracker,
}

impl FilterController {
    /// Creates a closed controller with empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Current input text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the input has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether hidden tokens are shown.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// The open draft, if an existing token is being edited.
    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            ControllerState::EditingExisting(draft) => Some(draft),
            _ => None,
        }
    }

    /// The most recent load request.
    pub fn latest_request(&self) -> Option<&LoadRequest> {
        self.tracker.latest()
    }

    // ==================== Input ====================

    /// Focuses the input, opening suggestions.
    pub fn focus(&mut self, engine: &FilterEngine) -> Option<ControllerEvent> {
        self.focused = true;
        match self.state {
            ControllerState::Closed | ControllerState::ClosedAfterCommit => {
                self.transition(ControllerState::Suggesting);
                self.load(engine, true, false)
            }
            _ => None,
        }
    }

    /// Removes focus from the input, closing suggestions.
    pub fn blur(&mut self) {
        self.focused = false;
        if matches!(
            self.state,
            ControllerState::Suggesting | ControllerState::ClosedAfterCommit
        ) {
            self.transition(ControllerState::Closed);
        }
    }

    /// Replaces the input text.
    ///
    /// Requests a first page when the text narrows a lazily loaded
    /// property differently than before.
    pub fn set_text(
        &mut self,
        engine: &FilterEngine,
        text: impl Into<String>,
    ) -> Option<ControllerEvent> {
        let previous = self.input_load_detail(engine);
        self.text = text.into();
        if self.focused && self.draft().is_none() {
            self.transition(ControllerState::Suggesting);
        }
        let detail = self.input_load_detail(engine)?;
        if previous.as_ref() == Some(&detail) {
            return None;
        }
        Some(ControllerEvent::LoadItems(self.tracker.issue(detail)))
    }

    /// Suggestions for the current input text.
    pub fn suggestions(&self, engine: &FilterEngine) -> Suggestions {
        engine.suggest(&self.text)
    }

    /// Selects the suggestion at a flattened index.
    ///
    /// Property and operator suggestions only insert their text and keep
    /// suggestions open. Value and entered-text suggestions commit a token.
    pub fn select(
        &mut self,
        engine: &FilterEngine,
        query: &Query,
        index: usize,
    ) -> Option<ControllerEvent> {
        let suggestions = self.suggestions(engine);
        let suggestion = suggestions.get(index)?;
        if suggestion.keep_open_on_select {
            let value = suggestion.value.clone();
            return self.set_text(engine, value);
        }
        let value = suggestion.value.clone();
        self.commit_text(engine, query, &value, None)
    }

    /// Commits the input text as a new top-level token.
    pub fn submit(&mut self, engine: &FilterEngine, query: &Query) -> Option<ControllerEvent> {
        let text = self.text.clone();
        self.commit_text(engine, query, &text, None)
    }

    /// Commits the input text into the item at top-level `index`, forming a
    /// group when needed.
    ///
    /// With token groups disabled this reports a diagnostic and adds the
    /// token at the top level instead.
    pub fn submit_to_group(
        &mut self,
        engine: &FilterEngine,
        query: &Query,
        index: usize,
    ) -> Option<ControllerEvent> {
        let text = self.text.clone();
        if !engine.config().enable_token_groups {
            engine.diagnostics().warn_once(
                DiagnosticCode::GroupsDisabled,
                "adding to a group requires enable_token_groups; adding at the top level",
            );
            return self.commit_text(engine, query, &text, None);
        }
        self.commit_text(engine, query, &text, Some(index))
    }

    fn commit_text(
        &mut self,
        engine: &FilterEngine,
        query: &Query,
        text: &str,
        group: Option<usize>,
    ) -> Option<ControllerEvent> {
        let Some(token) = engine.token_from_text(text) else {
            tracing::debug!(text, "nothing to commit");
            return None;
        };
        let query = match group {
            Some(index) => query.add_to_group(index, token),
            None => query.add(token),
        };
        self.text.clear();
        let next = if self.focused {
            ControllerState::ClosedAfterCommit
        } else {
            ControllerState::Closed
        };
        self.transition(next);
        Some(ControllerEvent::Change(query))
    }

    // ==================== Editing ====================

    /// Opens the editor over the token at `index`.
    ///
    /// # Panics
    ///
    /// Panics if there is no token at `index`.
    pub fn open_editor(
        &mut self,
        engine: &FilterEngine,
        query: &Query,
        index: TokenIndex,
    ) -> Option<ControllerEvent> {
        self.transition(ControllerState::EditingExisting(Draft::open(query, index)));
        self.load(engine, true, false)
    }

    /// Changes the draft's property (`None` for free text).
    pub fn set_draft_property(
        &mut self,
        engine: &FilterEngine,
        property_key: Option<&str>,
    ) -> Option<ControllerEvent> {
        let draft = self.draft_mut()?;
        draft.set_property(
            engine.registry(),
            &engine.config().free_text_filtering,
            property_key,
        );
        self.load(engine, true, false)
    }

    /// Changes the draft's operator.
    pub fn set_draft_operator(&mut self, engine: &FilterEngine, operator: ComparisonOperator) {
        if let Some(draft) = self.draft_mut() {
            draft.set_operator(engine.registry(), operator);
        }
    }

    /// Replaces the draft's value.
    pub fn set_draft_value(&mut self, value: TokenValue) {
        if let Some(draft) = self.draft_mut() {
            draft.set_value(value);
        }
    }

    /// Options of the draft's property narrowed by `filter_text`.
    pub fn draft_options<'e>(
        &self,
        engine: &'e FilterEngine,
        filter_text: &str,
    ) -> Vec<&'e FilteringOption> {
        let Some(key) = self.draft().and_then(|d| d.token().property_key.clone()) else {
            return Vec::new();
        };
        engine
            .catalog()
            .iter()
            .filter(|o| o.property_key == key && o.matches(filter_text))
            .collect()
    }

    /// Selects an option value in the editor; toggles for enum operators.
    pub fn select_draft_value(&mut self, engine: &FilterEngine, value: &str) {
        if let Some(draft) = self.draft_mut() {
            draft.select_value(engine.registry(), value);
        }
    }

    /// Hands the draft value to the custom form of its operator, applying
    /// whatever the form reports. Returns false when the operator has no
    /// custom form and the default editor applies.
    pub fn render_draft_form(&mut self, engine: &FilterEngine) -> bool {
        let ControllerState::EditingExisting(draft) = &mut self.state else {
            return false;
        };
        let token = draft.token();
        let Some(property) = token
            .property_key
            .as_deref()
            .and_then(|key| engine.registry().get(key))
        else {
            return false;
        };
        let Some(form) = property.form(token.operator) else {
            return false;
        };

        let context = FormContext {
            property: Some(property),
            operator: token.operator,
            options: engine.catalog().for_property(&property.key).collect(),
        };
        let mut changed: Option<TokenValue> = None;
        form.render(
            &token.value,
            &mut |value: TokenValue| changed = Some(value),
            &context,
        );
        if let Some(value) = changed {
            draft.set_value(value);
        }
        true
    }

    /// Writes the draft back into `query`.
    pub fn commit_edit(&mut self, query: &Query) -> Option<ControllerEvent> {
        let draft = self.take_draft()?;
        Some(ControllerEvent::Change(draft.commit(query)))
    }

    /// Discards the draft without touching the query.
    pub fn cancel_edit(&mut self) {
        if let Some(draft) = self.take_draft() {
            draft.cancel();
        }
    }

    /// Closes the editor the way an outside click would: same as cancel.
    pub fn dismiss(&mut self) {
        self.cancel_edit();
    }

    fn take_draft(&mut self) -> Option<Draft> {
        self.draft()?;
        match std::mem::take(&mut self.state) {
            ControllerState::EditingExisting(draft) => {
                self.transition(ControllerState::Closed);
                Some(draft)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            ControllerState::EditingExisting(draft) => Some(draft),
            _ => None,
        }
    }

    // ==================== One-shot edits ====================

    /// Removes the token at `index`.
    ///
    /// An open editor is closed: removal shifts sibling indices, so the
    /// draft could no longer be written back to the token it was opened on.
    ///
    /// # Panics
    ///
    /// Panics if there is no token at `index`.
    pub fn remove_token(&mut self, query: &Query, index: TokenIndex) -> ControllerEvent {
        let next = query.remove(index);
        self.cancel_edit();
        ControllerEvent::Change(next)
    }

    /// Removes every token.
    pub fn remove_all(&mut self, query: &Query) -> Option<ControllerEvent> {
        if query.is_empty() {
            return None;
        }
        if self.draft().is_some() {
            self.cancel_edit();
        }
        Some(ControllerEvent::Change(query.remove_all()))
    }

    /// Sets an operation directly, outside the edit lifecycle.
    ///
    /// # Panics
    ///
    /// Panics if `target` names no group.
    pub fn set_operation(
        &self,
        query: &Query,
        target: OperationTarget,
        operation: Operation,
    ) -> ControllerEvent {
        ControllerEvent::Change(query.set_operation(target, operation))
    }

    /// Flips an operation between `and` and `or`.
    ///
    /// # Panics
    ///
    /// Panics if `target` names no group.
    pub fn toggle_operation(&self, query: &Query, target: OperationTarget) -> ControllerEvent {
        let current = query.operation_of(target).unwrap_or_default();
        self.set_operation(query, target, current.toggled())
    }

    /// Moves a nested token out of its group, closing any open editor.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a nested token.
    pub fn release(&mut self, query: &Query, index: TokenIndex) -> ControllerEvent {
        let next = query.release(index);
        self.cancel_edit();
        ControllerEvent::Change(next)
    }

    // ==================== Token list ====================

    /// Flips between showing all tokens and the first `token_limit`.
    pub fn toggle_show_more(&mut self) {
        self.expanded = !self.expanded;
    }

    /// The token list for `query`.
    pub fn view(&self, engine: &FilterEngine, query: &Query) -> TokenListView {
        engine.view(query, self.expanded)
    }

    // ==================== Async loading ====================

    /// Requests the next page of the current options.
    pub fn load_more(&mut self, engine: &FilterEngine) -> Option<ControllerEvent> {
        self.load(engine, false, false)
    }

    /// Requests the failed page again.
    pub fn retry(&mut self, engine: &FilterEngine) -> Option<ControllerEvent> {
        self.load(engine, false, true)
    }

    /// Applies a load response to the engine's options.
    ///
    /// Only a response to the latest request is applied; anything else
    /// answers text the user has already moved past. Returns true if the
    /// response was applied.
    pub fn receive_options(&self, engine: &mut FilterEngine, response: LoadResponse) -> bool {
        let Some(request) = self.tracker.accept(&response) else {
            return false;
        };
        engine
            .catalog_mut()
            .apply(request, response.options, response.status);
        true
    }

    fn load(
        &mut self,
        engine: &FilterEngine,
        first_page: bool,
        same_page: bool,
    ) -> Option<ControllerEvent> {
        let mut detail = match self.draft() {
            Some(draft) => draft_load_detail(engine, draft)?,
            None => self.input_load_detail(engine)?,
        };
        detail.first_page = first_page;
        detail.same_page = same_page;
        Some(ControllerEvent::LoadItems(self.tracker.issue(detail)))
    }

    fn input_load_detail(&self, engine: &FilterEngine) -> Option<LoadItemsDetail> {
        let state = engine.parse(&self.text);
        let is_async = match state.property {
            Some(property) => engine.catalog().is_async(&property.key),
            None => engine.config().async_properties,
        };
        is_async.then(|| LoadItemsDetail {
            filtering_property: state.property.map(|p| p.key.clone()),
            filtering_operator: state.operator,
            filtering_text: state.filter_text.clone(),
            first_page: true,
            same_page: false,
        })
    }

    fn transition(&mut self, next: ControllerState) {
        tracing::debug!(
            from = state_name(&self.state),
            to = state_name(&next),
            "controller transition"
        );
        self.state = next;
    }
}

fn draft_load_detail(engine: &FilterEngine, draft: &Draft) -> Option<LoadItemsDetail> {
    let key = draft.token().property_key.as_deref()?;
    engine
        .catalog()
        .is_async(key)
        .then(|| LoadItemsDetail {
            filtering_property: Some(key.to_string()),
            filtering_operator: Some(draft.token().operator),
            filtering_text: String::new(),
            first_page: true,
            same_page: false,
        })
}

fn state_name(state: &ControllerState) -> &'static str {
    match state {
        ControllerState::Closed => "closed",
        ControllerState::Suggesting => "suggesting",
        ControllerState::EditingExisting(_) => "editing",
        ControllerState::ClosedAfterCommit => "closed-after-commit",
    }
}

#[cfg(test)]
mod tests;
