//! Tests for the editing controller.

use std::collections::HashMap;

use super::*;
use crate::catalog::{AsyncStatus, OptionCatalog};
use crate::config::FilterConfig;
use crate::diagnostics::DiagnosticCode;
use crate::operator::TokenType;
use crate::query::{QueryItem, Token, TokenGroup};
use crate::registry::{
    ExtendedOperator, FilteringProperty, FormHandle, OperatorForm, OperatorSpec,
};

use ComparisonOperator::*;

struct RangeForm;

impl OperatorForm for RangeForm {
    fn render(
        &self,
        _value: &TokenValue,
        on_change: &mut dyn FnMut(TokenValue),
        context: &FormContext<'_>,
    ) {
        assert_eq!(context.operator, Equals);
        on_change(TokenValue::Custom(serde_json::json!({"from": 1, "to": 5})));
    }
}

fn properties() -> Vec<FilteringProperty> {
    vec![
        FilteringProperty::new("string", "string").with_operators([
            OperatorSpec::from(Equals),
            OperatorSpec::from(Contains),
            OperatorSpec::from(NotContains),
            ExtendedOperator::new(NotEquals)
                .with_token_type(TokenType::Enum)
                .into(),
        ]),
        FilteringProperty::new("string-other", "string-other").with_operators([Equals, NotEquals]),
        FilteringProperty::new("state", "State").with_operators([
            ExtendedOperator::new(Equals).with_token_type(TokenType::Enum),
            ExtendedOperator::new(NotEquals),
        ]),
        FilteringProperty::new("range", "Range")
            .with_operators([ExtendedOperator::new(Equals).with_form(FormHandle::new(RangeForm))]),
    ]
}

fn options() -> OptionCatalog {
    OptionCatalog::new(vec![
        FilteringOption::new("state", "0").with_label("Stopped"),
        FilteringOption::new("state", "1").with_label("Stopping"),
        FilteringOption::new("state", "2").with_label("Running"),
    ])
}

fn engine() -> FilterEngine {
    engine_with(FilterConfig::default(), options())
}

fn engine_with(config: FilterConfig, catalog: OptionCatalog) -> FilterEngine {
    FilterEngine::new(properties(), &HashMap::new(), catalog, config)
}

fn changed(event: Option<ControllerEvent>) -> Query {
    match event {
        Some(ControllerEvent::Change(query)) => query,
        other => panic!("expected a change, got {other:?}"),
    }
}

fn load_request(event: Option<ControllerEvent>) -> LoadRequest {
    match event {
        Some(ControllerEvent::LoadItems(request)) => request,
        other => panic!("expected a load request, got {other:?}"),
    }
}

fn single_token(query: &Query) -> &Token {
    assert_eq!(query.len(), 1);
    query.token(TokenIndex::Top(0)).unwrap()
}

// ==================== Creating tokens ====================

#[test]
fn test_free_text_round_trip() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.focus(&engine);
    assert_eq!(controller.state(), &ControllerState::Suggesting);

    controller.set_text(&engine, "string");
    let query = changed(controller.submit(&engine, &Query::default()));

    assert_eq!(query.operation, Operation::And);
    assert_eq!(single_token(&query), &Token::free_text(Contains, "string"));
    assert_eq!(controller.text(), "");
    assert_eq!(controller.state(), &ControllerState::ClosedAfterCommit);
}

#[test]
fn test_submit_uses_longest_label() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.set_text(&engine, "string-other != value2");
    let query = changed(controller.submit(&engine, &Query::default()));
    assert_eq!(
        single_token(&query),
        &Token::property("string-other", NotEquals, "value2")
    );
}

#[test]
fn test_submit_uses_longest_operator() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.set_text(&engine, "State != X");
    let query = changed(controller.submit(&engine, &Query::default()));
    assert_eq!(single_token(&query), &Token::property("state", NotEquals, "X"));
}

#[test]
fn test_property_suggestion_keeps_suggestions_open() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.focus(&engine);
    controller.set_text(&engine, "Sta");

    let event = controller.select(&engine, &Query::default(), 0);

    assert!(event.is_none());
    assert_eq!(controller.text(), "State ");
    assert_eq!(controller.state(), &ControllerState::Suggesting);
}

#[test]
fn test_value_suggestion_commits() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.focus(&engine);
    controller.set_text(&engine, "State = Stop");

    let query = changed(controller.select(&engine, &Query::default(), 1));

    assert_eq!(
        single_token(&query),
        &Token::property("state", Equals, TokenValue::list(["1"]))
    );
    assert_eq!(engine.format(single_token(&query)), "State = Stopping");
}

#[test]
fn test_typing_after_commit_reopens_suggestions() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.focus(&engine);
    controller.set_text(&engine, "abc");
    controller.submit(&engine, &Query::default());
    controller.set_text(&engine, "d");
    assert_eq!(controller.state(), &ControllerState::Suggesting);
    controller.blur();
    assert_eq!(controller.state(), &ControllerState::Closed);
}

#[test]
fn test_blank_submit_is_ignored() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.set_text(&engine, "  ");
    assert!(controller.submit(&engine, &Query::default()).is_none());
}

// ==================== Editing existing tokens ====================

#[test]
fn test_enum_selection_in_editor() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [Token::property("state", Equals, TokenValue::list(["1"]))],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    controller.select_draft_value(&engine, "0");
    let query = changed(controller.commit_edit(&query));

    let token = single_token(&query);
    assert_eq!(token.value, TokenValue::list(["1", "0"]));
    assert_eq!(engine.format(token), "State = Stopping, Stopped");
}

#[test]
fn test_enum_selection_toggles_membership() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [Token::property("state", Equals, TokenValue::list(["1", "0"]))],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    controller.select_draft_value(&engine, "1");
    assert_eq!(
        controller.draft().unwrap().token().value,
        TokenValue::list(["0"])
    );
}

#[test]
fn test_operator_change_keeps_compatible_value() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [Token::property("string", Contains, "first")],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    controller.set_draft_operator(&engine, Equals);
    assert_eq!(controller.draft().unwrap().token().value, TokenValue::text("first"));

    controller.set_draft_operator(&engine, NotEquals);
    assert_eq!(
        controller.draft().unwrap().token().value,
        TokenValue::List(Vec::new())
    );
}

#[test]
fn test_property_change_clears_value() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [
            Token::property("string", Equals, "first"),
            Token::property("string", Contains, "second"),
        ],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    controller.set_draft_property(&engine, Some("string-other"));
    let draft = controller.draft().unwrap().token();
    assert_eq!(draft.operator, Equals);
    assert_eq!(draft.value, TokenValue::text(""));
    controller.cancel_edit();

    controller.open_editor(&engine, &query, TokenIndex::Top(1));
    controller.set_draft_property(&engine, Some("state"));
    let draft = controller.draft().unwrap().token();
    assert_eq!(draft.operator, Equals);
    assert_eq!(draft.value, TokenValue::List(Vec::new()));
}

#[test]
fn test_cancel_discards_draft() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(Operation::And, [Token::property("string", Equals, "a")]);
    let before = query.clone();

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    controller.set_draft_value(TokenValue::text("b"));
    assert!(controller.draft().unwrap().is_dirty());
    controller.cancel_edit();

    assert_eq!(controller.state(), &ControllerState::Closed);
    assert!(controller.commit_edit(&query).is_none());
    assert_eq!(query, before);
}

#[test]
fn test_dismiss_is_cancel() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(Operation::And, [Token::property("string", Equals, "a")]);
    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    controller.dismiss();
    assert!(controller.draft().is_none());
}

#[test]
fn test_commit_replaces_nested_token() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query {
        operation: Operation::And,
        tokens: vec![QueryItem::Group(TokenGroup {
            operation: Operation::Or,
            tokens: vec![
                Token::property("string", Equals, "a"),
                Token::property("string", Equals, "b"),
            ],
        })],
    };
    let index = TokenIndex::Nested { group: 0, token: 1 };

    controller.open_editor(&engine, &query, index);
    controller.set_draft_value(TokenValue::text("c"));
    let query = changed(controller.commit_edit(&query));

    assert_eq!(
        query.token(index),
        Some(&Token::property("string", Equals, "c"))
    );
    assert_eq!(query.operation_of(OperationTarget::Group(0)), Some(Operation::Or));
}

#[test]
fn test_custom_form_receives_draft() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [
            Token::property("range", Equals, ""),
            Token::property("string", Equals, ""),
        ],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    assert!(controller.render_draft_form(&engine));
    assert_eq!(
        controller.draft().unwrap().token().value,
        TokenValue::Custom(serde_json::json!({"from": 1, "to": 5}))
    );

    controller.cancel_edit();
    controller.open_editor(&engine, &query, TokenIndex::Top(1));
    assert!(!controller.render_draft_form(&engine));
}

#[test]
#[should_panic(expected = "Draft::open")]
fn test_open_editor_out_of_range_panics() {
    let engine = engine();
    let mut controller = FilterController::new();
    controller.open_editor(&engine, &Query::default(), TokenIndex::Top(3));
}

// ==================== One-shot edits ====================

#[test]
fn test_toggle_operation_bypasses_editor() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [
            Token::property("string", Equals, "a"),
            Token::property("string", Equals, "b"),
        ],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(1));
    let ControllerEvent::Change(toggled) =
        controller.toggle_operation(&query, OperationTarget::Root)
    else {
        panic!("expected a change");
    };

    assert_eq!(toggled.operation, Operation::Or);
    assert!(controller.draft().is_some());
}

#[test]
fn test_remove_token_closes_its_editor() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(Operation::Or, [Token::property("string", Equals, "a")]);

    controller.open_editor(&engine, &query, TokenIndex::Top(0));
    let ControllerEvent::Change(removed) = controller.remove_token(&query, TokenIndex::Top(0))
    else {
        panic!("expected a change");
    };

    assert!(removed.is_empty());
    assert_eq!(removed.operation, Operation::Or);
    assert!(controller.draft().is_none());
}

#[test]
fn test_removing_a_sibling_closes_the_editor() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [
            Token::property("string", Equals, "a"),
            Token::property("string", Equals, "b"),
        ],
    );

    controller.open_editor(&engine, &query, TokenIndex::Top(1));
    controller.set_draft_value(TokenValue::text("c"));
    let ControllerEvent::Change(removed) = controller.remove_token(&query, TokenIndex::Top(0))
    else {
        panic!("expected a change");
    };

    assert!(controller.draft().is_none());
    assert!(controller.commit_edit(&removed).is_none());
    assert_eq!(
        removed.token(TokenIndex::Top(0)),
        Some(&Token::property("string", Equals, "b"))
    );
}

#[test]
fn test_release_closes_the_editor() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query {
        operation: Operation::And,
        tokens: vec![QueryItem::Group(TokenGroup {
            operation: Operation::Or,
            tokens: vec![
                Token::property("string", Equals, "a"),
                Token::property("string", Equals, "b"),
                Token::property("string", Equals, "c"),
            ],
        })],
    };

    controller.open_editor(&engine, &query, TokenIndex::Nested { group: 0, token: 2 });
    let ControllerEvent::Change(released) =
        controller.release(&query, TokenIndex::Nested { group: 0, token: 0 })
    else {
        panic!("expected a change");
    };

    assert!(controller.draft().is_none());
    assert!(controller.commit_edit(&released).is_none());
    assert_eq!(released.len(), 2);
}

#[test]
fn test_remove_all() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::Or,
        [
            Token::property("string", Equals, "a"),
            Token::free_text(Contains, "b"),
        ],
    );
    controller.open_editor(&engine, &query, TokenIndex::Top(1));
    let cleared = changed(controller.remove_all(&query));
    assert!(cleared.is_empty());
    assert!(controller.draft().is_none());
    assert_eq!(cleared.operation, Operation::Or);
    assert!(controller.remove_all(&cleared).is_none());
}

#[test]
fn test_submit_to_group() {
    let config = FilterConfig {
        enable_token_groups: true,
        ..FilterConfig::default()
    };
    let engine = engine_with(config, options());
    let mut controller = FilterController::new();
    let query = Query::from_tokens(Operation::And, [Token::property("string", Equals, "a")]);

    controller.set_text(&engine, "string = b");
    let grouped = changed(controller.submit_to_group(&engine, &query, 0));

    let group = grouped.tokens[0].as_group().unwrap();
    assert_eq!(group.operation, Operation::Or);
    assert_eq!(group.tokens.len(), 2);
}

#[test]
fn test_submit_to_group_with_groups_disabled() {
    let engine = engine();
    let mut controller = FilterController::new();
    let query = Query::from_tokens(Operation::And, [Token::property("string", Equals, "a")]);

    controller.set_text(&engine, "string = b");
    let flat = changed(controller.submit_to_group(&engine, &query, 0));

    assert_eq!(flat.len(), 2);
    assert!(!flat.has_groups());
    assert!(engine.diagnostics().contains(DiagnosticCode::GroupsDisabled));
}

// ==================== Token list ====================

#[test]
fn test_show_more_toggle_is_idempotent() {
    let config = FilterConfig {
        token_limit: Some(1),
        ..FilterConfig::default()
    };
    let engine = engine_with(config, options());
    let mut controller = FilterController::new();
    let query = Query::from_tokens(
        Operation::And,
        [
            Token::property("string", Equals, "a"),
            Token::property("string", Equals, "b"),
        ],
    );
    let before = query.clone();

    assert_eq!(controller.view(&engine, &query).items.len(), 1);
    controller.toggle_show_more();
    assert_eq!(controller.view(&engine, &query).items.len(), 2);
    controller.toggle_show_more();
    assert_eq!(controller.view(&engine, &query).items.len(), 1);
    assert_eq!(query, before);
}

// ==================== Async loading ====================

fn async_engine() -> FilterEngine {
    engine_with(
        FilterConfig::default(),
        options().with_status("state", AsyncStatus::Pending),
    )
}

#[test]
fn test_typing_requests_first_pages() {
    let engine = async_engine();
    let mut controller = FilterController::new();

    assert!(controller.set_text(&engine, "str").is_none());

    let first = load_request(controller.set_text(&engine, "State = "));
    assert_eq!(first.detail.filtering_property.as_deref(), Some("state"));
    assert_eq!(first.detail.filtering_operator, Some(Equals));
    assert_eq!(first.detail.filtering_text, "");
    assert!(first.detail.first_page);
    assert!(!first.detail.same_page);

    let second = load_request(controller.set_text(&engine, "State = Sto"));
    assert!(second.id > first.id);
    assert_eq!(second.detail.filtering_text, "Sto");

    assert!(controller.set_text(&engine, "State = Sto ").is_none());
}

#[test]
fn test_stale_responses_are_dropped() {
    let mut engine = async_engine();
    let mut controller = FilterController::new();
    let first = load_request(controller.set_text(&engine, "State = S"));
    let second = load_request(controller.set_text(&engine, "State = St"));

    let stale = LoadResponse {
        request_id: first.id,
        options: vec![FilteringOption::new("state", "9")],
        status: AsyncStatus::Finished,
    };
    assert!(!controller.receive_options(&mut engine, stale));
    assert_eq!(engine.catalog().status("state"), Some(AsyncStatus::Pending));

    let fresh = LoadResponse {
        request_id: second.id,
        options: vec![FilteringOption::new("state", "3").with_label("Starting")],
        status: AsyncStatus::Finished,
    };
    assert!(controller.receive_options(&mut engine, fresh));
    let values: Vec<&str> = engine
        .catalog()
        .for_property("state")
        .map(|o| o.value.as_str())
        .collect();
    assert_eq!(values, vec!["3"]);
    assert_eq!(engine.catalog().status("state"), Some(AsyncStatus::Finished));
}

#[test]
fn test_retry_and_load_more() {
    let engine = async_engine();
    let mut controller = FilterController::new();
    controller.set_text(&engine, "State = ");

    let more = load_request(controller.load_more(&engine));
    assert!(!more.detail.first_page);
    assert!(!more.detail.same_page);

    let retry = load_request(controller.retry(&engine));
    assert!(!retry.detail.first_page);
    assert!(retry.detail.same_page);
    assert_eq!(controller.latest_request(), Some(&retry));
}

#[test]
fn test_focus_and_editor_request_options() {
    let engine = async_engine();
    let mut controller = FilterController::new();
    controller.set_text(&engine, "State = ");
    let on_focus = load_request(controller.focus(&engine));
    assert!(on_focus.detail.first_page);

    let query = Query::from_tokens(Operation::And, [Token::property("state", NotEquals, "0")]);
    let on_open = load_request(controller.open_editor(&engine, &query, TokenIndex::Top(0)));
    assert_eq!(on_open.detail.filtering_property.as_deref(), Some("state"));
    assert_eq!(on_open.detail.filtering_operator, Some(NotEquals));
}

#[test]
fn test_sync_properties_never_request() {
    let engine = engine();
    let mut controller = FilterController::new();
    assert!(controller.set_text(&engine, "State = ").is_none());
    assert!(controller.focus(&engine).is_none());
    assert!(controller.retry(&engine).is_none());
}
