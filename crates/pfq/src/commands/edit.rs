//! Query edit commands: add, edit, remove, toggle and release.
//!
//! Each command starts from the session query, applies one edit and reports
//! the result through [`Session::finish`].

use property_filter::{
    ComparisonOperator, ControllerEvent, Draft, FilterController, OperationTarget, QueryError,
    TokenIndex, TokenValue,
};

use super::session::Session;
use super::{parse_token_index, CommandContext, CommandError, Result};

/// Options for the edit command.
#[derive(Debug, Default)]
pub struct EditOptions {
    /// Token index, as typed.
    pub index: String,
    /// New property key, `-` for free text.
    pub property: Option<String>,
    /// New operator symbol.
    pub operator: Option<String>,
    /// Replacement value.
    pub value: Option<String>,
    /// Option values to select, in order.
    pub select: Vec<String>,
    /// Write back to the query file.
    pub write: bool,
}

/// Commits `text` as a new token, optionally into a group.
pub fn execute_add(
    ctx: &CommandContext,
    session: &Session,
    text: &str,
    group: Option<usize>,
    write: bool,
) -> Result<()> {
    let engine = &session.engine;
    let query = &session.query;

    if let Some(index) = group {
        if engine.config().enable_token_groups && index >= query.len() {
            return Err(QueryError::out_of_range(TokenIndex::Top(index), query.len()).into());
        }
    }

    let mut controller = FilterController::new();
    controller.focus(engine);
    controller.set_text(engine, text);
    let event = match group {
        Some(index) => controller.submit_to_group(engine, query, index),
        None => controller.submit(engine, query),
    };

    match event {
        Some(ControllerEvent::Change(next)) => session.finish(ctx, &next, write),
        _ => Err(CommandError::Input(format!(
            "'{text}' does not make a token"
        ))),
    }
}

/// Opens a draft over one token, applies the requested changes in order
/// (property, operator, value, selections) and commits it.
pub fn execute_edit(ctx: &CommandContext, session: &Session, opts: &EditOptions) -> Result<()> {
    let engine = &session.engine;
    let query = &session.query;
    let index = parse_token_index(&opts.index)?;
    Draft::try_open(query, index)?;

    let mut controller = FilterController::new();
    controller.open_editor(engine, query, index);

    if let Some(key) = opts.property.as_deref() {
        if key == "-" {
            controller.set_draft_property(engine, None);
        } else {
            engine.lookup_property(key)?;
            controller.set_draft_property(engine, Some(key));
        }
    }

    if let Some(symbol) = opts.operator.as_deref() {
        let operator: ComparisonOperator = symbol.parse()?;
        check_operator(session, &controller, operator)?;
        controller.set_draft_operator(engine, operator);
    }

    if let Some(value) = opts.value.as_deref() {
        let is_list = controller
            .draft()
            .is_some_and(|d| d.token().value.as_list().is_some());
        let value = if is_list {
            TokenValue::list(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty()),
            )
        } else {
            TokenValue::text(value)
        };
        controller.set_draft_value(value);
    }

    for value in &opts.select {
        controller.select_draft_value(engine, value);
    }

    match controller.commit_edit(query) {
        Some(ControllerEvent::Change(next)) => session.finish(ctx, &next, opts.write),
        _ => Err(CommandError::Input(format!("token {index} is not open for editing"))),
    }
}

fn check_operator(
    session: &Session,
    controller: &FilterController,
    operator: ComparisonOperator,
) -> Result<()> {
    let engine = &session.engine;
    let Some(draft) = controller.draft() else {
        return Ok(());
    };
    let (allowed, label) = match draft.token().property_key.as_deref() {
        Some(key) => {
            let property = engine.lookup_property(key)?;
            (property.allowed_operators(), property.label.clone())
        }
        None => (
            engine.config().free_text_filtering.allowed_operators(),
            engine.config().strings.all_properties.clone(),
        ),
    };

    if allowed.contains(&operator) {
        Ok(())
    } else {
        let symbols: Vec<&str> = allowed.iter().map(|op| op.symbol()).collect();
        Err(CommandError::Input(format!(
            "operator {operator} is not allowed for {label} (allowed: {})",
            symbols.join(" ")
        )))
    }
}

/// Removes one token, or every token with `all`.
pub fn execute_remove(
    ctx: &CommandContext,
    session: &Session,
    index: Option<&str>,
    all: bool,
    write: bool,
) -> Result<()> {
    let query = &session.query;
    let next = match (index, all) {
        (_, true) => query.remove_all(),
        (Some(index), false) => query.try_remove(parse_token_index(index)?)?,
        (None, false) => {
            return Err(CommandError::Input(
                "give a token index or --all".to_string(),
            ))
        }
    };
    session.finish(ctx, &next, write)
}

/// Flips the query's operation, or a group's with `group`.
pub fn execute_toggle(
    ctx: &CommandContext,
    session: &Session,
    group: Option<usize>,
    write: bool,
) -> Result<()> {
    let query = &session.query;
    let target = group.map_or(OperationTarget::Root, OperationTarget::Group);
    let current = query.operation_of(target).ok_or_else(|| match group {
        Some(i) if i < query.len() => QueryError::wrong_kind(TokenIndex::Top(i), "group"),
        Some(i) => QueryError::out_of_range(TokenIndex::Top(i), query.len()),
        None => QueryError::out_of_range(TokenIndex::Top(0), query.len()),
    })?;
    let next = query.try_set_operation(target, current.toggled())?;
    session.finish(ctx, &next, write)
}

/// Moves a nested token out of its group.
pub fn execute_release(
    ctx: &CommandContext,
    session: &Session,
    index: &str,
    write: bool,
) -> Result<()> {
    let next = session.query.try_release(parse_token_index(index)?)?;
    session.finish(ctx, &next, write)
}
