//! Parser state output formatting.

use owo_colors::OwoColorize;
use property_filter::{ParseStep, ParserState};
use serde::Serialize;

/// JSON output structure for the parse command.
#[derive(Serialize)]
pub struct ParseOutput<'a> {
    pub text: &'a str,
    pub step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_prefix: Option<&'a str>,
    pub filter_text: &'a str,
    pub chosen_values: &'a [String],
}

fn step_name(step: ParseStep) -> &'static str {
    match step {
        ParseStep::FreeText => "free_text",
        ParseStep::Operator => "operator",
        ParseStep::Property => "property",
    }
}

/// Formats a parser state as JSON.
pub fn format_parse_json(state: &ParserState<'_>) -> Result<String, serde_json::Error> {
    let output = ParseOutput {
        text: &state.raw,
        step: step_name(state.step()),
        property: state.property.map(|p| p.key.as_str()),
        operator: state.operator.map(|op| op.symbol()),
        operator_prefix: state.operator_prefix.as_deref(),
        filter_text: &state.filter_text,
        chosen_values: &state.chosen_values,
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a parser state as aligned key/value lines.
pub fn format_parse_table(state: &ParserState<'_>, use_colors: bool) -> String {
    let mut rows: Vec<(&str, String)> = vec![("Step", step_name(state.step()).to_string())];

    if let Some(property) = state.property {
        rows.push(("Property", format!("{} ({})", property.label, property.key)));
    }
    match (state.operator, state.operator_prefix.as_deref()) {
        (Some(op), _) => rows.push(("Operator", op.symbol().to_string())),
        (None, Some(prefix)) if !prefix.is_empty() => {
            rows.push(("Operator", format!("{prefix}…")));
        }
        _ => {}
    }
    rows.push(("Filter text", format!("{:?}", state.filter_text)));
    if !state.chosen_values.is_empty() {
        rows.push(("Chosen", state.chosen_values.join(", ")));
    }

    let mut output = String::new();
    for (key, value) in rows {
        let key = format!("{:<12}", format!("{key}:"));
        if use_colors {
            output.push_str(&format!("{} {}\n", key.dimmed(), value));
        } else {
            output.push_str(&format!("{} {}\n", key, value));
        }
    }
    output
}
