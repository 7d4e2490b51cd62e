//! Suggestion output formatting.

use owo_colors::OwoColorize;
use property_filter::{ListStatus, Suggestion, Suggestions};

/// Formats suggestions as JSON.
pub fn format_suggestions_json(suggestions: &Suggestions) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(suggestions)
}

/// Formats suggestions as a numbered list under group headers.
///
/// The numbers are flattened indices, the same ones a host passes to
/// `FilterController::select`.
pub fn format_suggestions_table(suggestions: &Suggestions, use_colors: bool) -> String {
    let mut output = String::new();
    let mut index = 0;

    for group in &suggestions.groups {
        if use_colors {
            output.push_str(&format!("{}\n", group.label.bold()));
        } else {
            output.push_str(&format!("{}\n", group.label));
        }
        for suggestion in &group.options {
            output.push_str(&format_row(index, suggestion, use_colors));
            index += 1;
        }
    }

    if let Some(entered) = &suggestions.entered_text {
        if !suggestions.groups.is_empty() {
            output.push('\n');
        }
        output.push_str(&format_row(index, entered, use_colors));
    }

    match &suggestions.status {
        ListStatus::Finished | ListStatus::Pending => {}
        ListStatus::Loading => {
            let line = "Loading…";
            if use_colors {
                output.push_str(&format!("{}\n", line.dimmed()));
            } else {
                output.push_str(&format!("{line}\n"));
            }
        }
        ListStatus::Error { retry } => {
            let line = match &retry.property_key {
                Some(key) => format!("Loading {key} failed. {}", retry.label),
                None => format!("Loading properties failed. {}", retry.label),
            };
            if use_colors {
                output.push_str(&format!("{}\n", line.red()));
            } else {
                output.push_str(&format!("{line}\n"));
            }
        }
    }

    if output.is_empty() {
        return "No suggestions.\n".to_string();
    }
    output
}

fn format_row(index: usize, suggestion: &Suggestion, use_colors: bool) -> String {
    let label = match &suggestion.label_prefix {
        Some(prefix) => format!("{prefix} {}", suggestion.label),
        None => suggestion.label.clone(),
    };
    let number = format!("{index:>3}");

    match (&suggestion.description, use_colors) {
        (Some(description), true) => format!(
            "{} {:<32} {}\n",
            number.dimmed(),
            label,
            description.dimmed()
        ),
        (Some(description), false) => format!("{} {:<32} {}\n", number, label, description),
        (None, true) => format!("{} {}\n", number.dimmed(), label),
        (None, false) => format!("{} {}\n", number, label),
    }
}
