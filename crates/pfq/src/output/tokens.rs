//! Token list output formatting.

use owo_colors::OwoColorize;
use property_filter::{TokenListItem, TokenListView, TokenView};

/// Formats a token list as JSON.
pub fn format_token_list_json(view: &TokenListView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}

/// Formats a token list as indexed lines, groups indented under their
/// operation.
pub fn format_token_list_table(view: &TokenListView, use_colors: bool) -> String {
    if view.items.is_empty() {
        return "No tokens.\n".to_string();
    }

    let mut output = String::new();
    for item in &view.items {
        match item {
            TokenListItem::Token(token) => {
                output.push_str(&format_token(token, 0, use_colors));
            }
            TokenListItem::Group {
                index,
                operation,
                show_operation,
                tokens,
            } => {
                let joiner = if *show_operation {
                    format!("{:<4}", operation.as_str())
                } else {
                    " ".repeat(4)
                };
                let header = format!("{joiner}{index:<5} (group)");
                if use_colors {
                    output.push_str(&format!("{}\n", header.dimmed()));
                } else {
                    output.push_str(&format!("{header}\n"));
                }
                for token in tokens {
                    output.push_str(&format_token(token, 4, use_colors));
                }
            }
        }
    }

    if let Some(toggle) = &view.toggle {
        let line = if toggle.expanded {
            toggle.label.clone()
        } else {
            format!("{} ({} hidden)", toggle.label, view.hidden_count)
        };
        if use_colors {
            output.push_str(&format!("{}\n", line.dimmed()));
        } else {
            output.push_str(&format!("{line}\n"));
        }
    }

    output
}

fn format_token(token: &TokenView, indent: usize, use_colors: bool) -> String {
    let joiner = if token.show_operation {
        format!("{:<4}", token.operation.as_str())
    } else {
        " ".repeat(4)
    };
    let index = format!("{:<5}", token.index.to_string());
    let pad = " ".repeat(indent);

    if use_colors {
        format!(
            "{pad}{}{} {}\n",
            joiner.cyan(),
            index.dimmed(),
            token.text
        )
    } else {
        format!("{pad}{joiner}{index} {}\n", token.text)
    }
}
