//! Catalog diagnostics output formatting.

use owo_colors::OwoColorize;
use property_filter::Diagnostic;
use serde::Serialize;

/// JSON output structure for the check command.
#[derive(Serialize)]
pub struct DiagnosticsOutput<'a> {
    pub diagnostics: &'a [Diagnostic],
}

/// Formats diagnostics as JSON.
pub fn format_diagnostics_json(diagnostics: &[Diagnostic]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&DiagnosticsOutput { diagnostics })
}

/// Formats diagnostics as one line each.
pub fn format_diagnostics_table(diagnostics: &[Diagnostic], use_colors: bool) -> String {
    if diagnostics.is_empty() {
        return "No problems found.\n".to_string();
    }

    let mut output = String::new();
    for diagnostic in diagnostics {
        let code = format!("{:<28}", diagnostic.code.as_str());
        if use_colors {
            output.push_str(&format!("{} {}\n", code.yellow(), diagnostic.message));
        } else {
            output.push_str(&format!("{} {}\n", code, diagnostic.message));
        }
    }
    output
}
