//! Suggest command implementation.

use super::session::Session;
use super::{CommandContext, Result};
use crate::output::{format_suggestions_json, format_suggestions_table};

/// Lists the suggestions for `text`.
pub fn execute(ctx: &CommandContext, session: &Session, text: &str) -> Result<()> {
    let suggestions = session.engine.suggest(text);
    tracing::debug!(text, count = suggestions.len(), "suggestions computed");

    if ctx.json_output {
        println!("{}", format_suggestions_json(&suggestions)?);
    } else if !ctx.quiet {
        print!("{}", format_suggestions_table(&suggestions, ctx.use_colors));
    }
    Ok(())
}
