//! Parse command implementation.

use super::session::Session;
use super::{CommandContext, Result};
use crate::output::{format_parse_json, format_parse_table};

/// Shows how the engine reads `text`.
pub fn execute(ctx: &CommandContext, session: &Session, text: &str) -> Result<()> {
    let state = session.engine.parse(text);

    if ctx.json_output {
        println!("{}", format_parse_json(&state)?);
    } else if !ctx.quiet {
        print!("{}", format_parse_table(&state, ctx.use_colors));
    }
    Ok(())
}
