//! View command implementation.

use super::session::Session;
use super::{CommandContext, Result};
use crate::output::{format_token_list_json, format_token_list_table};

/// Renders the session query as a token list.
pub fn execute(ctx: &CommandContext, session: &Session, expanded: bool) -> Result<()> {
    let view = session.engine.view(&session.query, expanded);

    if ctx.json_output {
        println!("{}", format_token_list_json(&view)?);
    } else if !ctx.quiet {
        print!("{}", format_token_list_table(&view, ctx.use_colors));
    }
    Ok(())
}
