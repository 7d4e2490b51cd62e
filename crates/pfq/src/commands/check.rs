//! Check command implementation.
//!
//! Building the engine already reports catalog problems to the diagnostics
//! sink; this command prints what was collected.

use super::session::Session;
use super::{CommandContext, Result};
use crate::output::{format_diagnostics_json, format_diagnostics_table};

/// Prints the diagnostics collected while loading the catalog.
pub fn execute(ctx: &CommandContext, session: &Session) -> Result<()> {
    let diagnostics = session.engine.diagnostics().entries();

    if ctx.json_output {
        println!("{}", format_diagnostics_json(&diagnostics)?);
    } else if !ctx.quiet {
        if ctx.verbose {
            let engine = &session.engine;
            println!(
                "{} properties, {} options",
                engine.registry().len(),
                engine.catalog().len()
            );
        }
        print!("{}", format_diagnostics_table(&diagnostics, ctx.use_colors));
    }
    Ok(())
}
