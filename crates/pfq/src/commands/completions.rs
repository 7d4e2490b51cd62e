//! Shell completions command implementation.
//!
//! Generate shell completions for bash, zsh, fish, and powershell.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};

use crate::cli::{Cli, Shell};

/// Generate shell completions for the given shell and write to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn execute(shell: Shell) -> io::Result<()> {
    let mut cmd = Cli::command();
    generate(to_clap_shell(shell), &mut cmd, "pfq", &mut io::stdout());
    Ok(())
}

fn to_clap_shell(shell: Shell) -> ClapShell {
    match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::Powershell => ClapShell::PowerShell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completions_for(shell: Shell) -> String {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        generate(to_clap_shell(shell), &mut cmd, "pfq", &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_completions() {
        let output = completions_for(Shell::Bash);
        assert!(output.contains("pfq"));
        assert!(output.contains("suggest"));
    }

    #[test]
    fn test_fish_completions() {
        let output = completions_for(Shell::Fish);
        assert!(output.contains("complete -c pfq"));
    }
}
