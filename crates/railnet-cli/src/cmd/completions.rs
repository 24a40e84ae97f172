//! `railnet completions <shell>`.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use clap_complete::{Shell, generate};

/// Name the scripts complete for; matches the installed binary.
const BIN_NAME: &str = "railnet";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the completion script for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Completion script for `command` in `shell`.
pub fn render_completions(shell: Shell, command: &mut clap::Command) -> Vec<u8> {
    let mut script = Vec::new();
    generate(shell, command, BIN_NAME, &mut script);
    script
}

/// Write the completion script to stdout.
///
/// # Errors
///
/// Fails when stdout is closed or unwritable.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let script = render_completions(shell, command);
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&script)
        .and_then(|()| stdout.flush())
        .with_context(|| format!("failed to write {shell} completions"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn scripts_cover_every_subcommand() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = render_completions(shell, &mut crate::Cli::command());
            let text = String::from_utf8(script).expect("utf-8 script");
            assert!(text.contains(BIN_NAME), "{shell}");
            for sub in ["build", "metrics", "simulate", "campaign", "compare"] {
                assert!(text.contains(sub), "{shell} script lacks {sub}");
            }
        }
    }
}
