use std::io::{BufRead, Write};

use crate::grammar::command::Outcome;
use crate::shell::builtin::listing;
use crate::shell::repl::{ReplOptions, run_repl};
use crate::shell::Shell;

use super::Commands;

/// Dispatch a parsed subcommand. Returns the process exit code: 0 on
/// success, 1 when the line does not resolve or its command fails.
pub fn route(
    command: &Commands,
    shell: &mut Shell,
    options: &ReplOptions,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<u8, anyhow::Error> {
    match command {
        Commands::Shell => {
            run_repl(shell, options, input, output)?;
            Ok(0)
        }
        Commands::Hint(args) => {
            let report = shell.hints(&args.line);
            writeln!(output, "{}", serde_json::to_string_pretty(&report)?)?;
            Ok(0)
        }
        Commands::Run(args) => {
            let line = join_args(&args.args);
            match shell.dispatch(&line) {
                Ok(Outcome::Text(reply)) => {
                    writeln!(output, "{reply}")?;
                    Ok(0)
                }
                Ok(Outcome::Silent) | Ok(Outcome::Exit) => Ok(0),
                Err(e) => {
                    eprintln!("cmdgraph: {e}");
                    Ok(1)
                }
            }
        }
        Commands::Commands => {
            for entry in listing(shell.registry()) {
                writeln!(output, "{}", entry.render())?;
            }
            Ok(0)
        }
    }
}

/// Rebuild a line from already-split arguments, quoting where needed so
/// the shell tokenizer yields the same argv.
pub fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            let plain = !arg.is_empty()
                && !arg
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\'));
            if plain {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
