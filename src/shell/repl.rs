use std::io::{BufRead, Write};
use std::time::Duration;

use crate::grammar::command::Outcome;

use super::Shell;
use super::hint::format_hint;

#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub prompt: String,
    pub preview_timeout: Duration,
}

impl Default for ReplOptions {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            preview_timeout: Duration::from_millis(200),
        }
    }
}

/// Line-oriented shell loop. A line ending in `?` prints hints for the
/// text before it, plus a preview when the text already resolves; any
/// other line is submitted. Returns on `exit` or end of input.
pub fn run_repl<R: BufRead, W: Write>(
    shell: &mut Shell,
    options: &ReplOptions,
    mut input: R,
    mut output: W,
) -> std::io::Result<()> {
    let mut line = String::new();
    loop {
        write!(output, "{}", options.prompt)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim_end_matches(['\n', '\r']);

        if let Some(buffer) = text.strip_suffix('?') {
            describe(shell, options, buffer, &mut output)?;
            continue;
        }

        match shell.submit(text) {
            Ok(Outcome::Text(reply)) => writeln!(output, "{reply}")?,
            Ok(Outcome::Silent) => {}
            Ok(Outcome::Exit) => break,
            Err(e) => writeln!(output, "error: {e}")?,
        }
    }
    Ok(())
}

fn describe<W: Write>(
    shell: &mut Shell,
    options: &ReplOptions,
    buffer: &str,
    output: &mut W,
) -> std::io::Result<()> {
    let report = shell.hints(buffer);
    if let Some(error) = &report.parse_error {
        writeln!(output, "  parse error: {error}")?;
        return Ok(());
    }
    if report.hints.is_empty() {
        writeln!(output, "  no matching command")?;
    }
    for hint in &report.hints {
        writeln!(output, "  {}", format_hint(hint))?;
    }
    if shell.request_preview(buffer)
        && let Some(preview) = shell.wait_preview(options.preview_timeout)
    {
        writeln!(output, "  preview: {preview}")?;
    }
    Ok(())
}
