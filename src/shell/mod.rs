//! The shell driver: per-keystroke hints and completion, line submission
//! and dispatch, and advisory previews.

pub mod builtin;
mod error;
pub mod hint;
pub mod preview;
pub mod repl;

pub use error::*;

use std::time::Duration;

use tracing::{debug, info};

use crate::grammar::ResolveError;
use crate::grammar::SchemeError;
use crate::grammar::command::{Invocation, Outcome, Registry};
use crate::grammar::resolver::Resolution;
use crate::grammar::tokenizer::{TokenizeMode, tokenize};
use hint::{HintReport, collect_hints};
use preview::PreviewRunner;

pub struct Shell {
    registry: Registry,
    preview: PreviewRunner,
}

impl Shell {
    /// Wrap `registry`, adding the `help` and `exit` built-ins.
    pub fn new(mut registry: Registry) -> Result<Self, SchemeError> {
        builtin::register_builtins(&mut registry)?;
        Ok(Self {
            registry,
            preview: PreviewRunner::new(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Hints for a buffer that is still being edited. Never fails: a buffer
    /// that cannot be tokenized yields a report carrying the parse error.
    pub fn hints(&self, buffer: &str) -> HintReport {
        let tokens = match tokenize(buffer, TokenizeMode::Tolerant) {
            Ok(tokens) => tokens,
            Err(e) => {
                return HintReport {
                    tokens: Vec::new(),
                    hints: Vec::new(),
                    parse_error: Some(e.to_string()),
                };
            }
        };
        let matches = self.registry.match_all(&tokens);
        HintReport {
            hints: collect_hints(&matches),
            tokens,
            parse_error: None,
        }
    }

    /// Complete the last token when exactly one candidate extends it.
    pub fn autocomplete(&self, buffer: &str) -> Option<String> {
        let tokens = tokenize(buffer, TokenizeMode::Tolerant).ok()?;
        let last = tokens.last().map(String::as_str).unwrap_or("");

        let mut candidates: Vec<&str> = Vec::new();
        let matches = self.registry.match_all(&tokens);
        for m in &matches {
            // only nodes that consumed the last token, not pending ones
            if !m.result.is_partial() || m.result.len() != tokens.len() {
                continue;
            }
            let Some(node) = m.result.last() else {
                continue;
            };
            for candidate in &node.enums {
                if candidate.starts_with(last)
                    && candidate != last
                    && !candidates.contains(&candidate.as_str())
                {
                    candidates.push(candidate);
                }
            }
        }

        let [only] = candidates.as_slice() else {
            return None;
        };
        let stem = buffer.strip_suffix(last)?;
        let completion = if only.chars().any(char::is_whitespace) {
            format!("'{only}'")
        } else {
            only.to_string()
        };
        Some(format!("{stem}{completion} "))
    }

    /// Tokenize, resolve and dispatch a submitted line. An unknown command
    /// becomes a notice for the user rather than an error.
    pub fn submit(&self, line: &str) -> Result<Outcome, ShellError> {
        match self.dispatch(line) {
            Err(ShellError::Resolve(e @ ResolveError::UnknownCommand(_))) => {
                debug!("{e}");
                Ok(Outcome::Text(e.to_string()))
            }
            other => other,
        }
    }

    /// Like [`Shell::submit`], but every resolve failure is an error.
    pub fn dispatch(&self, line: &str) -> Result<Outcome, ShellError> {
        let argv = tokenize(line, TokenizeMode::Strict)?;
        if argv.is_empty() {
            return Ok(Outcome::Silent);
        }

        let resolution = self.registry.resolve(line, &argv)?;
        let invocation = invocation(line, argv, &resolution);
        info!("dispatching '{}'", invocation.command);
        resolution
            .command
            .invoke(&invocation)
            .map_err(ShellError::Callback)
    }

    /// Start a preview for `buffer` if it resolves to a command that has
    /// one. Any earlier preview becomes stale either way.
    pub fn request_preview(&mut self, buffer: &str) -> bool {
        let resolved = tokenize(buffer, TokenizeMode::Strict)
            .ok()
            .filter(|argv| !argv.is_empty())
            .and_then(|argv| {
                let resolution = self.registry.resolve(buffer, &argv).ok()?;
                let preview = resolution.command.preview_fn()?;
                Some((preview, invocation(buffer, argv, &resolution)))
            });

        match resolved {
            Some((preview, invocation)) => {
                let generation = self.preview.request(preview, invocation);
                debug!("requested preview {generation} for '{buffer}'");
                true
            }
            None => {
                self.preview.cancel();
                false
            }
        }
    }

    pub fn poll_preview(&mut self) -> Option<String> {
        self.preview.poll()
    }

    pub fn wait_preview(&mut self, timeout: Duration) -> Option<String> {
        self.preview.wait(timeout)
    }
}

fn invocation(input: &str, argv: Vec<String>, resolution: &Resolution) -> Invocation {
    Invocation {
        input: input.to_string(),
        argv,
        command: resolution.command.name().to_string(),
        variables: resolution.variables.clone(),
        segments: resolution.segments(),
    }
}
