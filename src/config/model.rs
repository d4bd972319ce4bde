use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::template::Template;
use crate::config::ConfigError;
use crate::grammar::command::{Command, Invocation, Outcome, Registry};
use crate::grammar::scheme_parser::parse_scheme;
use crate::grammar::segment::{Segment, Variable, scheme_variables};
use crate::grammar::value::{compare_type, parse_value};

pub const DEFAULT_PROMPT: &str = "> ";
pub const DEFAULT_PREVIEW_TIMEOUT_MS: u64 = 200;

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub prompt: Option<String>,
    pub preview_timeout_ms: Option<u64>,
    pub commands: Option<Vec<CommandEntry>>,
}

/// One configured command. `grammar` uses the textual notation and omits
/// the command name, which is prepended as the leading keyword.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CommandEntry {
    pub name: String,
    pub grammar: Option<String>,
    pub comment: Option<String>,
    pub reply: Option<String>,
    pub preview: Option<String>,
    pub defaults: Option<BTreeMap<String, String>>,
}

impl Config {
    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_PROMPT)
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_millis(
            self.preview_timeout_ms
                .unwrap_or(DEFAULT_PREVIEW_TIMEOUT_MS),
        )
    }

    pub fn commands(&self) -> &[CommandEntry] {
        self.commands.as_deref().unwrap_or_default()
    }

    /// Validate every command entry.
    ///
    /// Collects all validation errors and returns them at once so that users
    /// can fix every issue in a single pass.
    ///
    /// Checks:
    /// - command names are non-empty and contain no whitespace
    /// - grammars parse
    /// - defaults name declared variables and fit their type
    /// - reply/preview templates parse and only reference declared variables
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        for (i, entry) in self.commands().iter().enumerate() {
            let label = format!("commands[{i}] ({})", entry.name);

            if entry.name.is_empty() {
                errors.push(format!("commands[{i}]: name must not be empty"));
                continue;
            }
            if entry.name.chars().any(char::is_whitespace) {
                errors.push(format!("{label}: name must be a single word"));
            }

            let scheme = match parse_scheme(entry.grammar.as_deref().unwrap_or_default()) {
                Ok(scheme) => scheme,
                Err(e) => {
                    errors.push(format!("{label}: invalid grammar: {e}"));
                    continue;
                }
            };
            let variables = scheme_variables(&scheme);

            for (name, value) in entry.defaults.iter().flatten() {
                match variables.iter().find(|v| v.name() == name) {
                    None => errors.push(format!(
                        "{label}: default for unknown variable '{name}'"
                    )),
                    Some(v) if !accepts_default(v, value) => errors.push(format!(
                        "{label}: default '{value}' does not fit variable {v}"
                    )),
                    Some(_) => {}
                }
            }

            for (field, source) in [("reply", &entry.reply), ("preview", &entry.preview)] {
                let Some(source) = source else {
                    continue;
                };
                match Template::parse(source) {
                    Ok(template) => {
                        for placeholder in template.placeholders() {
                            if !variables.iter().any(|v| v.name() == placeholder) {
                                errors.push(format!(
                                    "{label}: {field} references unknown variable '{placeholder}'"
                                ));
                            }
                        }
                    }
                    Err(e) => errors.push(format!("{label}: {field}: {e}")),
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Merge two configs. `self` is the base (e.g. global), `other` is the override (e.g. local).
    ///
    /// - prompt / preview_timeout_ms: override (local wins)
    /// - commands: append
    pub fn merge(self, other: Config) -> Config {
        Config {
            prompt: other.prompt.or(self.prompt),
            preview_timeout_ms: other.preview_timeout_ms.or(self.preview_timeout_ms),
            commands: Self::merge_vecs(self.commands, other.commands),
        }
    }

    fn merge_vecs<T>(base: Option<Vec<T>>, over: Option<Vec<T>>) -> Option<Vec<T>> {
        match (base, over) {
            (Some(mut b), Some(o)) => {
                b.extend(o);
                Some(b)
            }
            (b, o) => b.or(o),
        }
    }

    /// Compile every configured command. Call [`Config::validate`] first
    /// to get every problem reported at once.
    pub fn into_registry(self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new();
        for entry in self.commands.unwrap_or_default() {
            let command = entry.into_command()?;
            debug!("registered configured command '{}'", command.usage());
            registry.register(command);
        }
        Ok(registry)
    }
}

impl CommandEntry {
    fn into_command(self) -> Result<Command, ConfigError> {
        let mut scheme = parse_scheme(self.grammar.as_deref().unwrap_or_default())?;
        if let Some(defaults) = &self.defaults {
            attach_defaults(&mut scheme, defaults);
        }

        let reply = self.reply.as_deref().map(Template::parse).transpose()?;
        let preview = self.preview.as_deref().map(Template::parse).transpose()?;

        let mut command = Command::new(self.name, scheme, move |inv: &Invocation| {
            match &reply {
                Some(template) => Ok(Outcome::Text(template.render(&inv.variables))),
                None => Ok(Outcome::Text(serde_json::to_string(inv)?)),
            }
        })?;
        if let Some(comment) = self.comment {
            command = command.with_comment(comment);
        }
        if let Some(template) = preview {
            command = command.with_preview(move |inv: &Invocation| {
                Some(template.render(&inv.variables))
            });
        }
        Ok(command)
    }
}

fn accepts_default(variable: &Variable, value: &str) -> bool {
    if variable.choices().is_empty() {
        compare_type(value, variable)
    } else {
        variable.choices().iter().any(|c| c == value)
    }
}

fn attach_defaults(segments: &mut [Segment], defaults: &BTreeMap<String, String>) {
    for segment in segments {
        match segment {
            Segment::Variable(v) => {
                if let Some(raw) = defaults.get(v.name()) {
                    let value = parse_value(raw, v);
                    *v = v.clone().default_value(value);
                }
            }
            Segment::Optional(inner) => attach_defaults(inner, defaults),
            Segment::Union(branches) => {
                for branch in branches {
                    attach_defaults(branch, defaults);
                }
            }
            Segment::Keyword(_) => {}
        }
    }
}

/// Parse a YAML string into a `Config`.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_saphyr::from_str(yaml)?;
    Ok(config)
}
