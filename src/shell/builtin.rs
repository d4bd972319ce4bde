//! Commands every shell carries: `help [<command>]` and `exit`.

use std::sync::{Arc, OnceLock};

use crate::grammar::SchemeError;
use crate::grammar::command::{Command, Invocation, Outcome, Registry};
use crate::grammar::resolver::Binding;
use crate::grammar::segment::{optional, variable};

/// One help line per registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub usage: String,
    pub comment: Option<String>,
}

impl ListingEntry {
    pub fn render(&self) -> String {
        match &self.comment {
            Some(comment) => format!("{} - {comment}", self.usage),
            None => self.usage.clone(),
        }
    }
}

pub fn listing(registry: &Registry) -> Vec<ListingEntry> {
    registry
        .commands()
        .iter()
        .map(|c| ListingEntry {
            name: c.name().to_string(),
            usage: c.usage(),
            comment: c.comment().map(str::to_string),
        })
        .collect()
}

/// Add `help` and `exit` unless the registry already defines them.
pub fn register_builtins(registry: &mut Registry) -> Result<(), SchemeError> {
    let shared: Arc<OnceLock<Vec<ListingEntry>>> = Arc::new(OnceLock::new());

    if registry.find("help").is_none() {
        let mut names = registry.names();
        names.push("help".to_string());
        if registry.find("exit").is_none() {
            names.push("exit".to_string());
        }
        let topic = variable("command")?
            .provider(move || names.clone())
            .comment("command to describe");

        let entries = Arc::clone(&shared);
        registry.register(
            Command::new("help", vec![optional([topic.into()])], move |inv| {
                Ok(help_text(entries.get().map(Vec::as_slice).unwrap_or(&[]), inv))
            })?
            .with_comment("List commands, or describe one"),
        );
    }

    if registry.find("exit").is_none() {
        registry.register(
            Command::new("exit", vec![], |_: &Invocation| Ok(Outcome::Exit))?
                .with_comment("Leave the shell"),
        );
    }

    // first fill wins; a second call only re-checks names
    let _ = shared.set(listing(registry));
    Ok(())
}

fn help_text(entries: &[ListingEntry], invocation: &Invocation) -> Outcome {
    let lines: Vec<String> = match invocation.variables.get("command") {
        Some(Binding::Single(topic)) => {
            let topic = topic.to_string();
            entries
                .iter()
                .filter(|e| e.name == topic)
                .map(ListingEntry::render)
                .collect()
        }
        _ => entries.iter().map(ListingEntry::render).collect(),
    };
    Outcome::Text(lines.join("\n"))
}
