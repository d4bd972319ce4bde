use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::SchemeError;
use super::graph::Graph;
use super::matcher::{MatchResult, MatchSession};
use super::ResolveError;
use super::resolver::{Bindings, Resolution, resolve};
use super::segment::{Segment, keyword, render_scheme};

/// Everything a callback learns about the line that selected it.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub input: String,
    pub argv: Vec<String>,
    pub command: String,
    pub variables: Bindings,
    /// Canonical rendering of each consumed segment, in input order.
    pub segments: Vec<String>,
}

/// What the shell should do after a callback returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Text(String),
    Silent,
    Exit,
}

pub type Callback = Arc<dyn Fn(&Invocation) -> anyhow::Result<Outcome> + Send + Sync>;
pub type PreviewFn = Arc<dyn Fn(&Invocation) -> Option<String> + Send + Sync>;

/// A registered command: its scheme (led by a keyword equal to the command
/// name), the graph compiled from it, and the callback to dispatch to.
pub struct Command {
    name: String,
    comment: Option<String>,
    scheme: Vec<Segment>,
    graph: Graph,
    callback: Callback,
    preview: Option<PreviewFn>,
}

impl Command {
    pub fn new<F>(
        name: impl Into<String>,
        scheme: Vec<Segment>,
        callback: F,
    ) -> Result<Command, SchemeError>
    where
        F: Fn(&Invocation) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut full_scheme = Vec::with_capacity(scheme.len() + 1);
        full_scheme.push(Segment::Keyword(keyword(name.clone())?));
        full_scheme.extend(scheme);

        let graph = Graph::compile(&full_scheme);
        debug!("compiled command '{}' into {} graph nodes", name, graph.len());

        Ok(Command {
            name,
            comment: None,
            scheme: full_scheme,
            graph,
            callback: Arc::new(callback),
            preview: None,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach an advisory preview computed before the command is submitted.
    pub fn with_preview<F>(mut self, preview: F) -> Self
    where
        F: Fn(&Invocation) -> Option<String> + Send + Sync + 'static,
    {
        self.preview = Some(Arc::new(preview));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn scheme(&self) -> &[Segment] {
        &self.scheme
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Help-listing form, e.g. `ban <ip: string> [<reason...>]`.
    pub fn usage(&self) -> String {
        render_scheme(&self.scheme)
    }

    pub fn invoke(&self, invocation: &Invocation) -> anyhow::Result<Outcome> {
        (self.callback)(invocation)
    }

    pub fn preview_fn(&self) -> Option<PreviewFn> {
        self.preview.clone()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage())
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

/// A match result tagged with the command whose graph produced it.
#[derive(Debug, Clone)]
pub struct CommandMatch {
    pub command: Arc<Command>,
    pub result: MatchResult,
}

/// The set of commands known to a shell.
#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Arc<Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) -> Arc<Command> {
        let command = Arc::new(command);
        self.commands.push(Arc::clone(&command));
        command
    }

    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for command in &self.commands {
            if !names.iter().any(|n| n == command.name()) {
                names.push(command.name().to_string());
            }
        }
        names
    }

    pub fn find(&self, name: &str) -> Option<&Arc<Command>> {
        self.commands.iter().find(|c| c.name() == name)
    }

    /// Match `argv` against every registered graph, sharing one provider
    /// cache across them.
    pub fn match_all(&self, argv: &[String]) -> Vec<CommandMatch> {
        let mut session = MatchSession::new();
        self.commands
            .iter()
            .flat_map(|command| {
                session
                    .run(command.graph(), argv)
                    .into_iter()
                    .map(|result| CommandMatch {
                        command: Arc::clone(command),
                        result,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn resolve(&self, input: &str, argv: &[String]) -> Result<Resolution, ResolveError> {
        let matches = self.match_all(argv);
        resolve(input, &matches)
    }
}
