//! Picks the command to dispatch among all match results and extracts its
//! variable bindings.
//!
//! When several commands accept the same input, each candidate is scored by
//! the specificity of the segments it consumed: keyword 4, enumerated
//! variable 3, variable with a non-string type 2, free-text variable 1.
//! The highest total wins; a tie between distinct commands is ambiguous.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::ResolveError;
use super::command::{Command, CommandMatch};
use super::graph::{Graph, NodeKind};
use super::matcher::{MatchResult, MatchedNode};
use super::segment::{Segment, Variable, VariableType};
use super::value::Value;

/// A bound variable: one value, or one value per token for rest variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Binding {
    Single(Value),
    List(Vec<Value>),
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Single(value) => write!(f, "{value}"),
            Binding::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

pub type Bindings = BTreeMap<String, Binding>;

/// The selected command and what the winning match bound.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub command: Arc<Command>,
    pub variables: Bindings,
    pub nodes: Vec<MatchedNode>,
}

impl Resolution {
    /// Canonical rendering of each consumed segment.
    pub fn segments(&self) -> Vec<String> {
        let graph = self.command.graph();
        self.nodes
            .iter()
            .map(|n| match graph.node(n.node).kind() {
                NodeKind::Keyword(k) => k.name().to_string(),
                NodeKind::Variable(v) => v.to_string(),
                NodeKind::Control(_) => String::new(),
            })
            .collect()
    }
}

pub fn resolve(input: &str, matches: &[CommandMatch]) -> Result<Resolution, ResolveError> {
    if matches.is_empty() {
        return Err(ResolveError::UnknownCommand(input.to_string()));
    }

    let invokable: Vec<&CommandMatch> = matches.iter().filter(|m| m.result.is_invokable()).collect();
    let winner = match invokable.as_slice() {
        [] => return Err(ResolveError::IncompleteCommand(input.to_string())),
        [only] => *only,
        candidates => pick_best(candidates)?,
    };

    debug!("resolved '{}' to command '{}'", input, winner.command.name());

    Ok(Resolution {
        command: Arc::clone(&winner.command),
        variables: extract_bindings(&winner.command, &winner.result),
        nodes: winner.result.nodes().into_iter().cloned().collect(),
    })
}

fn pick_best<'a>(candidates: &[&'a CommandMatch]) -> Result<&'a CommandMatch, ResolveError> {
    let scores: Vec<u32> = candidates
        .iter()
        .map(|m| score(m.command.graph(), &m.result))
        .collect();
    let best = scores.iter().copied().max().unwrap_or(0);

    let tied: Vec<&CommandMatch> = candidates
        .iter()
        .zip(&scores)
        .filter(|(_, s)| **s == best)
        .map(|(m, _)| *m)
        .collect();

    let mut distinct: Vec<&Arc<Command>> = Vec::new();
    for m in &tied {
        if !distinct.iter().any(|c| Arc::ptr_eq(c, &m.command)) {
            distinct.push(&m.command);
        }
    }

    if distinct.len() > 1 {
        let names: Vec<String> = distinct.iter().map(|c| c.name().to_string()).collect();
        debug!("ambiguous input, tied at score {}: {:?}", best, names);
        return Err(ResolveError::AmbiguousCommand(names));
    }

    debug!("picked best of {} candidates with score {}", candidates.len(), best);
    Ok(tied[0])
}

/// Sum of per-node specificity weights along a match path.
pub fn score(graph: &Graph, result: &MatchResult) -> u32 {
    result
        .nodes()
        .iter()
        .map(|n| match graph.node(n.node).kind() {
            NodeKind::Keyword(_) => 4,
            NodeKind::Variable(v) => variable_weight(v),
            NodeKind::Control(_) => 0,
        })
        .sum()
}

fn variable_weight(variable: &Variable) -> u32 {
    if variable.is_enumerated() {
        3
    } else {
        match variable.kind() {
            None | Some(VariableType::String) => 1,
            Some(_) => 2,
        }
    }
}

/// Collect variable values along the match path, then fill declared
/// defaults for variables the path never visited.
pub fn extract_bindings(command: &Command, result: &MatchResult) -> Bindings {
    let graph = command.graph();
    let mut bindings = Bindings::new();

    for matched in result.nodes() {
        let NodeKind::Variable(variable) = graph.node(matched.node).kind() else {
            continue;
        };
        let value = matched
            .value
            .clone()
            .unwrap_or_else(|| Value::Text(matched.raw.clone()));
        if variable.is_rest() {
            match bindings
                .entry(variable.name().to_string())
                .or_insert_with(|| Binding::List(Vec::new()))
            {
                Binding::List(values) => values.push(value),
                single => *single = Binding::List(vec![value]),
            }
        } else {
            bindings.insert(variable.name().to_string(), Binding::Single(value));
        }
    }

    apply_defaults(command.scheme(), &mut bindings);
    bindings
}

fn apply_defaults(segments: &[Segment], bindings: &mut Bindings) {
    for segment in segments {
        match segment {
            Segment::Variable(variable) => {
                let Some(default) = variable.default() else {
                    continue;
                };
                if bindings.contains_key(variable.name()) {
                    continue;
                }
                let binding = if variable.is_rest() {
                    Binding::List(vec![default.clone()])
                } else {
                    Binding::Single(default.clone())
                };
                bindings.insert(variable.name().to_string(), binding);
            }
            Segment::Optional(inner) => apply_defaults(inner, bindings),
            Segment::Union(branches) => {
                for branch in branches {
                    apply_defaults(branch, bindings);
                }
            }
            Segment::Keyword(_) => {}
        }
    }
}
