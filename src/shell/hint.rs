//! Live hints for a buffer that is still being typed.

use serde::Serialize;

use crate::grammar::command::CommandMatch;
use crate::grammar::graph::NodeKind;

/// What one match result says about the input so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub command: String,
    /// Canonical rendering of the segment the input ended on.
    pub segment: String,
    pub comment: Option<String>,
    pub candidates: Vec<String>,
    pub partial: bool,
    pub invokable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HintReport {
    pub tokens: Vec<String>,
    pub hints: Vec<Hint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl HintReport {
    /// Candidates across all hints, first occurrence order.
    pub fn candidates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for candidate in self.hints.iter().flat_map(|h| &h.candidates) {
            if !out.contains(&candidate.as_str()) {
                out.push(candidate);
            }
        }
        out
    }

    pub fn has_invokable(&self) -> bool {
        self.hints.iter().any(|h| h.invokable)
    }
}

/// Build a hint from the terminal node of a match.
pub fn hint_for(m: &CommandMatch) -> Option<Hint> {
    let last = m.result.last()?;
    let graph = m.command.graph();
    let (segment, comment) = match graph.node(last.node).kind() {
        NodeKind::Keyword(k) => (k.name().to_string(), k.comment_text()),
        NodeKind::Variable(v) => (v.to_string(), v.comment_text()),
        NodeKind::Control(_) => return None,
    };
    // the leading keyword stands for the whole command
    let comment = match comment {
        Some(c) => Some(c.to_string()),
        None if m.result.len() == 1 => m.command.comment().map(str::to_string),
        None => None,
    };

    Some(Hint {
        command: m.command.name().to_string(),
        segment,
        comment,
        candidates: last.enums.clone(),
        partial: m.result.is_partial(),
        invokable: m.result.is_invokable(),
    })
}

/// Hints for every match, duplicates removed, in match order.
pub fn collect_hints(matches: &[CommandMatch]) -> Vec<Hint> {
    let mut hints: Vec<Hint> = Vec::new();
    for hint in matches.iter().filter_map(hint_for) {
        if !hints.contains(&hint) {
            hints.push(hint);
        }
    }
    hints
}

/// One human-readable line per hint, used by the line shell.
pub fn format_hint(hint: &Hint) -> String {
    let mut line = format!("{}: {}", hint.command, hint.segment);
    if hint.invokable {
        line.push_str(" (ready)");
    }
    if !hint.candidates.is_empty() && !(hint.candidates.len() == 1 && hint.candidates[0] == hint.segment) {
        line.push_str(&format!(" [{}]", hint.candidates.join(", ")));
    }
    if let Some(comment) = &hint.comment {
        line.push_str(&format!(" - {comment}"));
    }
    line
}
