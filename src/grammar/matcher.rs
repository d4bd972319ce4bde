//! Non-deterministic matching of tokenized input against a compiled [`Graph`].
//!
//! The walk is an explicit depth-first worklist of `(node, match, index)`
//! frames. Match paths are persistent linked lists, so branches fanning out
//! from a shared prefix never copy it.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::trace;

use super::graph::{Graph, NodeId, NodeKind};
use super::segment::{Keyword, SegmentId, Variable, VariableType};
use super::value::{Value, compare_type, parse_value};

/// One consumed (or, for partial matches, pending) graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedNode {
    pub node: NodeId,
    /// Token text as typed.
    pub raw: String,
    /// Coerced value, present only after a full variable match.
    pub value: Option<Value>,
    /// Completion candidates still consistent with `raw`.
    pub enums: Vec<String>,
}

#[derive(Debug)]
struct PathLink {
    node: MatchedNode,
    prev: Option<Rc<PathLink>>,
}

/// One traversal path through a graph.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    tail: Option<Rc<PathLink>>,
    len: usize,
    is_partial: bool,
    is_invokable: bool,
}

impl MatchResult {
    fn with(&self, node: MatchedNode) -> MatchResult {
        MatchResult {
            tail: Some(Rc::new(PathLink {
                node,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
            is_partial: false,
            is_invokable: false,
        }
    }

    fn partial(mut self) -> MatchResult {
        self.is_partial = true;
        self
    }

    fn invokable(mut self) -> MatchResult {
        self.is_invokable = true;
        self
    }

    /// Matched nodes in input order.
    pub fn nodes(&self) -> Vec<&MatchedNode> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(link) = cursor {
            out.push(&link.node);
            cursor = link.prev.as_deref();
        }
        out.reverse();
        out
    }

    /// The node the input ended on; hint text is derived from it.
    pub fn last(&self) -> Option<&MatchedNode> {
        self.tail.as_deref().map(|link| &link.node)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    pub fn is_invokable(&self) -> bool {
        self.is_invokable
    }

    fn dedup_key(&self) -> (Vec<(usize, String)>, bool, bool) {
        let path = self
            .nodes()
            .into_iter()
            .map(|n| (n.node.index(), n.raw.clone()))
            .collect();
        (path, self.is_partial, self.is_invokable)
    }
}

struct Frame {
    node: NodeId,
    result: MatchResult,
    index: usize,
}

/// Outcome of testing one token against one variable.
#[derive(Debug, PartialEq)]
pub struct VariableCheck {
    pub is_partial: bool,
    pub is_full: bool,
    pub enums: Vec<String>,
}

/// State shared by every graph matched for one input.
///
/// Enum providers are invoked at most once per session; later visits to the
/// same variable reuse the cached list.
#[derive(Default)]
pub struct MatchSession {
    provided: HashMap<SegmentId, Rc<[String]>>,
}

impl MatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Static choices, or the provider's list for enumerated variables.
    pub fn candidates(&mut self, variable: &Variable) -> Rc<[String]> {
        let Some(provider) = variable.provider_fn() else {
            return variable.choices().into();
        };
        if !variable.choices().is_empty() {
            return variable.choices().into();
        }
        self.provided
            .entry(variable.id())
            .or_insert_with(|| {
                let mut seen = HashSet::new();
                let list: Vec<String> = provider()
                    .into_iter()
                    .filter(|c| seen.insert(c.clone()))
                    .collect();
                list.into()
            })
            .clone()
    }

    /// Walk `graph` against `argv`, returning every reachable partial or
    /// invokable state. Never fails: unmatched input yields no results.
    pub fn run(&mut self, graph: &Graph, argv: &[String]) -> Vec<MatchResult> {
        let mut results = Vec::new();
        let mut stack = vec![Frame {
            node: graph.entry(),
            result: MatchResult::default(),
            index: 0,
        }];

        while let Some(frame) = stack.pop() {
            let node = graph.node(frame.node);
            let edges = node.edges();

            let advance = |stack: &mut Vec<Frame>, result: &MatchResult, index: usize| {
                for &edge in edges.iter().rev() {
                    stack.push(Frame {
                        node: edge,
                        result: result.clone(),
                        index,
                    });
                }
            };

            match node.kind() {
                NodeKind::Control(marker) => {
                    if !marker.is_bof && graph.is_terminal(frame.node) {
                        if frame.index == argv.len() {
                            results.push(frame.result.invokable());
                        }
                        continue;
                    }
                    advance(&mut stack, &frame.result, frame.index);
                }
                NodeKind::Keyword(keyword) => {
                    let Some(token) = argv.get(frame.index) else {
                        results.push(frame.result.with(pending_keyword(frame.node, keyword)).partial());
                        continue;
                    };
                    let name = keyword.name();
                    if token == name {
                        let next = frame.result.with(MatchedNode {
                            node: frame.node,
                            raw: token.clone(),
                            value: None,
                            enums: Vec::new(),
                        });
                        advance(&mut stack, &next, frame.index + 1);
                    } else if name.starts_with(token.as_str()) && frame.index + 1 == argv.len() {
                        let next = frame.result.with(MatchedNode {
                            node: frame.node,
                            raw: token.clone(),
                            value: None,
                            enums: vec![name.to_string()],
                        });
                        results.push(next.partial());
                    }
                }
                NodeKind::Variable(variable) => {
                    let candidates = self.candidates(variable);
                    let Some(token) = argv.get(frame.index) else {
                        let pending = MatchedNode {
                            node: frame.node,
                            raw: String::new(),
                            value: None,
                            enums: candidates.to_vec(),
                        };
                        results.push(frame.result.with(pending).partial());
                        continue;
                    };
                    let check = check_variable(token, variable, &candidates);
                    if check.is_full {
                        let next = frame.result.with(MatchedNode {
                            node: frame.node,
                            raw: token.clone(),
                            value: Some(parse_value(token, variable)),
                            enums: check.enums,
                        });
                        advance(&mut stack, &next, frame.index + 1);
                    } else if check.is_partial {
                        let next = frame.result.with(MatchedNode {
                            node: frame.node,
                            raw: token.clone(),
                            value: None,
                            enums: check.enums,
                        });
                        results.push(next.partial());
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        results.retain(|r| seen.insert(r.dedup_key()));
        trace!("{} tokens produced {} match results", argv.len(), results.len());
        results
    }
}

/// Match `argv` against a single graph with a fresh session.
pub fn match_argv(graph: &Graph, argv: &[String]) -> Vec<MatchResult> {
    MatchSession::new().run(graph, argv)
}

fn pending_keyword(node: NodeId, keyword: &Keyword) -> MatchedNode {
    MatchedNode {
        node,
        raw: String::new(),
        value: None,
        enums: vec![keyword.name().to_string()],
    }
}

/// Classify `token` against `variable`.
///
/// Enumerated variables only fully match one of their candidates; the
/// declared type then only narrows which candidates are accepted.
pub fn check_variable(token: &str, variable: &Variable, candidates: &[String]) -> VariableCheck {
    let enumerated = variable.is_enumerated();
    let is_type_match = !enumerated && compare_type(token, variable);
    let is_empty_non_string = token.is_empty() && variable.kind() != Some(VariableType::String);

    let enums: Vec<String> = candidates
        .iter()
        .filter(|c| c.starts_with(token))
        .cloned()
        .collect();
    let is_enum_match = enumerated
        && enums.iter().any(|c| c == token)
        && (variable.kind().is_none() || compare_type(token, variable));

    let (is_flag_partial, is_flag_match) = if variable.kind() == Some(VariableType::Flag) {
        let name = variable.name();
        (
            name.starts_with(token) && token.len() < name.len(),
            token == name,
        )
    } else {
        (false, false)
    };

    VariableCheck {
        is_partial: is_empty_non_string || !enums.is_empty() || is_flag_partial,
        is_full: is_type_match || is_enum_match || is_flag_match,
        enums,
    }
}
