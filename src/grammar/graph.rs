//! Compiles a segment scheme into a directed graph of solid and marker nodes.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`], so the
//! self-loops created for rest variables are plain index edges. Every scope
//! (the root, each optional group, each union and each union branch) is
//! bounded by a BOF/EOF marker pair. Marker ids come from a process-wide
//! counter and are never reused. The root EOF is the only node at which a
//! match can become invokable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

use super::segment::{Keyword, Segment, SegmentId, Variable};

static NEXT_MARKER_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Synthetic epsilon node bounding a compiled scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub id: u32,
    pub is_bof: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Keyword(Keyword),
    Variable(Variable),
    Control(Marker),
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    kind: NodeKind,
    edges: Vec<NodeId>,
}

impl GraphNode {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn edges(&self) -> &[NodeId] {
        &self.edges
    }
}

/// Immutable compiled command graph.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    entry: NodeId,
    exit: NodeId,
}

impl Graph {
    pub fn compile(segments: &[Segment]) -> Graph {
        let mut compiler = Compiler::default();
        let (entry, exit) = compiler.compile_scope(segments);
        trace!(
            "compiled scheme into {} nodes ({} solid)",
            compiler.nodes.len(),
            compiler.solids.len()
        );
        Graph {
            nodes: compiler.nodes,
            entry,
            exit,
        }
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn exit(&self) -> NodeId {
        self.exit
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_terminal(&self, id: NodeId) -> bool {
        id == self.exit
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

/// A scope waiting in the optional chain. The trailing anchor has no exit.
type ChainLink = (NodeId, Option<NodeId>);

#[derive(Default)]
struct Compiler {
    nodes: Vec<GraphNode>,
    solids: HashMap<SegmentId, NodeId>,
}

impl Compiler {
    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(GraphNode {
            kind,
            edges: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn marker_pair(&mut self) -> (NodeId, NodeId) {
        let id = NEXT_MARKER_ID.fetch_add(1, Ordering::Relaxed);
        let bof = self.push(NodeKind::Control(Marker { id, is_bof: true }));
        let eof = self.push(NodeKind::Control(Marker { id, is_bof: false }));
        (bof, eof)
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        let edges = &mut self.nodes[from.0].edges;
        if !edges.contains(&to) {
            edges.push(to);
        }
    }

    fn solid_node(&mut self, id: SegmentId, kind: NodeKind) -> NodeId {
        if let Some(&existing) = self.solids.get(&id) {
            return existing;
        }
        let node = self.push(kind);
        self.solids.insert(id, node);
        node
    }

    fn compile_scope(&mut self, segments: &[Segment]) -> (NodeId, NodeId) {
        let (bof, eof) = self.marker_pair();
        let mut current = bof;
        let mut chain: Vec<ChainLink> = Vec::new();

        for segment in segments {
            match segment {
                Segment::Optional(inner) => {
                    let (opt_bof, opt_eof) = self.compile_scope(inner);
                    self.link(current, opt_bof);
                    chain.push((opt_bof, Some(opt_eof)));
                }
                Segment::Union(branches) => {
                    let (union_bof, union_eof) = self.marker_pair();
                    self.link(current, union_bof);
                    if !chain.is_empty() {
                        self.resolve_chain(&mut chain, union_bof);
                    }
                    for branch in branches {
                        let (branch_bof, branch_eof) = self.compile_scope(branch);
                        self.link(union_bof, branch_bof);
                        self.link(branch_eof, union_eof);
                    }
                    current = union_eof;
                }
                Segment::Keyword(keyword) => {
                    let node = self.solid_node(keyword.id(), NodeKind::Keyword(keyword.clone()));
                    self.link(current, node);
                    current = node;
                    if !chain.is_empty() {
                        self.resolve_chain(&mut chain, node);
                    }
                }
                Segment::Variable(variable) => {
                    let node =
                        self.solid_node(variable.id(), NodeKind::Variable(variable.clone()));
                    self.link(current, node);
                    current = node;
                    if variable.is_rest() {
                        self.link(node, node);
                    }
                    if !chain.is_empty() {
                        self.resolve_chain(&mut chain, node);
                    }
                }
            }
        }

        if !chain.is_empty() {
            self.resolve_chain(&mut chain, eof);
        }
        self.link(current, eof);

        (bof, eof)
    }

    /// Link every pending scope exit to every later scope entry, ending with
    /// `anchor`. Any subset of the pending optional scopes can then be
    /// skipped while keeping their relative order.
    fn resolve_chain(&mut self, chain: &mut Vec<ChainLink>, anchor: NodeId) {
        chain.push((anchor, None));
        for i in 0..chain.len() {
            let Some(exit) = chain[i].1 else {
                continue;
            };
            for j in (i + 1)..chain.len() {
                self.link(exit, chain[j].0);
            }
        }
        chain.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::segment::{keyword, optional, union, variable};

    fn kw(name: &str) -> Segment {
        keyword(name).unwrap().into()
    }

    /// Find the node for the keyword or variable called `name`.
    fn find(graph: &Graph, name: &str) -> NodeId {
        graph
            .nodes()
            .find(|(_, n)| match n.kind() {
                NodeKind::Keyword(k) => k.name() == name,
                NodeKind::Variable(v) => v.name() == name,
                NodeKind::Control(_) => false,
            })
            .map(|(id, _)| id)
            .unwrap_or_else(|| panic!("no node named {name}"))
    }

    /// Solid names reachable from `from` through marker nodes only.
    fn next_solids(graph: &Graph, from: NodeId) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = graph.node(from).edges().iter().rev().copied().collect();
        let mut seen = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            match graph.node(id).kind() {
                NodeKind::Keyword(k) => out.push(k.name().to_string()),
                NodeKind::Variable(v) => out.push(v.name().to_string()),
                NodeKind::Control(_) if graph.is_terminal(id) => out.push("$".to_string()),
                NodeKind::Control(_) => {
                    stack.extend(graph.node(id).edges().iter().rev().copied());
                }
            }
        }
        out
    }

    #[test]
    fn empty_scheme_links_entry_to_exit() {
        let graph = Graph::compile(&[]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node(graph.entry()).edges(), &[graph.exit()]);
        assert!(graph.is_terminal(graph.exit()));
    }

    fn marker(graph: &Graph, id: NodeId) -> Marker {
        match graph.node(id).kind() {
            NodeKind::Control(m) => *m,
            other => panic!("expected a marker, got {other:?}"),
        }
    }

    #[test]
    fn root_markers_share_the_first_id() {
        let graph = Graph::compile(&[kw("a"), optional([kw("b")])]);
        let entry = marker(&graph, graph.entry());
        let exit = marker(&graph, graph.exit());
        assert!(entry.is_bof);
        assert!(!exit.is_bof);
        assert_eq!(entry.id, exit.id);

        let nested = graph
            .nodes()
            .filter_map(|(_, n)| match n.kind() {
                NodeKind::Control(m) if m.is_bof && m.id != entry.id => Some(m.id),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(nested.len(), 1);
        assert!(nested[0] > entry.id);
    }

    #[test]
    fn marker_ids_are_unique_per_scope() {
        let graph = Graph::compile(&[optional([kw("a")]), union([vec![kw("b")], vec![kw("c")]])]);
        let mut bof_ids: Vec<u32> = graph
            .nodes()
            .filter_map(|(_, n)| match n.kind() {
                NodeKind::Control(m) if m.is_bof => Some(m.id),
                _ => None,
            })
            .collect();
        bof_ids.sort();
        bof_ids.dedup();
        // root, optional, union hub, two branches
        assert_eq!(bof_ids.len(), 5);
    }

    #[test]
    fn marker_ids_are_never_reused_across_graphs() {
        let first = Graph::compile(&[optional([kw("a")])]);
        let second = Graph::compile(&[optional([kw("a")])]);
        let ids = |graph: &Graph| -> Vec<u32> {
            graph
                .nodes()
                .filter_map(|(_, n)| match n.kind() {
                    NodeKind::Control(m) => Some(m.id),
                    _ => None,
                })
                .collect()
        };
        let first_ids = ids(&first);
        assert!(ids(&second).iter().all(|id| !first_ids.contains(id)));
        assert!(marker(&second, second.entry()).id > marker(&first, first.entry()).id);
    }

    #[test]
    fn mandatory_sequence_has_no_skip_paths() {
        let graph = Graph::compile(&[kw("a"), kw("b"), kw("c")]);
        assert_eq!(next_solids(&graph, graph.entry()), vec!["a"]);
        assert_eq!(next_solids(&graph, find(&graph, "a")), vec!["b"]);
        assert_eq!(next_solids(&graph, find(&graph, "b")), vec!["c"]);
        assert_eq!(next_solids(&graph, find(&graph, "c")), vec!["$"]);
    }

    #[test]
    fn optional_between_solids_can_be_skipped() {
        let graph = Graph::compile(&[kw("a"), optional([kw("b")]), kw("c")]);
        assert_eq!(next_solids(&graph, find(&graph, "a")), vec!["b", "c"]);
        assert_eq!(next_solids(&graph, find(&graph, "b")), vec!["c"]);
    }

    #[test]
    fn trailing_optionals_form_skip_lattice() {
        let graph = Graph::compile(&[kw("a"), optional([kw("b")]), optional([kw("c")])]);
        assert_eq!(next_solids(&graph, find(&graph, "a")), vec!["b", "c", "$"]);
        assert_eq!(next_solids(&graph, find(&graph, "b")), vec!["c", "$"]);
        assert_eq!(next_solids(&graph, find(&graph, "c")), vec!["$"]);
    }

    #[test]
    fn leading_optional_links_to_first_solid() {
        let graph = Graph::compile(&[optional([kw("a")]), kw("b")]);
        assert_eq!(next_solids(&graph, graph.entry()), vec!["a", "b"]);
        assert_eq!(next_solids(&graph, find(&graph, "a")), vec!["b"]);
    }

    #[test]
    fn union_branches_converge_on_shared_exit() {
        let graph = Graph::compile(&[union([vec![kw("a")], vec![kw("b"), kw("c")]]), kw("d")]);
        assert_eq!(next_solids(&graph, graph.entry()), vec!["a", "b"]);
        assert_eq!(next_solids(&graph, find(&graph, "a")), vec!["d"]);
        assert_eq!(next_solids(&graph, find(&graph, "b")), vec!["c"]);
        assert_eq!(next_solids(&graph, find(&graph, "c")), vec!["d"]);
    }

    #[test]
    fn optional_before_union_cannot_skip_the_union() {
        let graph = Graph::compile(&[
            optional([kw("a")]),
            union([vec![kw("b")], vec![kw("c")]]),
            kw("d"),
        ]);
        assert_eq!(next_solids(&graph, graph.entry()), vec!["a", "b", "c"]);
        assert_eq!(next_solids(&graph, find(&graph, "a")), vec!["b", "c"]);
    }

    #[test]
    fn rest_variable_has_self_loop() {
        let graph = Graph::compile(&[kw("cmd"), variable("x").unwrap().rest().into()]);
        let x = find(&graph, "x");
        assert!(graph.node(x).edges().contains(&x));
        assert!(graph.node(x).edges().contains(&graph.exit()));
    }

    #[test]
    fn reused_segment_compiles_to_one_node() {
        let shared = kw("again");
        let graph = Graph::compile(&[shared.clone(), kw("x"), shared]);
        let solid_count = graph
            .nodes()
            .filter(|(_, n)| !matches!(n.kind(), NodeKind::Control(_)))
            .count();
        assert_eq!(solid_count, 2);
    }
}
