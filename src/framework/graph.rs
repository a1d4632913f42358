// This module provides the small dataflow graph used to wrap a single op for
// compilation. A Graph always contains the _SOURCE and _SINK bookkeeping nodes. Nodes
// are added from NodeDefs and resolved against the op registry so that each node knows
// its declared input and output dtypes. Edges connect an output slot to an input slot;
// control edges use CONTROL_SLOT on both ends. fixup_source_and_sink_edges gives every
// node without inputs a control edge from _SOURCE and every node without outputs a
// control edge to _SINK, which keeps the graph rooted and terminated.

//! Dataflow graphs.

use std::fmt;

use crate::core::error::{JitError, JitResult};
use crate::framework::op_registry::OpRegistry;
use crate::protos::{DataType, NodeDef};

/// Slot number used by control edges.
pub const CONTROL_SLOT: i32 = -1;

pub const SOURCE_ID: usize = 0;
pub const SINK_ID: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: usize,
    def: NodeDef,
    input_types: Vec<DataType>,
    output_types: Vec<DataType>,
}

impl Node {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn type_string(&self) -> &str {
        &self.def.op
    }

    pub fn def(&self) -> &NodeDef {
        &self.def
    }

    pub fn input_types(&self) -> &[DataType] {
        &self.input_types
    }

    pub fn output_types(&self) -> &[DataType] {
        &self.output_types
    }

    pub fn is_source(&self) -> bool {
        self.id == SOURCE_ID
    }

    pub fn is_sink(&self) -> bool {
        self.id == SINK_ID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: usize,
    pub src_output: i32,
    pub dst: usize,
    pub dst_input: i32,
}

impl Edge {
    pub fn is_control_edge(&self) -> bool {
        self.src_output == CONTROL_SLOT
    }
}

#[derive(Debug, Clone)]
pub struct Graph<'r> {
    registry: &'r OpRegistry,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph<'static> {
    /// Empty graph over the global op registry.
    pub fn new() -> Self {
        Self::with_registry(OpRegistry::global())
    }
}

impl Default for Graph<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Graph<'r> {
    pub fn with_registry(registry: &'r OpRegistry) -> Self {
        let bookkeeping = |name: &str| Node {
            id: 0,
            def: NodeDef { name: name.to_string(), op: "NoOp".to_string(), ..Default::default() },
            input_types: Vec::new(),
            output_types: Vec::new(),
        };
        let mut source = bookkeeping("_SOURCE");
        let mut sink = bookkeeping("_SINK");
        source.id = SOURCE_ID;
        sink.id = SINK_ID;
        Self { registry, nodes: vec![source, sink], edges: Vec::new() }
    }

    /// Add a node, resolving its dtypes against the registry.
    pub fn add_node(&mut self, def: NodeDef) -> JitResult<usize> {
        let op_def = self.registry.lookup(&def.op)?;
        let input_types = op_def.input_types(&def.name, &def.attr)?;
        let output_types = op_def.output_types(&def.name, &def.attr)?;
        let id = self.nodes.len();
        log::trace!("Graph node {} = {} ({})", id, def.name, def.op);
        self.nodes.push(Node { id, def, input_types, output_types });
        Ok(id)
    }

    /// Connect `src:src_output` to `dst:dst_input`. Data slots must exist on both nodes.
    pub fn add_edge(&mut self, src: usize, src_output: i32, dst: usize, dst_input: i32) -> JitResult<()> {
        let src_node = self.node(src)?;
        let dst_node = self.node(dst)?;
        if src_output != CONTROL_SLOT {
            check_slot(src_node, "output", src_output, src_node.output_types().len())?;
        }
        if dst_input != CONTROL_SLOT {
            check_slot(dst_node, "input", dst_input, dst_node.input_types().len())?;
        }
        self.edges.push(Edge { src, src_output, dst, dst_input });
        Ok(())
    }

    pub fn add_control_edge(&mut self, src: usize, dst: usize) -> JitResult<()> {
        self.add_edge(src, CONTROL_SLOT, dst, CONTROL_SLOT)
    }

    pub fn node(&self, id: usize) -> JitResult<&Node> {
        self.nodes.get(id).ok_or(JitError::NodeNotFound { id })
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    pub fn source_node(&self) -> &Node {
        &self.nodes[SOURCE_ID]
    }

    pub fn sink_node(&self) -> &Node {
        &self.nodes[SINK_ID]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes other than `_SOURCE` and `_SINK`.
    pub fn op_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|node| !node.is_source() && !node.is_sink())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn in_edges(&self, id: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |edge| edge.dst == id)
    }

    pub fn out_edges(&self, id: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |edge| edge.src == id)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Root input-less nodes at `_SOURCE` and terminate output-less nodes at `_SINK`.
    pub fn fixup_source_and_sink_edges(&mut self) {
        let ids: Vec<usize> = self.op_nodes().map(Node::id).collect();
        for id in ids {
            if self.in_edges(id).next().is_none() {
                self.edges.push(Edge { src: SOURCE_ID, src_output: CONTROL_SLOT, dst: id, dst_input: CONTROL_SLOT });
            }
            if self.out_edges(id).next().is_none() {
                self.edges.push(Edge { src: id, src_output: CONTROL_SLOT, dst: SINK_ID, dst_input: CONTROL_SLOT });
            }
        }
    }
}

fn check_slot(node: &Node, direction: &'static str, slot: i32, available: usize) -> JitResult<()> {
    match usize::try_from(slot) {
        Ok(index) if index < available => Ok(()),
        _ => Err(JitError::SlotOutOfRange {
            node: node.name().to_string(),
            direction,
            slot,
            available,
        }),
    }
}

impl fmt::Display for Graph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "{} = {}()", node.name(), node.type_string())?;
        }
        for edge in &self.edges {
            let src = self.nodes[edge.src].name();
            let dst = self.nodes[edge.dst].name();
            if edge.is_control_edge() {
                writeln!(f, "^{src} -> {dst}")?;
            } else {
                writeln!(f, "{src}:{} -> {dst}:{}", edge.src_output, edge.dst_input)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::node_def_builder::{FakeInput, NodeDefBuilder};

    #[test]
    fn test_new_graph_has_source_and_sink() {
        let graph = Graph::new();
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.source_node().name(), "_SOURCE");
        assert_eq!(graph.sink_node().name(), "_SINK");
        assert_eq!(graph.op_nodes().count(), 0);
    }

    #[test]
    fn test_fixup_source_and_sink() {
        let mut graph = Graph::new();
        let def = NodeDefBuilder::new("noop", "NoOp").finalize().unwrap();
        let id = graph.add_node(def).unwrap();
        graph.fixup_source_and_sink_edges();

        let edges = graph.edges();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(Edge::is_control_edge));
        assert_eq!(graph.in_edges(id).next().unwrap().src, SOURCE_ID);
        assert_eq!(graph.out_edges(id).next().unwrap().dst, SINK_ID);

        // A second fixup does not duplicate edges.
        graph.fixup_source_and_sink_edges();
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_add_edge_checks_ids() {
        let mut graph = Graph::new();
        let def = NodeDefBuilder::new("id", "Identity")
            .input(FakeInput(DataType::DtFloat))
            .finalize()
            .unwrap();
        let id = graph.add_node(def).unwrap();
        assert_eq!(graph.node(id).unwrap().output_types(), &[DataType::DtFloat]);
        assert_eq!(graph.add_edge(id, 0, 42, 0).unwrap_err(), JitError::NodeNotFound { id: 42 });
    }

    #[test]
    fn test_add_edge_checks_slots() {
        let mut graph = Graph::new();
        let def = NodeDefBuilder::new("id", "Identity")
            .input(FakeInput(DataType::DtFloat))
            .finalize()
            .unwrap();
        let id = graph.add_node(def).unwrap();
        let noop = graph.add_node(NodeDefBuilder::new("noop", "NoOp").finalize().unwrap()).unwrap();

        assert_eq!(
            graph.add_edge(id, 1, id, 0).unwrap_err(),
            JitError::SlotOutOfRange { node: "id".into(), direction: "output", slot: 1, available: 1 }
        );
        assert_eq!(
            graph.add_edge(id, 0, noop, 0).unwrap_err(),
            JitError::SlotOutOfRange { node: "noop".into(), direction: "input", slot: 0, available: 0 }
        );
        assert!(matches!(graph.add_edge(id, -2, id, 0), Err(JitError::SlotOutOfRange { slot: -2, .. })));
        assert_eq!(graph.num_edges(), 0);

        // Control edges carry no slot and are accepted between any nodes.
        graph.add_control_edge(id, noop).unwrap();
        graph.add_edge(id, 0, id, 0).unwrap();
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_display() {
        let mut graph = Graph::new();
        let def = NodeDefBuilder::new("noop", "NoOp").finalize().unwrap();
        graph.add_node(def).unwrap();
        graph.fixup_source_and_sink_edges();

        let text = graph.to_string();
        assert!(text.contains("noop = NoOp()"));
        assert!(text.contains("^_SOURCE -> noop"));
        assert!(text.contains("^noop -> _SINK"));
    }
}
