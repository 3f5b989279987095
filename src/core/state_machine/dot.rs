use crate::core::state_machine::graph::{Chain, CompiledPipeline, StateKind};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;

/// Node weight carrying state display information.
struct StateNode {
    id: String,
    kind: &'static str,
}

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\\n{}", self.id, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Trigger,
    Next,
    Each,
    Catch,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EdgeKind::Trigger => "trigger",
            EdgeKind::Next => "next",
            EdgeKind::Each => "each",
            EdgeKind::Catch => "catch",
        };
        f.write_str(label)
    }
}

struct GraphBuild {
    graph: DiGraph<StateNode, EdgeKind>,
    nodes: HashMap<String, NodeIndex>,
}

impl GraphBuild {
    fn add_chain(&mut self, chain: &Chain) -> Option<NodeIndex> {
        let mut first = None;
        let mut previous: Option<NodeIndex> = None;
        for state in &chain.states {
            let index = self.graph.add_node(StateNode {
                id: state.id.clone(),
                kind: state.kind.name(),
            });
            self.nodes.insert(state.id.clone(), index);
            first.get_or_insert(index);
            if let Some(previous) = previous {
                self.graph.add_edge(previous, index, EdgeKind::Next);
            }
            if let StateKind::ForEach { iterator, .. } = &state.kind {
                if let Some(start) = self.add_chain(iterator) {
                    self.graph.add_edge(index, start, EdgeKind::Each);
                }
            }
            for branch in &state.catch {
                if let Some(start) = self.add_chain(&branch.states) {
                    self.graph.add_edge(index, start, EdgeKind::Catch);
                }
            }
            previous = Some(index);
        }
        first
    }
}

fn build_graph(pipeline: &CompiledPipeline) -> GraphBuild {
    let mut build = GraphBuild {
        graph: DiGraph::new(),
        nodes: HashMap::new(),
    };
    let rule = build.graph.add_node(StateNode {
        id: pipeline.rule.name.clone(),
        kind: "TriggerRule",
    });
    build.nodes.insert(pipeline.rule.name.clone(), rule);
    if let Some(start) = build.add_chain(&pipeline.state_machine.chain) {
        build.graph.add_edge(rule, start, EdgeKind::Trigger);
    }
    build
}

/// Render the compiled state machine and its trigger as a Graphviz DOT
/// string using petgraph.
pub fn pipeline_to_dot(pipeline: &CompiledPipeline) -> String {
    let build = build_graph(pipeline);
    format!("{}", Dot::new(&build.graph))
}

/// Ids of the states a state can transition into, in edge insertion order.
pub fn successors(pipeline: &CompiledPipeline, state_id: &str) -> Vec<String> {
    let build = build_graph(pipeline);
    let Some(&index) = build.nodes.get(state_id) else {
        return Vec::new();
    };
    let mut out: Vec<String> = build
        .graph
        .neighbors(index)
        .map(|n| build.graph[n].id.clone())
        .collect();
    // petgraph yields neighbors most recent edge first
    out.reverse();
    out
}
