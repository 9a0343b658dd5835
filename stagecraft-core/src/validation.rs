//! Save-time checks on the active scene.
//!
//! Rules run in order. Only a missing name blocks a save; everything else is
//! recorded as a warning and folded into `Scene::has_warnings`.

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use stagecraft_types::{Scene, StageId};

use crate::canvas::CanvasSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockingError {
    MissingName,
}

impl std::fmt::Display for BlockingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockingError::MissingName => write!(f, "Scene needs a name before it can be saved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingStart,
    /// Stages that cannot be reached from the start stage.
    Unreachable(Vec<StageId>),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingStart => write!(f, "No start stage selected"),
            Warning::Unreachable(ids) => {
                write!(f, "{} stage(s) unreachable from the start stage", ids.len())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub blocking: Vec<BlockingError>,
    pub warnings: Vec<Warning>,
}

impl ValidationReport {
    pub fn is_blocked(&self) -> bool {
        !self.blocking.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub fn evaluate(scene: &Scene, canvas: &CanvasSnapshot) -> ValidationReport {
    let mut report = ValidationReport::default();

    if scene.name.trim().is_empty() {
        report.blocking.push(BlockingError::MissingName);
    }

    match canvas.start {
        None => report.warnings.push(Warning::MissingStart),
        Some(start) => {
            let unreachable = unreachable_from(start, canvas);
            if !unreachable.is_empty() {
                report.warnings.push(Warning::Unreachable(unreachable));
            }
        }
    }

    report
}

/// Nodes not reached by a breadth-first walk along outgoing edges from
/// `start`. The start node counts once, whether or not a cycle leads back.
fn unreachable_from(start: StageId, canvas: &CanvasSnapshot) -> Vec<StageId> {
    let mut graph: DiGraphMap<StageId, ()> = DiGraphMap::new();
    for node in &canvas.nodes {
        graph.add_node(node.id);
    }
    for &(from, to) in &canvas.edges {
        graph.add_edge(from, to, ());
    }
    if !graph.contains_node(start) {
        return canvas.nodes.iter().map(|n| n.id).collect();
    }

    let mut reachable_excluding_start = 0usize;
    let mut seen = std::collections::HashSet::new();
    let mut bfs = Bfs::new(&graph, start);
    while let Some(id) = bfs.next(&graph) {
        seen.insert(id);
        if id != start {
            reachable_excluding_start += 1;
        }
    }

    if reachable_excluding_start + 1 == canvas.nodes.len() {
        return Vec::new();
    }
    canvas
        .nodes
        .iter()
        .map(|n| n.id)
        .filter(|id| !seen.contains(id))
        .collect()
}
