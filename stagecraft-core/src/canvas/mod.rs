//! Graph canvas adapter.
//!
//! Owns the diagram model behind the node-link editor: one node per stage,
//! directed transition edges, a single start marker, coordinates, and the
//! view. Every mutation queues a `CanvasEvent`; the sync controller drains
//! the queue and decides whether the change counts as a user edit.

mod history;
mod layout;
mod rules;
mod viewport;

pub use history::History;
pub use layout::GridCursor;
pub use rules::ConnectionRules;
pub use viewport::{Bounds, Viewport};

use std::collections::BTreeMap;

use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use stagecraft_types::StageId;

use crate::config::CanvasSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasError {
    UnknownNode(StageId),
    DuplicateNode(StageId),
    MissingEndpoint(StageId),
    SelfLoop(StageId),
    DuplicateEdge(StageId, StageId),
    UnknownEdge(StageId, StageId),
}

impl std::fmt::Display for CanvasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanvasError::UnknownNode(id) => write!(f, "no node for stage {}", id),
            CanvasError::DuplicateNode(id) => write!(f, "stage {} already has a node", id),
            CanvasError::MissingEndpoint(id) => write!(f, "edge endpoint {} is not on the canvas", id),
            CanvasError::SelfLoop(id) => write!(f, "stage {} cannot transition to itself", id),
            CanvasError::DuplicateEdge(a, b) => write!(f, "edge {} -> {} already exists", a, b),
            CanvasError::UnknownEdge(a, b) => write!(f, "no edge {} -> {}", a, b),
        }
    }
}

impl std::error::Error for CanvasError {}

/// Structural notifications, in the order the mutations happened.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    NodeAdded(StageId),
    NodeRemoved(StageId),
    NodeMoved(StageId),
    LabelChanged(StageId),
    EdgeAdded(StageId, StageId),
    EdgeRemoved(StageId, StageId),
    StartChanged(Option<StageId>),
    Cleared,
    /// Undo or redo swapped in a different model.
    Restored,
}

impl CanvasEvent {
    /// Whether the event changes what a save would write. Labels only mirror
    /// stage names held by the store.
    pub fn is_structural(&self) -> bool {
        !matches!(self, CanvasEvent::LabelChanged(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodePlacement {
    x: f64,
    y: f64,
}

/// The undoable part of the canvas. The grid cursor lives here so undoing
/// an auto-placed node gives its slot back.
#[derive(Debug, Clone)]
struct CanvasModel {
    graph: DiGraphMap<StageId, ()>,
    placements: BTreeMap<StageId, NodePlacement>,
    start: Option<StageId>,
    cursor: GridCursor,
}

impl CanvasModel {
    fn empty(cursor: GridCursor) -> Self {
        Self {
            graph: DiGraphMap::new(),
            placements: BTreeMap::new(),
            start: None,
            cursor,
        }
    }

    fn taken_slots(&self) -> Vec<(f64, f64)> {
        self.placements.values().map(|p| (p.x, p.y)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: StageId,
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Serializable copy of the rendered diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    /// Nodes in canvas order.
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<(StageId, StageId)>,
    pub start: Option<StageId>,
}

impl CanvasSnapshot {
    pub fn node(&self, id: StageId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Outgoing edge targets of `id`.
    pub fn successors(&self, id: StageId) -> Vec<StageId> {
        self.edges
            .iter()
            .filter(|(from, _)| *from == id)
            .map(|(_, to)| *to)
            .collect()
    }
}

pub struct Canvas {
    model: CanvasModel,
    labels: BTreeMap<StageId, String>,
    rules: ConnectionRules,
    history: History<CanvasModel>,
    viewport: Viewport,
    settings: CanvasSettings,
    events: Vec<CanvasEvent>,
}

impl Canvas {
    pub fn new(settings: CanvasSettings) -> Self {
        Self::with_rules(settings, ConnectionRules::default())
    }

    pub fn with_rules(settings: CanvasSettings, rules: ConnectionRules) -> Self {
        Self {
            model: CanvasModel::empty(GridCursor::new(settings.grid)),
            labels: BTreeMap::new(),
            rules,
            history: History::new(settings.history_depth),
            viewport: Viewport::new(settings.viewport),
            settings,
            events: Vec::new(),
        }
    }

    pub fn rules(&self) -> ConnectionRules {
        self.rules
    }

    // --- queries ---

    pub fn is_empty(&self) -> bool {
        self.model.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.model.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.model.graph.edge_count()
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.model.graph.contains_node(id)
    }

    pub fn contains_edge(&self, from: StageId, to: StageId) -> bool {
        self.model.graph.contains_edge(from, to)
    }

    pub fn start(&self) -> Option<StageId> {
        self.model.start
    }

    pub fn position_of(&self, id: StageId) -> Option<(f64, f64)> {
        self.model.placements.get(&id).map(|p| (p.x, p.y))
    }

    pub fn label(&self, id: StageId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn node_ids(&self) -> Vec<StageId> {
        self.model.graph.nodes().collect()
    }

    pub fn successors(&self, id: StageId) -> Vec<StageId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.model.graph.neighbors(id).collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let grid = self.settings.grid;
        let mut iter = self.model.placements.values();
        let first = iter.next()?;
        let mut b = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x + grid.node_width,
            max_y: first.y + grid.node_height,
        };
        for p in iter {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x + grid.node_width);
            b.max_y = b.max_y.max(p.y + grid.node_height);
        }
        Some(b)
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        let nodes = self
            .model
            .graph
            .nodes()
            .map(|id| {
                let (x, y) = self.position_of(id).unwrap_or_default();
                NodeSnapshot {
                    id,
                    x,
                    y,
                    label: self.labels.get(&id).cloned().unwrap_or_default(),
                }
            })
            .collect();
        let edges = self
            .model
            .graph
            .all_edges()
            .map(|(from, to, _)| (from, to))
            .collect();
        CanvasSnapshot {
            nodes,
            edges,
            start: self.model.start,
        }
    }

    // --- structural mutations ---

    /// Add a node for `id`. Without coordinates the next grid slot no other
    /// node occupies is used.
    pub fn add_node(&mut self, id: StageId, at: Option<(f64, f64)>) -> Result<(), CanvasError> {
        if self.contains(id) {
            return Err(CanvasError::DuplicateNode(id));
        }
        self.record();
        let (x, y) = match at {
            Some(at) => at,
            None => {
                let taken = self.model.taken_slots();
                self.model.cursor.next_free_slot(&taken)
            }
        };
        self.model.graph.add_node(id);
        self.model.placements.insert(id, NodePlacement { x, y });
        self.events.push(CanvasEvent::NodeAdded(id));
        Ok(())
    }

    /// Remove a node with its incident edges. Clears the start marker if it
    /// pointed here.
    pub fn remove_node(&mut self, id: StageId) -> Result<(), CanvasError> {
        if !self.contains(id) {
            return Err(CanvasError::UnknownNode(id));
        }
        self.record();
        let incident: Vec<(StageId, StageId)> = self
            .model
            .graph
            .all_edges()
            .filter(|(a, b, _)| *a == id || *b == id)
            .map(|(a, b, _)| (a, b))
            .collect();
        self.model.graph.remove_node(id);
        self.model.placements.remove(&id);
        self.labels.remove(&id);
        for (a, b) in incident {
            self.events.push(CanvasEvent::EdgeRemoved(a, b));
        }
        self.events.push(CanvasEvent::NodeRemoved(id));
        if self.model.start == Some(id) {
            self.model.start = None;
            self.events.push(CanvasEvent::StartChanged(None));
        }
        Ok(())
    }

    pub fn add_edge(&mut self, from: StageId, to: StageId) -> Result<(), CanvasError> {
        self.rules.admit(&self.model.graph, from, to)?;
        self.record();
        self.model.graph.add_edge(from, to, ());
        self.events.push(CanvasEvent::EdgeAdded(from, to));
        Ok(())
    }

    pub fn remove_edge(&mut self, from: StageId, to: StageId) -> Result<(), CanvasError> {
        if !self.contains_edge(from, to) {
            return Err(CanvasError::UnknownEdge(from, to));
        }
        self.record();
        self.model.graph.remove_edge(from, to);
        self.events.push(CanvasEvent::EdgeRemoved(from, to));
        Ok(())
    }

    pub fn move_node(&mut self, id: StageId, x: f64, y: f64) -> Result<(), CanvasError> {
        if !self.contains(id) {
            return Err(CanvasError::UnknownNode(id));
        }
        self.record();
        self.model.placements.insert(id, NodePlacement { x, y });
        self.events.push(CanvasEvent::NodeMoved(id));
        Ok(())
    }

    /// Labels mirror stage names and are not part of undo history.
    pub fn set_label(&mut self, id: StageId, label: impl Into<String>) -> Result<(), CanvasError> {
        if !self.contains(id) {
            return Err(CanvasError::UnknownNode(id));
        }
        let label = label.into();
        if self.labels.get(&id) != Some(&label) {
            self.labels.insert(id, label);
            self.events.push(CanvasEvent::LabelChanged(id));
        }
        Ok(())
    }

    /// Move the single start marker. Setting the current start again is a no-op.
    pub fn set_start(&mut self, id: Option<StageId>) -> Result<(), CanvasError> {
        if let Some(id) = id {
            if !self.contains(id) {
                return Err(CanvasError::UnknownNode(id));
            }
        }
        if self.model.start == id {
            return Ok(());
        }
        self.record();
        self.model.start = id;
        self.events.push(CanvasEvent::StartChanged(id));
        Ok(())
    }

    /// Remove everything. A no-op on an empty canvas.
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        self.record();
        let had_start = self.model.start.is_some();
        self.model = CanvasModel::empty(GridCursor::new(self.settings.grid));
        self.labels.clear();
        self.events.push(CanvasEvent::Cleared);
        if had_start {
            self.events.push(CanvasEvent::StartChanged(None));
        }
    }

    // --- history ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let current = self.model.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.model.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn record(&mut self) {
        self.history.push(self.model.clone());
    }

    fn restore(&mut self, model: CanvasModel) {
        let start_before = self.model.start;
        self.model = model;
        self.labels.retain(|id, _| self.model.graph.contains_node(*id));
        self.events.push(CanvasEvent::Restored);
        if self.model.start != start_before {
            self.events.push(CanvasEvent::StartChanged(self.model.start));
        }
    }

    // --- events ---

    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    // --- viewport ---

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        self.viewport.zoom_to(zoom);
    }

    pub fn zoom_to_fit(&mut self) {
        let bounds = self.bounds();
        self.viewport.fit(bounds);
    }

    pub fn center_content(&mut self) {
        let bounds = self.bounds();
        self.viewport.center_on(bounds);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
    }

    pub fn toggle_pan_lock(&mut self) -> bool {
        self.viewport.toggle_pan_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(CanvasSettings::default())
    }

    #[test]
    fn auto_placement_uses_grid() {
        let mut c = canvas();
        let (a, b) = (StageId::new(), StageId::new());
        c.add_node(a, None).unwrap();
        c.add_node(b, None).unwrap();
        assert_eq!(c.position_of(a), Some((40.0, 40.0)));
        assert_eq!(c.position_of(b), Some((260.0, 40.0)));
    }

    #[test]
    fn remove_node_drops_incident_edges_and_start() {
        let mut c = canvas();
        let (a, b) = (StageId::new(), StageId::new());
        c.add_node(a, None).unwrap();
        c.add_node(b, None).unwrap();
        c.add_edge(a, b).unwrap();
        c.set_start(Some(a)).unwrap();
        c.drain_events();

        c.remove_node(a).unwrap();
        assert_eq!(c.edge_count(), 0);
        assert_eq!(c.start(), None);
        let events = c.drain_events();
        assert!(events.contains(&CanvasEvent::EdgeRemoved(a, b)));
        assert!(events.contains(&CanvasEvent::StartChanged(None)));
    }

    #[test]
    fn set_start_twice_is_a_single_change() {
        let mut c = canvas();
        let a = StageId::new();
        c.add_node(a, None).unwrap();
        c.drain_events();
        c.set_start(Some(a)).unwrap();
        c.set_start(Some(a)).unwrap();
        assert_eq!(c.drain_events(), vec![CanvasEvent::StartChanged(Some(a))]);
    }

    #[test]
    fn undo_restores_previous_model() {
        let mut c = canvas();
        let (a, b) = (StageId::new(), StageId::new());
        c.add_node(a, None).unwrap();
        c.add_node(b, None).unwrap();
        c.add_edge(a, b).unwrap();
        assert!(c.undo());
        assert!(!c.contains_edge(a, b));
        assert!(c.redo());
        assert!(c.contains_edge(a, b));
        c.clear_history();
        assert!(!c.can_undo());
    }

    #[test]
    fn clear_on_empty_canvas_does_nothing() {
        let mut c = canvas();
        c.clear();
        assert!(c.drain_events().is_empty());
        assert!(!c.can_undo());
    }

    #[test]
    fn snapshot_lists_nodes_edges_and_start() {
        let mut c = canvas();
        let (a, b) = (StageId::new(), StageId::new());
        c.add_node(a, Some((1.0, 2.0))).unwrap();
        c.add_node(b, None).unwrap();
        c.set_label(a, "Intro").unwrap();
        c.add_edge(a, b).unwrap();
        c.set_start(Some(a)).unwrap();

        let snap = c.snapshot();
        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.nodes[0].label, "Intro");
        assert_eq!((snap.nodes[0].x, snap.nodes[0].y), (1.0, 2.0));
        assert_eq!(snap.edges, vec![(a, b)]);
        assert_eq!(snap.successors(a), vec![b]);
        assert_eq!(snap.start, Some(a));
    }

    #[test]
    fn auto_placement_skips_stored_coordinates() {
        let mut c = canvas();
        let (a, b) = (StageId::new(), StageId::new());
        c.add_node(a, Some((40.0, 40.0))).unwrap();
        c.add_node(b, None).unwrap();
        assert_eq!(c.position_of(b), Some((260.0, 40.0)));
    }

    #[test]
    fn undo_gives_back_the_grid_slot() {
        let mut c = canvas();
        let (a, b) = (StageId::new(), StageId::new());
        c.add_node(a, None).unwrap();
        assert!(c.undo());
        c.add_node(b, None).unwrap();
        assert_eq!(c.position_of(b), Some((40.0, 40.0)));
    }

    #[test]
    fn rejected_edge_records_nothing() {
        let mut c = canvas();
        let a = StageId::new();
        c.add_node(a, None).unwrap();
        c.clear_history();
        c.drain_events();
        assert_eq!(c.add_edge(a, a), Err(CanvasError::SelfLoop(a)));
        assert!(!c.can_undo());
        assert!(c.drain_events().is_empty());
    }
}
