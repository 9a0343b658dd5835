use petgraph::graphmap::DiGraphMap;
use stagecraft_types::StageId;

use super::CanvasError;

/// Edge admission policy, consulted at the single point where edges enter
/// the canvas. Each node exposes exactly one output port, so every edge is
/// identified by its ordered (source, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionRules {
    /// Permit a stage to transition to itself.
    pub allow_self_loops: bool,
}

impl ConnectionRules {
    pub fn admit(
        &self,
        graph: &DiGraphMap<StageId, ()>,
        from: StageId,
        to: StageId,
    ) -> Result<(), CanvasError> {
        if !graph.contains_node(from) {
            return Err(CanvasError::MissingEndpoint(from));
        }
        if !graph.contains_node(to) {
            return Err(CanvasError::MissingEndpoint(to));
        }
        if from == to && !self.allow_self_loops {
            return Err(CanvasError::SelfLoop(from));
        }
        if graph.contains_edge(from, to) {
            return Err(CanvasError::DuplicateEdge(from, to));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_reject_loops_duplicates_and_dangling_edges() {
        let rules = ConnectionRules::default();
        let (a, b, ghost) = (StageId::new(), StageId::new(), StageId::new());
        let mut g = DiGraphMap::new();
        g.add_node(a);
        g.add_node(b);

        assert!(rules.admit(&g, a, b).is_ok());
        g.add_edge(a, b, ());
        assert_eq!(rules.admit(&g, a, b), Err(CanvasError::DuplicateEdge(a, b)));
        assert!(rules.admit(&g, b, a).is_ok());
        assert_eq!(rules.admit(&g, a, a), Err(CanvasError::SelfLoop(a)));
        assert_eq!(rules.admit(&g, a, ghost), Err(CanvasError::MissingEndpoint(ghost)));
    }

    #[test]
    fn self_loops_can_be_allowed() {
        let rules = ConnectionRules { allow_self_loops: true };
        let a = StageId::new();
        let mut g = DiGraphMap::new();
        g.add_node(a);
        assert!(rules.admit(&g, a, a).is_ok());
    }
}
