//! Persisted scene model.
//!
//! This is also the wire shape exchanged with editor windows and the
//! persistence collaborator: `graph` serializes as a map of stage id to
//! `{x, y, dest}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{PositionId, SceneId, StageId};

/// A shared placement-variant payload. The engine treats `info` as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    #[serde(default)]
    pub info: serde_json::Value,
}

impl Position {
    pub fn new(info: serde_json::Value) -> Self {
        Self {
            id: PositionId::new(),
            info,
        }
    }

    /// Empty per-stage slot inserted when a position is added scene-wide.
    pub fn placeholder() -> Self {
        Self::new(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Copy of this position under a freshly minted id.
    pub fn refreshed(&self) -> Self {
        Self::new(self.info.clone())
    }
}

/// Per-stage extras carried through unchanged by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageExtra {
    #[serde(default)]
    pub fixed_len: f32,
    #[serde(default)]
    pub nav_text: String,
}

/// One content unit of a scene, edited in an external stage editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    #[serde(default)]
    pub name: String,
    /// Index-parallel with `Scene::positions`.
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub extra: StageExtra,
}

impl Stage {
    /// A new, empty stage sized to the scene's current position list.
    pub fn new(scene: &Scene) -> Self {
        Self {
            id: StageId::new(),
            name: String::new(),
            positions: scene.positions.iter().map(|_| Position::placeholder()).collect(),
            tags: Vec::new(),
            extra: StageExtra::default(),
        }
    }

    /// Clone-into-new: same content under a fresh stage id and fresh position ids.
    pub fn duplicate(&self) -> Self {
        Self {
            id: StageId::new(),
            name: self.name.clone(),
            positions: self.positions.iter().map(Position::refreshed).collect(),
            tags: self.tags.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Display label used for the canvas node.
    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Stage {}", &self.id.to_string()[..8])
        } else {
            self.name.clone()
        }
    }
}

/// Visual layout and outgoing transitions of one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLayoutEntry {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub dest: Vec<StageId>,
}

/// Scene-wide furniture configuration. The taxonomy itself lives elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Furniture {
    #[serde(default)]
    pub furni_types: Vec<String>,
    #[serde(default)]
    pub allow_bed: bool,
    #[serde(default)]
    pub offset: [f32; 4],
}

/// A named state machine of stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub root: Option<StageId>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub graph: BTreeMap<StageId, GraphLayoutEntry>,
    #[serde(default)]
    pub furniture: Furniture,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub has_warnings: bool,
}

impl Scene {
    /// Blank scene: fresh id, no stages, no positions.
    pub fn blank() -> Self {
        Self {
            id: SceneId::new(),
            name: String::new(),
            root: None,
            stages: Vec::new(),
            positions: Vec::new(),
            graph: BTreeMap::new(),
            furniture: Furniture::default(),
            tags: Vec::new(),
            private: false,
            has_warnings: false,
        }
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn contains_stage(&self, id: StageId) -> bool {
        self.stages.iter().any(|s| s.id == id)
    }

    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stages.iter().map(|s| s.id)
    }

    /// Every stage's position list has the scene's length.
    pub fn positions_aligned(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.positions.len() == self.positions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stage_matches_scene_position_count() {
        let mut scene = Scene::blank();
        scene.positions = vec![Position::placeholder(), Position::placeholder()];
        let stage = Stage::new(&scene);
        assert_eq!(stage.positions.len(), 2);
        assert!(stage.positions.iter().all(|p| !scene.positions.iter().any(|q| q.id == p.id)));
    }

    #[test]
    fn duplicate_mints_fresh_ids() {
        let scene = Scene::blank();
        let mut stage = Stage::new(&scene);
        stage.name = "Intro".into();
        stage.positions.push(Position::new(serde_json::json!({"race": "Human"})));

        let copy = stage.duplicate();
        assert_ne!(copy.id, stage.id);
        assert_eq!(copy.name, "Intro");
        assert_ne!(copy.positions[0].id, stage.positions[0].id);
        assert_eq!(copy.positions[0].info, stage.positions[0].info);
    }

    #[test]
    fn graph_serializes_as_id_keyed_map() {
        let mut scene = Scene::blank();
        let stage = Stage::new(&scene);
        let id = stage.id;
        scene.stages.push(stage);
        scene.graph.insert(id, GraphLayoutEntry { x: 10.0, y: 20.0, dest: vec![] });

        let value = serde_json::to_value(&scene).unwrap();
        let entry = &value["graph"][id.to_string()];
        assert_eq!(entry["x"], 10.0);
        assert_eq!(entry["y"], 20.0);
        assert!(entry["dest"].as_array().unwrap().is_empty());
    }

    #[test]
    fn missing_fields_default_on_load() {
        let id = SceneId::new();
        let scene: Scene = serde_json::from_str(&format!(r#"{{"id":"{}"}}"#, id)).unwrap();
        assert_eq!(scene.id, id);
        assert!(scene.stages.is_empty());
        assert!(scene.root.is_none());
        assert!(!scene.has_warnings);
    }
}
