use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stagecraft_types::{Position, ProjectSnapshot, Scene, SceneId, Stage, StageId};

use super::ProjectError;

/// Format written by this build.
pub const CURRENT_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    1
}

/// On-disk project: metadata plus every scene keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub scenes: ProjectSnapshot,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            name: name.into(),
            author: String::new(),
            scenes: BTreeMap::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let mut project: Project = serde_json::from_str(text)?;
        project.update_to_latest_version()?;
        Ok(project)
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Bring an older project up to `CURRENT_VERSION` in place.
    pub fn update_to_latest_version(&mut self) -> Result<(), ProjectError> {
        if self.version > CURRENT_VERSION {
            return Err(ProjectError::UnsupportedVersion(self.version));
        }
        if self.version < 2 {
            for scene in self.scenes.values_mut() {
                repair_scene(scene);
            }
            log::info!(target: "persistence", "migrated project '{}' from v{} to v2", self.name, self.version);
            self.version = 2;
        }
        Ok(())
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    /// Find a stage in any scene.
    pub fn find_stage(&self, id: StageId) -> Option<(&Scene, &Stage)> {
        self.scenes
            .values()
            .find_map(|scene| scene.stage(id).map(|stage| (scene, stage)))
    }
}

/// v1 scenes could carry short per-stage position lists, graph entries for
/// deleted stages, and a root naming a deleted stage.
fn repair_scene(scene: &mut Scene) {
    let len = scene.positions.len();
    for stage in &mut scene.stages {
        stage.positions.truncate(len);
        while stage.positions.len() < len {
            stage.positions.push(Position::placeholder());
        }
    }
    let ids: Vec<StageId> = scene.stage_ids().collect();
    scene.graph.retain(|id, _| ids.contains(id));
    for entry in scene.graph.values_mut() {
        entry.dest.retain(|d| ids.contains(d));
    }
    if let Some(root) = scene.root {
        if !ids.contains(&root) {
            scene.root = None;
        }
    }
}
