#![allow(dead_code)]
//! Test harness utilities for stagecraft-core integration tests.

use stagecraft_core::config::CanvasSettings;
use stagecraft_core::dispatch::SyncController;
use stagecraft_core::persistence::{IoFeedback, Persistence};
use stagecraft_types::{GraphLayoutEntry, ProjectSnapshot, Scene, SceneId, Stage, StageId};

/// Persistence double that records calls instead of doing I/O.
#[derive(Default)]
pub struct RecordingPersistence {
    pub saves: Vec<(u64, Scene)>,
    pub deleted: Vec<SceneId>,
    pub created: Vec<SceneId>,
    pub snapshot_requests: usize,
}

impl RecordingPersistence {
    /// Acknowledge the most recent save as successful.
    pub fn ack_last(&self) -> IoFeedback {
        let (id, scene) = self.saves.last().cloned().expect("no save recorded");
        IoFeedback::SaveComplete { id, scene_id: scene.id, result: Ok(scene) }
    }
}

impl Persistence for RecordingPersistence {
    fn save(&mut self, id: u64, scene: Scene) {
        self.saves.push((id, scene));
    }

    fn create_blank(&mut self) -> Scene {
        let scene = Scene::blank();
        self.created.push(scene.id);
        scene
    }

    fn delete(&mut self, id: SceneId) {
        self.deleted.push(id);
    }

    fn request_snapshot(&mut self) {
        self.snapshot_requests += 1;
    }
}

/// Scene named `name` with `n` stages, no layout, no edges, no root.
pub fn scene_with_stages(name: &str, n: usize) -> (Scene, Vec<StageId>) {
    let mut scene = Scene::blank();
    scene.name = name.to_string();
    let mut ids = Vec::new();
    for i in 0..n {
        let mut stage = Stage::new(&scene);
        stage.name = format!("Stage {}", i + 1);
        ids.push(stage.id);
        scene.stages.push(stage);
    }
    (scene, ids)
}

/// Lay out every stage and add the given edges to `scene.graph`.
pub fn with_edges(mut scene: Scene, edges: &[(StageId, StageId)]) -> Scene {
    for (i, stage) in scene.stages.iter().enumerate() {
        scene.graph.insert(
            stage.id,
            GraphLayoutEntry { x: 100.0 * i as f64, y: 50.0, dest: Vec::new() },
        );
    }
    for (from, to) in edges {
        if let Some(entry) = scene.graph.get_mut(from) {
            entry.dest.push(*to);
        }
    }
    scene
}

pub fn snapshot_of(scenes: &[&Scene]) -> ProjectSnapshot {
    scenes.iter().map(|s| (s.id, Scene::clone(s))).collect()
}

/// Controller loaded with `scenes`; the first scene in id order is active.
pub fn controller_with(scenes: &[&Scene]) -> SyncController {
    let mut controller = SyncController::new(CanvasSettings::default());
    controller.apply_project_snapshot(snapshot_of(scenes));
    controller
}

/// Controller with `scene` active, whatever the id order of `others`.
pub fn controller_with_active(scene: &Scene, others: &[&Scene]) -> SyncController {
    let mut all = vec![scene];
    all.extend_from_slice(others);
    let mut controller = controller_with(&all);
    if controller.store().active_id() != Some(scene.id) {
        controller.request_activate(scene.id);
    }
    assert_eq!(controller.store().active_id(), Some(scene.id));
    controller
}
