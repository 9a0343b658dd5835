use std::sync::Arc;

use serde::Serialize;
use stagecraft_types::{ProjectSnapshot, Scene, SceneId};

/// Where a patch for a scene id landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchTarget {
    /// The working copy of the active scene.
    Active,
    /// A scene in the known list that is not being edited.
    Background,
    /// No scene with that id is known.
    Missing,
}

/// Owned copy of the store contents, for comparisons and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub active: Option<Scene>,
    pub scenes: Vec<Scene>,
}

/// The active scene's working copy plus every known scene as last loaded or
/// saved.
///
/// Scenes are never mutated in place. A patch builds a new `Scene` from the
/// current one and swaps the `Arc` in whole, so readers holding an older
/// snapshot keep seeing a consistent scene.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    active: Option<Arc<Scene>>,
    scenes: Vec<Arc<Scene>>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and adopt `snapshot` in scene id order. Nothing is active.
    pub fn replace_all(&mut self, snapshot: ProjectSnapshot) {
        self.active = None;
        self.scenes = snapshot.into_values().map(Arc::new).collect();
    }

    pub fn scenes(&self) -> &[Arc<Scene>] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn first_id(&self) -> Option<SceneId> {
        self.scenes.first().map(|s| s.id)
    }

    /// Committed copy of a known scene.
    pub fn get(&self, id: SceneId) -> Option<&Arc<Scene>> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn active(&self) -> Option<&Arc<Scene>> {
        self.active.as_ref()
    }

    pub fn active_id(&self) -> Option<SceneId> {
        self.active.as_ref().map(|s| s.id)
    }

    pub fn is_active(&self, id: SceneId) -> bool {
        self.active_id() == Some(id)
    }

    /// Working copy for the active scene, committed copy otherwise.
    pub fn current(&self, id: SceneId) -> Option<Arc<Scene>> {
        match &self.active {
            Some(active) if active.id == id => Some(Arc::clone(active)),
            _ => self.get(id).cloned(),
        }
    }

    pub fn target(&self, id: SceneId) -> PatchTarget {
        if self.is_active(id) {
            PatchTarget::Active
        } else if self.get(id).is_some() {
            PatchTarget::Background
        } else {
            PatchTarget::Missing
        }
    }

    /// Swap in a patched scene under its own id.
    pub fn replace(&mut self, scene: Scene) -> PatchTarget {
        match self.target(scene.id) {
            PatchTarget::Active => {
                self.active = Some(Arc::new(scene));
                PatchTarget::Active
            }
            PatchTarget::Background => {
                let id = scene.id;
                if let Some(slot) = self.scenes.iter_mut().find(|s| s.id == id) {
                    *slot = Arc::new(scene);
                }
                PatchTarget::Background
            }
            PatchTarget::Missing => PatchTarget::Missing,
        }
    }

    /// Copy-on-write edit of the active working copy. Returns false when
    /// nothing is active.
    pub fn update_active(&mut self, f: impl FnOnce(&mut Scene)) -> bool {
        match &self.active {
            Some(active) => {
                let mut next = Scene::clone(active);
                f(&mut next);
                self.active = Some(Arc::new(next));
                true
            }
            None => false,
        }
    }

    /// Make the committed copy of `id` the active working copy.
    pub fn activate(&mut self, id: SceneId) -> Option<Arc<Scene>> {
        let scene = self.get(id).cloned()?;
        self.active = Some(Arc::clone(&scene));
        Some(scene)
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// Record `scene` as saved: it replaces (or joins) the known list and, when
    /// it is the active scene, the working copy too.
    pub fn commit(&mut self, scene: Scene) {
        let scene = Arc::new(scene);
        match self.scenes.iter_mut().find(|s| s.id == scene.id) {
            Some(slot) => *slot = Arc::clone(&scene),
            None => self.scenes.push(Arc::clone(&scene)),
        }
        if self.is_active(scene.id) {
            self.active = Some(scene);
        }
    }

    /// Record `scene` as saved without touching the active working copy.
    /// Used when edits landed while the save was in flight.
    pub fn record_saved(&mut self, scene: Scene) {
        let scene = Arc::new(scene);
        match self.scenes.iter_mut().find(|s| s.id == scene.id) {
            Some(slot) => *slot = scene,
            None => self.scenes.push(scene),
        }
    }

    pub fn insert(&mut self, scene: Scene) {
        self.commit(scene);
    }

    pub fn remove(&mut self, id: SceneId) -> bool {
        if self.is_active(id) {
            self.active = None;
        }
        let before = self.scenes.len();
        self.scenes.retain(|s| s.id != id);
        self.scenes.len() != before
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            active: self.active.as_deref().cloned(),
            scenes: self.scenes.iter().map(|s| Scene::clone(s)).collect(),
        }
    }
}
