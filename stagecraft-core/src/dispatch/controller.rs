//! Sync controller: the single mediator between the canvas and the store.
//!
//! ```text
//!            user edit                 save ack (same generation)
//!   Idle ─────────────────▶ Dirty ─────────────────────────────▶ Idle
//!    │  ▲                     │
//!    │  └── rebuild done ──┐  │ activate (after confirm)
//!    └── activate ──▶ BulkRebuilding ◀┘
//! ```

use std::collections::BTreeMap;

use stagecraft_types::{
    DispatchResult, FocusField, GraphLayoutEntry, PendingConfirm, ProjectSnapshot, SaveOutcome,
    Scene, SceneId, StatusLevel,
};

use crate::canvas::{Canvas, CanvasEvent};
use crate::config::CanvasSettings;
use crate::persistence::{IoFeedback, Persistence};
use crate::state::{SceneStore, SyncMode};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSave {
    id: u64,
    scene_id: SceneId,
    /// `edit_generation` at the time the save was issued.
    generation: u64,
}

pub struct SyncController {
    pub(crate) store: SceneStore,
    pub(crate) canvas: Canvas,
    mode: SyncMode,
    pending_confirm: Option<PendingConfirm>,
    pending_save: Option<PendingSave>,
    next_request_id: u64,
    edit_generation: u64,
}

impl SyncController {
    pub fn new(settings: CanvasSettings) -> Self {
        Self::with_canvas(Canvas::new(settings))
    }

    pub fn with_canvas(canvas: Canvas) -> Self {
        Self {
            store: SceneStore::new(),
            canvas,
            mode: SyncMode::Idle,
            pending_confirm: None,
            pending_save: None,
            next_request_id: 0,
            edit_generation: 0,
        }
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.mode.is_dirty()
    }

    pub fn pending_confirm(&self) -> Option<&PendingConfirm> {
        self.pending_confirm.as_ref()
    }

    pub fn save_in_flight(&self) -> bool {
        self.pending_save.is_some()
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.store.active().map(|s| s.as_ref())
    }

    // --- dirty tracking ---

    /// Mark the active scene as having unsaved edits.
    pub(crate) fn mark_dirty(&mut self) {
        if self.store.active().is_none() || self.mode == SyncMode::BulkRebuilding {
            return;
        }
        self.edit_generation += 1;
        if self.mode != SyncMode::Dirty {
            log::debug!(target: "sync", "scene marked dirty");
        }
        self.mode = SyncMode::Dirty;
    }

    /// Drain canvas events. Outside a rebuild, structural events are user
    /// edits and start changes are mirrored into `root`.
    pub(crate) fn pump_canvas_events(&mut self) {
        let events = self.canvas.drain_events();
        if self.mode == SyncMode::BulkRebuilding {
            return;
        }
        for event in events {
            match event {
                CanvasEvent::StartChanged(start) => {
                    self.store.update_active(|scene| scene.root = start);
                }
                CanvasEvent::Restored => self.relabel_nodes(),
                _ => {}
            }
            if event.is_structural() {
                self.mark_dirty();
            }
        }
    }

    /// Labels are not undoable; re-read them for nodes an undo brought back.
    fn relabel_nodes(&mut self) {
        let Some(active) = self.store.active().cloned() else {
            return;
        };
        for id in self.canvas.node_ids() {
            if self.canvas.label(id).is_none() {
                if let Some(stage) = active.stage(id) {
                    let _ = self.canvas.set_label(id, stage.label());
                }
            }
        }
    }

    // --- activation ---

    /// Switch the canvas to scene `id`. Gated behind a confirmation while dirty.
    pub fn request_activate(&mut self, id: SceneId) -> DispatchResult {
        if self.store.get(id).is_none() {
            log::warn!(target: "sync", "activate: unknown scene {}", id);
            return DispatchResult::with_status(StatusLevel::Warning, "Scene not found");
        }
        if self.is_dirty() {
            return self.defer(PendingConfirm::DiscardAndActivate(id));
        }
        self.activate(id);
        DispatchResult::none()
    }

    /// Discard the working copy and rebuild the canvas from the committed scene.
    pub(crate) fn activate(&mut self, id: SceneId) {
        let Some(scene) = self.store.activate(id) else {
            log::warn!(target: "sync", "activate: unknown scene {}", id);
            return;
        };
        self.rebuild_canvas(&scene);
        log::info!(target: "sync", "activated scene {} ({} stages)", id, scene.stages.len());
    }

    fn rebuild_canvas(&mut self, scene: &Scene) {
        self.mode = SyncMode::BulkRebuilding;
        self.canvas.clear();

        // stored coordinates first so auto-placed stages avoid them
        let (placed, unplaced): (Vec<_>, Vec<_>) =
            scene.stages.iter().partition(|s| scene.graph.contains_key(&s.id));
        for stage in placed.into_iter().chain(unplaced) {
            let at = scene.graph.get(&stage.id).map(|e| (e.x, e.y));
            if let Err(e) = self.canvas.add_node(stage.id, at) {
                log::warn!(target: "sync", "rebuild: {}", e);
                continue;
            }
            let _ = self.canvas.set_label(stage.id, stage.label());
        }

        if let Some(root) = scene.root {
            if self.canvas.set_start(Some(root)).is_err() {
                log::warn!(target: "sync", "rebuild: root {} is not a stage of scene {}", root, scene.id);
                self.store.update_active(|s| s.root = None);
            }
        }

        for (source, entry) in &scene.graph {
            for target in &entry.dest {
                if let Err(e) = self.canvas.add_edge(*source, *target) {
                    log::warn!(target: "sync", "rebuild: skipping edge: {}", e);
                }
            }
        }

        self.canvas.clear_history();
        self.canvas.center_content();
        self.pump_canvas_events();
        self.mode = SyncMode::Idle;
    }

    /// Empty the canvas without it counting as an edit.
    fn reset_canvas(&mut self) {
        self.mode = SyncMode::BulkRebuilding;
        self.canvas.clear();
        self.canvas.clear_history();
        self.canvas.center_content();
        self.pump_canvas_events();
        self.mode = SyncMode::Idle;
    }

    /// Replace every known scene and select the first one, if any.
    pub fn apply_project_snapshot(&mut self, scenes: ProjectSnapshot) -> DispatchResult {
        let count = scenes.len();
        self.store.replace_all(scenes);
        self.mode = SyncMode::Idle;
        self.pending_confirm = None;
        self.pending_save = None;
        match self.store.first_id() {
            Some(first) => self.activate(first),
            None => self.reset_canvas(),
        }
        log::info!(target: "sync", "project replaced with {} scene(s)", count);
        DispatchResult::none()
    }

    // --- scene lifecycle ---

    pub fn new_scene(&mut self, persistence: &mut dyn Persistence) -> DispatchResult {
        if self.is_dirty() {
            return self.defer(PendingConfirm::DiscardAndCreate);
        }
        self.create_scene(persistence)
    }

    fn create_scene(&mut self, persistence: &mut dyn Persistence) -> DispatchResult {
        let scene = persistence.create_blank();
        let id = scene.id;
        self.store.insert(scene);
        self.mode = SyncMode::Idle;
        self.activate(id);
        let mut result = DispatchResult::none();
        result.focus = Some(FocusField::SceneName);
        result
    }

    pub fn request_delete(&mut self, id: SceneId) -> DispatchResult {
        if self.store.get(id).is_none() {
            log::warn!(target: "sync", "delete: unknown scene {}", id);
            return DispatchResult::with_status(StatusLevel::Warning, "Scene not found");
        }
        self.defer(PendingConfirm::DeleteScene(id))
    }

    fn delete_scene(&mut self, id: SceneId, persistence: &mut dyn Persistence) -> DispatchResult {
        let was_active = self.store.is_active(id);
        if !self.store.remove(id) {
            log::warn!(target: "sync", "delete: unknown scene {}", id);
            return DispatchResult::none();
        }
        persistence.delete(id);
        if self.pending_save.map(|p| p.scene_id) == Some(id) {
            self.pending_save = None;
        }
        if was_active {
            self.mode = SyncMode::Idle;
            match self.store.first_id() {
                Some(first) => self.activate(first),
                None => self.reset_canvas(),
            }
        }
        DispatchResult::with_status(StatusLevel::Info, "Scene deleted")
    }

    // --- confirmation gate ---

    pub(crate) fn defer(&mut self, pending: PendingConfirm) -> DispatchResult {
        log::debug!(target: "sync", "awaiting confirmation: {:?}", pending);
        self.pending_confirm = Some(pending.clone());
        DispatchResult::with_confirm(pending)
    }

    pub fn confirm(&mut self, persistence: &mut dyn Persistence) -> DispatchResult {
        let Some(pending) = self.pending_confirm.take() else {
            return DispatchResult::none();
        };
        match pending {
            PendingConfirm::DiscardAndActivate(id) => {
                self.mode = SyncMode::Idle;
                self.activate(id);
                DispatchResult::none()
            }
            PendingConfirm::DiscardAndCreate => {
                self.mode = SyncMode::Idle;
                self.create_scene(persistence)
            }
            PendingConfirm::DeleteScene(id) => self.delete_scene(id, persistence),
            PendingConfirm::ClearCanvas => {
                self.canvas.clear();
                self.pump_canvas_events();
                DispatchResult::none()
            }
        }
    }

    /// Drop the pending mutation. Nothing else changes.
    pub fn decline(&mut self) -> DispatchResult {
        self.pending_confirm = None;
        DispatchResult::none()
    }

    // --- save ---

    /// The active scene as it would be saved: store data for every stage on
    /// the canvas, plus layout, edges and start taken from the canvas.
    pub fn serialize_active(&self) -> Option<Scene> {
        let active = self.store.active()?;
        let snapshot = self.canvas.snapshot();
        let mut scene = Scene::clone(active);

        scene.stages.retain(|s| snapshot.node(s.id).is_some());
        scene.graph = snapshot
            .nodes
            .iter()
            .filter(|n| active.contains_stage(n.id))
            .map(|n| {
                let dest = snapshot
                    .successors(n.id)
                    .into_iter()
                    .filter(|d| active.contains_stage(*d))
                    .collect();
                (n.id, GraphLayoutEntry { x: n.x, y: n.y, dest })
            })
            .collect::<BTreeMap<_, _>>();
        scene.root = snapshot.start.filter(|id| scene.contains_stage(*id));
        Some(scene)
    }

    pub fn save(&mut self, persistence: &mut dyn Persistence) -> DispatchResult {
        let mut result = DispatchResult::none();
        if !self.is_dirty() {
            result.save = Some(SaveOutcome::Clean);
            return result;
        }
        let Some(mut scene) = self.serialize_active() else {
            result.save = Some(SaveOutcome::Clean);
            return result;
        };

        let report = validation::evaluate(&scene, &self.canvas.snapshot());
        if report.is_blocked() {
            for error in &report.blocking {
                result.push_status(StatusLevel::Error, error.to_string());
            }
            result.focus = Some(FocusField::SceneName);
            result.save = Some(SaveOutcome::Blocked);
            log::info!(target: "sync", "save of scene {} blocked", scene.id);
            return result;
        }
        for warning in &report.warnings {
            result.push_status(StatusLevel::Warning, warning.to_string());
        }
        // position edits may already have flagged the scene
        scene.has_warnings |= report.has_warnings();

        self.next_request_id += 1;
        let id = self.next_request_id;
        self.pending_save = Some(PendingSave {
            id,
            scene_id: scene.id,
            generation: self.edit_generation,
        });
        log::debug!(target: "sync", "save #{} of scene {}", id, scene.id);
        persistence.save(id, scene);

        result.push_status(StatusLevel::Info, "Saving...");
        result.save = Some(SaveOutcome::Pending(id));
        result
    }

    /// Apply a completion notice from the persistence collaborator.
    pub fn handle_io_feedback(&mut self, feedback: IoFeedback) -> DispatchResult {
        match feedback {
            IoFeedback::SaveComplete { id, scene_id, result } => {
                let pending = match self.pending_save {
                    Some(p) if p.id == id && p.scene_id == scene_id => p,
                    _ => {
                        log::debug!(target: "sync", "ignoring stale save ack #{}", id);
                        return DispatchResult::none();
                    }
                };
                self.pending_save = None;
                match result {
                    Ok(saved) => {
                        let untouched = pending.generation == self.edit_generation;
                        if self.store.is_active(scene_id) && untouched {
                            self.store.commit(saved);
                            self.mode = SyncMode::Idle;
                        } else {
                            self.store.record_saved(saved);
                        }
                        log::info!(target: "sync", "scene {} saved", scene_id);
                        DispatchResult::with_status(StatusLevel::Info, "Saved")
                    }
                    Err(e) => {
                        log::error!(target: "sync", "save of scene {} failed: {}", scene_id, e);
                        DispatchResult::with_status(StatusLevel::Error, format!("Save failed: {}", e))
                    }
                }
            }
            IoFeedback::Snapshot(scenes) => self.apply_project_snapshot(scenes),
        }
    }
}
