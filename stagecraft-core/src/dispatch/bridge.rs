//! Inbound window messages → store and canvas updates.
//!
//! Each scene-targeted message lands on the active working copy when its
//! scene is active, otherwise on the matching background scene. Unknown
//! scene ids and out-of-range indices are logged and dropped.

use stagecraft_types::reduce::{self, PatchMiss};
use stagecraft_types::{
    DispatchResult, EditOrigin, Position, Scene, SceneId, Stage, WindowMessage,
};

use crate::state::PatchTarget;

use super::SyncController;

pub fn apply_window_message(msg: &WindowMessage, controller: &mut SyncController) -> DispatchResult {
    match msg {
        WindowMessage::StageSaved { scene_id, stage, positions } => {
            stage_saved(*scene_id, stage, positions, controller)
        }
        WindowMessage::PositionAdded { scene_id, position } => {
            position_added(*scene_id, position, controller)
        }
        WindowMessage::PositionRemoved { scene_id, index } => {
            position_removed(*scene_id, *index, controller)
        }
        WindowMessage::PositionChanged { scene_id, origin, index, info } => {
            position_changed(*scene_id, *origin, *index, info, controller)
        }
        WindowMessage::ProjectReplace { scenes } => controller.apply_project_snapshot(scenes.clone()),
        WindowMessage::OpenEditor { .. } | WindowMessage::OpenEditorFrom { .. } => {
            log::warn!(target: "bridge", "ignoring outbound-only message {}", msg.kind());
            DispatchResult::none()
        }
    }
}

/// Build the patched scene with `patch` and swap it in. Returns where it landed.
fn patch_scene(
    scene_id: SceneId,
    kind: &str,
    controller: &mut SyncController,
    patch: impl FnOnce(&Scene) -> Result<Scene, PatchMiss>,
) -> PatchTarget {
    let Some(current) = controller.store.current(scene_id) else {
        log::warn!(target: "bridge", "{}: unknown scene {}", kind, scene_id);
        return PatchTarget::Missing;
    };
    match patch(&current) {
        Ok(next) => controller.store.replace(next),
        Err(miss) => {
            log::warn!(target: "bridge", "{}: scene {}: {}", kind, scene_id, miss);
            PatchTarget::Missing
        }
    }
}

fn stage_saved(
    scene_id: SceneId,
    stage: &Stage,
    positions: &[Position],
    controller: &mut SyncController,
) -> DispatchResult {
    // only the first stage the scene ever gets is promoted to start, even if
    // earlier stages were since taken off the canvas
    let first_stage = controller
        .store
        .current(scene_id)
        .is_some_and(|scene| scene.stages.is_empty());
    let target = patch_scene(scene_id, "stage-saved", controller, |scene| {
        reduce::upsert_stage(scene, stage, positions)
    });
    if target != PatchTarget::Active {
        return DispatchResult::none();
    }

    if !controller.canvas.contains(stage.id) {
        if let Err(e) = controller.canvas.add_node(stage.id, None) {
            log::warn!(target: "bridge", "stage-saved: {}", e);
        }
    }
    if first_stage {
        let root = controller.store.active().and_then(|scene| scene.root);
        if let Err(e) = controller.canvas.set_start(root) {
            log::warn!(target: "bridge", "stage-saved: {}", e);
        }
    }
    let _ = controller.canvas.set_label(stage.id, stage.label());
    controller.pump_canvas_events();
    controller.mark_dirty();
    DispatchResult::none()
}

fn position_added(scene_id: SceneId, position: &Position, controller: &mut SyncController) -> DispatchResult {
    let target = patch_scene(scene_id, "position-added", controller, |scene| {
        Ok(reduce::add_position(scene, position))
    });
    if target == PatchTarget::Active {
        controller.mark_dirty();
    }
    DispatchResult::none()
}

fn position_removed(scene_id: SceneId, index: usize, controller: &mut SyncController) -> DispatchResult {
    let target = patch_scene(scene_id, "position-removed", controller, |scene| {
        let patched = reduce::remove_position(scene, index)?;
        for stage in &patched.skipped {
            log::warn!(target: "bridge", "position-removed: stage {} has no index {}", stage, index);
        }
        Ok(patched.scene)
    });
    if target == PatchTarget::Active {
        controller.mark_dirty();
    }
    DispatchResult::none()
}

fn position_changed(
    scene_id: SceneId,
    origin: EditOrigin,
    index: usize,
    info: &serde_json::Value,
    controller: &mut SyncController,
) -> DispatchResult {
    if origin == EditOrigin::SceneEditor {
        log::debug!(target: "bridge", "position-changed: dropping echo of own edit");
        return DispatchResult::none();
    }
    if !controller.store.is_active(scene_id) {
        log::debug!(target: "bridge", "position-changed: scene {} is not active", scene_id);
        return DispatchResult::none();
    }
    let target = patch_scene(scene_id, "position-changed", controller, |scene| {
        reduce::change_position(scene, index, info)
    });
    if target == PatchTarget::Active {
        controller.mark_dirty();
    }
    DispatchResult::none()
}
