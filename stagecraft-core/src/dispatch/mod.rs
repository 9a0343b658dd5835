mod bridge;
mod controller;
pub mod local;

pub use bridge::apply_window_message;
pub use controller::SyncController;

use stagecraft_types::reduce;
use stagecraft_types::{
    DispatchResult, EditOrigin, PendingConfirm, Position, SceneAction, StatusLevel, WindowMessage,
};

use crate::canvas::CanvasError;
use crate::persistence::Persistence;

/// Dispatch a user intent. Returns the side effects for the UI and transport
/// layers: outbound window messages, status lines, focus and confirmation
/// requests.
pub fn dispatch_action(
    action: &SceneAction,
    controller: &mut SyncController,
    persistence: &mut dyn Persistence,
) -> DispatchResult {
    match action {
        SceneAction::Activate(id) => controller.request_activate(*id),
        SceneAction::NewScene => controller.new_scene(persistence),
        SceneAction::DeleteScene(id) => controller.request_delete(*id),
        SceneAction::RequestSnapshot => {
            persistence.request_snapshot();
            DispatchResult::none()
        }
        SceneAction::Save => controller.save(persistence),
        SceneAction::Confirm => controller.confirm(persistence),
        SceneAction::Decline => controller.decline(),

        SceneAction::Rename(name) => edit_fields(controller, |s| s.name = name.clone()),
        SceneAction::SetTags(tags) => edit_fields(controller, |s| s.tags = tags.clone()),
        SceneAction::SetPrivate(private) => edit_fields(controller, |s| s.private = *private),
        SceneAction::SetFurniture(furniture) => {
            edit_fields(controller, |s| s.furniture = furniture.clone())
        }

        SceneAction::NewStage => open_stage_editor(controller, None, false),
        SceneAction::EditStage(id) => open_stage_editor(controller, Some(*id), false),
        SceneAction::CloneStage(id) => open_stage_editor(controller, Some(*id), true),

        SceneAction::MarkStart(id) => {
            let res = controller.canvas.set_start(Some(*id));
            canvas_result(controller, res)
        }
        SceneAction::RemoveStage(id) => {
            let res = controller.canvas.remove_node(*id);
            canvas_result(controller, res)
        }
        SceneAction::Connect(from, to) => {
            let res = controller.canvas.add_edge(*from, *to);
            canvas_result(controller, res)
        }
        SceneAction::Disconnect(from, to) => {
            let res = controller.canvas.remove_edge(*from, *to);
            canvas_result(controller, res)
        }
        SceneAction::MoveStage { id, x, y } => {
            let res = controller.canvas.move_node(*id, *x, *y);
            canvas_result(controller, res)
        }
        SceneAction::ClearCanvas => {
            if controller.canvas.is_empty() {
                DispatchResult::none()
            } else {
                controller.defer(PendingConfirm::ClearCanvas)
            }
        }
        SceneAction::Undo => {
            if controller.canvas.undo() {
                controller.pump_canvas_events();
            }
            DispatchResult::none()
        }
        SceneAction::Redo => {
            if controller.canvas.redo() {
                controller.pump_canvas_events();
            }
            DispatchResult::none()
        }

        SceneAction::ZoomTo(zoom) => {
            controller.canvas.zoom_to(*zoom);
            DispatchResult::none()
        }
        SceneAction::ZoomToFit => {
            controller.canvas.zoom_to_fit();
            DispatchResult::none()
        }
        SceneAction::CenterContent => {
            controller.canvas.center_content();
            DispatchResult::none()
        }
        SceneAction::PanBy { dx, dy } => {
            controller.canvas.pan_by(*dx, *dy);
            DispatchResult::none()
        }
        SceneAction::TogglePanLock => {
            let locked = controller.canvas.toggle_pan_lock();
            DispatchResult::with_status(
                StatusLevel::Info,
                if locked { "Pan locked" } else { "Pan unlocked" },
            )
        }

        SceneAction::AddPosition(info) => add_position(controller, info),
        SceneAction::RemovePosition(index) => remove_position(controller, *index),
        SceneAction::EditPosition { index, info } => edit_position(controller, *index, info),
    }
}

fn no_active_scene() -> DispatchResult {
    DispatchResult::with_status(StatusLevel::Warning, "No scene selected")
}

fn edit_fields(
    controller: &mut SyncController,
    edit: impl FnOnce(&mut stagecraft_types::Scene),
) -> DispatchResult {
    if !controller.store.update_active(edit) {
        return no_active_scene();
    }
    controller.mark_dirty();
    DispatchResult::none()
}

fn canvas_result(controller: &mut SyncController, res: Result<(), CanvasError>) -> DispatchResult {
    controller.pump_canvas_events();
    match res {
        Ok(()) => DispatchResult::none(),
        Err(e) => {
            log::warn!(target: "canvas", "{}", e);
            DispatchResult::with_status(StatusLevel::Warning, e.to_string())
        }
    }
}

/// Ask the stage editor window to open. `clone` hands it a copy of the stage
/// under fresh ids so saving it creates a new stage.
fn open_stage_editor(
    controller: &mut SyncController,
    stage_id: Option<stagecraft_types::StageId>,
    clone: bool,
) -> DispatchResult {
    let Some(active) = controller.store.active() else {
        return no_active_scene();
    };
    let scene = stagecraft_types::Scene::clone(active);
    let stage = match stage_id {
        None => None,
        Some(id) => match scene.stage(id) {
            Some(stage) => Some(stage.clone()),
            None => {
                log::warn!(target: "sync", "open editor: unknown stage {}", id);
                return DispatchResult::with_status(StatusLevel::Warning, "Stage not found");
            }
        },
    };
    let msg = match (stage, clone) {
        (Some(stage), true) => WindowMessage::OpenEditorFrom { stage: stage.duplicate(), scene },
        (stage, _) => WindowMessage::OpenEditor { scene, stage },
    };
    DispatchResult::with_outbound(msg)
}

fn add_position(controller: &mut SyncController, info: &serde_json::Value) -> DispatchResult {
    let Some(active) = controller.store.active() else {
        return no_active_scene();
    };
    let next = reduce::add_position(active, &Position::new(info.clone()));
    controller.store.replace(next);
    controller.mark_dirty();
    DispatchResult::none()
}

fn remove_position(controller: &mut SyncController, index: usize) -> DispatchResult {
    let Some(active) = controller.store.active() else {
        return no_active_scene();
    };
    match reduce::remove_position(active, index) {
        Ok(patched) => {
            for stage in &patched.skipped {
                log::warn!(target: "sync", "remove position: stage {} has no index {}", stage, index);
            }
            controller.store.replace(patched.scene);
            controller.mark_dirty();
            DispatchResult::none()
        }
        Err(miss) => {
            log::warn!(target: "sync", "remove position: {}", miss);
            DispatchResult::none()
        }
    }
}

/// Scene-level edit, echoed to stage editors as a `position-changed`.
fn edit_position(
    controller: &mut SyncController,
    index: usize,
    info: &serde_json::Value,
) -> DispatchResult {
    let Some(active) = controller.store.active() else {
        return no_active_scene();
    };
    let scene_id = active.id;
    match reduce::change_position(active, index, info) {
        Ok(next) => {
            controller.store.replace(next);
            controller.mark_dirty();
            DispatchResult::with_outbound(WindowMessage::PositionChanged {
                scene_id,
                origin: EditOrigin::SceneEditor,
                index,
                info: info.clone(),
            })
        }
        Err(miss) => {
            log::warn!(target: "sync", "edit position: {}", miss);
            DispatchResult::none()
        }
    }
}
