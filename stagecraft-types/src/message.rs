//! Window message set.
//!
//! Every message that crosses a window boundary is one of these variants.
//! Serialized as `{"kind": "<kebab-name>", "payload": {...}}`.
//!
//! | kind               | direction | payload                                  | idempotent |
//! |--------------------|-----------|------------------------------------------|------------|
//! | `stage-saved`      | inbound   | `scene_id`, `stage`, `positions`         | yes        |
//! | `position-added`   | inbound   | `scene_id`, `position`                   | no         |
//! | `position-removed` | inbound   | `scene_id`, `index`                      | no         |
//! | `position-changed` | both      | `scene_id`, `origin`, `index`, `info`    | yes        |
//! | `project-replace`  | outbound  | `scenes` (scene id → scene)              | yes        |
//! | `open-editor`      | outbound  | `scene`, `stage` (or null for a new one) | yes        |
//! | `open-editor-from` | outbound  | `scene`, `stage` (template to clone)     | yes        |
//!
//! A project is only replaced from a persistence snapshot, so windows may
//! not send `project-replace`.
//!
//! Replaying `position-added` twice yields two distinct positions: each
//! message is one discrete edit, not a state to converge to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Position, Scene, SceneId, Stage, StageId};

/// Full project map: scene id → scene.
pub type ProjectSnapshot = BTreeMap<SceneId, Scene>;

/// Which editor produced a position edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditOrigin {
    /// The scene-level position panel that lives next to the canvas.
    SceneEditor,
    /// A stage editor window working on the given stage.
    StageEditor(StageId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum WindowMessage {
    StageSaved {
        scene_id: SceneId,
        stage: Stage,
        positions: Vec<Position>,
    },
    PositionAdded {
        scene_id: SceneId,
        position: Position,
    },
    PositionRemoved {
        scene_id: SceneId,
        index: usize,
    },
    PositionChanged {
        scene_id: SceneId,
        origin: EditOrigin,
        index: usize,
        info: serde_json::Value,
    },
    ProjectReplace {
        scenes: ProjectSnapshot,
    },
    OpenEditor {
        scene: Scene,
        stage: Option<Stage>,
    },
    OpenEditorFrom {
        scene: Scene,
        stage: Stage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    StageSaved,
    PositionAdded,
    PositionRemoved,
    PositionChanged,
    ProjectReplace,
    OpenEditor,
    OpenEditorFrom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    /// Editor windows → scene editor.
    Inbound,
    /// Scene editor → editor windows.
    Outbound,
    Both,
}

impl MessageKind {
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::StageSaved => "stage-saved",
            MessageKind::PositionAdded => "position-added",
            MessageKind::PositionRemoved => "position-removed",
            MessageKind::PositionChanged => "position-changed",
            MessageKind::ProjectReplace => "project-replace",
            MessageKind::OpenEditor => "open-editor",
            MessageKind::OpenEditorFrom => "open-editor-from",
        }
    }

    pub fn direction(self) -> MessageDirection {
        match self {
            MessageKind::StageSaved
            | MessageKind::PositionAdded
            | MessageKind::PositionRemoved => MessageDirection::Inbound,
            MessageKind::PositionChanged => MessageDirection::Both,
            MessageKind::ProjectReplace | MessageKind::OpenEditor | MessageKind::OpenEditorFrom => {
                MessageDirection::Outbound
            }
        }
    }

    /// Whether applying the same message twice leaves the same state as applying it once.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, MessageKind::PositionAdded | MessageKind::PositionRemoved)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl WindowMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            WindowMessage::StageSaved { .. } => MessageKind::StageSaved,
            WindowMessage::PositionAdded { .. } => MessageKind::PositionAdded,
            WindowMessage::PositionRemoved { .. } => MessageKind::PositionRemoved,
            WindowMessage::PositionChanged { .. } => MessageKind::PositionChanged,
            WindowMessage::ProjectReplace { .. } => MessageKind::ProjectReplace,
            WindowMessage::OpenEditor { .. } => MessageKind::OpenEditor,
            WindowMessage::OpenEditorFrom { .. } => MessageKind::OpenEditorFrom,
        }
    }

    /// Scene this message targets, if it targets exactly one.
    pub fn scene_id(&self) -> Option<SceneId> {
        match self {
            WindowMessage::StageSaved { scene_id, .. }
            | WindowMessage::PositionAdded { scene_id, .. }
            | WindowMessage::PositionRemoved { scene_id, .. }
            | WindowMessage::PositionChanged { scene_id, .. } => Some(*scene_id),
            WindowMessage::OpenEditor { scene, .. } | WindowMessage::OpenEditorFrom { scene, .. } => {
                Some(scene.id)
            }
            WindowMessage::ProjectReplace { .. } => None,
        }
    }
}
