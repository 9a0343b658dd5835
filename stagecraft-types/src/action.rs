//! Action types for the dispatch system.
//!
//! Actions represent user intents on the scene editor (canvas, scene fields,
//! bottom position panel, toolbar). Messages from other windows are
//! `WindowMessage`s and go through the bridge instead.

use serde::{Deserialize, Serialize};

use crate::{Furniture, SceneId, StageId, WindowMessage};

/// User intents handled by the sync controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneAction {
    // Scene list
    Activate(SceneId),
    NewScene,
    DeleteScene(SceneId),
    RequestSnapshot,
    Save,

    // Confirmation gate
    Confirm,
    Decline,

    // Scene fields
    Rename(String),
    SetTags(Vec<String>),
    SetPrivate(bool),
    SetFurniture(Furniture),

    // Stage editor round trips
    NewStage,
    EditStage(StageId),
    CloneStage(StageId),

    // Canvas structure
    MarkStart(StageId),
    RemoveStage(StageId),
    Connect(StageId, StageId),
    Disconnect(StageId, StageId),
    MoveStage { id: StageId, x: f64, y: f64 },
    ClearCanvas,
    Undo,
    Redo,

    // Viewport
    ZoomTo(f64),
    ZoomToFit,
    CenterContent,
    PanBy { dx: f64, dy: f64 },
    TogglePanLock,

    // Scene-level position panel
    AddPosition(serde_json::Value),
    RemovePosition(usize),
    EditPosition { index: usize, info: serde_json::Value },
}

/// A mutation deferred behind an explicit confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingConfirm {
    /// Drop unsaved edits and activate another scene.
    DiscardAndActivate(SceneId),
    /// Drop unsaved edits and create a blank scene.
    DiscardAndCreate,
    DeleteScene(SceneId),
    ClearCanvas,
}

impl PendingConfirm {
    pub fn prompt(&self) -> &'static str {
        match self {
            PendingConfirm::DiscardAndActivate(_) | PendingConfirm::DiscardAndCreate => {
                "Discard unsaved changes?"
            }
            PendingConfirm::DeleteScene(_) => "Delete this scene? This cannot be undone.",
            PendingConfirm::ClearCanvas => "Remove every stage from the canvas?",
        }
    }
}

/// Form fields the UI may be asked to focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusField {
    SceneName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub level: StatusLevel,
    pub message: String,
}

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOutcome {
    /// Nothing to save; no persistence call was made.
    Clean,
    /// A blocking validation error aborted the save.
    Blocked,
    /// Handed to the persistence collaborator; completion arrives as feedback.
    Pending(u64),
}

/// Side effects of a dispatched action or message for the UI/transport layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    /// Messages to send to editor windows.
    pub outbound: Vec<WindowMessage>,
    pub status: Vec<StatusEvent>,
    pub focus: Option<FocusField>,
    /// Set when the action was deferred behind a confirmation.
    pub confirm: Option<PendingConfirm>,
    pub save: Option<SaveOutcome>,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_outbound(msg: WindowMessage) -> Self {
        Self { outbound: vec![msg], ..Self::default() }
    }

    pub fn with_confirm(pending: PendingConfirm) -> Self {
        Self { confirm: Some(pending), ..Self::default() }
    }

    pub fn with_status(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            status: vec![StatusEvent { level, message: message.into() }],
            ..Self::default()
        }
    }

    pub fn push_outbound(&mut self, msg: WindowMessage) {
        self.outbound.push(msg);
    }

    pub fn push_status(&mut self, level: StatusLevel, message: impl Into<String>) {
        self.status.push(StatusEvent { level, message: message.into() });
    }

    pub fn merge(&mut self, other: DispatchResult) {
        self.outbound.extend(other.outbound);
        self.status.extend(other.status);
        if other.focus.is_some() {
            self.focus = other.focus;
        }
        if other.confirm.is_some() {
            self.confirm = other.confirm;
        }
        if other.save.is_some() {
            self.save = other.save;
        }
    }
}
