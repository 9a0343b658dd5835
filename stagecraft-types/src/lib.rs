//! # stagecraft-types
//!
//! Shared type definitions for the stagecraft scene editor.
//! This crate holds the persisted scene model, the window message set, the
//! user-intent actions, and the pure copy-on-write reducers used by
//! stagecraft-core and stagecraft-net.

pub mod action;
pub mod dispatch;
pub mod message;
pub mod reduce;
pub mod scene;

pub use action::*;
pub use dispatch::Dispatcher;
pub use message::{EditOrigin, MessageDirection, MessageKind, ProjectSnapshot, WindowMessage};
pub use scene::{Furniture, GraphLayoutEntry, Position, Scene, Stage, StageExtra};

use uuid::Uuid;

/// Unique identifier for a scene.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SceneId(Uuid);

impl SceneId {
    /// Mint a fresh, never-before-seen id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
    pub fn get(self) -> Uuid {
        self.0
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a stage. Stage ids double as canvas node ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct StageId(Uuid);

impl StageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
    pub fn get(self) -> Uuid {
        self.0
    }
}

impl Default for StageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a position.
///
/// Minted on every creation and every structural replacement. Ids are never
/// reused, so a stale reference held by another window can never alias a
/// newer position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PositionId(Uuid);

impl PositionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn get(self) -> Uuid {
        self.0
    }
}

impl Default for PositionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
