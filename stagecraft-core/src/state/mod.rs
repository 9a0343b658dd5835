mod store;

pub use store::{PatchTarget, SceneStore, StoreSnapshot};

/// Sync state of the scene editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Canvas and store agree with the last saved or loaded scene.
    #[default]
    Idle,
    /// Programmatic canvas reconstruction in progress. Canvas events raised
    /// in this mode are not user edits.
    BulkRebuilding,
    /// Unsaved edits exist on the active scene.
    Dirty,
}

impl SyncMode {
    pub fn is_dirty(self) -> bool {
        self == SyncMode::Dirty
    }
}
