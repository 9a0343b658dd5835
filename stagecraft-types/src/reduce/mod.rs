//! Pure copy-on-write patches for the scene model.
//!
//! Every function takes the current `&Scene` and builds a new one; the caller
//! swaps the result in whole. A patch either fully applies, or returns a
//! `PatchMiss` and leaves nothing half-written.
//!
//! Reducers do NOT:
//! - touch the canvas
//! - mark anything dirty
//! - log (callers decide how loud a miss is)

mod positions;
mod stages;

pub use positions::{add_position, change_position, remove_position};
pub use stages::{set_root, upsert_stage};

use crate::StageId;

/// A patch result that may have skipped individual stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Patched {
    pub scene: crate::Scene,
    /// Stages left untouched because they could not take the patch.
    pub skipped: Vec<StageId>,
}

/// Why a patch could not be applied at all.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchMiss {
    IndexOutOfRange { index: usize, len: usize },
    UnknownStage(StageId),
    /// A stage's position list would stop being index-parallel with the scene's.
    PositionCountMismatch {
        stage: StageId,
        expected: usize,
        got: usize,
    },
}

impl std::fmt::Display for PatchMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchMiss::IndexOutOfRange { index, len } => {
                write!(f, "position index {} out of range (len {})", index, len)
            }
            PatchMiss::UnknownStage(id) => write!(f, "unknown stage {}", id),
            PatchMiss::PositionCountMismatch { stage, expected, got } => write!(
                f,
                "stage {} has {} positions, expected {}",
                stage, got, expected
            ),
        }
    }
}

impl std::error::Error for PatchMiss {}
