//! Dispatch abstraction for local and remote execution.

use crate::{DispatchResult, SceneAction};

/// Trait for dispatching user intents to the sync engine.
///
/// The local implementation mutates in-process state directly; a remote one
/// would forward the action to the window owning the engine.
pub trait Dispatcher {
    fn dispatch(&mut self, action: &SceneAction) -> DispatchResult;
}
