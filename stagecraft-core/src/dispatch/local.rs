//! LocalDispatcher: Dispatcher implementation for in-process execution.

use stagecraft_types::{DispatchResult, Dispatcher, SceneAction};

use crate::persistence::Persistence;

use super::{dispatch_action, SyncController};

/// Dispatcher that applies actions directly to an in-process controller.
pub struct LocalDispatcher<'a> {
    pub controller: &'a mut SyncController,
    pub persistence: &'a mut dyn Persistence,
}

impl<'a> LocalDispatcher<'a> {
    pub fn new(controller: &'a mut SyncController, persistence: &'a mut dyn Persistence) -> Self {
        Self { controller, persistence }
    }
}

impl<'a> Dispatcher for LocalDispatcher<'a> {
    fn dispatch(&mut self, action: &SceneAction) -> DispatchResult {
        dispatch_action(action, self.controller, self.persistence)
    }
}
