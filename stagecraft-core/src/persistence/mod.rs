//! Persistence collaborator seam.
//!
//! The sync controller only talks to `Persistence`. Saves are acknowledged
//! asynchronously through `IoFeedback`, drained by the host loop and handed
//! back to the controller.

mod file;
mod project;

pub use file::ProjectFile;
pub use project::{Project, CURRENT_VERSION};

use stagecraft_types::{ProjectSnapshot, Scene, SceneId};

/// Completion notices from persistence work running off the main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum IoFeedback {
    SaveComplete {
        /// Request id handed to `Persistence::save`.
        id: u64,
        scene_id: SceneId,
        result: Result<Scene, String>,
    },
    Snapshot(ProjectSnapshot),
}

pub trait Persistence {
    /// Persist `scene`. Completion arrives later as `IoFeedback::SaveComplete { id, .. }`.
    fn save(&mut self, id: u64, scene: Scene);
    /// A fresh blank scene, registered with the backing project.
    fn create_blank(&mut self) -> Scene;
    fn delete(&mut self, id: SceneId);
    /// Ask for the full project map; answered with `IoFeedback::Snapshot`.
    fn request_snapshot(&mut self);
}

#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Json(serde_json::Error),
    UnsupportedVersion(u32),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "I/O error: {}", e),
            ProjectError::Json(e) => write!(f, "invalid project JSON: {}", e),
            ProjectError::UnsupportedVersion(v) => {
                write!(f, "project version {} is newer than {}", v, CURRENT_VERSION)
            }
        }
    }
}

impl std::error::Error for ProjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectError::Io(e) => Some(e),
            ProjectError::Json(e) => Some(e),
            ProjectError::UnsupportedVersion(_) => None,
        }
    }
}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<serde_json::Error> for ProjectError {
    fn from(e: serde_json::Error) -> Self {
        ProjectError::Json(e)
    }
}
