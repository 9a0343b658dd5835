use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use stagecraft_types::{Scene, SceneId, Stage, StageId};

use super::{IoFeedback, Persistence, Project, ProjectError};

/// JSON project file backing the scene editor.
///
/// The in-memory `Project` is the source of truth for this process; every
/// save or delete writes the whole project on a worker thread. A save whose
/// write fails is rolled back in memory before the next operation, so a
/// later write never persists a scene that was reported as failed.
pub struct ProjectFile {
    path: PathBuf,
    project: Project,
    io_tx: Sender<IoFeedback>,
    write_seq: u64,
    writes: Arc<Mutex<WriteState>>,
}

#[derive(Default)]
struct WriteState {
    /// Sequence number of the newest project written to disk.
    last_written: u64,
    rollbacks: Vec<Rollback>,
}

/// Undo record for a save whose write failed.
struct Rollback {
    failed: Scene,
    previous: Option<Scene>,
}

impl ProjectFile {
    /// Load and migrate an existing project.
    pub fn open(path: impl Into<PathBuf>, io_tx: Sender<IoFeedback>) -> Result<Self, ProjectError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        let project = Project::from_json(&text)?;
        log::info!(target: "persistence", "loaded {} scene(s) from {}", project.scenes.len(), path.display());
        Ok(Self::from_parts(path, project, io_tx))
    }

    /// Start an empty project and write it out immediately.
    pub fn create(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        io_tx: Sender<IoFeedback>,
    ) -> Result<Self, ProjectError> {
        let path = path.into();
        let project = Project::new(name);
        write_atomic(&path, &project)?;
        Ok(Self::from_parts(path, project, io_tx))
    }

    /// Open `path` if it exists, otherwise create it.
    pub fn open_or_create(path: impl Into<PathBuf>, io_tx: Sender<IoFeedback>) -> Result<Self, ProjectError> {
        let path = path.into();
        if path.exists() {
            Self::open(path, io_tx)
        } else {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string();
            Self::create(path, name, io_tx)
        }
    }

    fn from_parts(path: PathBuf, project: Project, io_tx: Sender<IoFeedback>) -> Self {
        Self {
            path,
            project,
            io_tx,
            write_seq: 0,
            writes: Arc::new(Mutex::new(WriteState::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.project.scene(id)
    }

    pub fn find_stage(&self, id: StageId) -> Option<(&Scene, &Stage)> {
        self.project.find_stage(id)
    }

    /// Put back what failed saves replaced, unless the scene changed again
    /// since.
    fn apply_rollbacks(&mut self) {
        let rollbacks = {
            let mut state = self.writes.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::take(&mut state.rollbacks)
        };
        for Rollback { failed, previous } in rollbacks {
            if self.project.scenes.get(&failed.id) != Some(&failed) {
                continue;
            }
            log::warn!(target: "persistence", "rolling back unsaved scene {}", failed.id);
            match previous {
                Some(previous) => {
                    self.project.scenes.insert(previous.id, previous);
                }
                None => {
                    self.project.scenes.remove(&failed.id);
                }
            }
        }
    }

    /// Writes may finish out of order; one that lost the race to a newer
    /// write is skipped instead of clobbering it.
    fn write_in_background(
        &mut self,
        rollback: Option<Rollback>,
        on_done: impl FnOnce(Result<(), String>) + Send + 'static,
    ) {
        self.write_seq += 1;
        let seq = self.write_seq;
        let writes = Arc::clone(&self.writes);
        let path = self.path.clone();
        let project = self.project.clone();
        std::thread::spawn(move || {
            let mut state = writes.lock().unwrap_or_else(|p| p.into_inner());
            let res = if seq > state.last_written {
                let res = write_atomic(&path, &project).map_err(|e| e.to_string());
                if res.is_ok() {
                    state.last_written = seq;
                }
                res
            } else {
                Ok(())
            };
            if res.is_err() {
                state.rollbacks.extend(rollback);
            }
            drop(state);
            if let Err(e) = &res {
                log::error!(target: "persistence", "failed to write {}: {}", path.display(), e);
            }
            on_done(res);
        });
    }
}

impl Persistence for ProjectFile {
    fn save(&mut self, id: u64, scene: Scene) {
        self.apply_rollbacks();
        let scene_id = scene.id;
        let previous = self.project.scenes.insert(scene_id, scene.clone());
        let rollback = Rollback { failed: scene.clone(), previous };
        let tx = self.io_tx.clone();
        self.write_in_background(Some(rollback), move |res| {
            let _ = tx.send(IoFeedback::SaveComplete {
                id,
                scene_id,
                result: res.map(|_| scene),
            });
        });
    }

    fn create_blank(&mut self) -> Scene {
        self.apply_rollbacks();
        let scene = Scene::blank();
        self.project.scenes.insert(scene.id, scene.clone());
        scene
    }

    fn delete(&mut self, id: SceneId) {
        self.apply_rollbacks();
        if self.project.scenes.remove(&id).is_none() {
            log::warn!(target: "persistence", "delete: unknown scene {}", id);
            return;
        }
        self.write_in_background(None, |_| {});
    }

    fn request_snapshot(&mut self) {
        self.apply_rollbacks();
        let _ = self.io_tx.send(IoFeedback::Snapshot(self.project.scenes.clone()));
    }
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
fn write_atomic(path: &Path, project: &Project) -> Result<(), ProjectError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = project.to_json()?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
