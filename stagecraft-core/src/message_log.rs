//! Append-only JSONL log of inbound window messages, for debugging and replay.
//!
//! Default location: `<data_dir>/stagecraft/messages.jsonl`. Tailable with
//! `tail -f`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use stagecraft_types::{DispatchResult, WindowMessage};

use crate::dispatch::{apply_window_message, SyncController};

pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stagecraft")
        .join("messages.jsonl")
}

pub struct MessageLog {
    writer: BufWriter<File>,
    session_start: Instant,
}

#[derive(Serialize)]
struct SessionHeader {
    event: &'static str,
    epoch_ms: u128,
    pid: u32,
}

#[derive(Serialize)]
struct LogEntry<'a> {
    t_ms: u128,
    window: &'a str,
    message: &'a WindowMessage,
    outbound: usize,
    status: Vec<&'a str>,
}

#[derive(Deserialize)]
struct ReplayEntry {
    message: Option<WindowMessage>,
}

impl MessageLog {
    pub fn open(path: &Path) -> Option<Self> {
        if let Some(dir) = path.parent() {
            if std::fs::create_dir_all(dir).is_err() {
                return None;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
        let mut writer = BufWriter::new(file);

        let header = SessionHeader {
            event: "session_start",
            epoch_ms: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
            pid: std::process::id(),
        };
        if let Ok(json) = serde_json::to_string(&header) {
            let _ = writeln!(writer, "{}", json);
            let _ = writer.flush();
        }

        Some(Self {
            writer,
            session_start: Instant::now(),
        })
    }

    /// Record a message from `window` and what handling it produced.
    pub fn record(&mut self, window: &str, message: &WindowMessage, result: &DispatchResult) {
        let entry = LogEntry {
            t_ms: self.session_start.elapsed().as_millis(),
            window,
            message,
            outbound: result.outbound.len(),
            status: result.status.iter().map(|s| s.message.as_str()).collect(),
        };
        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = writeln!(self.writer, "{}", json);
            let _ = self.writer.flush();
        }
    }
}

#[derive(Debug)]
pub enum ReplayError {
    Io(std::io::Error),
}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Re-apply every logged message to `controller`, in order. Session headers
/// and unparseable lines are skipped. Returns the number of messages applied.
pub fn replay_message_log(path: &Path, controller: &mut SyncController) -> Result<usize, ReplayError> {
    let file = File::open(path)?;
    let mut applied = 0;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ReplayEntry = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(_) => continue,
        };
        if let Some(message) = entry.message {
            apply_window_message(&message, controller);
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasSettings;
    use stagecraft_types::{Position, Scene};

    #[test]
    fn recorded_messages_replay_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("messages.jsonl");

        let scene = Scene::blank();
        let replace = WindowMessage::ProjectReplace {
            scenes: [(scene.id, scene.clone())].into_iter().collect(),
        };
        let added = WindowMessage::PositionAdded {
            scene_id: scene.id,
            position: Position::placeholder(),
        };
        {
            let mut log = MessageLog::open(&path).unwrap();
            log.record("stage-editor", &replace, &DispatchResult::none());
            log.record("stage-editor", &added, &DispatchResult::none());
        }

        let mut controller = SyncController::new(CanvasSettings::default());
        let applied = replay_message_log(&path, &mut controller).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(controller.active_scene().unwrap().positions.len(), 1);
        assert!(controller.is_dirty());
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(
            &path,
            "not json\n\n{\"event\":\"session_start\",\"epoch_ms\":1,\"pid\":2}\n",
        )
        .unwrap();
        let mut controller = SyncController::new(CanvasSettings::default());
        assert_eq!(replay_message_log(&path, &mut controller).unwrap(), 0);
    }

    #[test]
    fn missing_log_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = SyncController::new(CanvasSettings::default());
        let err = replay_message_log(&dir.path().join("none.jsonl"), &mut controller).unwrap_err();
        assert!(matches!(err, ReplayError::Io(_)));
    }
}
