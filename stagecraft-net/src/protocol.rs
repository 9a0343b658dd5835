//! Frames exchanged between the scene editor host and editor windows.

use serde::{Deserialize, Serialize};
use stagecraft_types::WindowMessage;

/// Host-assigned id of a connected window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowRole {
    StageEditor,
    /// Receives broadcasts, never sends window messages.
    Observer,
}

/// Window → host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientFrame {
    Hello { name: String, role: WindowRole },
    Message(WindowMessage),
    Ping,
    Goodbye,
}

/// Host → window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostFrame {
    Welcome { window_id: WindowId },
    Message(WindowMessage),
    Pong,
    Error { message: String },
    Shutdown,
}
