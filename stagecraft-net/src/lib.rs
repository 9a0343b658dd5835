//! Window transport for stagecraft.
//!
//! The scene editor hosts a `WindowHost`; each stage editor window connects
//! with an `EditorLink`. Both sides exchange `WindowMessage`s wrapped in
//! length-prefixed JSON frames.

pub mod framing;
pub mod host;
pub mod link;
pub mod protocol;

pub use host::WindowHost;
pub use link::EditorLink;
pub use protocol::{ClientFrame, HostFrame, WindowId, WindowRole};
