//! # stagecraft-core
//!
//! Scene/canvas synchronization engine.
//!
//! ## Usage
//!
//! ```ignore
//! use stagecraft_core::dispatch::{apply_window_message, dispatch_action, SyncController};
//! use stagecraft_core::persistence::{IoFeedback, ProjectFile};
//!
//! // 1. Load config and build the controller
//! let config = stagecraft_core::config::Config::load();
//! let mut controller = SyncController::new(config.canvas_settings());
//!
//! // 2. Open the project; IoFeedback arrives on io_rx
//! let (io_tx, io_rx) = crossbeam_channel::unbounded::<IoFeedback>();
//! let mut project = ProjectFile::open_or_create("scenes.json", io_tx)?;
//!
//! // 3. Feed user intents and window messages
//! let result = dispatch_action(&action, &mut controller, &mut project);
//! let result = apply_window_message(&msg, &mut controller);
//!
//! // 4. Drain save acknowledgements and snapshots
//! while let Ok(feedback) = io_rx.try_recv() {
//!     controller.handle_io_feedback(feedback);
//! }
//! ```

pub mod canvas;
pub mod config;
pub mod dispatch;
pub mod message_log;
pub mod persistence;
pub mod state;
pub mod validation;

pub use stagecraft_types as types;
