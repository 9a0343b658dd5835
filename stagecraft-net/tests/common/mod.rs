#![allow(dead_code)]
//! Test harness utilities for stagecraft-net integration tests.

use std::time::{Duration, Instant};

use stagecraft_net::protocol::WindowId;
use stagecraft_net::WindowHost;
use stagecraft_types::{Position, SceneId, WindowMessage};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn bind_host() -> (WindowHost, String) {
    let host = WindowHost::bind("127.0.0.1:0").expect("bind");
    let addr = host.local_addr().expect("local addr").to_string();
    (host, addr)
}

/// Drive the host (accept + poll) until `expected` windows completed Hello.
/// Messages polled along the way are returned.
pub fn drive_until_windows(
    host: &mut WindowHost,
    expected: usize,
    timeout: Duration,
) -> Vec<(WindowId, WindowMessage)> {
    let start = Instant::now();
    let mut seen = Vec::new();
    while start.elapsed() < timeout {
        host.accept_connections();
        seen.extend(host.poll_messages());
        if host.window_count() >= expected {
            return seen;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!(
        "Timed out waiting for {} windows (have {})",
        expected,
        host.window_count()
    );
}

/// Drive the host until at least `count` window messages arrived.
pub fn drive_until_messages(
    host: &mut WindowHost,
    count: usize,
    timeout: Duration,
) -> Vec<(WindowId, WindowMessage)> {
    let start = Instant::now();
    let mut seen = Vec::new();
    while start.elapsed() < timeout {
        host.accept_connections();
        seen.extend(host.poll_messages());
        if seen.len() >= count {
            return seen;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("Timed out waiting for {} messages (have {})", count, seen.len());
}

/// Drive the host until the window count drops to `expected`.
pub fn drive_until_window_count(host: &mut WindowHost, expected: usize, timeout: Duration) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        host.accept_connections();
        host.poll_messages();
        if host.window_count() == expected {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("Timed out waiting for window count {} (have {})", expected, host.window_count());
}

pub fn position_added(scene_id: SceneId) -> WindowMessage {
    WindowMessage::PositionAdded {
        scene_id,
        position: Position::new(serde_json::json!({"race": "Human"})),
    }
}
