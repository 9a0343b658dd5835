mod common;

use std::time::Duration;

use common::*;
use stagecraft_net::{EditorLink, WindowRole};

#[test]
fn hello_gets_welcome_with_distinct_ids() {
    let (mut host, addr) = bind_host();

    let a = std::thread::spawn({
        let addr = addr.clone();
        move || EditorLink::connect(&addr, "stage-editor-a", WindowRole::StageEditor)
    });
    drive_until_windows(&mut host, 1, TIMEOUT);
    let a = a.join().unwrap().unwrap();

    let b = std::thread::spawn({
        let addr = addr.clone();
        move || EditorLink::connect(&addr, "stage-editor-b", WindowRole::StageEditor)
    });
    drive_until_windows(&mut host, 2, TIMEOUT);
    let b = b.join().unwrap().unwrap();

    assert_ne!(a.window_id(), b.window_id());
    assert_eq!(host.window_name(a.window_id()), Some("stage-editor-a"));
    assert_eq!(host.window_name(b.window_id()), Some("stage-editor-b"));
}

#[test]
fn ping_is_answered() {
    let (mut host, addr) = bind_host();
    let link = std::thread::spawn(move || EditorLink::connect(&addr, "pinger", WindowRole::StageEditor));
    drive_until_windows(&mut host, 1, TIMEOUT);
    let mut link = link.join().unwrap().unwrap();

    link.ping().unwrap();
    let waiter = std::thread::spawn(move || {
        let ok = link.wait_for_pong(TIMEOUT);
        (ok, link)
    });
    let start = std::time::Instant::now();
    while !waiter.is_finished() && start.elapsed() < TIMEOUT {
        host.poll_messages();
        std::thread::sleep(Duration::from_millis(5));
    }
    let (ok, _link) = waiter.join().unwrap();
    assert!(ok);
}

#[test]
fn goodbye_and_disconnect_remove_windows() {
    let (mut host, addr) = bind_host();
    let a = std::thread::spawn({
        let addr = addr.clone();
        move || EditorLink::connect(&addr, "a", WindowRole::StageEditor)
    });
    drive_until_windows(&mut host, 1, TIMEOUT);
    let a = a.join().unwrap().unwrap();
    let b = std::thread::spawn(move || EditorLink::connect(&addr, "b", WindowRole::Observer));
    drive_until_windows(&mut host, 2, TIMEOUT);
    let b = b.join().unwrap().unwrap();

    a.goodbye().unwrap();
    drive_until_window_count(&mut host, 1, TIMEOUT);

    drop(b);
    drive_until_window_count(&mut host, 0, TIMEOUT);
}
