mod common;

use common::*;
use stagecraft_net::{EditorLink, WindowRole};
use stagecraft_types::{Scene, SceneId, WindowMessage};

fn connect(host: &mut stagecraft_net::WindowHost, addr: &str, name: &str, role: WindowRole) -> EditorLink {
    let expected = host.window_count() + 1;
    let addr = addr.to_string();
    let name = name.to_string();
    let handle = std::thread::spawn(move || EditorLink::connect(&addr, &name, role));
    drive_until_windows(host, expected, TIMEOUT);
    handle.join().unwrap().unwrap()
}

#[test]
fn window_messages_reach_the_host_in_order() {
    let (mut host, addr) = bind_host();
    let mut link = connect(&mut host, &addr, "editor", WindowRole::StageEditor);

    let scene_id = SceneId::new();
    link.send(position_added(scene_id)).unwrap();
    link.send(WindowMessage::PositionRemoved { scene_id, index: 0 }).unwrap();

    let got = drive_until_messages(&mut host, 2, TIMEOUT);
    assert_eq!(got[0].0, link.window_id());
    assert!(matches!(got[0].1, WindowMessage::PositionAdded { .. }));
    assert!(matches!(got[1].1, WindowMessage::PositionRemoved { index: 0, .. }));
}

#[test]
fn relay_skips_the_sender() {
    let (mut host, addr) = bind_host();
    let mut a = connect(&mut host, &addr, "a", WindowRole::StageEditor);
    let mut b = connect(&mut host, &addr, "b", WindowRole::StageEditor);

    let msg = position_added(SceneId::new());
    a.send(msg.clone()).unwrap();
    let got = drive_until_messages(&mut host, 1, TIMEOUT);
    host.relay(got[0].0, &got[0].1);

    assert_eq!(b.recv_timeout(TIMEOUT), Some(msg));
    assert_eq!(a.recv_timeout(std::time::Duration::from_millis(100)), None);
}

#[test]
fn broadcast_and_send_to() {
    let (mut host, addr) = bind_host();
    let mut a = connect(&mut host, &addr, "a", WindowRole::StageEditor);
    let mut b = connect(&mut host, &addr, "b", WindowRole::Observer);

    let scene = Scene::blank();
    let open = WindowMessage::OpenEditor { scene, stage: None };
    host.send_to(a.window_id(), &open).unwrap();
    assert_eq!(a.recv_timeout(TIMEOUT), Some(open));

    let removed = WindowMessage::PositionRemoved { scene_id: SceneId::new(), index: 3 };
    host.broadcast(&removed);
    assert_eq!(a.recv_timeout(TIMEOUT), Some(removed.clone()));
    assert_eq!(b.recv_timeout(TIMEOUT), Some(removed));

    assert!(host.send_to(stagecraft_net::WindowId(999), &position_added(SceneId::new())).is_err());
}

#[test]
fn outbound_only_kinds_and_observers_are_refused() {
    let (mut host, addr) = bind_host();
    let mut editor = connect(&mut host, &addr, "editor", WindowRole::StageEditor);
    let mut observer = connect(&mut host, &addr, "observer", WindowRole::Observer);

    editor
        .send(WindowMessage::OpenEditor { scene: Scene::blank(), stage: None })
        .unwrap();
    observer.send(position_added(SceneId::new())).unwrap();
    // a valid message afterwards proves the refused ones were consumed
    editor.send(position_added(SceneId::new())).unwrap();

    let mut got = drive_until_messages(&mut host, 1, TIMEOUT);
    // the observer's socket is read independently; give it time to land
    for _ in 0..40 {
        got.extend(host.poll_messages());
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].0, editor.window_id());

    assert_eq!(editor.recv_timeout(std::time::Duration::from_millis(500)), None);
    assert!(editor.take_error().is_some());
    assert_eq!(observer.recv_timeout(std::time::Duration::from_millis(500)), None);
    assert!(observer.take_error().is_some());
}

#[test]
fn shutdown_is_seen_by_links() {
    let (mut host, addr) = bind_host();
    let mut link = connect(&mut host, &addr, "editor", WindowRole::StageEditor);
    host.broadcast_shutdown();
    assert_eq!(link.recv_timeout(std::time::Duration::from_millis(500)), None);
    assert!(link.host_shutdown());
}

#[test]
fn windows_cannot_replace_the_project() {
    let (mut host, addr) = bind_host();
    let mut a = connect(&mut host, &addr, "a", WindowRole::StageEditor);
    let mut b = connect(&mut host, &addr, "b", WindowRole::StageEditor);

    let scene = Scene::blank();
    a.send(WindowMessage::ProjectReplace {
        scenes: [(scene.id, scene)].into_iter().collect(),
    })
    .unwrap();
    a.send(position_added(SceneId::new())).unwrap();

    let got = drive_until_messages(&mut host, 1, TIMEOUT);
    assert_eq!(got.len(), 1);
    assert!(matches!(got[0].1, WindowMessage::PositionAdded { .. }));

    assert_eq!(a.recv_timeout(std::time::Duration::from_millis(500)), None);
    assert!(a.take_error().unwrap().contains("project-replace"));
    assert_eq!(b.recv_timeout(std::time::Duration::from_millis(200)), None);
}
