use crate::{Position, Scene};

use super::{PatchMiss, Patched};

/// Append a freshly-identified copy of `position` to the scene list and a
/// fresh placeholder to every stage.
///
/// Not idempotent: applying twice adds two positions with distinct ids.
pub fn add_position(scene: &Scene, position: &Position) -> Scene {
    let mut next = scene.clone();
    next.positions.push(position.refreshed());
    for stage in &mut next.stages {
        stage.positions.push(Position::placeholder());
    }
    next.has_warnings = true;
    next
}

/// Remove `index` from the scene list and from every stage's parallel list.
///
/// A stage whose list is too short to hold `index` is skipped and reported.
pub fn remove_position(scene: &Scene, index: usize) -> Result<Patched, PatchMiss> {
    if index >= scene.positions.len() {
        return Err(PatchMiss::IndexOutOfRange {
            index,
            len: scene.positions.len(),
        });
    }
    let mut next = scene.clone();
    next.positions.remove(index);
    let mut skipped = Vec::new();
    for stage in &mut next.stages {
        if index < stage.positions.len() {
            stage.positions.remove(index);
        } else {
            skipped.push(stage.id);
        }
    }
    next.has_warnings = true;
    Ok(Patched { scene: next, skipped })
}

/// Replace the info payload of the scene-level position at `index`.
pub fn change_position(
    scene: &Scene,
    index: usize,
    info: &serde_json::Value,
) -> Result<Scene, PatchMiss> {
    let len = scene.positions.len();
    if index >= len {
        return Err(PatchMiss::IndexOutOfRange { index, len });
    }
    let mut next = scene.clone();
    next.positions[index].info = info.clone();
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stage;
    use serde_json::json;

    fn scene_with_stages(n: usize) -> Scene {
        let mut scene = Scene::blank();
        for _ in 0..n {
            let stage = Stage::new(&scene);
            scene.stages.push(stage);
        }
        scene
    }

    #[test]
    fn add_keeps_lists_parallel() {
        let scene = scene_with_stages(3);
        let pos = Position::new(json!({"sex": "female"}));
        let next = add_position(&scene, &pos);

        assert_eq!(next.positions.len(), 1);
        assert!(next.positions_aligned());
        assert!(next.has_warnings);
        assert_ne!(next.positions[0].id, pos.id);
        assert_eq!(next.positions[0].info, pos.info);
        // source snapshot untouched
        assert!(scene.positions.is_empty());
    }

    #[test]
    fn add_twice_mints_two_positions() {
        let scene = scene_with_stages(1);
        let pos = Position::placeholder();
        let next = add_position(&add_position(&scene, &pos), &pos);
        assert_eq!(next.positions.len(), 2);
        assert_ne!(next.positions[0].id, next.positions[1].id);
        assert_ne!(next.stages[0].positions[0].id, next.stages[0].positions[1].id);
    }

    #[test]
    fn remove_is_applied_at_the_same_index_everywhere() {
        let mut scene = scene_with_stages(2);
        for i in 0..3 {
            scene = add_position(&scene, &Position::new(json!({ "n": i })));
        }
        let keep_stage_pos = scene.stages[0].positions[2].id;

        let patched = remove_position(&scene, 1).unwrap();
        assert!(patched.skipped.is_empty());
        assert_eq!(patched.scene.positions.len(), 2);
        assert_eq!(patched.scene.positions[1].info, json!({"n": 2}));
        assert_eq!(patched.scene.stages[0].positions[1].id, keep_stage_pos);
        assert!(patched.scene.positions_aligned());
    }

    #[test]
    fn remove_out_of_range_is_a_miss() {
        let scene = scene_with_stages(1);
        assert_eq!(
            remove_position(&scene, 0),
            Err(PatchMiss::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn remove_skips_short_stage() {
        let mut scene = add_position(&scene_with_stages(2), &Position::placeholder());
        scene.stages[1].positions.clear();
        let short = scene.stages[1].id;

        let patched = remove_position(&scene, 0).unwrap();
        assert_eq!(patched.skipped, vec![short]);
        assert!(patched.scene.stages[0].positions.is_empty());
    }

    #[test]
    fn change_replaces_info_only() {
        let scene = add_position(&scene_with_stages(1), &Position::placeholder());
        let id = scene.positions[0].id;
        let next = change_position(&scene, 0, &json!({"race": "Wolf"})).unwrap();
        assert_eq!(next.positions[0].id, id);
        assert_eq!(next.positions[0].info, json!({"race": "Wolf"}));
        assert!(change_position(&scene, 5, &json!(null)).is_err());
    }
}
