use crate::{Position, Scene, Stage, StageId};

use super::PatchMiss;

/// Insert `stage`, or replace the stage with the same id in place, and adopt
/// the editor's scene-level `positions`.
///
/// The whole patch is refused if it would break index-parallel position
/// lists. The first stage of a scene without a root becomes the root.
pub fn upsert_stage(scene: &Scene, stage: &Stage, positions: &[Position]) -> Result<Scene, PatchMiss> {
    if stage.positions.len() != positions.len() {
        return Err(PatchMiss::PositionCountMismatch {
            stage: stage.id,
            expected: positions.len(),
            got: stage.positions.len(),
        });
    }
    if let Some(sibling) = scene
        .stages
        .iter()
        .find(|s| s.id != stage.id && s.positions.len() != positions.len())
    {
        return Err(PatchMiss::PositionCountMismatch {
            stage: sibling.id,
            expected: positions.len(),
            got: sibling.positions.len(),
        });
    }

    let mut next = scene.clone();
    next.positions = positions.to_vec();
    match next.stages.iter_mut().find(|s| s.id == stage.id) {
        Some(existing) => *existing = stage.clone(),
        None => next.stages.push(stage.clone()),
    }
    if next.root.is_none() && next.stages.len() == 1 {
        next.root = Some(stage.id);
    }
    Ok(next)
}

/// Point `root` at `id`, or clear it with `None`.
pub fn set_root(scene: &Scene, id: Option<StageId>) -> Result<Scene, PatchMiss> {
    if let Some(id) = id {
        if !scene.contains_stage(id) {
            return Err(PatchMiss::UnknownStage(id));
        }
    }
    let mut next = scene.clone();
    next.root = id;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_stage_becomes_root() {
        let scene = Scene::blank();
        let stage = Stage::new(&scene);
        let next = upsert_stage(&scene, &stage, &[]).unwrap();
        assert_eq!(next.root, Some(stage.id));
        assert_eq!(next.stages.len(), 1);
    }

    #[test]
    fn existing_stage_is_replaced_in_place() {
        let scene = Scene::blank();
        let a = Stage::new(&scene);
        let b = Stage::new(&scene);
        let scene = upsert_stage(&scene, &a, &[]).unwrap();
        let scene = upsert_stage(&scene, &b, &[]).unwrap();

        let mut renamed = a.clone();
        renamed.name = "Kiss".into();
        let next = upsert_stage(&scene, &renamed, &[]).unwrap();
        assert_eq!(next.stages.len(), 2);
        assert_eq!(next.stages[0].name, "Kiss");
        assert_eq!(next.root, Some(a.id));
    }

    #[test]
    fn adopts_editor_positions() {
        let scene = Scene::blank();
        let mut stage = Stage::new(&scene);
        stage.positions.push(Position::placeholder());
        let positions = vec![Position::new(json!({"race": "Human"}))];
        let next = upsert_stage(&scene, &stage, &positions).unwrap();
        assert_eq!(next.positions, positions);
        assert!(next.positions_aligned());
    }

    #[test]
    fn mismatched_lengths_reject_the_whole_patch() {
        let scene = Scene::blank();
        let stage = Stage::new(&scene);
        let scene = upsert_stage(&scene, &stage, &[]).unwrap();

        let mut other = Stage::new(&scene);
        other.positions.push(Position::placeholder());
        let err = upsert_stage(&scene, &other, &[Position::placeholder()]).unwrap_err();
        assert_eq!(
            err,
            PatchMiss::PositionCountMismatch { stage: stage.id, expected: 1, got: 0 }
        );

        let bad = Stage::new(&scene);
        assert!(upsert_stage(&scene, &bad, &[Position::placeholder()]).is_err());
    }

    #[test]
    fn root_must_name_a_stage() {
        let scene = Scene::blank();
        let stray = StageId::new();
        assert_eq!(set_root(&scene, Some(stray)), Err(PatchMiss::UnknownStage(stray)));
        assert_eq!(set_root(&scene, None).unwrap().root, None);
    }
}
