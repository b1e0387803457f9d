//! Property tests for scene graph edits and their undo history.

use dentiscope_core::{CommandHistory, SceneEdit, SceneGraph, Vec3};
use proptest::prelude::*;

fn node_ids() -> Vec<String> {
    SceneGraph::dental()
        .preorder()
        .map(|n| n.id().to_string())
        .collect()
}

fn edit_strategy() -> impl Strategy<Value = SceneEdit> {
    let ids = node_ids();
    let id = prop::sample::select(ids);
    prop_oneof![
        id.clone().prop_map(SceneEdit::ToggleVisibility),
        (id.clone(), 0.0f32..1.0, 0.0f32..1.0, 0.0f32..1.0)
            .prop_map(|(id, r, g, b)| SceneEdit::SetColor(id, Vec3::new(r, g, b))),
        (id.clone(), -1.0f32..2.0).prop_map(|(id, o)| SceneEdit::SetOpacity(id, o)),
        id.prop_map(SceneEdit::ToggleExpand),
    ]
}

proptest! {
    #[test]
    fn toggle_visibility_touches_one_node(index in 0usize..19) {
        let scene = SceneGraph::dental();
        let target = node_ids()[index].clone();
        let next = scene.toggle_visibility(&target).expect("known id");

        for (before, after) in scene.preorder().zip(next.preorder()) {
            if before.id() == target {
                prop_assert_eq!(before.visible, !after.visible);
                prop_assert_eq!(before.color, after.color);
                prop_assert_eq!(before.opacity.to_bits(), after.opacity.to_bits());
                prop_assert_eq!(before.expanded, after.expanded);
            } else {
                prop_assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn undo_redo_restores_exact_states(edits in prop::collection::vec(edit_strategy(), 1..20)) {
        let mut history = CommandHistory::new();
        let mut scene = SceneGraph::dental();
        let initial = scene.clone();

        for edit in &edits {
            history.commit(&mut scene, |s| s.apply(edit)).expect("known id");
        }
        let last = scene.clone();

        for _ in 0..edits.len() {
            prop_assert!(history.undo(&mut scene));
        }
        prop_assert_eq!(&scene, &initial);

        for _ in 0..edits.len() {
            prop_assert!(history.redo(&mut scene));
        }
        prop_assert_eq!(&scene, &last);
    }

    #[test]
    fn opacity_always_in_unit_range(value in -10.0f32..10.0) {
        let scene = SceneGraph::dental().set_opacity("sinus", value).expect("known id");
        let opacity = scene.find("sinus").expect("present").opacity;
        prop_assert!((0.0..=1.0).contains(&opacity));
    }
}

#[test]
fn sinus_toggle_leaves_mandible_visible() {
    let scene = SceneGraph::dental();
    let next = scene.toggle_visibility("sinus").expect("known id");
    assert!(!next.find("sinus").expect("present").visible);
    assert!(next.find("mandible").expect("present").visible);
}
