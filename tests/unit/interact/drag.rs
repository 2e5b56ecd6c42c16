use super::*;
use crate::timeline::model::SceneField;

#[test]
fn negative_start_pins_span_at_zero() {
    assert_eq!(drag_span(100, 5_100, -200.0), (0, 5_000));
    assert_eq!(drag_span(100, 300, -10_000.0), (0, 200));
}

#[test]
fn times_snap_to_grid() {
    assert_eq!(drag_span(1_000, 2_000, 149.0), (1_100, 2_100));
    assert_eq!(drag_span(1_000, 2_000, 151.0), (1_200, 2_200));
}

#[test]
fn end_keeps_minimum_length() {
    let (s, e) = drag_span(0, 40, 0.0);
    assert_eq!((s, e), (0, 100));
    let (s, e) = drag_span(1_000, 1_030, 20.0);
    assert_eq!((s, e), (1_000, 1_100));
}

fn setup() -> (Timeline, TrackId, TrackId, SceneId) {
    let mut tl = Timeline::with_default_content();
    let a = tl.tracks()[0].id;
    let b = tl.add_track();
    let s = tl.tracks()[0].scenes[0].id;
    tl.update_scene(a, s, &[SceneField::EndTime(5_100), SceneField::StartTime(100)])
        .unwrap();
    (tl, a, b, s)
}

#[test]
fn drag_left_past_zero_preserves_span() {
    let (mut tl, a, _, s) = setup();
    let g = TimelineGeometry::default();
    let mut drag = begin_drag(&tl, a, s, 50.0).unwrap();
    update_drag(&mut tl, &g, &mut drag, 30.0, 40.0);
    let scene = tl.scene(a, s).unwrap();
    assert_eq!((scene.start_time, scene.end_time), (0, 5_000));
    assert!(!end_drag(&mut tl, drag));
    assert_eq!(tl.selection().scene, Some(s));
}

#[test]
fn drag_to_other_row_moves_on_release_only() {
    let (mut tl, a, b, s) = setup();
    let g = TimelineGeometry::default();
    let mut drag = begin_drag(&tl, a, s, 100.0).unwrap();
    update_drag(&mut tl, &g, &mut drag, 200.0, 70.0);
    assert_eq!(drag.target_track, b);
    assert!(tl.scene(a, s).is_some());
    update_drag(&mut tl, &g, &mut drag, 200.0, 500.0);
    assert_eq!(drag.target_track, b);
    assert!(end_drag(&mut tl, drag));
    let moved = tl.scene(b, s).unwrap();
    assert_eq!((moved.start_time, moved.end_time), (1_100, 6_100));
    assert_eq!(tl.selection().track, Some(b));
}

#[test]
fn cancel_restores_original_times() {
    let (mut tl, a, _, s) = setup();
    let g = TimelineGeometry::default();
    let mut drag = begin_drag(&tl, a, s, 0.0).unwrap();
    update_drag(&mut tl, &g, &mut drag, 300.0, 40.0);
    cancel_drag(&mut tl, drag);
    let scene = tl.scene(a, s).unwrap();
    assert_eq!((scene.start_time, scene.end_time), (100, 5_100));
}

#[test]
fn begin_rejects_scene_from_other_track() {
    let (tl, _, b, s) = setup();
    assert!(begin_drag(&tl, b, s, 0.0).is_none());
}

#[test]
fn ruler_drag_seeks_by_x() {
    let g = TimelineGeometry::default();
    assert_eq!(RulerDrag { pointer_x: 123.0 }.seek_time(&g), 1_230);
}
