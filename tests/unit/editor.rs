use std::time::Duration;

use super::*;
use crate::persist::store::{MemoryStore, NoDocuments};
use crate::playback::keys::Key;

fn loaded(timeline: Timeline) -> LoadedState {
    let mut l = LoadedState::synthesized();
    l.timeline = timeline;
    l.canvas = Canvas::new(16, 16).unwrap();
    l
}

fn editor_with(timeline: Timeline) -> Editor<MemoryStore> {
    Editor::from_loaded(loaded(timeline), MemoryStore::new(), EditorOpts::default()).unwrap()
}

fn editor() -> Editor<MemoryStore> {
    editor_with(Timeline::with_default_content())
}

fn first_ids(ed: &Editor<MemoryStore>) -> (TrackId, SceneId) {
    let t = &ed.timeline().tracks()[0];
    (t.id, t.scenes[0].id)
}

#[test]
fn add_track_then_scene_starts_at_zero() {
    let mut ed = editor_with(Timeline::new());
    let now = Instant::now();
    assert!(ed.dispatch(Command::AddTrack, now).unwrap());
    let track = ed.timeline().tracks()[0].id;
    assert!(ed.dispatch(Command::AddScene { track }, now).unwrap());
    assert!(ed.dispatch(Command::AddScene { track }, now).unwrap());
    let scenes = &ed.timeline().tracks()[0].scenes;
    assert_eq!((scenes[0].start_time, scenes[0].end_time), (0, 5_000));
    assert_eq!((scenes[1].start_time, scenes[1].end_time), (5_000, 10_000));
    assert_eq!(ed.playback().duration(), 11_000);
    assert_eq!(ed.persister().store().writes(), 3);
}

#[test]
fn unknown_ids_are_quiet_no_ops() {
    let mut ed = editor();
    let now = Instant::now();
    assert!(!ed.dispatch(Command::AddScene { track: TrackId(99) }, now).unwrap());
    assert!(
        !ed.dispatch(
            Command::DeleteScene {
                track: TrackId(1),
                scene: SceneId(99)
            },
            now
        )
        .unwrap()
    );
    assert!(!ed.dispatch(Command::EndDrag, now).unwrap());
    assert_eq!(ed.persister().store().writes(), 0);
}

#[test]
fn invalid_scene_edits_are_rejected_whole() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    let err = ed.dispatch(
        Command::UpdateSceneField {
            track,
            scene,
            field: SceneField::EndTime(0),
        },
        Instant::now(),
    );
    assert!(err.is_err());
    assert_eq!(ed.timeline().scene(track, scene).unwrap().end_time, 5_000);
}

#[test]
fn code_edits_compile_immediately_and_save_later() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    ed.dispatch(Command::SelectScene { track, scene }, Instant::now())
        .unwrap();
    let t0 = Instant::now();
    ed.dispatch(
        Command::UpdateSceneField {
            track,
            scene,
            field: SceneField::Code("ctx.fillRect(0,0,w,h".to_owned()),
        },
        t0,
    )
    .unwrap();
    assert!(ed.timeline().scene(track, scene).unwrap().has_error);
    let console = ed.console_for_selection().unwrap();
    assert!(console.syntax_error.is_some());
    assert!(console.lines()[0].starts_with("Syntax error: "));

    assert_eq!(ed.persister().store().writes(), 0);
    ed.frame(t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(ed.persister().store().writes(), 0);
    ed.frame(t0 + Duration::from_millis(600)).unwrap();
    assert_eq!(ed.persister().store().writes(), 1);

    ed.dispatch(
        Command::UpdateSceneField {
            track,
            scene,
            field: SceneField::Code("ctx.fillRect(0, 0, w, h);".to_owned()),
        },
        t0,
    )
    .unwrap();
    assert!(ed.console_for_selection().unwrap().is_clean());
    assert!(ed.flush().unwrap());
}

#[test]
fn runtime_faults_show_in_the_console_and_heal() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    let now = Instant::now();
    ed.dispatch(Command::SelectScene { track, scene }, now)
        .unwrap();
    ed.dispatch(
        Command::UpdateSceneField {
            track,
            scene,
            field: SceneField::Code(r#"if t < 1000.0 { throw "early"; }"#.to_owned()),
        },
        now,
    )
    .unwrap();
    ed.render_now().unwrap();
    let console = ed.console_for_selection().unwrap();
    assert!(console.runtime_error.unwrap().contains("early"));
    assert!(ed.last_report().unwrap().has_faults());

    ed.dispatch(Command::Seek { time: 2_000 }, now).unwrap();
    ed.render_now().unwrap();
    assert!(ed.console_for_selection().unwrap().is_clean());
}

#[test]
fn frame_renders_only_when_something_changed() {
    let mut ed = editor();
    let now = Instant::now();
    let frame = ed.frame(now).unwrap().unwrap();
    assert_eq!((frame.width, frame.height), (16, 16));
    assert!(ed.frame(now).unwrap().is_none());
    ed.dispatch(Command::Step { delta: 1_000 }, now).unwrap();
    assert!(ed.frame(now).unwrap().is_some());
}

#[test]
fn playback_advances_from_frames_and_stops_at_the_end() {
    let mut ed = editor();
    let t0 = Instant::now();
    ed.dispatch(Command::Key(KeyEvent::new(Key::Space)), t0)
        .unwrap();
    assert!(ed.playback().is_playing());
    ed.frame(t0 + Duration::from_millis(250)).unwrap();
    assert_eq!(ed.playback().current_time(), 250);
    ed.frame(t0 + Duration::from_secs(60)).unwrap();
    assert_eq!(ed.playback().current_time(), ed.playback().duration());
    assert!(!ed.playback().is_playing());
}

#[test]
fn dragging_left_past_zero_keeps_the_span() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    let now = Instant::now();
    for field in [SceneField::EndTime(5_100), SceneField::StartTime(100)] {
        ed.dispatch(Command::UpdateSceneField { track, scene, field }, now)
            .unwrap();
    }
    let writes = ed.persister().store().writes();
    // 100 px/s: -20 px is -200 ms.
    ed.dispatch(Command::BeginDrag { track, scene, x: 110.0, y: 30.0 }, now)
        .unwrap();
    ed.dispatch(Command::UpdateDrag { x: 90.0, y: 30.0 }, now)
        .unwrap();
    ed.dispatch(Command::EndDrag, now).unwrap();
    let s = ed.timeline().scene(track, scene).unwrap();
    assert_eq!((s.start_time, s.end_time), (0, 5_000));
    assert_eq!(ed.persister().store().writes(), writes + 1);
    assert_eq!(ed.selection().scene, Some(scene));
}

#[test]
fn pointer_down_picks_scene_or_ruler() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    let now = Instant::now();
    ed.dispatch(Command::AddTrack, now).unwrap();
    let other = ed.timeline().tracks()[1].id;

    // Row 0 spans y 24..64, row 1 spans 64..104.
    assert!(ed.dispatch(Command::PointerDown { x: 50.0, y: 40.0 }, now).unwrap());
    assert_eq!(ed.drag().unwrap().scene, scene);
    ed.dispatch(Command::UpdateDrag { x: 150.0, y: 80.0 }, now)
        .unwrap();
    ed.dispatch(Command::EndDrag, now).unwrap();
    assert!(ed.timeline().scene(track, scene).is_none());
    let moved = ed.timeline().scene(other, scene).unwrap();
    assert_eq!((moved.start_time, moved.end_time), (1_000, 6_000));
    assert_eq!(ed.selection().track, Some(other));

    assert!(ed.dispatch(Command::PointerDown { x: 250.0, y: 10.0 }, now).unwrap());
    assert_eq!(ed.playback().current_time(), 2_500);
    ed.dispatch(Command::UpdateRulerDrag { x: -50.0 }, now)
        .unwrap();
    assert_eq!(ed.playback().current_time(), 0);
    assert!(ed.dispatch(Command::EndRulerDrag, now).unwrap());

    assert!(!ed.dispatch(Command::PointerDown { x: 50.0, y: 300.0 }, now).unwrap());
}

#[test]
fn cancel_drag_restores_times() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    let now = Instant::now();
    ed.dispatch(Command::BeginDrag { track, scene, x: 0.0, y: 30.0 }, now)
        .unwrap();
    ed.dispatch(Command::UpdateDrag { x: 300.0, y: 30.0 }, now)
        .unwrap();
    assert_eq!(ed.timeline().scene(track, scene).unwrap().start_time, 3_000);
    ed.dispatch(Command::CancelDrag, now).unwrap();
    assert_eq!(ed.timeline().scene(track, scene).unwrap().start_time, 0);
}

#[test]
fn resize_canvas_validates() {
    let mut ed = editor();
    let now = Instant::now();
    assert!(ed.dispatch(Command::ResizeCanvas { width: 0, height: 10 }, now).is_err());
    assert_eq!(ed.canvas(), Canvas::new(16, 16).unwrap());
    assert!(ed.dispatch(Command::ResizeCanvas { width: 8, height: 4 }, now).unwrap());
    let frame = ed.render_now().unwrap();
    assert_eq!((frame.width, frame.height), (8, 4));
    assert_eq!(ed.state().canvas_width, 8);
}

#[test]
fn commands_parse_from_json() {
    let cmd: Command = serde_json::from_str(
        r#"{"type":"updateSceneField","track":1,"scene":2,"field":{"field":"code","value":"x"}}"#,
    )
    .unwrap();
    assert_eq!(
        cmd,
        Command::UpdateSceneField {
            track: TrackId(1),
            scene: SceneId(2),
            field: SceneField::Code("x".to_owned()),
        }
    );
    let key: Command =
        serde_json::from_str(r#"{"type":"key","key":"ArrowRight","shift":true}"#).unwrap();
    assert_eq!(key, Command::Key(KeyEvent::new(Key::ArrowRight).with_shift()));
    let toggle: Command = serde_json::from_str(r#"{"type":"togglePlayback"}"#).unwrap();
    assert_eq!(toggle, Command::TogglePlayback);
    let resize: Command =
        serde_json::from_str(r#"{"type":"resizeCanvas","width":4,"height":3}"#).unwrap();
    assert_eq!(resize, Command::ResizeCanvas { width: 4, height: 3 });
}

#[test]
fn load_uses_the_store() {
    let mut first = editor();
    first.dispatch(Command::AddTrack, Instant::now()).unwrap();
    let blob = first.persister().store().get("demoline-state").unwrap().unwrap();

    let mut store = MemoryStore::new();
    store.set("demoline-state", &blob).unwrap();
    let ed = Editor::load(store, &NoDocuments, EditorOpts::default()).unwrap();
    assert_eq!(ed.timeline().tracks().len(), 2);
    assert_eq!(ed.canvas(), Canvas::new(16, 16).unwrap());
}

#[test]
fn begin_drag_selects_only_a_scene_it_can_grab() {
    let mut ed = editor();
    let (track, scene) = first_ids(&ed);
    let now = Instant::now();
    let stray = TrackId(track.0 + 99);
    let grabbed = ed
        .dispatch(Command::BeginDrag { track: stray, scene, x: 0.0, y: 30.0 }, now)
        .unwrap();
    assert!(!grabbed);
    assert!(ed.drag().is_none());
    assert_eq!(ed.selection(), Selection::default());

    assert!(
        ed.dispatch(Command::BeginDrag { track, scene, x: 0.0, y: 30.0 }, now)
            .unwrap()
    );
    assert_eq!(ed.selection().track, Some(track));
    assert_eq!(ed.selection().scene, Some(scene));
}
