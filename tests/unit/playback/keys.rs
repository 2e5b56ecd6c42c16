use super::*;

fn two_scene_timeline() -> Timeline {
    let mut tl = Timeline::with_default_content();
    let t = tl.tracks()[0].id;
    tl.add_scene(t).unwrap();
    tl
}

fn seek_target(cmd: Option<Command>) -> i64 {
    match cmd {
        Some(Command::Seek { time }) => time,
        other => panic!("expected seek, got {other:?}"),
    }
}

#[test]
fn text_focus_swallows_keys() {
    let tl = two_scene_timeline();
    let p = Playback::new(11_000);
    let mut ev = KeyEvent::new(Key::Space);
    ev.focus_in_text_input = true;
    assert_eq!(map_key(&ev, &tl, &p), None);
}

#[test]
fn plain_keys() {
    let tl = two_scene_timeline();
    let p = Playback::new(11_000);
    assert_eq!(
        map_key(&KeyEvent::new(Key::Space), &tl, &p),
        Some(Command::TogglePlayback)
    );
    assert_eq!(
        map_key(&KeyEvent::new(Key::ArrowLeft), &tl, &p),
        Some(Command::Step { delta: -1_000 })
    );
    assert_eq!(
        map_key(&KeyEvent::new(Key::ArrowRight), &tl, &p),
        Some(Command::Step { delta: 1_000 })
    );
    assert_eq!(map_key(&KeyEvent::new(Key::Other), &tl, &p), None);
}

#[test]
fn shift_right_skips_boundary_under_playhead() {
    let tl = two_scene_timeline();
    let mut p = Playback::new(11_000);
    p.seek_to(4_950);
    let ev = KeyEvent::new(Key::ArrowRight).with_shift();
    assert_eq!(seek_target(map_key(&ev, &tl, &p)), 10_000);
    p.seek_to(10_000);
    assert_eq!(seek_target(map_key(&ev, &tl, &p)), 11_000);
}

#[test]
fn shift_left_jumps_to_previous_start() {
    let tl = two_scene_timeline();
    let mut p = Playback::new(11_000);
    let ev = KeyEvent::new(Key::ArrowLeft).with_shift();
    p.seek_to(7_000);
    assert_eq!(seek_target(map_key(&ev, &tl, &p)), 5_000);
    p.seek_to(5_050);
    assert_eq!(seek_target(map_key(&ev, &tl, &p)), 0);
    p.seek_to(0);
    assert_eq!(seek_target(map_key(&ev, &tl, &p)), 0);
}

#[test]
fn key_events_decode_from_json() {
    let ev: KeyEvent = serde_json::from_str(r#"{"key":"ArrowLeft","shift":true}"#).unwrap();
    assert_eq!(ev, KeyEvent::new(Key::ArrowLeft).with_shift());
    let ev: KeyEvent = serde_json::from_str(r#"{"key":"KeyQ"}"#).unwrap();
    assert_eq!(ev.key, Key::Other);
}
