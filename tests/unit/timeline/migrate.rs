use super::*;
use serde_json::json;

#[test]
fn flat_track_becomes_single_scene() {
    let mut state = json!({
        "tracks": [{
            "id": 1,
            "name": "Intro",
            "zIndex": 0,
            "renderTarget": "main",
            "enabled": true,
            "code": "ctx.fillRect(0,0,10,10);",
            "startTime": 200,
            "endTime": 900
        }],
        "duration": 10000
    });
    assert_eq!(migrate_state(&mut state), 1);
    let track = &state["tracks"][0];
    assert!(track.get("code").is_none());
    assert!(track.get("startTime").is_none());
    let scene = &track["scenes"][0];
    assert_eq!(scene["name"], "Intro Scene");
    assert_eq!(scene["startTime"], 200);
    assert_eq!(scene["endTime"], 900);
    assert_eq!(scene["code"], "ctx.fillRect(0,0,10,10);");
    assert_eq!(scene["visible"], true);
    assert_eq!(scene["hasError"], false);
}

#[test]
fn synthesized_ids_avoid_existing_scenes() {
    let mut tracks = vec![
        json!({"id": 1, "name": "a", "scenes": [{"id": 9, "name": "s", "startTime": 0, "endTime": 10}]}),
        json!({"id": 2, "name": "b", "code": "", "startTime": 0, "endTime": 10}),
    ];
    migrate_tracks(&mut tracks);
    assert_eq!(tracks[1]["scenes"][0]["id"], 10);
}

#[test]
fn missing_visible_defaults_true() {
    let mut state = json!({"tracks": [{"id": 1, "name": "a", "scenes": [
        {"id": 1, "name": "s", "startTime": 0, "endTime": 10},
        {"id": 2, "name": "h", "startTime": 0, "endTime": 10, "visible": false}
    ]}]});
    assert_eq!(migrate_state(&mut state), 0);
    assert_eq!(state["tracks"][0]["scenes"][0]["visible"], true);
    assert_eq!(state["tracks"][0]["scenes"][1]["visible"], false);
}

#[test]
fn migration_is_idempotent() {
    let mut state = json!({"tracks": [
        {"id": 1, "name": "Old", "code": "let a = 1;", "startTime": 0, "endTime": 3000},
        {"id": 2, "name": "New", "scenes": [{"id": 4, "name": "s", "startTime": 0, "endTime": 10}]},
        {"id": 3, "name": "Empty"}
    ]});
    migrate_state(&mut state);
    let once = state.clone();
    assert_eq!(migrate_state(&mut state), 0);
    assert_eq!(state, once);
    assert!(state["tracks"][2].get("scenes").is_none());
}

#[test]
fn non_object_inputs_are_ignored() {
    let mut state = json!([1, 2, 3]);
    assert_eq!(migrate_state(&mut state), 0);
    let mut state = json!({"tracks": [null, 4]});
    assert_eq!(migrate_state(&mut state), 0);
}
