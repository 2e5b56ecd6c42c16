//! Rewrites older persisted shapes into the current track/scene layout.
//!
//! Works on raw [`serde_json::Value`] so it runs before typed decoding. Every rewrite is
//! idempotent: migrating current-format data leaves it byte-for-byte unchanged.

use serde_json::{Map, Value};

use crate::timeline::model::DEFAULT_SCENE_LENGTH_MS;

const LEGACY_TRACK_FIELDS: [&str; 6] = [
    "code",
    "startTime",
    "endTime",
    "hasError",
    "errorMessage",
    "runtimeError",
];

/// Migrate a whole persisted state blob (`{"tracks": [...], ...}`) in place.
///
/// Returns the number of tracks rewritten from the flat single-scene shape.
#[tracing::instrument(level = "debug", skip(state))]
pub fn migrate_state(state: &mut Value) -> usize {
    let Some(tracks) = state.get_mut("tracks").and_then(Value::as_array_mut) else {
        return 0;
    };
    migrate_tracks(tracks)
}

/// Migrate a list of track records in place.
pub fn migrate_tracks(tracks: &mut [Value]) -> usize {
    let mut next_scene_id = max_scene_id(tracks) + 1;
    let mut rewritten = 0;
    for track in tracks.iter_mut() {
        let Some(obj) = track.as_object_mut() else {
            continue;
        };
        if !obj.contains_key("scenes") && is_flat_track(obj) {
            let scene = lift_flat_scene(obj, next_scene_id);
            next_scene_id += 1;
            obj.insert("scenes".to_owned(), Value::Array(vec![scene]));
            rewritten += 1;
        }
        if let Some(scenes) = obj.get_mut("scenes").and_then(Value::as_array_mut) {
            for scene in scenes.iter_mut().filter_map(Value::as_object_mut) {
                scene
                    .entry("visible")
                    .or_insert(Value::Bool(true));
            }
        }
    }
    if rewritten > 0 {
        tracing::info!(rewritten, "migrated legacy track records");
    }
    rewritten
}

fn is_flat_track(obj: &Map<String, Value>) -> bool {
    ["code", "startTime", "endTime"]
        .iter()
        .any(|k| obj.contains_key(*k))
}

fn lift_flat_scene(track: &mut Map<String, Value>, id: u64) -> Value {
    let track_name = track
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Track")
        .to_owned();
    let start = track.get("startTime").and_then(Value::as_u64).unwrap_or(0);
    let end = track
        .get("endTime")
        .and_then(Value::as_u64)
        .filter(|e| *e > start)
        .unwrap_or(start + DEFAULT_SCENE_LENGTH_MS);
    let code = track
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    for k in LEGACY_TRACK_FIELDS {
        track.remove(k);
    }
    serde_json::json!({
        "id": id,
        "name": format!("{track_name} Scene"),
        "startTime": start,
        "endTime": end,
        "code": code,
        "hasError": false,
        "errorMessage": null,
        "runtimeError": null,
        "visible": true,
    })
}

fn max_scene_id(tracks: &[Value]) -> u64 {
    tracks
        .iter()
        .filter_map(|t| t.get("scenes").and_then(Value::as_array))
        .flatten()
        .filter_map(|s| s.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/migrate.rs"]
mod tests;
