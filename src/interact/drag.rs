use crate::foundation::core::{SceneId, TimeMs, TrackId};
use crate::foundation::math::snap_ms;
use crate::interact::geometry::TimelineGeometry;
use crate::timeline::store::Timeline;

/// Scene times snap to this grid while dragging.
pub const SNAP_MS: u64 = 100;
/// Shortest span a drag may produce.
pub const MIN_SCENE_MS: u64 = 100;

/// An in-progress scene drag. Times are written into the scene live; the track move only
/// happens on release.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
    /// Scene being dragged.
    pub scene: SceneId,
    /// Track that owned the scene at pointer-down.
    pub source_track: TrackId,
    /// Row currently under the pointer (starts at the source track).
    pub target_track: TrackId,
    /// Scene start at pointer-down.
    pub original_start: TimeMs,
    /// Scene end at pointer-down.
    pub original_end: TimeMs,
    /// Pointer x at pointer-down.
    pub origin_x: f64,
}

/// Scrubbing on the ruler band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RulerDrag {
    /// Latest pointer x.
    pub pointer_x: f64,
}

impl RulerDrag {
    /// Time to seek to for the current pointer position (unclamped).
    pub fn seek_time(&self, geometry: &TimelineGeometry) -> i64 {
        geometry.time_at_x(self.pointer_x)
    }
}

/// Candidate span for a drag of `delta_ms` from the original span.
///
/// A start that would go negative pins the whole span at zero with its length preserved.
/// Both edges snap to [`SNAP_MS`] and the end stays at least [`MIN_SCENE_MS`] after the
/// start.
pub fn drag_span(original_start: TimeMs, original_end: TimeMs, delta_ms: f64) -> (TimeMs, TimeMs) {
    let start = original_start as f64 + delta_ms;
    let (start, end) = if start < 0.0 {
        (0.0, original_end.saturating_sub(original_start) as f64)
    } else {
        (start, original_end as f64 + delta_ms)
    };
    let start = snap_ms(start, SNAP_MS).max(0) as TimeMs;
    let end = snap_ms(end, SNAP_MS).max(0) as TimeMs;
    (start, end.max(start + MIN_SCENE_MS))
}

/// Capture a drag on pointer-down. `None` when the scene is not in `track`.
pub fn begin_drag(
    timeline: &Timeline,
    track: TrackId,
    scene: SceneId,
    origin_x: f64,
) -> Option<DragState> {
    let s = timeline.scene(track, scene)?;
    tracing::debug!(%scene, %track, "drag begin");
    Some(DragState {
        scene,
        source_track: track,
        target_track: track,
        original_start: s.start_time,
        original_end: s.end_time,
        origin_x,
    })
}

/// Pointer-move: write candidate times into the scene and track the row under the pointer.
pub fn update_drag(
    timeline: &mut Timeline,
    geometry: &TimelineGeometry,
    drag: &mut DragState,
    x: f64,
    y: f64,
) {
    let delta = geometry.px_to_ms(x - drag.origin_x);
    let (start, end) = drag_span(drag.original_start, drag.original_end, delta);
    if let Some(s) = timeline.scene_mut(drag.source_track, drag.scene) {
        s.start_time = start;
        s.end_time = end;
    }
    if let Some(row) = geometry.track_at(timeline, y) {
        drag.target_track = row;
    }
}

/// Pointer-up: move the scene to the target row if it changed and select it.
///
/// Returns `true` when the scene changed tracks.
pub fn end_drag(timeline: &mut Timeline, drag: DragState) -> bool {
    let moved = drag.target_track != drag.source_track
        && timeline.move_scene_to_track(drag.scene, drag.source_track, drag.target_track);
    let owner = if moved {
        drag.target_track
    } else {
        drag.source_track
    };
    if let Err(err) = timeline.select_scene(owner, drag.scene) {
        tracing::debug!(%err, "dragged scene vanished before release");
    }
    tracing::debug!(scene = %drag.scene, moved, "drag end");
    moved
}

/// Abandon a drag, restoring the original times.
pub fn cancel_drag(timeline: &mut Timeline, drag: DragState) {
    if let Some(s) = timeline.scene_mut(drag.source_track, drag.scene) {
        s.start_time = drag.original_start;
        s.end_time = drag.original_end;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/drag.rs"]
mod tests;
