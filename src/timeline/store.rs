use crate::foundation::core::{SceneId, TimeMs, TrackId};
use crate::foundation::error::{DemolineError, DemolineResult};
use crate::timeline::model::{
    DEFAULT_SCENE_CODE, DEFAULT_SCENE_LENGTH_MS, RenderTarget, Scene, SceneField, Selection, Track,
    TrackField,
};

/// Direction for [`Timeline::move_track`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackMove {
    /// Paint later (higher zIndex).
    Up,
    /// Paint earlier (lower zIndex).
    Down,
}

/// Scene edges used for boundary jumps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneBoundaries {
    /// Every distinct start time, ascending.
    pub starts: Vec<TimeMs>,
    /// Every distinct end time, ascending.
    pub ends: Vec<TimeMs>,
}

/// Ordered collection of tracks plus id allocation and the current selection.
///
/// All structural edits go through this type so ids stay unique and every scene keeps
/// `end > start`.
#[derive(Clone, Debug)]
pub struct Timeline {
    tracks: Vec<Track>,
    next_track_id: u64,
    next_scene_id: u64,
    selection: Selection,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Empty timeline.
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            next_track_id: 1,
            next_scene_id: 1,
            selection: Selection::default(),
        }
    }

    /// The built-in starting project: one track holding one default scene.
    pub fn with_default_content() -> Self {
        let mut tl = Self::new();
        let track = tl.add_track();
        // Fresh track always accepts a scene.
        let _ = tl.add_scene(track);
        tl
    }

    /// Adopt loaded tracks and reseed the id counters above every existing id.
    pub fn from_tracks(tracks: Vec<Track>) -> DemolineResult<Self> {
        for t in &tracks {
            for s in &t.scenes {
                s.validate()?;
            }
        }
        let mut tl = Self {
            tracks,
            ..Self::new()
        };
        tl.reseed_ids();
        Ok(tl)
    }

    /// Move the id counters past the largest id in use.
    pub fn reseed_ids(&mut self) {
        let max_track = self.tracks.iter().map(|t| t.id.0).max().unwrap_or(0);
        let max_scene = self
            .tracks
            .iter()
            .flat_map(|t| t.scenes.iter())
            .map(|s| s.id.0)
            .max()
            .unwrap_or(0);
        self.next_track_id = self.next_track_id.max(max_track + 1);
        self.next_scene_id = self.next_scene_id.max(max_scene + 1);
    }

    /// Tracks in store order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track by id.
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Scene by id within `track`.
    pub fn scene(&self, track: TrackId, scene: SceneId) -> Option<&Scene> {
        self.track(track).and_then(|t| t.scene(scene))
    }

    pub(crate) fn scene_mut(&mut self, track: TrackId, scene: SceneId) -> Option<&mut Scene> {
        self.track_mut(track).and_then(|t| t.scene_mut(scene))
    }

    /// Find a scene anywhere, returning its owning track.
    pub fn find_scene(&self, scene: SceneId) -> Option<(TrackId, &Scene)> {
        self.tracks
            .iter()
            .find_map(|t| t.scene(scene).map(|s| (t.id, s)))
    }

    /// Append a track named `Track N` with zIndex `N-1`, where N is the new track count.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn add_track(&mut self) -> TrackId {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;
        let n = self.tracks.len() + 1;
        self.tracks.push(Track {
            id,
            name: format!("Track {n}"),
            z_index: i32::try_from(n - 1).unwrap_or(i32::MAX),
            render_target: RenderTarget::Main,
            enabled: true,
            scenes: Vec::new(),
        });
        tracing::debug!(%id, "track added");
        id
    }

    /// Append a 5 s scene after the track's latest end (or at 0 for an empty track).
    ///
    /// Returns `None` when the track does not exist.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn add_scene(&mut self, track: TrackId) -> Option<SceneId> {
        let id = SceneId(self.next_scene_id);
        let t = self.track_mut(track)?;
        let start = t.latest_end();
        let n = t.scenes.len() + 1;
        t.scenes.push(Scene::new(
            id,
            format!("Scene {n}"),
            start,
            start + DEFAULT_SCENE_LENGTH_MS,
            DEFAULT_SCENE_CODE,
        ));
        self.next_scene_id += 1;
        tracing::debug!(%id, start, "scene added");
        Some(id)
    }

    /// Remove a track and all its scenes. Clears the selection if it pointed inside.
    pub fn delete_track(&mut self, track: TrackId) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id != track);
        let removed = self.tracks.len() != before;
        if removed && self.selection.track == Some(track) {
            self.selection = Selection::default();
        }
        removed
    }

    /// Remove one scene. Clears the selection if that scene was selected.
    pub fn delete_scene(&mut self, track: TrackId, scene: SceneId) -> bool {
        let Some(t) = self.track_mut(track) else {
            return false;
        };
        let before = t.scenes.len();
        t.scenes.retain(|s| s.id != scene);
        let removed = t.scenes.len() != before;
        if removed && self.selection.scene == Some(scene) {
            self.selection.scene = None;
        }
        removed
    }

    /// Apply a batch of track field changes. Returns `false` for an unknown track.
    pub fn update_track(&mut self, track: TrackId, fields: &[TrackField]) -> bool {
        let Some(t) = self.track_mut(track) else {
            return false;
        };
        for f in fields {
            match f {
                TrackField::Name(v) => t.name.clone_from(v),
                TrackField::ZIndex(v) => t.z_index = *v,
                TrackField::RenderTarget(v) => t.render_target = v.clone(),
                TrackField::Enabled(v) => t.enabled = *v,
            }
        }
        true
    }

    /// Apply a batch of scene field changes atomically.
    ///
    /// The merged scene is validated before anything is written, so a rejected batch leaves
    /// the scene untouched. A code change clears all recorded faults.
    pub fn update_scene(
        &mut self,
        track: TrackId,
        scene: SceneId,
        fields: &[SceneField],
    ) -> DemolineResult<bool> {
        let Some(s) = self.scene_mut(track, scene) else {
            return Ok(false);
        };
        let mut next = s.clone();
        for f in fields {
            match f {
                SceneField::Name(v) => next.name.clone_from(v),
                SceneField::StartTime(v) => next.start_time = *v,
                SceneField::EndTime(v) => next.end_time = *v,
                SceneField::Code(v) => {
                    next.code.clone_from(v);
                    next.clear_faults();
                }
                SceneField::Visible(v) => next.visible = *v,
            }
        }
        next.validate()?;
        *s = next;
        Ok(true)
    }

    /// Flip a scene's visibility. Returns `false` when it does not exist.
    pub fn toggle_scene_visibility(&mut self, track: TrackId, scene: SceneId) -> bool {
        match self.scene_mut(track, scene) {
            Some(s) => {
                s.visible = !s.visible;
                true
            }
            None => false,
        }
    }

    /// Move a scene between tracks, keeping its id and timing.
    ///
    /// Returns `false` when either track or the scene is missing, or `from == to`.
    /// A selection on the moved scene follows it to the new track.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn move_scene_to_track(&mut self, scene: SceneId, from: TrackId, to: TrackId) -> bool {
        if from == to || self.track(to).is_none() {
            return false;
        }
        let Some(src) = self.track_mut(from) else {
            return false;
        };
        let Some(idx) = src.scenes.iter().position(|s| s.id == scene) else {
            return false;
        };
        let moved = src.scenes.remove(idx);
        let Some(dst) = self.track_mut(to) else {
            return false;
        };
        dst.scenes.push(moved);
        if self.selection.scene == Some(scene) {
            self.selection.track = Some(to);
        }
        true
    }

    /// Swap a track with its neighbour in paint order.
    ///
    /// zIndex values are first renumbered to `0..n` in the current paint order so ties
    /// resolve deterministically.
    pub fn move_track(&mut self, track: TrackId, direction: TrackMove) -> bool {
        let order: Vec<TrackId> = self.paint_order(false).iter().map(|t| t.id).collect();
        let Some(pos) = order.iter().position(|id| *id == track) else {
            return false;
        };
        let neighbour = match direction {
            TrackMove::Up if pos + 1 < order.len() => pos + 1,
            TrackMove::Down if pos > 0 => pos - 1,
            _ => return false,
        };
        let mut order = order;
        order.swap(pos, neighbour);
        for (z, id) in order.iter().enumerate() {
            if let Some(t) = self.track_mut(*id) {
                t.z_index = i32::try_from(z).unwrap_or(i32::MAX);
            }
        }
        true
    }

    /// Enabled tracks stably sorted by ascending zIndex; equal keys keep store order.
    pub fn render_order(&self) -> Vec<&Track> {
        self.paint_order(true)
    }

    fn paint_order(&self, enabled_only: bool) -> Vec<&Track> {
        let mut out: Vec<&Track> = self
            .tracks
            .iter()
            .filter(|t| t.enabled || !enabled_only)
            .collect();
        out.sort_by_key(|t| t.z_index);
        out
    }

    /// Sorted, deduplicated scene start and end times across all tracks.
    pub fn scene_boundaries(&self) -> SceneBoundaries {
        let scenes = || self.tracks.iter().flat_map(|t| t.scenes.iter());
        let sorted = |mut v: Vec<TimeMs>| {
            v.sort_unstable();
            v.dedup();
            v
        };
        SceneBoundaries {
            starts: sorted(scenes().map(|s| s.start_time).collect()),
            ends: sorted(scenes().map(|s| s.end_time).collect()),
        }
    }

    /// Latest scene end across all tracks, 0 when there are no scenes.
    pub fn max_scene_end(&self) -> TimeMs {
        self.tracks.iter().map(Track::latest_end).max().unwrap_or(0)
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Select a scene; fails when it is not in `track`.
    pub fn select_scene(&mut self, track: TrackId, scene: SceneId) -> DemolineResult<()> {
        if self.scene(track, scene).is_none() {
            return Err(DemolineError::validation(format!(
                "{scene} is not part of {track}"
            )));
        }
        self.selection = Selection {
            track: Some(track),
            scene: Some(scene),
        };
        Ok(())
    }

    /// Select nothing.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Record the outcome of compiling a scene's code.
    pub(crate) fn set_compile_fault(
        &mut self,
        track: TrackId,
        scene: SceneId,
        message: Option<String>,
    ) {
        if let Some(s) = self.scene_mut(track, scene) {
            s.has_error = message.is_some();
            s.error_message = message;
        }
    }

    /// Record the outcome of the latest run of a scene.
    pub(crate) fn set_runtime_fault(
        &mut self,
        track: TrackId,
        scene: SceneId,
        message: Option<String>,
    ) {
        if let Some(s) = self.scene_mut(track, scene) {
            s.runtime_error = message;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/store.rs"]
mod tests;
