use crate::foundation::core::{SceneId, TimeMs, TrackId};
use crate::foundation::error::{DemolineError, DemolineResult};

/// Length given to a freshly added scene.
pub const DEFAULT_SCENE_LENGTH_MS: TimeMs = 5_000;

/// Drawing program used for new scenes.
pub const DEFAULT_SCENE_CODE: &str = r##"ctx.fillStyle = "#1e90ff";
let x = (t / 10.0) % w;
ctx.fillRect(x, h / 2 - 25, 50, 50);
"##;

/// Output surface a track draws onto.
///
/// Serialized as a plain string: `"main"` or the buffer name (e.g. `"buffer1"`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RenderTarget {
    /// The shared visible surface.
    #[default]
    Main,
    /// A named offscreen buffer, sized like the main canvas.
    Buffer(String),
}

impl RenderTarget {
    /// Parse the persisted form. Empty strings and `"main"` map to [`RenderTarget::Main`].
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "main" {
            Self::Main
        } else {
            Self::Buffer(s.to_owned())
        }
    }

    /// Persisted/display form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => "main",
            Self::Buffer(name) => name,
        }
    }

    /// Buffer name when this target is offscreen.
    pub fn buffer_name(&self) -> Option<&str> {
        match self {
            Self::Main => None,
            Self::Buffer(name) => Some(name),
        }
    }
}

impl From<String> for RenderTarget {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RenderTarget> for String {
    fn from(t: RenderTarget) -> Self {
        t.as_str().to_owned()
    }
}

fn default_true() -> bool {
    true
}

/// A z-ordered layer with one output target and an ordered list of scenes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Stable identifier.
    pub id: TrackId,
    /// Display name.
    pub name: String,
    /// Paint order key, ascending (lower is behind). Ties keep store order.
    #[serde(default)]
    pub z_index: i32,
    /// Output surface.
    #[serde(default)]
    pub render_target: RenderTarget,
    /// Disabled tracks are skipped by the render pipeline.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Scenes in declaration order; the first active one wins.
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Track {
    /// The scene to draw at `time`: the first visible scene whose `[start, end]` contains it.
    pub fn active_scene(&self, time: TimeMs) -> Option<&Scene> {
        find_active_scene(self, time)
    }

    /// Look up a scene by id.
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub(crate) fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }

    /// End time of the latest-ending scene, or 0 for an empty track.
    pub fn latest_end(&self) -> TimeMs {
        self.scenes.iter().map(|s| s.end_time).max().unwrap_or(0)
    }
}

/// Active-scene rule: visible, `start <= time <= end`, first match in track order.
///
/// Overlapping visible scenes are allowed; the earliest-declared one is drawn.
pub fn find_active_scene(track: &Track, time: TimeMs) -> Option<&Scene> {
    track.scenes.iter().find(|s| s.is_active_at(time))
}

/// A time-bounded unit of drawing code belonging to one track.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Stable identifier.
    pub id: SceneId,
    /// Display name.
    pub name: String,
    /// Inclusive start on the global timeline.
    pub start_time: TimeMs,
    /// Inclusive end on the global timeline; always `> start_time`.
    pub end_time: TimeMs,
    /// Source text of the drawing program.
    #[serde(default)]
    pub code: String,
    /// Set when `code` failed to compile. Persists until the code changes.
    #[serde(default)]
    pub has_error: bool,
    /// Compile failure message.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Failure message from the most recent frame that ran this scene.
    #[serde(default)]
    pub runtime_error: Option<String>,
    /// Hidden scenes are never active.
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl Scene {
    /// Build a scene with no recorded faults.
    pub fn new(
        id: SceneId,
        name: impl Into<String>,
        start_time: TimeMs,
        end_time: TimeMs,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            start_time,
            end_time,
            code: code.into(),
            has_error: false,
            error_message: None,
            runtime_error: None,
            visible: true,
        }
    }

    /// Active-scene predicate for a single scene.
    pub fn is_active_at(&self, time: TimeMs) -> bool {
        self.visible && time >= self.start_time && time <= self.end_time
    }

    /// Span length in milliseconds.
    pub fn duration(&self) -> TimeMs {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Check the timing invariant.
    pub fn validate(&self) -> DemolineResult<()> {
        if self.end_time <= self.start_time {
            return Err(DemolineError::validation(format!(
                "scene {} endTime ({}) must be > startTime ({})",
                self.id, self.end_time, self.start_time
            )));
        }
        Ok(())
    }

    pub(crate) fn clear_faults(&mut self) {
        self.has_error = false;
        self.error_message = None;
        self.runtime_error = None;
    }
}

/// One field change on a track.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TrackField {
    /// Rename.
    Name(String),
    /// Change paint order.
    ZIndex(i32),
    /// Retarget output.
    RenderTarget(RenderTarget),
    /// Enable or disable.
    Enabled(bool),
}

/// One field change on a scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum SceneField {
    /// Rename.
    Name(String),
    /// Move the start; the merged scene must keep `end > start`.
    StartTime(TimeMs),
    /// Move the end; the merged scene must keep `end > start`.
    EndTime(TimeMs),
    /// Replace the program. Clears recorded faults.
    Code(String),
    /// Show or hide.
    Visible(bool),
}

impl SceneField {
    /// Whether this field is a high-frequency text edit (persisted with debounce).
    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code(_))
    }
}

/// Currently selected track/scene in the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Selection {
    /// Selected track.
    pub track: Option<TrackId>,
    /// Selected scene (always inside `track` when both are set).
    pub scene: Option<SceneId>,
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
