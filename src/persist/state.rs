use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::foundation::core::{Canvas, TimeMs};
use crate::foundation::error::{DemolineError, DemolineResult};
use crate::persist::store::{DocumentSource, KeyValueStore};
use crate::playback::clock::{DEFAULT_DURATION_MS, DURATION_HEADROOM_MS};
use crate::timeline::migrate::migrate_state;
use crate::timeline::model::Track;
use crate::timeline::store::Timeline;

/// Persistence configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistOpts {
    /// Key the state blob is stored under.
    pub key: String,
    /// Quiet period before a code edit is written.
    pub debounce: Duration,
    /// Document tried when the store holds nothing.
    pub fallback_document: String,
}

impl Default for PersistOpts {
    fn default() -> Self {
        Self {
            key: "demoline-state".to_owned(),
            debounce: Duration::from_millis(500),
            fallback_document: "default.json".to_owned(),
        }
    }
}

impl PersistOpts {
    /// Set the store key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the quiet period for code edits.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the fallback document path.
    pub fn with_fallback_document(mut self, path: impl Into<String>) -> Self {
        self.fallback_document = path.into();
        self
    }

    /// Apply `DEMOLINE_PERSIST_DEBOUNCE_MS` when it parses.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = std::env::var("DEMOLINE_PERSIST_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.debounce = Duration::from_millis(ms);
        }
        self
    }
}

fn default_duration() -> TimeMs {
    DEFAULT_DURATION_MS
}

fn default_width() -> u32 {
    Canvas::default().width
}

fn default_height() -> u32 {
    Canvas::default().height
}

/// The persisted blob: tracks with nested scenes, duration and canvas size.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(default)]
    /// Tracks with their scenes, in store order.
    pub tracks: Vec<Track>,
    #[serde(default = "default_duration")]
    /// Timeline length in milliseconds.
    pub duration: TimeMs,
    #[serde(default = "default_width")]
    /// Canvas width in pixels.
    pub canvas_width: u32,
    #[serde(default = "default_height")]
    /// Canvas height in pixels.
    pub canvas_height: u32,
}

impl ProjectState {
    /// Snapshot the persisted fields of a live timeline.
    pub fn capture(timeline: &Timeline, duration: TimeMs, canvas: Canvas) -> Self {
        Self {
            tracks: timeline.tracks().to_vec(),
            duration,
            canvas_width: canvas.width,
            canvas_height: canvas.height,
        }
    }

    /// Parse a blob, migrating legacy track shapes first.
    pub fn decode(raw: &str) -> DemolineResult<Self> {
        let mut value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(DemolineError::serde("state blob must be a JSON object"));
        }
        let migrated = migrate_state(&mut value);
        if migrated > 0 {
            tracing::debug!(tracks = migrated, "migrated legacy tracks");
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Compact JSON.
    pub fn to_json(&self) -> DemolineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> DemolineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and turn into live editor state. Ids are reseeded above the loaded maximum and
    /// the duration is grown to cover every scene.
    pub fn into_loaded(self, source: LoadSource) -> DemolineResult<LoadedState> {
        let canvas = Canvas::new(self.canvas_width, self.canvas_height)?;
        let timeline = Timeline::from_tracks(self.tracks)?;
        let duration = self
            .duration
            .max(timeline.max_scene_end().saturating_add(DURATION_HEADROOM_MS));
        Ok(LoadedState {
            timeline,
            duration,
            canvas,
            source,
        })
    }
}

/// Where a loaded state came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    /// The key-value store.
    Store,
    /// The fallback document.
    Document,
    /// Built-in default content.
    Default,
}

#[derive(Clone, Debug)]
/// State ready to drive an editor.
pub struct LoadedState {
    /// Timeline with reseeded ids.
    pub timeline: Timeline,
    /// Duration, grown to cover every scene.
    pub duration: TimeMs,
    /// Canvas size.
    pub canvas: Canvas,
    /// Where the state came from.
    pub source: LoadSource,
}

impl LoadedState {
    /// One default track holding one default scene.
    pub fn synthesized() -> Self {
        let timeline = Timeline::with_default_content();
        let duration =
            DEFAULT_DURATION_MS.max(timeline.max_scene_end().saturating_add(DURATION_HEADROOM_MS));
        Self {
            timeline,
            duration,
            canvas: Canvas::default(),
            source: LoadSource::Default,
        }
    }
}

/// Load state: the key-value store first, then the fallback document, then the built-in
/// default. A source that is missing or malformed is skipped.
#[tracing::instrument(skip(store, docs), fields(key = %opts.key))]
pub fn load_state(
    store: &dyn KeyValueStore,
    docs: &dyn DocumentSource,
    opts: &PersistOpts,
) -> LoadedState {
    let stored = store.get(&opts.key);
    if let Some(state) = try_source(stored, LoadSource::Store) {
        return state;
    }
    let fetched = docs.fetch(&opts.fallback_document);
    if let Some(state) = try_source(fetched, LoadSource::Document) {
        return state;
    }
    tracing::debug!("no saved state, using default content");
    LoadedState::synthesized()
}

fn try_source(raw: DemolineResult<Option<String>>, source: LoadSource) -> Option<LoadedState> {
    let raw = match raw {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(?source, error = %e, "state source unavailable");
            return None;
        }
    };
    match ProjectState::decode(&raw).and_then(|s| s.into_loaded(source)) {
        Ok(state) => {
            tracing::debug!(?source, tracks = state.timeline.tracks().len(), "state loaded");
            Some(state)
        }
        Err(e) => {
            tracing::warn!(?source, error = %e, "ignoring malformed state");
            None
        }
    }
}

/// Export file name: `demo-<UTC ISO-8601 timestamp>.json` with `:` and `.` turned into `-`.
pub fn export_filename(at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("demo-{stamp}.json")
}

/// Pretty-printed export blob and its file name.
pub fn export_state(state: &ProjectState, at: DateTime<Utc>) -> DemolineResult<(String, String)> {
    Ok((export_filename(at), state.to_json_pretty()?))
}

/// Writes state blobs to a store, immediately or after a quiet period.
#[derive(Debug)]
pub struct Persister<S> {
    store: S,
    opts: PersistOpts,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    blob: String,
    due: Instant,
}

impl<S: KeyValueStore> Persister<S> {
    /// Wrap `store`; nothing is pending.
    pub fn new(store: S, opts: PersistOpts) -> Self {
        Self {
            store,
            opts,
            pending: None,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persistence settings.
    pub fn opts(&self) -> &PersistOpts {
        &self.opts
    }

    /// Whether a debounced write is pending.
    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Write now, superseding any pending debounced write.
    pub fn persist_now(&mut self, state: &ProjectState) -> DemolineResult<()> {
        self.pending = None;
        let blob = state.to_json()?;
        self.store.set(&self.opts.key, &blob)
    }

    /// Queue a write for `now + debounce`. Each call restarts the quiet period.
    pub fn persist_debounced(&mut self, state: &ProjectState, now: Instant) -> DemolineResult<()> {
        self.pending = Some(Pending {
            blob: state.to_json()?,
            due: now + self.opts.debounce,
        });
        Ok(())
    }

    /// Write the pending blob if its quiet period is over. Returns whether a write happened.
    pub fn flush_due(&mut self, now: Instant) -> DemolineResult<bool> {
        match &self.pending {
            Some(p) if p.due <= now => self.flush(),
            _ => Ok(false),
        }
    }

    /// Write the pending blob regardless of its deadline.
    pub fn flush(&mut self) -> DemolineResult<bool> {
        let Some(p) = self.pending.take() else {
            return Ok(false);
        };
        self.store.set(&self.opts.key, &p.blob)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/state.rs"]
mod tests;
