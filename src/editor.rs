//! Application state and the command dispatcher that drives it.
//!
//! A front end (UI toolkit, test, CLI script) translates its input into [`Command`] values and
//! calls [`Editor::dispatch`]; once per display refresh it calls [`Editor::frame`].

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::foundation::core::{Canvas, Point, SceneId, TrackId};
use crate::foundation::error::DemolineResult;
use crate::interact::drag::{self, DragState, RulerDrag};
use crate::interact::geometry::TimelineGeometry;
use crate::persist::state::{LoadedState, PersistOpts, Persister, ProjectState, export_state, load_state};
use crate::persist::store::{DocumentSource, KeyValueStore};
use crate::playback::clock::Playback;
use crate::playback::keys::{KeyEvent, map_key};
use crate::render::pipeline::{FrameReport, RenderOpts, Renderer};
use crate::render::surface::FrameRGBA;
use crate::timeline::model::{SceneField, Selection, TrackField};
use crate::timeline::store::{Timeline, TrackMove};

/// Everything a front end can ask the editor to do.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Move the playhead to `time`, clamped.
    Seek {
        /// Target time in ms.
        time: i64,
    },
    /// Move the playhead by `delta`, clamped.
    Step {
        /// Signed offset in ms.
        delta: i64,
    },
    /// Play or pause.
    TogglePlayback,
    /// Append a track behind the others.
    AddTrack,
    /// Append a scene after the latest-ending one in `track`.
    AddScene {
        /// Owning track.
        track: TrackId,
    },
    /// Remove a track and its scenes.
    DeleteTrack {
        /// Track to remove.
        track: TrackId,
    },
    /// Remove one scene.
    DeleteScene {
        /// Owning track.
        track: TrackId,
        /// Scene to remove.
        scene: SceneId,
    },
    /// Change one track field.
    UpdateTrackField {
        /// Track to edit.
        track: TrackId,
        /// New value.
        field: TrackField,
    },
    /// Change one scene field. Code edits are compiled right away.
    UpdateSceneField {
        /// Owning track.
        track: TrackId,
        /// Scene to edit.
        scene: SceneId,
        /// New value.
        field: SceneField,
    },
    /// Swap paint order with the neighbouring track.
    MoveTrack {
        /// Track to move.
        track: TrackId,
        /// Towards the front or the back.
        direction: TrackMove,
    },
    /// Select a scene.
    SelectScene {
        /// Owning track.
        track: TrackId,
        /// Scene to select.
        scene: SceneId,
    },
    /// Select nothing.
    ClearSelection,
    /// Show or hide a scene.
    ToggleSceneVisibility {
        /// Owning track.
        track: TrackId,
        /// Scene to flip.
        scene: SceneId,
    },
    /// Pointer pressed in the timeline panel: starts a ruler or scene drag under `(x, y)`.
    PointerDown {
        /// Panel x in pixels.
        x: f64,
        /// Panel y in pixels.
        y: f64,
    },
    /// Start dragging a scene.
    BeginDrag {
        /// Owning track.
        track: TrackId,
        /// Scene to drag.
        scene: SceneId,
        /// Pointer x in pixels.
        x: f64,
        /// Pointer y in pixels.
        y: f64,
    },
    /// Pointer moved during a scene drag.
    UpdateDrag {
        /// Pointer x in pixels.
        x: f64,
        /// Pointer y in pixels.
        y: f64,
    },
    /// Release a scene drag and apply any track move.
    EndDrag,
    /// Abort a scene drag and restore its times.
    CancelDrag,
    /// Start scrubbing on the ruler.
    BeginRulerDrag {
        /// Pointer x in pixels.
        x: f64,
    },
    /// Pointer moved while scrubbing.
    UpdateRulerDrag {
        /// Pointer x in pixels.
        x: f64,
    },
    /// Stop scrubbing.
    EndRulerDrag,
    /// Change the canvas size.
    ResizeCanvas {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A key press, mapped through the shortcuts.
    Key(KeyEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Save {
    Skip,
    Now,
    Debounced,
}

/// Editor construction options.
#[derive(Clone, Debug, Default)]
pub struct EditorOpts {
    /// Renderer settings.
    pub render: RenderOpts,
    /// Persistence settings.
    pub persist: PersistOpts,
    /// Timeline panel layout used for pointer hit tests.
    pub geometry: TimelineGeometry,
}

impl EditorOpts {
    /// Replace the renderer settings.
    pub fn with_render(mut self, render: RenderOpts) -> Self {
        self.render = render;
        self
    }

    /// Replace the persistence settings.
    pub fn with_persist(mut self, persist: PersistOpts) -> Self {
        self.persist = persist;
        self
    }

    /// Replace the panel layout.
    pub fn with_geometry(mut self, geometry: TimelineGeometry) -> Self {
        self.geometry = geometry;
        self
    }
}

/// Compile and runtime messages of the selected scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneConsole {
    /// Compile failure message, while the scene is flagged.
    pub syntax_error: Option<String>,
    /// Failure message from the last frame.
    pub runtime_error: Option<String>,
}

impl SceneConsole {
    /// No message to show.
    pub fn is_clean(&self) -> bool {
        self.syntax_error.is_none() && self.runtime_error.is_none()
    }

    /// Console lines, syntax error first.
    pub fn lines(&self) -> Vec<String> {
        let syntax = self.syntax_error.iter().map(|m| format!("Syntax error: {m}"));
        let runtime = self.runtime_error.iter().map(|m| format!("Runtime error: {m}"));
        syntax.chain(runtime).collect()
    }
}

/// The single application state: timeline, playhead, canvas, interaction and output.
pub struct Editor<S> {
    timeline: Timeline,
    playback: Playback,
    canvas: Canvas,
    geometry: TimelineGeometry,
    drag: Option<DragState>,
    ruler: Option<RulerDrag>,
    renderer: Renderer,
    persister: Persister<S>,
    redraw: bool,
    last_report: Option<FrameReport>,
}

impl<S> std::fmt::Debug for Editor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("tracks", &self.timeline.tracks().len())
            .field("playback", &self.playback)
            .field("canvas", &self.canvas)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> Editor<S> {
    /// Load from `store` (falling back to `docs`, then default content) and build the editor.
    pub fn load(store: S, docs: &dyn DocumentSource, opts: EditorOpts) -> DemolineResult<Self> {
        let loaded = load_state(&store, docs, &opts.persist);
        Self::from_loaded(loaded, store, opts)
    }

    /// Build the editor around already loaded state.
    pub fn from_loaded(loaded: LoadedState, store: S, opts: EditorOpts) -> DemolineResult<Self> {
        let mut playback = Playback::default();
        playback.set_duration(loaded.duration);
        Ok(Self {
            timeline: loaded.timeline,
            playback,
            canvas: loaded.canvas,
            geometry: opts.geometry,
            drag: None,
            ruler: None,
            renderer: Renderer::new(opts.render)?,
            persister: Persister::new(store, opts.persist),
            redraw: true,
            last_report: None,
        })
    }

    /// The timeline store.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The playback clock.
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Current canvas size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.timeline.selection()
    }

    /// Timeline panel layout.
    pub fn geometry(&self) -> &TimelineGeometry {
        &self.geometry
    }

    /// The scene drag in progress, if any.
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// The frame renderer.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The state persister.
    pub fn persister(&self) -> &Persister<S> {
        &self.persister
    }

    /// Report of the most recent rendered frame.
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Whether the next `frame` renders regardless of playback.
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Snapshot of the persisted fields.
    pub fn state(&self) -> ProjectState {
        ProjectState::capture(&self.timeline, self.playback.duration(), self.canvas)
    }

    /// Export blob and file name stamped with `at`.
    pub fn export(&self, at: DateTime<Utc>) -> DemolineResult<(String, String)> {
        export_state(&self.state(), at)
    }

    /// Apply one command. Lookup misses are `Ok(false)`; an edit that would break a scene
    /// invariant is an error and changes nothing.
    pub fn dispatch(&mut self, cmd: Command, now: Instant) -> DemolineResult<bool> {
        tracing::trace!(?cmd, "dispatch");
        let (changed, save) = match cmd {
            Command::Seek { time } => {
                self.playback.seek_to(time);
                (true, Save::Skip)
            }
            Command::Step { delta } => {
                self.playback.step(delta);
                (true, Save::Skip)
            }
            Command::TogglePlayback => {
                self.playback.toggle(now);
                (true, Save::Skip)
            }
            Command::AddTrack => {
                self.timeline.add_track();
                (true, Save::Now)
            }
            Command::AddScene { track } => {
                let added = self.timeline.add_scene(track).is_some();
                (added, Save::Now)
            }
            Command::DeleteTrack { track } => (self.timeline.delete_track(track), Save::Now),
            Command::DeleteScene { track, scene } => {
                (self.timeline.delete_scene(track, scene), Save::Now)
            }
            Command::UpdateTrackField { track, field } => (
                self.timeline
                    .update_track(track, std::slice::from_ref(&field)),
                Save::Now,
            ),
            Command::UpdateSceneField {
                track,
                scene,
                field,
            } => {
                let changed =
                    self.timeline
                        .update_scene(track, scene, std::slice::from_ref(&field))?;
                if changed && let SceneField::Code(code) = &field {
                    let fault = self.renderer.check_code(code).err();
                    self.timeline.set_compile_fault(track, scene, fault);
                }
                let save = if field.is_code() {
                    Save::Debounced
                } else {
                    Save::Now
                };
                (changed, save)
            }
            Command::MoveTrack { track, direction } => {
                (self.timeline.move_track(track, direction), Save::Now)
            }
            Command::SelectScene { track, scene } => {
                (self.timeline.select_scene(track, scene).is_ok(), Save::Skip)
            }
            Command::ClearSelection => {
                self.timeline.clear_selection();
                (true, Save::Skip)
            }
            Command::ToggleSceneVisibility { track, scene } => (
                self.timeline.toggle_scene_visibility(track, scene),
                Save::Now,
            ),
            Command::PointerDown { x, y } => return self.pointer_down(x, y, now),
            Command::BeginDrag { track, scene, x, .. } => {
                self.drag = drag::begin_drag(&self.timeline, track, scene, x);
                if self.drag.is_some()
                    && let Err(err) = self.timeline.select_scene(track, scene)
                {
                    tracing::debug!(%err, "pressed scene could not be selected");
                }
                (self.drag.is_some(), Save::Skip)
            }
            Command::UpdateDrag { x, y } => match self.drag.as_mut() {
                Some(d) => {
                    drag::update_drag(&mut self.timeline, &self.geometry, d, x, y);
                    (true, Save::Skip)
                }
                None => (false, Save::Skip),
            },
            Command::EndDrag => match self.drag.take() {
                Some(d) => {
                    drag::end_drag(&mut self.timeline, d);
                    (true, Save::Now)
                }
                None => (false, Save::Skip),
            },
            Command::CancelDrag => match self.drag.take() {
                Some(d) => {
                    drag::cancel_drag(&mut self.timeline, d);
                    (true, Save::Skip)
                }
                None => (false, Save::Skip),
            },
            Command::BeginRulerDrag { x } => {
                let ruler = RulerDrag { pointer_x: x };
                self.playback.seek_to(ruler.seek_time(&self.geometry));
                self.ruler = Some(ruler);
                (true, Save::Skip)
            }
            Command::UpdateRulerDrag { x } => match self.ruler.as_mut() {
                Some(r) => {
                    r.pointer_x = x;
                    self.playback.seek_to(r.seek_time(&self.geometry));
                    (true, Save::Skip)
                }
                None => (false, Save::Skip),
            },
            Command::EndRulerDrag => (self.ruler.take().is_some(), Save::Skip),
            Command::ResizeCanvas { width, height } => {
                let canvas = Canvas::new(width, height)?;
                let changed = canvas != self.canvas;
                self.canvas = canvas;
                (changed, Save::Now)
            }
            Command::Key(event) => {
                return match map_key(&event, &self.timeline, &self.playback) {
                    Some(mapped) => self.dispatch(mapped, now),
                    None => Ok(false),
                };
            }
        };

        if !changed {
            return Ok(false);
        }
        self.playback
            .recompute_duration(self.timeline.max_scene_end());
        self.redraw = true;
        match save {
            Save::Skip => {}
            Save::Now => self.save_now(),
            Save::Debounced => {
                if let Err(e) = self.persister.persist_debounced(&self.state(), now) {
                    tracing::warn!(error = %e, "state not queued for saving");
                }
            }
        }
        Ok(true)
    }

    fn pointer_down(&mut self, x: f64, y: f64, now: Instant) -> DemolineResult<bool> {
        let p = Point::new(x, y);
        if self.geometry.in_ruler(p) {
            return self.dispatch(Command::BeginRulerDrag { x }, now);
        }
        match self.geometry.scene_at(&self.timeline, p) {
            Some((track, scene)) => self.dispatch(Command::BeginDrag { track, scene, x, y }, now),
            None => Ok(false),
        }
    }

    fn save_now(&mut self) {
        if let Err(e) = self.persister.persist_now(&self.state()) {
            tracing::warn!(error = %e, "state not saved");
        }
    }

    /// One display refresh: advance playback, write due state, and render if anything moved.
    pub fn frame(&mut self, now: Instant) -> DemolineResult<Option<FrameRGBA>> {
        let mut render = std::mem::take(&mut self.redraw);
        if self.playback.is_playing() {
            self.playback.advance(now);
            render = true;
        }
        if let Err(e) = self.persister.flush_due(now) {
            tracing::warn!(error = %e, "debounced save failed");
        }
        if !render {
            return Ok(None);
        }
        self.render_now().map(Some)
    }

    /// Render the current time and record scene faults on the timeline.
    pub fn render_now(&mut self) -> DemolineResult<FrameRGBA> {
        let (frame, report) = self.renderer.render_frame(
            &self.timeline,
            self.canvas,
            self.playback.current_time(),
        )?;
        report.apply(&mut self.timeline);
        self.last_report = Some(report);
        self.redraw = false;
        Ok(frame)
    }

    /// Write any pending debounced state now.
    pub fn flush(&mut self) -> DemolineResult<bool> {
        self.persister.flush()
    }

    /// Messages for the console panel of the selected scene.
    pub fn console_for_selection(&self) -> Option<SceneConsole> {
        let Selection {
            track: Some(track),
            scene: Some(scene),
        } = self.timeline.selection()
        else {
            return None;
        };
        let s = self.timeline.scene(track, scene)?;
        Some(SceneConsole {
            syntax_error: s.error_message.clone().filter(|_| s.has_error),
            runtime_error: s.runtime_error.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/editor.rs"]
mod tests;
