//! demoline is the core of a timeline editor for layered, time-driven 2D demos.
//!
//! Tracks are z-ordered layers drawing to the main canvas or to named offscreen buffers; each
//! holds scenes, time-bounded programs written in an embedded script language. Every frame is
//! recomputed from the playhead time:
//!
//! - Build or load a [`Timeline`] (or a whole [`Editor`])
//! - Drive it with [`Command`] values
//! - Render frames with [`Renderer`] and read back [`FrameRGBA`] pixels
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Application state and command dispatch.
pub mod editor;
/// Pointer interaction: timeline layout and scene dragging.
pub mod interact;
/// State persistence and export.
pub mod persist;
/// Playhead clock and keyboard shortcuts.
pub mod playback;
/// Frame rendering.
pub mod render;
/// Scene scripting: engine, drawing context, colors and text.
pub mod script;
/// Tracks, scenes and the timeline store.
pub mod timeline;

pub use crate::foundation::core::{Canvas, Point, Rect, Rgba8Premul, SceneId, TimeMs, TrackId};
pub use crate::foundation::error::{DemolineError, DemolineResult};
pub use crate::foundation::math::seeded_random;

pub use crate::editor::{Command, Editor, EditorOpts, SceneConsole};
pub use crate::interact::drag::{DragState, RulerDrag};
pub use crate::interact::geometry::TimelineGeometry;
pub use crate::persist::state::{
    LoadSource, LoadedState, PersistOpts, Persister, ProjectState, export_filename, export_state,
    load_state,
};
pub use crate::persist::store::{
    DirDocuments, DocumentSource, FileStore, KeyValueStore, MemoryStore, NoDocuments,
};
pub use crate::playback::clock::{PlayState, Playback};
pub use crate::playback::keys::{Key, KeyEvent, map_key};
pub use crate::render::pipeline::{FrameReport, RenderOpts, Renderer, SceneOutcome, SceneReport};
pub use crate::render::surface::{BufferRegistry, FrameRGBA};
pub use crate::script::sandbox::{Sandbox, SandboxOpts};
pub use crate::timeline::model::{RenderTarget, Scene, SceneField, Selection, Track, TrackField};
pub use crate::timeline::store::{Timeline, TrackMove};
