use std::collections::BTreeSet;
use std::sync::Arc;

use rhai::{Dynamic, ImmutableString};

use crate::foundation::core::{Canvas, SceneId, TimeMs, TrackId};
use crate::foundation::error::DemolineResult;
use crate::render::composite::{clear_pixmap_to_transparent, premul_over_in_place, premul_rgba8};
use crate::render::surface::{BufferRegistry, FrameRGBA, MainSurface};
use crate::script::canvas2d::Canvas2d;
use crate::script::sandbox::{Sandbox, SandboxOpts, SceneCall};
use crate::script::text::TextEngine;
use crate::timeline::model::{RenderTarget, Scene, Track};
use crate::timeline::store::Timeline;

const OVERLAY_FILL: &str = "rgba(180, 0, 0, 0.85)";
const OVERLAY_TEXT: &str = "#ffffff";
const OVERLAY_FONT_PX: f64 = 12.0;
const OVERLAY_LINE_PX: f64 = 16.0;
const OVERLAY_PAD_PX: f64 = 6.0;

/// Renderer configuration.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Straight-alpha RGBA8 the main surface and buffers are cleared to.
    pub background_rgba: [u8; 4],
    /// Draw the fault banner on the main surface.
    pub overlay: bool,
    /// Recreate buffers whose size no longer matches the canvas.
    pub resize_buffers_on_canvas_change: bool,
    /// Font used by `fillText` and the fault banner. Text is skipped without one.
    pub font_bytes: Option<Arc<Vec<u8>>>,
    /// Limits for scene programs.
    pub sandbox: SandboxOpts,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            background_rgba: [0, 0, 0, 255],
            overlay: true,
            resize_buffers_on_canvas_change: true,
            font_bytes: None,
            sandbox: SandboxOpts::default().with_env_overrides(),
        }
    }
}

impl RenderOpts {
    /// Set the clear color.
    pub fn with_background(mut self, rgba: [u8; 4]) -> Self {
        self.background_rgba = rgba;
        self
    }

    /// Enable or disable the fault banner.
    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    /// Set the buffer resize policy.
    pub fn with_resize_buffers(mut self, resize: bool) -> Self {
        self.resize_buffers_on_canvas_change = resize;
        self
    }

    /// Set the font used for text.
    pub fn with_font_bytes(mut self, bytes: Arc<Vec<u8>>) -> Self {
        self.font_bytes = Some(bytes);
        self
    }

    /// Set the scene program limits.
    pub fn with_sandbox(mut self, sandbox: SandboxOpts) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// What happened to one active scene during a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneOutcome {
    /// The scene ran to completion.
    Ok,
    /// The code does not compile; the scene was not run.
    CompileError(String),
    /// The code raised during this frame.
    RuntimeError(String),
}

impl SceneOutcome {
    /// Fault message, or `None` for `Ok`.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::CompileError(m) | Self::RuntimeError(m) => Some(m.as_str()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Outcome of one active scene.
pub struct SceneReport {
    /// Owning track.
    pub track: TrackId,
    /// Track name at render time.
    pub track_name: String,
    /// Scene id.
    pub scene: SceneId,
    /// Scene name at render time.
    pub scene_name: String,
    /// What happened.
    pub outcome: SceneOutcome,
}

impl SceneReport {
    fn banner_line(&self) -> Option<String> {
        let msg = self.outcome.message()?;
        Some(format!("{} / {}: {msg}", self.track_name, self.scene_name))
    }
}

/// Per-scene results of one frame, in paint order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Playhead time of the frame.
    pub time: TimeMs,
    /// One entry per active scene.
    pub scenes: Vec<SceneReport>,
}

impl FrameReport {
    /// Reports of scenes that faulted.
    pub fn faults(&self) -> impl Iterator<Item = &SceneReport> {
        self.scenes
            .iter()
            .filter(|r| r.outcome != SceneOutcome::Ok)
    }

    /// Whether any scene faulted.
    pub fn has_faults(&self) -> bool {
        self.faults().next().is_some()
    }

    /// Outcome of `scene`, if it was active.
    pub fn outcome(&self, scene: SceneId) -> Option<&SceneOutcome> {
        self.scenes
            .iter()
            .find(|r| r.scene == scene)
            .map(|r| &r.outcome)
    }

    /// Record the outcomes on the scenes. Successful runs clear `runtimeError`; compile
    /// failures set `hasError` until the code changes.
    pub fn apply(&self, timeline: &mut Timeline) {
        for r in &self.scenes {
            match &r.outcome {
                SceneOutcome::Ok => timeline.set_runtime_fault(r.track, r.scene, None),
                SceneOutcome::RuntimeError(msg) => {
                    timeline.set_runtime_fault(r.track, r.scene, Some(msg.clone()));
                }
                SceneOutcome::CompileError(msg) => {
                    let already = timeline
                        .scene(r.track, r.scene)
                        .is_some_and(|s| s.has_error);
                    if !already {
                        timeline.set_compile_fault(r.track, r.scene, Some(msg.clone()));
                    }
                }
            }
        }
    }
}

/// Draws one frame of a timeline at a given time.
///
/// Owns the main surface, the buffer registry and the scripting engine. The timeline is only
/// read; scene faults come back in the [`FrameReport`].
pub struct Renderer {
    opts: RenderOpts,
    sandbox: Sandbox,
    text: Option<TextEngine>,
    main: Option<MainSurface>,
    buffers: BufferRegistry,
    ctx: Option<vello_cpu::RenderContext>,
    scratch: Option<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("opts", &self.opts)
            .field("buffers", &self.buffers)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Build a renderer; fails when the configured font cannot be loaded.
    pub fn new(opts: RenderOpts) -> DemolineResult<Self> {
        let text = opts
            .font_bytes
            .as_ref()
            .map(TextEngine::from_font_bytes)
            .transpose()?;
        Ok(Self {
            sandbox: Sandbox::new(opts.sandbox),
            buffers: BufferRegistry::new(opts.resize_buffers_on_canvas_change),
            text,
            main: None,
            ctx: None,
            scratch: None,
            opts,
        })
    }

    /// Renderer settings.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Offscreen buffers as of the last frame.
    pub fn buffers(&self) -> &BufferRegistry {
        &self.buffers
    }

    /// Compile `code` without running it. The error is the parser's message.
    pub fn check_code(&self, code: &str) -> Result<(), String> {
        self.sandbox.compile(code).map(|_| ())
    }

    /// Render the frame at `time`. Every frame is computed from scratch, except that buffers
    /// not yet drawn this frame still hold their previous content.
    #[tracing::instrument(skip(self, timeline), fields(tracks = timeline.tracks().len()))]
    pub fn render_frame(
        &mut self,
        timeline: &Timeline,
        canvas: Canvas,
        time: TimeMs,
    ) -> DemolineResult<(FrameRGBA, FrameReport)> {
        canvas.validate()?;
        let background = premul_rgba8(self.opts.background_rgba);
        if self.main.is_none() {
            self.main = Some(MainSurface::new(canvas)?);
        }
        if let Some(main) = self.main.as_mut() {
            main.begin_frame(canvas, background)?;
        }
        self.buffers.begin_frame();

        let mut report = FrameReport {
            time,
            scenes: Vec::new(),
        };
        for track in timeline.render_order() {
            let Some(scene) = track.active_scene(time) else {
                continue;
            };
            if let RenderTarget::Buffer(name) = &track.render_target {
                self.buffers.acquire(name, canvas, background)?;
            }
            let outcome = self.run_scene(track, scene, canvas, time)?;
            if let Some(msg) = outcome.message() {
                tracing::warn!(track = %track.id, scene = %scene.id, error = %msg, "scene fault");
            }
            report.scenes.push(SceneReport {
                track: track.id,
                track_name: track.name.clone(),
                scene: scene.id,
                scene_name: scene.name.clone(),
                outcome,
            });
        }

        let live: BTreeSet<SceneId> = timeline
            .tracks()
            .iter()
            .flat_map(|t| t.scenes.iter().map(|s| s.id))
            .collect();
        self.sandbox.retain_scenes(|id| live.contains(&id));

        if self.opts.overlay && report.has_faults() {
            self.draw_overlay(&report)?;
        }

        let frame = self
            .main
            .as_ref()
            .map(MainSurface::to_frame)
            .unwrap_or_else(|| FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: vec![0; canvas.byte_len()],
                premultiplied: true,
            });
        Ok((frame, report))
    }

    fn run_scene(
        &mut self,
        track: &Track,
        scene: &Scene,
        canvas: Canvas,
        time: TimeMs,
    ) -> DemolineResult<SceneOutcome> {
        if scene.has_error {
            let msg = scene
                .error_message
                .clone()
                .unwrap_or_else(|| "syntax error".to_owned());
            return Ok(SceneOutcome::CompileError(msg));
        }
        let compiled = match self.sandbox.compile_cached(scene.id, &scene.code) {
            Ok(c) => c,
            Err(msg) => return Ok(SceneOutcome::CompileError(msg)),
        };

        let (w, h) = match &track.render_target {
            RenderTarget::Main => canvas.size_u16()?,
            RenderTarget::Buffer(name) => self
                .buffers
                .get(name)
                .map(|pm| (pm.width(), pm.height()))
                .map_or_else(|| canvas.size_u16(), Ok)?,
        };
        let ctx = self.take_context(w, h);
        let ctx2d = Canvas2d::new(ctx, self.text.take());
        let call = SceneCall {
            canvas: ctx2d.clone(),
            local_time: time.saturating_sub(scene.start_time) as f64,
            width: i64::from(w),
            height: i64::from(h),
            scene_start: scene.start_time as i64,
            scene_end: scene.end_time as i64,
            buffers: self.buffers.snapshot(),
        };
        let result = self.sandbox.invoke(&compiled, call);
        let (ctx, text) = ctx2d.finish();
        self.text = text;

        // Whatever was drawn before a runtime failure stays on the surface.
        if let Some(ctx) = ctx {
            self.composite(ctx, &track.render_target, canvas)?;
        }
        Ok(match result {
            Ok(()) => SceneOutcome::Ok,
            Err(msg) => SceneOutcome::RuntimeError(msg),
        })
    }

    fn take_context(&mut self, w: u16, h: u16) -> vello_cpu::RenderContext {
        match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        }
    }

    /// Rasterize into the scratch pixmap and source-over it onto the target surface.
    fn composite(
        &mut self,
        mut ctx: vello_cpu::RenderContext,
        target: &RenderTarget,
        canvas: Canvas,
    ) -> DemolineResult<()> {
        let (w, h) = (ctx.width(), ctx.height());
        let scratch = match self.scratch.take() {
            Some(mut pm) if pm.width() == w && pm.height() == h => {
                clear_pixmap_to_transparent(&mut pm);
                pm
            }
            _ => vello_cpu::Pixmap::new(w, h),
        };
        let mut scratch = scratch;
        ctx.flush();
        ctx.render_to_pixmap(&mut scratch);

        let background = premul_rgba8(self.opts.background_rgba);
        let dst = match target {
            RenderTarget::Main => self.main.as_mut().map(|m| &mut m.pixmap),
            RenderTarget::Buffer(name) => Some(self.buffers.acquire(name, canvas, background)?),
        };
        if let Some(dst) = dst {
            premul_over_in_place(dst.data_as_u8_slice_mut(), scratch.data_as_u8_slice())?;
        }
        self.scratch = Some(scratch);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn draw_overlay(&mut self, report: &FrameReport) -> DemolineResult<()> {
        let lines: Vec<String> = report.faults().filter_map(SceneReport::banner_line).collect();
        let Some(main) = self.main.as_ref() else {
            return Ok(());
        };
        let (w, h) = (main.width, main.height);
        let ctx = self.take_context(w, h);
        let c = Canvas2d::new(ctx, self.text.take());
        let banner_h = OVERLAY_PAD_PX * 2.0 + OVERLAY_LINE_PX * lines.len() as f64;

        let style = |s: &str| Dynamic::from(ImmutableString::from(s));
        c.set_fill_style(&style(OVERLAY_FILL));
        let mut drawn = c.fill_rect(0.0, 0.0, f64::from(w), banner_h);
        c.set_fill_style(&style(OVERLAY_TEXT));
        c.set_font(format!("{OVERLAY_FONT_PX}px sans-serif").into());
        for (i, line) in lines.iter().enumerate() {
            let y = OVERLAY_PAD_PX + OVERLAY_LINE_PX * (i as f64 + 1.0) - 4.0;
            drawn = drawn.and_then(|()| c.fill_text(line, OVERLAY_PAD_PX, y));
        }
        let (ctx, text) = c.finish();
        self.text = text;
        if let Err(e) = drawn {
            tracing::debug!(error = %e, "fault banner incomplete");
        }
        if let Some(ctx) = ctx {
            self.composite(ctx, &RenderTarget::Main, Canvas::new(u32::from(w), u32::from(h))?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
