//! The `ctx` object handed to scene code: a small Canvas 2D surface over `vello_cpu`.
//!
//! Path points are transformed when they are added, so the current path lives in device
//! space and survives later transform changes, as in the browser API. Rect, text and image
//! draws use the transform current at the call.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::rc::Rc;
use std::sync::Arc;

use rhai::{Dynamic, EvalAltResult, ImmutableString};
use smallvec::SmallVec;
use vello_cpu::kurbo::{self, Affine, BezPath, Point, Rect, Stroke, Vec2};

use crate::render::composite::{image_paint, pixmap_from_premul_bytes, premultiply_rgba8_in_place};
use crate::script::color::{CssColor, parse_css_color};
use crate::script::text::{TextEngine, parse_font_px};

pub(crate) type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

const ARC_TOLERANCE: f64 = 0.1;

/// Gradient geometry in user space.
#[derive(Clone, Debug, PartialEq)]
enum GradientShape {
    Linear { p0: Point, p1: Point },
    Radial { center: Point, radius: f64 },
}

/// A gradient created by `createLinearGradient`/`createRadialGradient`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    shape: GradientShape,
    stops: Vec<(f64, CssColor)>,
}

impl Gradient {
    pub(crate) fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            shape: GradientShape::Linear {
                p0: Point::new(x0, y0),
                p1: Point::new(x1, y1),
            },
            stops: Vec::new(),
        }
    }

    pub(crate) fn radial(x: f64, y: f64, radius: f64) -> Self {
        Self {
            shape: GradientShape::Radial {
                center: Point::new(x, y),
                radius,
            },
            stops: Vec::new(),
        }
    }

    /// Offsets outside `[0, 1]` and unparsable colors are script errors.
    pub(crate) fn add_color_stop(&mut self, offset: f64, color: &str) -> ScriptResult<()> {
        if !(0.0..=1.0).contains(&offset) {
            return Err(format!("color stop offset {offset} is outside [0, 1]").into());
        }
        let c = parse_css_color(color)
            .ok_or_else(|| format!("invalid color stop color \"{color}\""))?;
        let at = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(at, (offset, c));
        Ok(())
    }

    fn param_at(&self, p: Point) -> f64 {
        match self.shape {
            GradientShape::Linear { p0, p1 } => {
                let d = p1 - p0;
                let len2 = d.hypot2();
                if len2 <= f64::EPSILON {
                    0.0
                } else {
                    (p - p0).dot(d) / len2
                }
            }
            GradientShape::Radial { center, radius } => {
                if radius <= 0.0 {
                    1.0
                } else {
                    (p - center).hypot() / radius
                }
            }
        }
    }

    fn color_at(&self, t: f64) -> CssColor {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return CssColor::rgba(0.0, 0.0, 0.0, 0.0);
        };
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let span = o1 - o0;
                let local = if span <= f64::EPSILON {
                    1.0
                } else {
                    (t - o0) / span
                };
                return c0.lerp(c1, local);
            }
        }
        self.stops.last().map_or(first.1, |(_, c)| *c)
    }

    /// Rasterize in device space; `device_to_user` maps pixel centers into gradient space.
    fn rasterize(&self, device_to_user: Affine, w: u16, h: u16) -> ScriptResult<vello_cpu::Image> {
        let (w32, h32) = (u32::from(w), u32::from(h));
        let mut bytes = vec![0u8; (w as usize) * (h as usize) * 4];
        for y in 0..h as usize {
            for x in 0..w as usize {
                let p = device_to_user * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let idx = (y * w as usize + x) * 4;
                bytes[idx..idx + 4].copy_from_slice(&self.color_at(self.param_at(p)).to_rgba8());
            }
        }
        premultiply_rgba8_in_place(&mut bytes);
        let pixmap =
            pixmap_from_premul_bytes(&bytes, w32, h32).map_err(|e| e.to_string())?;
        Ok(image_paint(Arc::new(pixmap)))
    }
}

/// A buffer surface as seen by scene code (`getBuffer` result, `drawImage` source).
#[derive(Clone)]
pub struct BufferImage {
    name: ImmutableString,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl BufferImage {
    pub(crate) fn new(name: &str, pixmap: Arc<vello_cpu::Pixmap>) -> Self {
        Self {
            name: name.into(),
            pixmap,
        }
    }

    /// Buffer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in pixels.
    pub fn width(&self) -> i64 {
        i64::from(self.pixmap.width())
    }

    /// Height in pixels.
    pub fn height(&self) -> i64 {
        i64::from(self.pixmap.height())
    }
}

impl std::fmt::Debug for BufferImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferImage")
            .field("name", &self.name)
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish()
    }
}

/// Buffers visible to one scene invocation, keyed by render-target name.
pub type BufferSnapshot = Rc<BTreeMap<String, BufferImage>>;

#[derive(Clone, Debug)]
enum Style {
    Color(CssColor, ImmutableString),
    Gradient(Gradient),
}

impl Style {
    fn black() -> Self {
        Self::Color(CssColor::BLACK, "#000000".into())
    }

    fn to_dynamic(&self) -> Dynamic {
        match self {
            Self::Color(_, src) => Dynamic::from(src.clone()),
            Self::Gradient(g) => Dynamic::from(g.clone()),
        }
    }

    /// Canvas semantics: unrecognized values leave the style unchanged.
    fn from_dynamic(v: &Dynamic) -> Option<Self> {
        if v.is_string() {
            let s = v.clone().into_immutable_string().ok()?;
            return parse_css_color(&s).map(|c| Self::Color(c, s));
        }
        v.clone().try_cast::<Gradient>().map(Self::Gradient)
    }
}

#[derive(Clone, Debug)]
struct DrawState {
    fill: Style,
    stroke: Style,
    line_width: f64,
    global_alpha: f64,
    font: ImmutableString,
    font_px: f32,
    transform: Affine,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: Style::black(),
            stroke: Style::black(),
            line_width: 1.0,
            global_alpha: 1.0,
            font: "10px sans-serif".into(),
            font_px: 10.0,
            transform: Affine::IDENTITY,
        }
    }
}

enum Paint<'a> {
    Style(&'a Style),
    Image(vello_cpu::Image),
}

struct Inner {
    ctx: Option<vello_cpu::RenderContext>,
    text: Option<TextEngine>,
    width: u16,
    height: u16,
    state: DrawState,
    stack: SmallVec<[DrawState; 8]>,
    path: BezPath,
    current: Option<Point>,
    subpath_start: Option<Point>,
    warned_no_font: bool,
}

/// Drawing context bound to one scene invocation.
///
/// Cheap to clone; clones share the same underlying context.
#[derive(Clone)]
pub struct Canvas2d {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for Canvas2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Canvas2d")
            .field("width", &inner.width)
            .field("height", &inner.height)
            .finish_non_exhaustive()
    }
}

impl Canvas2d {
    /// Wrap a reset render context. The text engine is lent for the invocation.
    pub(crate) fn new(mut ctx: vello_cpu::RenderContext, text: Option<TextEngine>) -> Self {
        ctx.reset();
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        let (width, height) = (ctx.width(), ctx.height());
        Self {
            inner: Rc::new(RefCell::new(Inner {
                ctx: Some(ctx),
                text,
                width,
                height,
                state: DrawState::default(),
                stack: SmallVec::new(),
                path: BezPath::new(),
                current: None,
                subpath_start: None,
                warned_no_font: false,
            })),
        }
    }

    /// Hand the render context and text engine back. Later draws on any clone are no-ops.
    pub(crate) fn finish(&self) -> (Option<vello_cpu::RenderContext>, Option<TextEngine>) {
        let mut inner = self.inner.borrow_mut();
        (inner.ctx.take(), inner.text.take())
    }

    /// Surface width in pixels.
    pub fn width(&self) -> i64 {
        i64::from(self.inner.borrow().width)
    }

    /// Surface height in pixels.
    pub fn height(&self) -> i64 {
        i64::from(self.inner.borrow().height)
    }

    // --- state ---

    fn set_style(&self, fill: bool, v: &Dynamic) {
        if let Some(style) = Style::from_dynamic(v) {
            let mut inner = self.inner.borrow_mut();
            if fill {
                inner.state.fill = style;
            } else {
                inner.state.stroke = style;
            }
        }
    }

    pub(crate) fn set_fill_style(&self, v: &Dynamic) {
        self.set_style(true, v);
    }

    pub(crate) fn set_stroke_style(&self, v: &Dynamic) {
        self.set_style(false, v);
    }

    fn fill_style(&self) -> Dynamic {
        self.inner.borrow().state.fill.to_dynamic()
    }

    fn stroke_style(&self) -> Dynamic {
        self.inner.borrow().state.stroke.to_dynamic()
    }

    pub(crate) fn set_line_width(&self, w: f64) {
        if w.is_finite() && w > 0.0 {
            self.inner.borrow_mut().state.line_width = w;
        }
    }

    pub(crate) fn set_global_alpha(&self, a: f64) {
        if (0.0..=1.0).contains(&a) {
            self.inner.borrow_mut().state.global_alpha = a;
        }
    }

    pub(crate) fn set_font(&self, font: ImmutableString) {
        if let Some(px) = parse_font_px(&font) {
            let mut inner = self.inner.borrow_mut();
            inner.state.font = font;
            inner.state.font_px = px;
        }
    }

    pub(crate) fn save(&self) {
        let mut inner = self.inner.borrow_mut();
        let snapshot = inner.state.clone();
        inner.stack.push(snapshot);
    }

    /// Unbalanced restores are ignored.
    pub(crate) fn restore(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(prev) = inner.stack.pop() {
            inner.state = prev;
        }
    }

    fn post_multiply(&self, a: Affine) {
        let mut inner = self.inner.borrow_mut();
        inner.state.transform *= a;
    }

    pub(crate) fn translate(&self, x: f64, y: f64) {
        self.post_multiply(Affine::translate((x, y)));
    }

    pub(crate) fn rotate(&self, angle: f64) {
        self.post_multiply(Affine::rotate(angle));
    }

    pub(crate) fn scale(&self, sx: f64, sy: f64) {
        self.post_multiply(Affine::scale_non_uniform(sx, sy));
    }

    pub(crate) fn set_transform(&self, coeffs: [f64; 6]) {
        self.inner.borrow_mut().state.transform = Affine::new(coeffs);
    }

    pub(crate) fn reset_transform(&self) {
        self.inner.borrow_mut().state.transform = Affine::IDENTITY;
    }

    // --- paths ---

    pub(crate) fn begin_path(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.path = BezPath::new();
        inner.current = None;
        inner.subpath_start = None;
    }

    pub(crate) fn move_to(&self, x: f64, y: f64) {
        let mut inner = self.inner.borrow_mut();
        let p = inner.state.transform * Point::new(x, y);
        inner.path.move_to(p);
        inner.current = Some(p);
        inner.subpath_start = Some(p);
    }

    /// Ensure a current point exists, starting a subpath at `p` (device space) if not.
    fn ensure_subpath(inner: &mut Inner, p: Point) {
        let after_close = matches!(inner.path.elements().last(), Some(kurbo::PathEl::ClosePath));
        match inner.current {
            None => {
                inner.path.move_to(p);
                inner.current = Some(p);
                inner.subpath_start = Some(p);
            }
            Some(cur) if after_close => inner.path.move_to(cur),
            Some(_) => {}
        }
    }

    pub(crate) fn line_to(&self, x: f64, y: f64) {
        let mut inner = self.inner.borrow_mut();
        let p = inner.state.transform * Point::new(x, y);
        Self::ensure_subpath(&mut inner, p);
        inner.path.line_to(p);
        inner.current = Some(p);
    }

    pub(crate) fn quadratic_curve_to(&self, cx: f64, cy: f64, x: f64, y: f64) {
        let mut inner = self.inner.borrow_mut();
        let t = inner.state.transform;
        let (c, p) = (t * Point::new(cx, cy), t * Point::new(x, y));
        Self::ensure_subpath(&mut inner, c);
        inner.path.quad_to(c, p);
        inner.current = Some(p);
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn bezier_curve_to(&self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let mut inner = self.inner.borrow_mut();
        let t = inner.state.transform;
        let (c1, c2, p) = (
            t * Point::new(c1x, c1y),
            t * Point::new(c2x, c2y),
            t * Point::new(x, y),
        );
        Self::ensure_subpath(&mut inner, c1);
        inner.path.curve_to(c1, c2, p);
        inner.current = Some(p);
    }

    pub(crate) fn arc(
        &self,
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) -> ScriptResult<()> {
        if radius < 0.0 {
            return Err(format!("arc radius {radius} is negative").into());
        }
        let sweep = arc_sweep(start, end, anticlockwise);
        let mut inner = self.inner.borrow_mut();
        let t = inner.state.transform;
        let center = Point::new(x, y);
        let first = t * (center + Vec2::from_angle(start) * radius);
        if inner.current.is_some() {
            Self::ensure_subpath(&mut inner, first);
            inner.path.line_to(first);
        } else {
            Self::ensure_subpath(&mut inner, first);
        }
        let arc = kurbo::Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: sweep,
            x_rotation: 0.0,
        };
        arc.append_iter(ARC_TOLERANCE)
            .for_each(|el| inner.path.push(t * el));
        inner.current = Some(t * (center + Vec2::from_angle(start + sweep) * radius));
        Ok(())
    }

    pub(crate) fn rect(&self, x: f64, y: f64, w: f64, h: f64) {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close_path();
    }

    pub(crate) fn close_path(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.current.is_some() {
            inner.path.close_path();
            inner.current = inner.subpath_start;
        }
    }

    // --- drawing ---

    pub(crate) fn fill(&self) -> ScriptResult<()> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let path = inner.path.clone();
        let fill = inner.state.fill.clone();
        draw_with(inner, Paint::Style(&fill), Affine::IDENTITY, |ctx| {
            ctx.fill_path(&path);
        })
    }

    pub(crate) fn stroke(&self) -> ScriptResult<()> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let path = inner.path.clone();
        let width = inner.state.line_width * inner.state.transform.determinant().abs().sqrt();
        let stroke = inner.state.stroke.clone();
        draw_with(inner, Paint::Style(&stroke), Affine::IDENTITY, |ctx| {
            ctx.set_stroke(Stroke::new(width));
            ctx.stroke_path(&path);
        })
    }

    pub(crate) fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64) -> ScriptResult<()> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let rect = Rect::from_points((x, y), (x + w, y + h));
        let transform = inner.state.transform;
        let fill = inner.state.fill.clone();
        draw_with(inner, Paint::Style(&fill), transform, |ctx| {
            ctx.fill_rect(&rect);
        })
    }

    pub(crate) fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64) -> ScriptResult<()> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let rect = Rect::from_points((x, y), (x + w, y + h));
        let transform = inner.state.transform;
        let width = inner.state.line_width;
        let stroke = inner.state.stroke.clone();
        draw_with(inner, Paint::Style(&stroke), transform, |ctx| {
            ctx.set_stroke(Stroke::new(width));
            ctx.stroke_rect(&rect);
        })
    }

    /// Draw a buffer at `(x, y)`, scaled to `size` when given.
    pub(crate) fn draw_image(
        &self,
        image: &BufferImage,
        x: f64,
        y: f64,
        size: Option<(f64, f64)>,
    ) -> ScriptResult<()> {
        let (bw, bh) = (image.width() as f64, image.height() as f64);
        if bw <= 0.0 || bh <= 0.0 {
            return Ok(());
        }
        let (dw, dh) = size.unwrap_or((bw, bh));
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let transform = inner.state.transform
            * Affine::translate((x, y))
            * Affine::scale_non_uniform(dw / bw, dh / bh);
        let paint = Paint::Image(image_paint(image.pixmap.clone()));
        draw_with(inner, paint, transform, |ctx| {
            ctx.fill_rect(&Rect::new(0.0, 0.0, bw, bh));
        })
    }

    /// Fill text with its baseline at `(x, y)`. Without a configured font nothing is drawn.
    pub(crate) fn fill_text(&self, text: &str, x: f64, y: f64) -> ScriptResult<()> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let Some(mut engine) = inner.text.take() else {
            if !inner.warned_no_font {
                inner.warned_no_font = true;
                tracing::debug!("fillText ignored: no font configured");
            }
            return Ok(());
        };
        let out = match engine.layout_line(text, inner.state.font_px) {
            Ok(line) => {
                let transform = inner.state.transform * line.origin(x, y);
                let fill = inner.state.fill.clone();
                draw_with(inner, Paint::Style(&fill), transform, |ctx| {
                    engine.fill_glyphs(ctx, &line);
                })
            }
            Err(e) => Err(e.to_string().into()),
        };
        inner.text = Some(engine);
        out
    }
}

/// Set up paint, transform and global alpha on the shared context, then run `op`.
///
/// `geometry` is the transform the geometry in `op` is expressed in; gradients are mapped so
/// they stay in the user space current at the call.
fn draw_with(
    inner: &mut Inner,
    paint: Paint<'_>,
    geometry: Affine,
    op: impl FnOnce(&mut vello_cpu::RenderContext),
) -> ScriptResult<()> {
    let alpha = inner.state.global_alpha;
    let user = inner.state.transform;
    let (w, h) = (inner.width, inner.height);
    let Some(ctx) = inner.ctx.as_mut() else {
        return Ok(());
    };
    if alpha <= 0.0 {
        return Ok(());
    }
    ctx.set_transform(geometry);
    match paint {
        Paint::Style(Style::Color(c, _)) => {
            let [r, g, b, a] = c.to_rgba8();
            ctx.set_paint_transform(Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        }
        Paint::Style(Style::Gradient(grad)) => {
            let img = grad.rasterize(user.inverse(), w, h)?;
            ctx.set_paint_transform(geometry.inverse());
            ctx.set_paint(img);
        }
        Paint::Image(img) => {
            ctx.set_paint_transform(Affine::IDENTITY);
            ctx.set_paint(img);
        }
    }
    if alpha < 1.0 {
        ctx.push_opacity_layer(alpha as f32);
    }
    op(ctx);
    if alpha < 1.0 {
        ctx.pop_layer();
    }
    Ok(())
}

/// Signed sweep for `arc`, following the Canvas rules for direction and full turns.
fn arc_sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    let d = end - start;
    if !anticlockwise {
        if d >= TAU { TAU } else { d.rem_euclid(TAU) }
    } else if d <= -TAU {
        -TAU
    } else {
        -(-d).rem_euclid(TAU)
    }
}

fn num(v: &Dynamic) -> ScriptResult<f64> {
    if let Ok(f) = v.as_float() {
        return Ok(f);
    }
    if let Ok(i) = v.as_int() {
        return Ok(i as f64);
    }
    Err(format!("expected a number, got {}", v.type_name()).into())
}

/// Register the canvas types and methods on a scripting engine.
pub(crate) fn register(engine: &mut rhai::Engine) {
    engine
        .register_type_with_name::<Canvas2d>("CanvasContext")
        .register_type_with_name::<Gradient>("CanvasGradient")
        .register_type_with_name::<BufferImage>("Buffer");

    engine
        .register_get("width", |c: &mut Canvas2d| c.width())
        .register_get("height", |c: &mut Canvas2d| c.height())
        .register_get_set(
            "fillStyle",
            |c: &mut Canvas2d| c.fill_style(),
            |c: &mut Canvas2d, v: Dynamic| c.set_fill_style(&v),
        )
        .register_get_set(
            "strokeStyle",
            |c: &mut Canvas2d| c.stroke_style(),
            |c: &mut Canvas2d, v: Dynamic| c.set_stroke_style(&v),
        )
        .register_get("lineWidth", |c: &mut Canvas2d| {
            c.inner.borrow().state.line_width
        })
        .register_set("lineWidth", |c: &mut Canvas2d, v: Dynamic| -> ScriptResult<()> {
            c.set_line_width(num(&v)?);
            Ok(())
        })
        .register_get("globalAlpha", |c: &mut Canvas2d| {
            c.inner.borrow().state.global_alpha
        })
        .register_set("globalAlpha", |c: &mut Canvas2d, v: Dynamic| -> ScriptResult<()> {
            c.set_global_alpha(num(&v)?);
            Ok(())
        })
        .register_get_set(
            "font",
            |c: &mut Canvas2d| c.inner.borrow().state.font.clone(),
            |c: &mut Canvas2d, v: ImmutableString| c.set_font(v),
        );

    engine
        .register_fn("save", |c: &mut Canvas2d| c.save())
        .register_fn("restore", |c: &mut Canvas2d| c.restore())
        .register_fn("translate", |c: &mut Canvas2d, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            c.translate(num(&x)?, num(&y)?);
            Ok(())
        })
        .register_fn("rotate", |c: &mut Canvas2d, a: Dynamic| -> ScriptResult<()> {
            c.rotate(num(&a)?);
            Ok(())
        })
        .register_fn("scale", |c: &mut Canvas2d, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            c.scale(num(&x)?, num(&y)?);
            Ok(())
        })
        .register_fn(
            "setTransform",
            |c: &mut Canvas2d,
             a: Dynamic,
             b: Dynamic,
             cc: Dynamic,
             d: Dynamic,
             e: Dynamic,
             f: Dynamic|
             -> ScriptResult<()> {
                c.set_transform([num(&a)?, num(&b)?, num(&cc)?, num(&d)?, num(&e)?, num(&f)?]);
                Ok(())
            },
        )
        .register_fn("resetTransform", |c: &mut Canvas2d| c.reset_transform());

    engine
        .register_fn("beginPath", |c: &mut Canvas2d| c.begin_path())
        .register_fn("closePath", |c: &mut Canvas2d| c.close_path())
        .register_fn("moveTo", |c: &mut Canvas2d, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            c.move_to(num(&x)?, num(&y)?);
            Ok(())
        })
        .register_fn("lineTo", |c: &mut Canvas2d, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            c.line_to(num(&x)?, num(&y)?);
            Ok(())
        })
        .register_fn(
            "quadraticCurveTo",
            |c: &mut Canvas2d, cx: Dynamic, cy: Dynamic, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
                c.quadratic_curve_to(num(&cx)?, num(&cy)?, num(&x)?, num(&y)?);
                Ok(())
            },
        )
        .register_fn(
            "bezierCurveTo",
            |c: &mut Canvas2d,
             c1x: Dynamic,
             c1y: Dynamic,
             c2x: Dynamic,
             c2y: Dynamic,
             x: Dynamic,
             y: Dynamic|
             -> ScriptResult<()> {
                c.bezier_curve_to(
                    num(&c1x)?,
                    num(&c1y)?,
                    num(&c2x)?,
                    num(&c2y)?,
                    num(&x)?,
                    num(&y)?,
                );
                Ok(())
            },
        )
        .register_fn(
            "arc",
            |c: &mut Canvas2d, x: Dynamic, y: Dynamic, r: Dynamic, s: Dynamic, e: Dynamic| -> ScriptResult<()> {
                c.arc(num(&x)?, num(&y)?, num(&r)?, num(&s)?, num(&e)?, false)
            },
        )
        .register_fn(
            "arc",
            |c: &mut Canvas2d,
             x: Dynamic,
             y: Dynamic,
             r: Dynamic,
             s: Dynamic,
             e: Dynamic,
             ccw: bool|
             -> ScriptResult<()> { c.arc(num(&x)?, num(&y)?, num(&r)?, num(&s)?, num(&e)?, ccw) },
        )
        .register_fn(
            "rect",
            |c: &mut Canvas2d, x: Dynamic, y: Dynamic, w: Dynamic, h: Dynamic| -> ScriptResult<()> {
                c.rect(num(&x)?, num(&y)?, num(&w)?, num(&h)?);
                Ok(())
            },
        )
        .register_fn("fill", |c: &mut Canvas2d| c.fill())
        .register_fn("stroke", |c: &mut Canvas2d| c.stroke());

    engine
        .register_fn(
            "fillRect",
            |c: &mut Canvas2d, x: Dynamic, y: Dynamic, w: Dynamic, h: Dynamic| -> ScriptResult<()> {
                c.fill_rect(num(&x)?, num(&y)?, num(&w)?, num(&h)?)
            },
        )
        .register_fn(
            "strokeRect",
            |c: &mut Canvas2d, x: Dynamic, y: Dynamic, w: Dynamic, h: Dynamic| -> ScriptResult<()> {
                c.stroke_rect(num(&x)?, num(&y)?, num(&w)?, num(&h)?)
            },
        )
        .register_fn(
            "fillText",
            |c: &mut Canvas2d, text: ImmutableString, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
                c.fill_text(&text, num(&x)?, num(&y)?)
            },
        )
        .register_fn(
            "drawImage",
            |c: &mut Canvas2d, img: BufferImage, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
                c.draw_image(&img, num(&x)?, num(&y)?, None)
            },
        )
        .register_fn(
            "drawImage",
            |c: &mut Canvas2d,
             img: BufferImage,
             x: Dynamic,
             y: Dynamic,
             w: Dynamic,
             h: Dynamic|
             -> ScriptResult<()> {
                c.draw_image(&img, num(&x)?, num(&y)?, Some((num(&w)?, num(&h)?)))
            },
        );

    engine
        .register_fn(
            "createLinearGradient",
            |_: &mut Canvas2d, x0: Dynamic, y0: Dynamic, x1: Dynamic, y1: Dynamic| -> ScriptResult<Gradient> {
                Ok(Gradient::linear(num(&x0)?, num(&y0)?, num(&x1)?, num(&y1)?))
            },
        )
        .register_fn(
            "createRadialGradient",
            |_: &mut Canvas2d, x: Dynamic, y: Dynamic, r: Dynamic| -> ScriptResult<Gradient> {
                Ok(Gradient::radial(num(&x)?, num(&y)?, num(&r)?))
            },
        )
        .register_fn(
            "addColorStop",
            |g: &mut Gradient, offset: Dynamic, color: ImmutableString| -> ScriptResult<()> {
                g.add_color_stop(num(&offset)?, &color)
            },
        );

    engine
        .register_get("width", |b: &mut BufferImage| b.width())
        .register_get("height", |b: &mut BufferImage| b.height())
        .register_get("name", |b: &mut BufferImage| b.name.clone());
}

#[cfg(test)]
#[path = "../../tests/unit/script/canvas2d.rs"]
mod tests;
