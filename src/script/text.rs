use std::sync::Arc;

use vello_cpu::kurbo::Affine;

use crate::foundation::error::{DemolineError, DemolineResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Brush slot required by Parley; color comes from the canvas paint instead.
pub(crate) struct TextBrushRgba8;

/// Parley layout over one registered font, plus the font handle used for glyph runs.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    /// Register `font_bytes` and keep its first family for every layout.
    pub fn from_font_bytes(font_bytes: &Arc<Vec<u8>>) -> DemolineResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            DemolineError::script("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| DemolineError::script("registered font family has no name"))?
            .to_string();
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
            0,
        );
        tracing::debug!(family = %family_name, "font registered");
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// Family name of the registered font.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(&mut self, text: &str, size_px: f32) -> DemolineResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(DemolineError::validation("font size must be finite and > 0"));
        }
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Shape a single run of text at `size_px`.
    pub(crate) fn layout_line(&mut self, text: &str, size_px: f32) -> DemolineResult<TextLine> {
        let layout = self.layout(text, size_px)?;
        let baseline = layout
            .lines()
            .next()
            .map(|l| f64::from(l.metrics().baseline))
            .unwrap_or(0.0);
        Ok(TextLine { layout, baseline })
    }

    /// Emit glyph runs for `line` with the context's current transform and paint.
    pub(crate) fn fill_glyphs(&self, ctx: &mut vello_cpu::RenderContext, line: &TextLine) {
        for l in line.layout.lines() {
            for item in l.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}

/// Laid-out text with the distance from its top edge to the first baseline.
pub(crate) struct TextLine {
    layout: parley::Layout<TextBrushRgba8>,
    pub(crate) baseline: f64,
}

impl TextLine {
    /// Origin offset that puts the first baseline at `(x, y)`.
    pub(crate) fn origin(&self, x: f64, y: f64) -> Affine {
        Affine::translate((x, y - self.baseline))
    }
}

/// Pixel size out of a CSS font shorthand such as `"bold 24px sans-serif"`.
pub fn parse_font_px(font: &str) -> Option<f32> {
    font.split_whitespace()
        .filter_map(|tok| tok.strip_suffix("px"))
        .find_map(|n| n.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/script/text.rs"]
mod tests;
