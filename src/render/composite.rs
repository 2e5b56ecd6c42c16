//! Premultiplied RGBA8 pixel helpers shared by surfaces, the canvas and the overlay.

use std::sync::Arc;

use crate::foundation::error::{DemolineError, DemolineResult};
use crate::foundation::math::mul_div255_u8;

/// Fill every pixel with an already-premultiplied color.
pub(crate) fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, premul: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&premul);
    }
}

pub(crate) fn clear_pixmap_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

/// Straight RGBA8 to premultiplied RGBA8.
pub(crate) fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| mul_div255_u8(u16::from(c), a16);
    [premul(r), premul(g), premul(b), a]
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let [r, g, b, _] = premul_rgba8([px[0], px[1], px[2], px[3]]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

/// Source-over of `src` onto `dst`, both premultiplied and the same size.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> DemolineResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(DemolineError::render(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - sa;
        for c in 0..4 {
            d[c] = s[c].saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

/// Wrap premultiplied bytes as a `vello_cpu` pixmap.
pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> DemolineResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| DemolineError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| DemolineError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(DemolineError::render("pixmap byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, false))
}

/// Image paint sampling a shared pixmap.
pub(crate) fn image_paint(pixmap: Arc<vello_cpu::Pixmap>) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(pixmap),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
