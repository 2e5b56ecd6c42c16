use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{DemolineError, DemolineResult};
use crate::render::composite::clear_pixmap;
use crate::script::canvas2d::{BufferImage, BufferSnapshot};

/// Rendered frame in RGBA8 format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixels, four bytes each.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// The visible output surface.
pub(crate) struct MainSurface {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) pixmap: vello_cpu::Pixmap,
}

impl MainSurface {
    pub(crate) fn new(canvas: Canvas) -> DemolineResult<Self> {
        let (width, height) = canvas.size_u16()?;
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Recreate the pixmap when the canvas size changed, then clear it.
    pub(crate) fn begin_frame(&mut self, canvas: Canvas, background: [u8; 4]) -> DemolineResult<()> {
        let (w, h) = canvas.size_u16()?;
        if w != self.width || h != self.height {
            *self = Self::new(canvas)?;
        }
        clear_pixmap(&mut self.pixmap, background);
        Ok(())
    }

    pub(crate) fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

/// Named offscreen surfaces, created lazily at canvas size and kept for the session.
#[derive(Default)]
pub struct BufferRegistry {
    buffers: BTreeMap<String, Arc<vello_cpu::Pixmap>>,
    cleared: BTreeSet<String>,
    resize_on_mismatch: bool,
}

impl std::fmt::Debug for BufferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferRegistry")
            .field("buffers", &self.buffers.keys().collect::<Vec<_>>())
            .field("resize_on_mismatch", &self.resize_on_mismatch)
            .finish()
    }
}

impl BufferRegistry {
    /// Empty registry with the given resize policy.
    pub fn new(resize_on_mismatch: bool) -> Self {
        Self {
            resize_on_mismatch,
            ..Self::default()
        }
    }

    /// Forget which buffers were cleared; the next `acquire` of each clears it again.
    pub(crate) fn begin_frame(&mut self) {
        self.cleared.clear();
    }

    /// Surface for `name`, created on first reference and cleared to `clear` once per frame.
    pub(crate) fn acquire(
        &mut self,
        name: &str,
        canvas: Canvas,
        clear: [u8; 4],
    ) -> DemolineResult<&mut vello_cpu::Pixmap> {
        let (w, h) = canvas.size_u16()?;
        let stale = self
            .buffers
            .get(name)
            .is_some_and(|pm| pm.width() != w || pm.height() != h);
        if stale && self.resize_on_mismatch {
            tracing::debug!(buffer = name, width = w, height = h, "buffer resized");
            self.buffers.remove(name);
        }
        if !self.buffers.contains_key(name) {
            tracing::debug!(buffer = name, width = w, height = h, "buffer created");
            self.buffers
                .insert(name.to_owned(), Arc::new(vello_cpu::Pixmap::new(w, h)));
        }
        let first_use = self.cleared.insert(name.to_owned());
        let pixmap = self
            .buffers
            .get_mut(name)
            .ok_or_else(|| DemolineError::render(format!("buffer '{name}' missing")))?;
        let pixmap = Arc::make_mut(pixmap);
        if first_use {
            clear_pixmap(pixmap, clear);
        }
        Ok(pixmap)
    }

    /// Buffer pixels by name.
    pub fn get(&self, name: &str) -> Option<&vello_cpu::Pixmap> {
        self.buffers.get(name).map(|pm| pm.as_ref())
    }

    /// Names of existing buffers.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no buffer exists yet.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Every buffer that exists right now, shared without copying pixels.
    pub fn snapshot(&self) -> BufferSnapshot {
        Rc::new(
            self.buffers
                .iter()
                .map(|(name, pm)| (name.clone(), BufferImage::new(name, Arc::clone(pm))))
                .collect(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
