/// Premultiplied RGBA8 pixel helpers.
pub mod composite;
/// Frame rendering and scene fault reports.
pub mod pipeline;
/// Main surface, offscreen buffers and frame output.
pub mod surface;
