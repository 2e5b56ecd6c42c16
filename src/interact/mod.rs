/// Scene dragging and ruler scrubbing.
pub mod drag;
/// Pixel layout and hit testing of the timeline panel.
pub mod geometry;
