/// The `ctx` drawing capability.
pub mod canvas2d;
/// CSS color strings.
pub mod color;
/// Engine setup, compile cache and invocation.
pub mod sandbox;
/// Font registration and glyph layout for `fillText`.
pub mod text;
