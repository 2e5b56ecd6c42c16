/// Legacy shape migration on raw JSON.
pub mod migrate;
/// Tracks, scenes, render targets and field patches.
pub mod model;
/// The in-memory timeline store.
pub mod store;
