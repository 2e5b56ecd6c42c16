/// Persisted blob, load order, debounced writes and export.
pub mod state;
/// Key-value store and document source collaborators.
pub mod store;
