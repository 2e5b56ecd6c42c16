/// Identifiers, canvas dimensions, colors and time units.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Small numeric helpers shared by the pipeline and the sandbox.
pub mod math;
