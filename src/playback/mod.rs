/// Playhead, duration and the play/pause state machine.
pub mod clock;
/// Keyboard shortcuts.
pub mod keys;
