use crate::editor::Command;
use crate::foundation::core::TimeMs;
use crate::playback::clock::Playback;
use crate::timeline::store::Timeline;

/// Arrow-key step size.
pub const STEP_MS: i64 = 1_000;
/// A playhead within this distance of a boundary jumps past it.
pub const BOUNDARY_THRESHOLD_MS: i64 = 100;

/// Keys the editor reacts to. Names follow DOM `KeyboardEvent.code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Key {
    /// Space bar.
    Space,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    #[serde(other)]
    /// Any other key.
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// One key press with the modifier and focus context the shortcuts need.
pub struct KeyEvent {
    /// Key pressed.
    pub key: Key,
    #[serde(default)]
    /// Shift held.
    pub shift: bool,
    /// Keystrokes typed into a text field never reach the shortcuts.
    #[serde(default)]
    pub focus_in_text_input: bool,
}

impl KeyEvent {
    /// Unmodified press outside a text field.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            focus_in_text_input: false,
        }
    }

    /// Mark Shift as held.
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Translate a key press into an editor command.
pub fn map_key(event: &KeyEvent, timeline: &Timeline, playback: &Playback) -> Option<Command> {
    if event.focus_in_text_input {
        return None;
    }
    match (event.key, event.shift) {
        (Key::Space, _) => Some(Command::TogglePlayback),
        (Key::ArrowLeft, false) => Some(Command::Step { delta: -STEP_MS }),
        (Key::ArrowRight, false) => Some(Command::Step { delta: STEP_MS }),
        (Key::ArrowLeft, true) => {
            let limit = as_signed(playback.current_time()) - BOUNDARY_THRESHOLD_MS;
            let target = timeline
                .scene_boundaries()
                .starts
                .into_iter()
                .rev()
                .find(|s| as_signed(*s) < limit)
                .unwrap_or(0);
            Some(Command::Seek {
                time: as_signed(target),
            })
        }
        (Key::ArrowRight, true) => {
            let limit = as_signed(playback.current_time()) + BOUNDARY_THRESHOLD_MS;
            let target = timeline
                .scene_boundaries()
                .ends
                .into_iter()
                .find(|e| as_signed(*e) > limit)
                .unwrap_or(playback.duration());
            Some(Command::Seek {
                time: as_signed(target),
            })
        }
        (Key::Other, _) => None,
    }
}

fn as_signed(t: TimeMs) -> i64 {
    i64::try_from(t).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/keys.rs"]
mod tests;
