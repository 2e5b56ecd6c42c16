use std::time::{Duration, Instant};

use crate::foundation::core::TimeMs;

/// Timeline length before any scene extends it.
pub const DEFAULT_DURATION_MS: TimeMs = 10_000;
/// Space kept after the latest scene end when the duration grows.
pub const DURATION_HEADROOM_MS: TimeMs = 1_000;

/// The two playback states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    /// Playhead is still.
    Paused,
    /// Playhead advances with the wall clock.
    Playing,
}

/// Playhead position, timeline duration and the play/pause state machine.
///
/// `current_time` is kept in `[0, duration]` by every operation.
#[derive(Clone, Debug)]
pub struct Playback {
    current_time: TimeMs,
    duration: TimeMs,
    state: PlayState,
    reference: Option<Instant>,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS)
    }
}

impl Playback {
    /// Paused at zero with the given duration.
    pub fn new(duration: TimeMs) -> Self {
        Self {
            current_time: 0,
            duration,
            state: PlayState::Paused,
            reference: None,
        }
    }

    /// Playhead position.
    pub fn current_time(&self) -> TimeMs {
        self.current_time
    }

    /// Timeline length.
    pub fn duration(&self) -> TimeMs {
        self.duration
    }

    /// Play/pause state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Move the playhead, silently clamping to `[0, duration]`.
    pub fn seek_to(&mut self, time: i64) -> TimeMs {
        let max = i64::try_from(self.duration).unwrap_or(i64::MAX);
        // Clamped into [0, max], so the cast back is lossless.
        self.current_time = time.clamp(0, max) as TimeMs;
        tracing::trace!(time = self.current_time, "seek");
        self.current_time
    }

    /// `seek_to(current_time + delta)`.
    pub fn step(&mut self, delta: i64) -> TimeMs {
        let now = i64::try_from(self.current_time).unwrap_or(i64::MAX);
        self.seek_to(now.saturating_add(delta))
    }

    /// Advance by `elapsed_ms` while playing. Reaching the end clamps and pauses.
    ///
    /// Returns `true` when the playhead moved.
    pub fn tick(&mut self, elapsed_ms: u64) -> bool {
        if !self.is_playing() {
            return false;
        }
        let before = self.current_time;
        let next = self.current_time.saturating_add(elapsed_ms);
        if next >= self.duration {
            self.current_time = self.duration;
            self.pause();
        } else {
            self.current_time = next;
        }
        self.current_time != before
    }

    /// Feed a wall-clock instant; converts the time since the last reference into whole
    /// milliseconds and moves the reference by exactly that much.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(reference) = self.reference else {
            return false;
        };
        let elapsed = now.saturating_duration_since(reference);
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return false;
        }
        self.reference = Some(reference + Duration::from_millis(ms));
        self.tick(ms)
    }

    /// Flip between playing and paused. Returns the new playing flag.
    pub fn toggle(&mut self, now: Instant) -> bool {
        match self.state {
            PlayState::Playing => self.pause(),
            PlayState::Paused => {
                self.state = PlayState::Playing;
                self.reference = Some(now);
                tracing::debug!(from = self.current_time, "play");
            }
        }
        self.is_playing()
    }

    fn pause(&mut self) {
        self.state = PlayState::Paused;
        self.reference = None;
        tracing::debug!(at = self.current_time, "pause");
    }

    /// Grow the duration to fit `max_scene_end` plus headroom. Never shrinks.
    pub fn recompute_duration(&mut self, max_scene_end: TimeMs) -> TimeMs {
        let wanted = max_scene_end.saturating_add(DURATION_HEADROOM_MS);
        if wanted > self.duration {
            tracing::debug!(from = self.duration, to = wanted, "duration grown");
            self.duration = wanted;
        }
        self.duration
    }

    /// Replace the duration outright (used on load), clamping the playhead into range.
    pub fn set_duration(&mut self, duration: TimeMs) {
        self.duration = duration;
        self.current_time = self.current_time.min(duration);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/clock.rs"]
mod tests;
