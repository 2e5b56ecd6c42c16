use crate::foundation::core::{Point, Rect, SceneId, TimeMs, TrackId};
use crate::timeline::store::Timeline;

/// Pixel layout of the timeline panel: a ruler band on top, then one row per track in
/// store order.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineGeometry {
    /// Horizontal zoom (the timeline scale).
    pub pixels_per_second: f64,
    /// Height of the ruler band.
    pub ruler_height: f64,
    /// Height of one track row.
    pub row_height: f64,
    /// Width of the track-name column left of time zero.
    pub header_width: f64,
}

impl Default for TimelineGeometry {
    fn default() -> Self {
        Self {
            pixels_per_second: 100.0,
            ruler_height: 24.0,
            row_height: 40.0,
            header_width: 0.0,
        }
    }
}

impl TimelineGeometry {
    /// Set the horizontal zoom.
    pub fn with_pixels_per_second(mut self, pps: f64) -> Self {
        self.pixels_per_second = pps;
        self
    }

    /// Set the header column width.
    pub fn with_header_width(mut self, width: f64) -> Self {
        self.header_width = width;
        self
    }

    /// Pixel distance to milliseconds.
    pub fn px_to_ms(&self, dx: f64) -> f64 {
        if self.pixels_per_second <= 0.0 {
            return 0.0;
        }
        dx / self.pixels_per_second * 1000.0
    }

    /// Timeline time under a panel x coordinate (may be negative left of zero).
    pub fn time_at_x(&self, x: f64) -> i64 {
        self.px_to_ms(x - self.header_width).round() as i64
    }

    /// Pixel x of time `t`.
    pub fn x_at_time(&self, t: TimeMs) -> f64 {
        self.header_width + t as f64 / 1000.0 * self.pixels_per_second
    }

    /// Rectangle of the ruler band.
    pub fn ruler_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::MAX, self.ruler_height)
    }

    /// Row band of the track at `index` in store order.
    pub fn row_rect(&self, index: usize) -> Rect {
        let y0 = self.ruler_height + index as f64 * self.row_height;
        Rect::new(0.0, y0, f64::MAX, y0 + self.row_height)
    }

    /// Whether `p` is on the ruler band.
    pub fn in_ruler(&self, p: Point) -> bool {
        self.ruler_rect().contains(p)
    }

    /// Track whose row contains `y`.
    pub fn track_at(&self, timeline: &Timeline, y: f64) -> Option<TrackId> {
        let p = Point::new(self.header_width, y);
        timeline
            .tracks()
            .iter()
            .enumerate()
            .find(|(i, _)| self.row_rect(*i).contains(p))
            .map(|(_, t)| t.id)
    }

    /// Segment rectangle of a scene drawn in row `index`.
    pub fn scene_rect(&self, index: usize, start: TimeMs, end: TimeMs) -> Rect {
        let row = self.row_rect(index);
        Rect::new(self.x_at_time(start), row.y0, self.x_at_time(end), row.y1)
    }

    /// Scene segment under `p`. Later scenes in a row sit on top of earlier ones.
    pub fn scene_at(&self, timeline: &Timeline, p: Point) -> Option<(TrackId, SceneId)> {
        let (index, track) = timeline
            .tracks()
            .iter()
            .enumerate()
            .find(|(i, _)| self.row_rect(*i).contains(p))?;
        track
            .scenes
            .iter()
            .rev()
            .find(|s| self.scene_rect(index, s.start_time, s.end_time).contains(p))
            .map(|s| (track.id, s.id))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/geometry.rs"]
mod tests;
