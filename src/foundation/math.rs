pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Deterministic pseudo-random value in `[0, 1)` derived from `seed` alone.
///
/// `fract(sin(seed) * 43758.5453)`: no hidden state, independent of call order.
pub fn seeded_random(seed: f64) -> f64 {
    let x = seed.sin() * 43_758.545_3;
    let r = x - x.floor();
    // `x - floor(x)` rounds up to exactly 1.0 for tiny negative x.
    if r.is_finite() && r < 1.0 { r } else { 0.0 }
}

/// Round a signed millisecond value to the nearest multiple of `grid_ms` (half away from zero).
pub(crate) fn snap_ms(value_ms: f64, grid_ms: u64) -> i64 {
    if grid_ms == 0 {
        return value_ms.round() as i64;
    }
    let g = grid_ms as f64;
    ((value_ms / g).round() * g) as i64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
