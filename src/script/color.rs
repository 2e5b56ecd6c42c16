use crate::foundation::core::Rgba8Premul;

/// Straight-alpha color with channels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl CssColor {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Color from straight channels.
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        )
    }

    /// Straight RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// Premultiplied RGBA8, rounded.
    pub fn to_premul(self) -> Rgba8Premul {
        let [r, g, b, a] = self.to_rgba8();
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    /// Component-wise interpolation in straight alpha.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Parse a CSS color string: hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`,
/// `hsl()`/`hsla()` or a named color. Returns `None` for anything else.
pub fn parse_css_color(s: &str) -> Option<CssColor> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
        return parse_rgb_args(&args);
    }
    if let Some(args) = function_args(&lower, "hsla").or_else(|| function_args(&lower, "hsl")) {
        return parse_hsl_args(&args);
    }
    named(&lower)
}

fn parse_hex(hex: &str) -> Option<CssColor> {
    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|d| d as u8)
    }
    let b = hex.as_bytes();
    let byte = |i: usize| Some(nibble(b[i])? * 16 + nibble(b[i + 1])?);
    let short = |i: usize| nibble(b[i]).map(|v| v * 17);
    match b.len() {
        3 => Some(CssColor::from_u8(short(0)?, short(1)?, short(2)?, 255)),
        4 => Some(CssColor::from_u8(short(0)?, short(1)?, short(2)?, short(3)?)),
        6 => Some(CssColor::from_u8(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(CssColor::from_u8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn function_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?;
    let inner = inner.strip_suffix(')')?;
    let args: Vec<String> = inner
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect();
    Some(args)
}

fn parse_channel(s: &str) -> Option<f64> {
    match s.strip_suffix('%') {
        Some(p) => Some(p.parse::<f64>().ok()? / 100.0),
        None => Some(s.parse::<f64>().ok()? / 255.0),
    }
}

fn parse_alpha(s: Option<&String>) -> Option<f64> {
    let Some(s) = s else {
        return Some(1.0);
    };
    match s.strip_suffix('%') {
        Some(p) => Some(p.parse::<f64>().ok()? / 100.0),
        None => s.parse::<f64>().ok(),
    }
}

fn parse_rgb_args(args: &[String]) -> Option<CssColor> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    Some(CssColor::rgba(
        parse_channel(&args[0])?.clamp(0.0, 1.0),
        parse_channel(&args[1])?.clamp(0.0, 1.0),
        parse_channel(&args[2])?.clamp(0.0, 1.0),
        parse_alpha(args.get(3))?.clamp(0.0, 1.0),
    ))
}

fn parse_hsl_args(args: &[String]) -> Option<CssColor> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    let h = args[0].trim_end_matches("deg").parse::<f64>().ok()?;
    let pct = |s: &str| Some(s.strip_suffix('%').unwrap_or(s).parse::<f64>().ok()? / 100.0);
    let s = pct(&args[1])?;
    let l = pct(&args[2])?;
    let a = parse_alpha(args.get(3))?.clamp(0.0, 1.0);
    Some(hsla_to_rgba(h, s, l, a))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> CssColor {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return CssColor::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    CssColor::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

fn named(s: &str) -> Option<CssColor> {
    let (r, g, b, a) = match s {
        "transparent" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "lime" => (0, 255, 0, 255),
        "green" => (0, 128, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "cyan" | "aqua" => (0, 255, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "pink" => (255, 192, 203, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "silver" => (192, 192, 192, 255),
        "navy" => (0, 0, 128, 255),
        "teal" => (0, 128, 128, 255),
        "maroon" => (128, 0, 0, 255),
        "olive" => (128, 128, 0, 255),
        "gold" => (255, 215, 0, 255),
        "dodgerblue" => (30, 144, 255, 255),
        "hotpink" => (255, 105, 180, 255),
        "crimson" => (220, 20, 60, 255),
        _ => return None,
    };
    Some(CssColor::from_u8(r, g, b, a))
}

#[cfg(test)]
#[path = "../../tests/unit/script/color.rs"]
mod tests;
