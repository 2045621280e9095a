// ============================================================================
// MATH: interpolation, colours, gradient sampling, deterministic hashing
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linear interpolation, unclamped.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Rec. 601 luma of an 8-bit RGB triple, normalized to `[0, 1]`.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

// ---------------------------------------------------------------------------
//  Colour
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised colour '{0}'")]
pub struct ColorParseError(pub String);

/// Opaque 8-bit RGB colour. Serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel interpolation, rounded to the nearest integer.
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let ch = |x: u8, y: u8| lerp(x as f64, y as f64, t).round().clamp(0.0, 255.0) as u8;
        Color {
            r: ch(a.r, b.r),
            g: ch(a.g, b.g),
            b: ch(a.b, b.b),
        }
    }

    /// `rgb(r,g,b)` form used in emitted SVG attributes.
    pub fn to_css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn luminance(&self) -> f64 {
        luminance(self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let err = || ColorParseError(s.to_string());

        if let Some(hex) = lower.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(err());
            }
            let nibble = |c: u8| (c as char).to_digit(16).map(|v| v as u8);
            let bytes = hex.as_bytes();
            return match bytes.len() {
                3 => {
                    let r = nibble(bytes[0]).ok_or_else(err)?;
                    let g = nibble(bytes[1]).ok_or_else(err)?;
                    let b = nibble(bytes[2]).ok_or_else(err)?;
                    Ok(Color::rgb(r * 17, g * 17, b * 17))
                }
                // Alpha in #rrggbbaa is dropped; cells carry their own opacity.
                6 | 8 => {
                    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
                    Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?))
                }
                _ => Err(err()),
            };
        }

        if let Some(inner) = lower
            .strip_prefix("rgb(")
            .or_else(|| lower.strip_prefix("rgba("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return Err(err());
            }
            let ch = |p: &str| {
                p.parse::<f64>()
                    .map(|v| v.round().clamp(0.0, 255.0) as u8)
                    .map_err(|_| err())
            };
            return Ok(Color::rgb(ch(parts[0])?, ch(parts[1])?, ch(parts[2])?));
        }

        match lower.as_str() {
            "black" | "transparent" | "none" => Ok(Color::BLACK),
            "white" => Ok(Color::WHITE),
            "red" => Ok(Color::rgb(255, 0, 0)),
            "green" => Ok(Color::rgb(0, 128, 0)),
            "blue" => Ok(Color::rgb(0, 0, 255)),
            "gray" | "grey" => Ok(Color::rgb(128, 128, 128)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

// ---------------------------------------------------------------------------
//  Gradient sampling
// ---------------------------------------------------------------------------

/// A gradient colour stop. `position` is a percentage in `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: Color,
    pub position: f64,
}

impl GradientStop {
    pub fn new(color: Color, position: f64) -> Self {
        Self { color, position }
    }
}

/// Sample a stop list at `t` (0–100).
///
/// Stops are sorted by position first (stable, so equal positions keep their
/// declared order). Outside the stop range the endpoint colour is returned.
pub fn sample_gradient(stops: &[GradientStop], t: f64) -> Color {
    if stops.is_empty() {
        return Color::BLACK;
    }
    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| a.position.total_cmp(&b.position));
    sample_sorted_gradient(&sorted, t)
}

/// Same as [`sample_gradient`] for a list already sorted by position.
pub fn sample_sorted_gradient(sorted: &[GradientStop], t: f64) -> Color {
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Color::BLACK,
    };
    if t <= first.position {
        return first.color;
    }
    if t >= last.position {
        return last.color;
    }
    for pair in sorted.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if t >= lo.position && t <= hi.position {
            let span = hi.position - lo.position;
            if span <= f64::EPSILON {
                return lo.color;
            }
            return Color::lerp(lo.color, hi.color, (t - lo.position) / span);
        }
    }
    last.color
}

// ---------------------------------------------------------------------------
//  Deterministic hashing
// ---------------------------------------------------------------------------

/// Integer avalanche hash.
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Hash a 2-D coordinate plus seed to `[0, 1)`.
#[inline]
pub fn hash_unit(x: u32, y: u32, seed: u32) -> f64 {
    let h = hash_u32(
        x.wrapping_mul(374761393)
            .wrapping_add(y.wrapping_mul(668265263))
            .wrapping_add(seed),
    );
    (h & 0x00FF_FFFF) as f64 / 16_777_216.0
}

/// Format a coordinate for emitted markup: at most three decimals, trailing
/// zeros stripped, no negative zero.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{:.3}", v);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
