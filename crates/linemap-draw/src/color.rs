//! RGBA colors and a sequential colormap for fill encodings.

use std::fmt;

use crate::scale::finite_range;

/// An RGBA color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Default vertex fill: dark red, slightly translucent.
    pub const VERTEX_FILL: Self = Self::new(0.640_625, 0.0, 0.0, 0.9);
    /// Default vertex outline.
    pub const VERTEX_STROKE: Self = Self::new(0.180, 0.204, 0.212, 0.8);
    /// Default edge stroke.
    pub const EDGE_STROKE: Self = Self::new(0.179, 0.203, 0.210, 0.8);

    /// `#rrggbb`, ignoring alpha.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    /// `#rrggbbaa`.
    #[must_use]
    pub fn to_hex_rgba(self) -> String {
        format!("{}{:02x}", self.to_hex(), channel(self.a))
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: (other.r - self.r).mul_add(t, self.r),
            g: (other.g - self.g).mul_add(t, self.g),
            b: (other.b - self.b).mul_add(t, self.b),
            a: (other.a - self.a).mul_add(t, self.a),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_rgba())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Piecewise-linear sequential colormap over evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<Rgba>,
}

impl Default for Colormap {
    /// Dark purple → magenta → orange → pale yellow.
    fn default() -> Self {
        Self {
            stops: vec![
                Rgba::new(0.001, 0.000, 0.014, 0.9),
                Rgba::new(0.317, 0.072, 0.485, 0.9),
                Rgba::new(0.716, 0.215, 0.475, 0.9),
                Rgba::new(0.987, 0.536, 0.382, 0.9),
                Rgba::new(0.987, 0.991, 0.750, 0.9),
            ],
        }
    }
}

impl Colormap {
    /// Build a colormap from at least one stop. Returns `None` for no stops.
    #[must_use]
    pub fn from_stops(stops: Vec<Rgba>) -> Option<Self> {
        if stops.is_empty() {
            None
        } else {
            Some(Self { stops })
        }
    }

    /// Color at position `t` in `[0, 1]` (clamped; NaN maps to the first stop).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn at(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.stops.len() - 1;
        if segments == 0 {
            return self.stops[0];
        }
        let scaled = t * segments as f64;
        let i = (scaled.floor() as usize).min(segments - 1);
        self.stops[i].lerp(self.stops[i + 1], scaled - i as f64)
    }

    /// Normalize `values` to `[0, 1]` by their finite range and map each.
    ///
    /// Equal values (and non-finite ones) take the first stop.
    #[must_use]
    pub fn map_values(&self, values: &[f64]) -> Vec<Rgba> {
        let (lo, hi) = finite_range(values);
        let span = hi - lo;
        values
            .iter()
            .map(|&v| {
                if !v.is_finite() || span <= 0.0 {
                    self.at(0.0)
                } else {
                    self.at((v - lo) / span)
                }
            })
            .collect()
    }
}
