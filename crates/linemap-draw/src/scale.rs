//! Mapping numeric attributes onto visual sizes.
//!
//! ```text
//! size(x) = min + (max - min) * ((x - lo) / (hi - lo))^power
//! ```
//!
//! where `lo`/`hi` are the smallest and largest finite inputs. When every
//! input is equal (or there is only one) all outputs are `min`. Non-finite
//! inputs map to `min`.

/// A size mapping from a value range onto `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeScale {
    pub min: f64,
    pub max: f64,
    /// Exponent applied to the normalized value. Default: 0.5.
    pub power: f64,
    /// Apply `ln(1 + x)` to inputs before normalizing.
    pub log: bool,
}

impl SizeScale {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            power: 0.5,
            log: false,
        }
    }

    #[must_use]
    pub const fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    #[must_use]
    pub const fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Map every value onto `[min, max]`.
    #[must_use]
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let transformed: Vec<f64> = if self.log {
            values.iter().map(|v| v.max(0.0).ln_1p()).collect()
        } else {
            values.to_vec()
        };

        let (lo, hi) = finite_range(&transformed);
        let span = hi - lo;

        transformed
            .iter()
            .map(|&v| {
                if !v.is_finite() || span <= 0.0 {
                    return self.min;
                }
                let t = ((v - lo) / span).clamp(0.0, 1.0);
                (self.max - self.min).mul_add(t.powf(self.power), self.min)
            })
            .collect()
    }
}

/// Map `values` onto `[min, max]` with the default power (0.5).
#[must_use]
pub fn prop_to_size(values: &[f64], min: f64, max: f64) -> Vec<f64> {
    SizeScale::new(min, max).apply(values)
}

/// Smallest and largest finite value, or `(0, 0)` when there are none.
pub(crate) fn finite_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 0.0))
}
