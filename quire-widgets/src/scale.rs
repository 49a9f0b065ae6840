//! Linear mapping between a value domain and the `[0, 1]` track fraction.

/// Clamped linear scale from `[min, max]` onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Fraction of the track covered by `value`, clamped to `[0, 1]`.
    ///
    /// A degenerate domain (`min == max`) maps everything to `0`.
    pub fn apply(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Value at the given track fraction. The fraction is clamped first.
    pub fn invert(&self, fraction: f64) -> f64 {
        let t = fraction.clamp(0.0, 1.0);
        self.min + t * (self.max - self.min)
    }

    /// Roughly `count` human-friendly tick values inside the domain.
    ///
    /// Tick spacing is a power of ten times 1, 2 or 5, so a `[0, 1]` domain
    /// yields `0, 0.1, ..., 1` and `[0, 100]` yields `0, 10, ..., 100`.
    pub fn nice_ticks(&self, count: usize) -> Vec<f64> {
        let (start, stop) = (self.min, self.max);
        if count == 0 || !start.is_finite() || !stop.is_finite() {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }

        let raw = (stop - start) / count as f64;
        let power = raw.log10().floor();
        let error = raw / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

        // Negative powers divide by an integer inverse so ticks like 0.3 come
        // out exact instead of 0.30000000000000004.
        if power < 0.0 {
            let inverse = 10f64.powf(-power) / factor;
            let first = (start * inverse).ceil() as i64;
            let last = (stop * inverse).floor() as i64;
            (first..=last).map(|i| i as f64 / inverse).collect()
        } else {
            let increment = factor * 10f64.powf(power);
            let first = (start / increment).ceil() as i64;
            let last = (stop / increment).floor() as i64;
            (first..=last).map(|i| i as f64 * increment).collect()
        }
    }
}

/// Values from `start` towards `stop` (exclusive) spaced by `step`.
pub(crate) fn range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || !step.is_finite() || stop <= start {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}
