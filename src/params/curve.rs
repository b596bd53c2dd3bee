//! Keyframe curves and their evaluator
//!
//! A [`Curve`] maps a normalized position `t ∈ [0, 1]` to a blend factor.
//! Segments between two unweighted keys are cubic Hermite splines; when either
//! key of a segment is weighted the segment becomes a cubic Bézier in
//! `(time, value)` space, matching the usual animation-curve semantics.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Default tangent weight (one third of the segment)
pub const DEFAULT_WEIGHT: f32 = 1.0 / 3.0;

/// A single curve control point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key
    pub in_tangent: f32,
    /// Slope leaving this key
    pub out_tangent: f32,
    pub in_weight: f32,
    pub out_weight: f32,
    /// Use `in_weight`/`out_weight` instead of the implicit one-third weights
    pub weighted: bool,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Keyframe {
    /// Key with flat tangents
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
            in_weight: DEFAULT_WEIGHT,
            out_weight: DEFAULT_WEIGHT,
            weighted: false,
        }
    }

    pub fn with_tangents(mut self, in_tangent: f32, out_tangent: f32) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }

    pub fn with_weights(mut self, in_weight: f32, out_weight: f32) -> Self {
        self.in_weight = in_weight;
        self.out_weight = out_weight;
        self.weighted = true;
        self
    }
}

/// Piecewise cubic curve over `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Default for Curve {
    fn default() -> Self {
        Self::linear(0.0, 1.0)
    }
}

impl Curve {
    /// Curve from keys; they are sorted by time. Call [`validate`](Self::validate)
    /// before trusting externally supplied keys.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Single-key curve
    pub fn constant(value: f32) -> Self {
        Self { keys: vec![Keyframe::new(0.0, value)] }
    }

    /// Straight line from `(0, start)` to `(1, end)`
    pub fn linear(start: f32, end: f32) -> Self {
        let slope = end - start;
        Self {
            keys: vec![
                Keyframe::new(0.0, start).with_tangents(slope, slope),
                Keyframe::new(1.0, end).with_tangents(slope, slope),
            ],
        }
    }

    /// S-curve from `(0, start)` to `(1, end)` with flat ends
    pub fn ease_in_out(start: f32, end: f32) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, start), Keyframe::new(1.0, end)],
        }
    }

    /// Smooth curve through `(time, value)` points with Catmull-Rom tangents
    pub fn auto(points: &[(f32, f32)]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let n = sorted.len();
        let keys = (0..n)
            .map(|i| {
                let prev = sorted[i.saturating_sub(1)];
                let next = sorted[(i + 1).min(n - 1)];
                let dt = next.0 - prev.0;
                let tangent = if dt > f32::EPSILON { (next.1 - prev.1) / dt } else { 0.0 };
                Keyframe::new(sorted[i].0, sorted[i].1).with_tangents(tangent, tangent)
            })
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Reject empty curves, keys outside `[0, 1]`, unsorted or non-finite keys
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.keys.is_empty() {
            return Err(Error::validation(format!("curve '{}' has no keys", name)));
        }
        for (i, key) in self.keys.iter().enumerate() {
            let finite = [key.time, key.value, key.in_tangent, key.out_tangent, key.in_weight, key.out_weight]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(Error::validation(format!("curve '{}' key {} is not finite", name, i)));
            }
            if !(0.0..=1.0).contains(&key.time) {
                return Err(Error::validation(format!(
                    "curve '{}' key {} time {} outside [0, 1]",
                    name, i, key.time
                )));
            }
            if i > 0 && key.time < self.keys[i - 1].time {
                return Err(Error::validation(format!("curve '{}' keys are not sorted", name)));
            }
        }
        Ok(())
    }

    /// Evaluate at `t`, clamped to `[0, 1]` and to the key range
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if self.keys.len() == 1 || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t > first.time guarantees idx >= 1
        let idx = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[idx - 1];
        let k1 = &self.keys[idx];
        let dt = k1.time - k0.time;
        if dt <= f32::EPSILON {
            return k1.value;
        }

        if k0.weighted || k1.weighted {
            evaluate_weighted(k0, k1, t)
        } else {
            evaluate_hermite(k0, k1, (t - k0.time) / dt, dt)
        }
    }

    /// `a + (b - a) * evaluate(t)`
    pub fn lerp(&self, a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * self.evaluate(t)
    }
}

fn evaluate_hermite(k0: &Keyframe, k1: &Keyframe, s: f32, dt: f32) -> f32 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
}

fn bezier(p0: f32, p1: f32, p2: f32, p3: f32, s: f32) -> f32 {
    let u = 1.0 - s;
    u * u * u * p0 + 3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s * p3
}

/// Weighted segment: solve x(s) = t by bisection, then return y(s)
fn evaluate_weighted(k0: &Keyframe, k1: &Keyframe, t: f32) -> f32 {
    let dt = k1.time - k0.time;
    let w_out = if k0.weighted { k0.out_weight } else { DEFAULT_WEIGHT }.clamp(0.0, 1.0);
    let w_in = if k1.weighted { k1.in_weight } else { DEFAULT_WEIGHT }.clamp(0.0, 1.0);

    let x0 = k0.time;
    let x1 = k0.time + w_out * dt;
    let x2 = k1.time - w_in * dt;
    let x3 = k1.time;
    let y0 = k0.value;
    let y1 = k0.value + w_out * dt * k0.out_tangent;
    let y2 = k1.value - w_in * dt * k1.in_tangent;
    let y3 = k1.value;

    // x(s) is monotonic because the control x values are ordered within the segment
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..32 {
        let mid = (lo + hi) * 0.5;
        if bezier(x0, x1, x2, x3, mid) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier(y0, y1, y2, y3, (lo + hi) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_constant() {
        let curve = Curve::new(vec![Keyframe::new(0.4, 0.75).with_tangents(3.0, -2.0)]);
        for i in 0..=20 {
            assert_eq!(curve.evaluate(i as f32 / 20.0), 0.75);
        }
        assert_eq!(curve.evaluate(-5.0), 0.75);
    }

    #[test]
    fn test_linear() {
        let curve = Curve::linear(0.0, 1.0);
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_clamped_outside_domain() {
        let curve = Curve::linear(0.2, 0.8);
        assert_eq!(curve.evaluate(-1.0), 0.2);
        assert_eq!(curve.evaluate(2.0), 0.8);
        assert_eq!(curve.evaluate(f32::NAN), 0.2);
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        let curve = Curve::ease_in_out(0.0, 1.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!(curve.evaluate(0.1) < 0.1);
        assert!(curve.evaluate(0.9) > 0.9);
    }

    #[test]
    fn test_weighted_default_weights_match_hermite() {
        let k0 = Keyframe::new(0.0, 0.0).with_tangents(0.0, 2.0);
        let k1 = Keyframe::new(1.0, 1.0).with_tangents(0.5, 0.0);
        let hermite = Curve::new(vec![k0, k1]);
        let weighted = Curve::new(vec![
            k0.with_weights(DEFAULT_WEIGHT, DEFAULT_WEIGHT),
            k1.with_weights(DEFAULT_WEIGHT, DEFAULT_WEIGHT),
        ]);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!((hermite.evaluate(t) - weighted.evaluate(t)).abs() < 1e-3, "t={}", t);
        }
    }

    #[test]
    fn test_auto_passes_through_points() {
        let curve = Curve::auto(&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]);
        assert!((curve.evaluate(0.5) - 1.0).abs() < 1e-6);
        assert_eq!(curve.evaluate(1.0), 0.0);
    }

    #[test]
    fn test_lerp() {
        let curve = Curve::linear(0.0, 1.0);
        assert!((curve.lerp(2.0, 4.0, 0.25) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_validate() {
        assert!(Curve::linear(0.0, 1.0).validate("ok").is_ok());
        assert!(Curve::new(vec![]).validate("empty").is_err());
        assert!(Curve::new(vec![Keyframe::new(1.5, 0.0)]).validate("domain").is_err());
        let nan = Curve::new(vec![Keyframe::new(0.5, f32::NAN)]);
        assert!(matches!(nan.validate("nan"), Err(Error::Validation(_))));
    }
}
