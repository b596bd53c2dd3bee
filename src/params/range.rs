//! Min/max parameter pairs

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::math::SimpleRng;

/// Closed scalar range sampled per instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f32,
    pub max: f32,
}

impl Default for MinMax {
    fn default() -> Self {
        Self::fixed(1.0)
    }
}

impl MinMax {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range where min == max
    pub fn fixed(value: f32) -> Self {
        Self { min: value, max: value }
    }

    /// Uniform sample in `[min, max]`
    pub fn sample(&self, rng: &mut SimpleRng) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.range(self.min, self.max)
    }

    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::validation(format!("{} is not finite", name)));
        }
        if self.min > self.max {
            return Err(Error::validation(format!(
                "{}: min {} > max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }

    /// Validate ordering and that both ends lie in `[lo, hi]`
    pub fn validate_within(&self, name: &str, lo: f32, hi: f32) -> Result<()> {
        self.validate(name)?;
        if self.min < lo || self.max > hi {
            return Err(Error::validation(format!(
                "{}: [{}, {}] outside [{}, {}]",
                name, self.min, self.max, lo, hi
            )));
        }
        Ok(())
    }
}

/// Validate a scalar lies in `[lo, hi]`
pub fn validate_unit(name: &str, value: f32, lo: f32, hi: f32) -> Result<()> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(Error::validation(format!(
            "{} = {} outside [{}, {}]",
            name, value, lo, hi
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_within() {
        let mut rng = SimpleRng::new(5);
        let r = MinMax::new(2.0, 3.0);
        for _ in 0..100 {
            let v = r.sample(&mut rng);
            assert!((2.0..=3.0).contains(&v));
        }
        assert_eq!(MinMax::fixed(0.5).sample(&mut rng), 0.5);
    }

    #[test]
    fn test_validate() {
        assert!(MinMax::new(1.0, 2.0).validate("ok").is_ok());
        assert!(MinMax::new(2.0, 1.0).validate("bad").is_err());
        assert!(MinMax::new(0.0, 1.5).validate_within("unit", 0.0, 1.0).is_err());
        assert!(validate_unit("v", 0.5, 0.0, 1.0).is_ok());
        assert!(validate_unit("v", f32::NAN, 0.0, 1.0).is_err());
    }
}
