//! Seeded scalar noise shared by every deformation stage
//!
//! All types return values in `[-1, 1]` and are pure functions of
//! `(type, position, resolution, seed)`.

use noise::{NoiseFn, Perlin, Simplex, Value};
use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// Noise flavours selectable from descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoiseType {
    /// Cheap hash lattice noise
    #[default]
    Basic,
    Perlin,
    Simplex,
    Value,
}

impl NoiseType {
    /// Per-type frequency constant applied on top of `resolution * 0.25`
    pub fn frequency_multiplier(self) -> f32 {
        match self {
            NoiseType::Basic => 1.0,
            NoiseType::Perlin => 1.25,
            NoiseType::Simplex => 1.0,
            NoiseType::Value => 1.65,
        }
    }

    /// Sampling frequency for a given resolution
    pub fn frequency(self, resolution: f32) -> f32 {
        resolution * 0.25 * self.frequency_multiplier()
    }

    /// Resolution actually sampled with: only `Basic` honours the descriptor's value
    pub fn effective_resolution(self, resolution: f32) -> f32 {
        match self {
            NoiseType::Basic => resolution,
            _ => NEUTRAL_RESOLUTION,
        }
    }
}

/// Resolution at which every type samples at its bare frequency constant
pub const NEUTRAL_RESOLUTION: f32 = 4.0;

/// Deterministic 3D hash for lattice noise
fn hash_3d(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut h = seed;
    h ^= x as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= y as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= z as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h
}

/// Lattice corner value in [-1, 1]
fn lattice(x: i32, y: i32, z: i32, seed: u32) -> f32 {
    (hash_3d(x, y, z, seed) & 0x00ff_ffff) as f32 / 0x00ff_ffff as f32 * 2.0 - 1.0
}

/// Trilinear value noise over the hash lattice with smoothstep weights
fn basic_noise(p: Vec3, seed: u32) -> f32 {
    let cell = p.floor();
    let (ix, iy, iz) = (cell.x as i32, cell.y as i32, cell.z as i32);
    let f = p - cell;
    let w = f * f * (Vec3::splat(3.0) - 2.0 * f);

    let c000 = lattice(ix, iy, iz, seed);
    let c100 = lattice(ix + 1, iy, iz, seed);
    let c010 = lattice(ix, iy + 1, iz, seed);
    let c110 = lattice(ix + 1, iy + 1, iz, seed);
    let c001 = lattice(ix, iy, iz + 1, seed);
    let c101 = lattice(ix + 1, iy, iz + 1, seed);
    let c011 = lattice(ix, iy + 1, iz + 1, seed);
    let c111 = lattice(ix + 1, iy + 1, iz + 1, seed);

    let x00 = c000 + (c100 - c000) * w.x;
    let x10 = c010 + (c110 - c010) * w.x;
    let x01 = c001 + (c101 - c001) * w.x;
    let x11 = c011 + (c111 - c011) * w.x;
    let y0 = x00 + (x10 - x00) * w.y;
    let y1 = x01 + (x11 - x01) * w.y;
    y0 + (y1 - y0) * w.z
}

/// Pre-initialised noise generators for one seed.
///
/// Construct once per pass and call [`sample`](Self::sample) per node or
/// vertex; this avoids rebuilding permutation tables on every call.
pub struct NoiseField {
    seed: u32,
    perlin: Perlin,
    simplex: Simplex,
    value: Value,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            perlin: Perlin::new(seed),
            simplex: Simplex::new(seed),
            value: Value::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Sample noise of `noise_type` at `position`; result is in `[-1, 1]`
    pub fn sample(&self, noise_type: NoiseType, position: Vec3, resolution: f32) -> f32 {
        let p = position * noise_type.frequency(resolution);
        let raw = match noise_type {
            NoiseType::Basic => basic_noise(p, self.seed),
            NoiseType::Perlin => self.perlin.get(to_f64(p)) as f32,
            NoiseType::Simplex => self.simplex.get(to_f64(p)) as f32,
            NoiseType::Value => self.value.get(to_f64(p)) as f32,
        };
        if raw.is_finite() { raw.clamp(-1.0, 1.0) } else { 0.0 }
    }

    /// Two decorrelated samples, used for displacement in a plane
    pub fn sample_pair(&self, noise_type: NoiseType, position: Vec3, resolution: f32) -> (f32, f32) {
        const DECORRELATE: Vec3 = Vec3::new(17.31, 5.17, 31.73);
        (
            self.sample(noise_type, position, resolution),
            self.sample(noise_type, position + DECORRELATE, resolution),
        )
    }
}

fn to_f64(p: Vec3) -> [f64; 3] {
    [p.x as f64, p.y as f64, p.z as f64]
}

/// One-off sample. Prefer a long-lived [`NoiseField`] in loops.
pub fn sample(noise_type: NoiseType, position: Vec3, resolution: f32, seed: u32) -> f32 {
    NoiseField::new(seed).sample(noise_type, position, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NoiseType; 4] = [NoiseType::Basic, NoiseType::Perlin, NoiseType::Simplex, NoiseType::Value];

    #[test]
    fn test_only_basic_uses_descriptor_resolution() {
        assert_eq!(NoiseType::Basic.effective_resolution(7.5), 7.5);
        for ty in [NoiseType::Perlin, NoiseType::Simplex, NoiseType::Value] {
            assert_eq!(ty.effective_resolution(7.5), NEUTRAL_RESOLUTION);
            assert_eq!(ty.frequency(ty.effective_resolution(0.5)), ty.frequency_multiplier());
        }
    }

    #[test]
    fn test_frequency_constants() {
        assert_eq!(NoiseType::Perlin.frequency(4.0), 1.25);
        assert_eq!(NoiseType::Simplex.frequency(4.0), 1.0);
        assert_eq!(NoiseType::Value.frequency(4.0), 1.65);
        assert_eq!(NoiseType::Basic.frequency(8.0), 2.0);
    }

    #[test]
    fn test_deterministic_bit_identical() {
        for ty in ALL {
            for i in 0..32 {
                let p = Vec3::new(i as f32 * 0.37, i as f32 * -1.13, 2.5 + i as f32 * 0.05);
                let a = sample(ty, p, 3.0, 42);
                let b = sample(ty, p, 3.0, 42);
                assert_eq!(a.to_bits(), b.to_bits(), "{:?} not deterministic", ty);
            }
        }
    }

    #[test]
    fn test_range() {
        let field = NoiseField::new(7);
        for ty in ALL {
            for i in 0..200 {
                let p = Vec3::new(i as f32 * 0.173, (i % 13) as f32 * 0.61, (i % 7) as f32 * 1.7);
                let v = field.sample(ty, p, 5.0);
                assert!((-1.0..=1.0).contains(&v), "{:?} out of range: {}", ty, v);
            }
        }
    }

    #[test]
    fn test_seed_changes_basic() {
        let p = Vec3::new(0.3, 0.7, 1.9);
        let differs = (0..8).any(|s| sample(NoiseType::Basic, p, 4.0, s) != sample(NoiseType::Basic, p, 4.0, s + 100));
        assert!(differs);
    }

    #[test]
    fn test_basic_matches_lattice_at_integer_points() {
        let seed = 11;
        let v = basic_noise(Vec3::new(3.0, -2.0, 5.0), seed);
        assert_eq!(v, lattice(3, -2, 5, seed));
    }
}
