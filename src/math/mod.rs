//! Mathematical utilities and data structures

pub mod aabb;
pub mod hash;
pub mod hull;
pub mod rect;
pub mod rng;

pub use aabb::Aabb;
pub use hash::ContentHasher;
pub use rect::{OrientedRect, Rect};
pub use rng::SimpleRng;

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep on [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
