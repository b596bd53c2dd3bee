//! Shared math, image and result types

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use image::{Rgba, RgbaImage};

/// Result of every fallible generation, extraction and packing call
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
