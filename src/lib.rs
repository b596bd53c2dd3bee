//! Arbor - procedural tree geometry and sprout atlas composition

pub mod core;
pub mod math;
pub mod procgen;
pub mod params;
pub mod skeleton;
pub mod mesh;
pub mod polygon;
pub mod atlas;
pub mod generation;
