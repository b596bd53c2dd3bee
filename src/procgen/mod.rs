//! Procedural primitives shared by the generation stages

pub mod noise_field;

pub use noise_field::{NoiseField, NoiseType, NEUTRAL_RESOLUTION};
