//! Descriptor types supplied by the caller
//!
//! Everything here is plain serde data plus validation; generation stages
//! read these structs and never mutate them.

pub mod bending;
pub mod branch;
pub mod curve;
pub mod descriptor;
pub mod range;
pub mod sprout;
pub mod style;
pub mod trunk;

pub use bending::BendingParams;
pub use branch::{BranchLevel, TrunkParams};
pub use curve::{Curve, Keyframe};
pub use descriptor::{BranchDescriptor, TreePreset};
pub use range::MinMax;
pub use sprout::{CustomSproutMesh, ScaleMode, ShapeMode, SproutDescriptor, SproutMapArea};
pub use style::{SproutStyle, StyleChannel, StyleSample, VariationMode};
pub use trunk::{IntegrationMode, TrunkMeshParams};
