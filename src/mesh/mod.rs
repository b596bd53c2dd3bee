//! Mesh buffers and the builders that fill them

pub mod branch;
pub mod data;
pub mod sprout;
pub mod trunk;
pub mod tube;

pub use branch::{BranchMeshBuilder, ROOT_ELEMENT_ID};
pub use data::{MeshData, Vertex};
pub use sprout::{SproutMeshBuilder, SproutPlacement};
pub use trunk::{Crest, TrunkMeshBuilder, TRUNK_ELEMENT_ID};
