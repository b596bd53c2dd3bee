//! Sprout polygon areas: fragment extraction, caching and snapshots

pub mod area;
pub mod builder;
pub mod cache;
pub mod fragment;
pub mod snapshot;

pub use area::PolygonArea;
pub use builder::PolygonAreaBuilder;
pub use cache::PolygonAreaCache;
pub use fragment::{CutPlane, Fragment, PlaneBasis};
pub use snapshot::{Snapshot, SnapshotLod, SnapshotProcessor};
