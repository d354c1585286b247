/// Flattened bounding-volume hierarchy over [`Primitive`]s.
mod bvh;
mod primitive;

pub use bvh::{Bvh, BvhConfig, SplitMethod, SurfaceInteraction};
pub use primitive::Primitive;
