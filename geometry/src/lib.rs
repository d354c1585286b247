/// Defines the `BBox` axis-aligned bounding-box type.
pub mod bbox;
pub mod bxdf;
pub mod camera;
pub mod error;
pub mod interaction;
pub mod microfacet;
pub mod ray;
pub mod transform;

pub use error::BuildError;
pub use interaction::Interaction;
pub use transform::{AffineTransform, Transform};
