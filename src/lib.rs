//! Path tracing on top of the scene crates: the integrator, direct lighting with multiple
//! importance sampling, and a tiled render driver.

pub mod directlighting;
pub mod options;
pub mod pathintegrator;
pub mod render;

pub use options::{parse_args, OptionsError, RenderOptions};
pub use pathintegrator::{LightStrategy, PathIntegrator};
pub use render::{render, Film};
