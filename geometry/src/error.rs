use thiserror::Error;

/// Failures detected while building scene objects. Rendering itself never produces these: once a
/// scene is built, degenerate samples are reported through zero-valued colors and densities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("transform is not invertible (determinant {0})")]
    SingularTransform(f32),
    #[error("{0} requires a transform without non-uniform scaling")]
    NonUniformScale(&'static str),
    #[error("invalid `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("triangle references vertex {index}, but the mesh has only {count} vertices")]
    VertexOutOfRange { index: usize, count: usize },
    #[error("mesh has {expected} vertices but {actual} {attribute}")]
    AttributeCountMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BuildError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        BuildError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejects scalar parameters that are NaN/infinite or not strictly positive.
pub fn require_positive(name: &'static str, x: f32) -> Result<f32, BuildError> {
    if x.is_finite() && x > 0.0 {
        Ok(x)
    } else {
        Err(BuildError::invalid(name, format!("expected a positive finite value, got {}", x)))
    }
}
