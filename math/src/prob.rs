/// Represents probability mass (discrete pr) or probability density (continuous pr).
/// - `density()` and `mass()` returns the corresponding variant value or 0 if the `Prob` value is
///   not the variant.
/// - A `Mass` marks a sample drawn from a Dirac delta (specular) distribution; a value of exactly
///   zero in either variant flags an impossible sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prob {
    Density(f32),
    Mass(f32),
}

impl Prob {
    pub fn is_density(&self) -> bool {
        matches!(self, Self::Density(_))
    }
    pub fn is_positive(&self) -> bool {
        self.value() > 0.0
    }
    /// The raw value regardless of the measure it is expressed in.
    pub fn value(&self) -> f32 {
        match self {
            Self::Density(x) | Self::Mass(x) => *x,
        }
    }
    pub fn density(&self) -> f32 {
        if let Self::Density(pdf) = self {
            *pdf
        } else {
            0.0
        }
    }
    pub fn mass(&self) -> f32 {
        if let Self::Mass(pmf) = self {
            *pmf
        } else {
            0.0
        }
    }
}
