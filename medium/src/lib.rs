mod phase;

use geometry::ray::Ray;
use geometry::{BuildError, Interaction};
use radiometry::color::Color;
use rand::{Rng, RngCore};

pub use phase::HenyeyGreenstein;

/// Smallest density used when a free-flight distance is sampled inside the medium.
const MIN_PDF: f32 = 1e-8;

/// A scattering event sampled inside a medium.
#[derive(Debug, Clone, Copy)]
pub struct MediumInteraction {
    pub isect: Interaction,
    pub phase: HenyeyGreenstein,
}

/// Result of `Medium::sample()`: the throughput weight of the segment, and the scattering event
/// if one happened before the ray reached its far end.
#[derive(Debug, Clone, Copy)]
pub struct MediumSample {
    pub weight: Color,
    pub scatter: Option<MediumInteraction>,
}

/// A participating medium filling some region of space.
pub trait Medium: Send + Sync + std::fmt::Debug {
    /// Transmittance along the segment `(t_min, t_max)` of the ray.
    fn tr(&self, ray: &Ray) -> Color;

    /// Samples a free-flight distance along the segment `(t_min, t_max)` of the ray.
    fn sample(&self, ray: &Ray, rng: &mut dyn RngCore) -> MediumSample;

    fn summary(&self) -> String;
}

/// Medium with constant absorption and scattering coefficients and a Henyey-Greenstein phase
/// function.
#[derive(Debug, Clone)]
pub struct HomogeneousMedium {
    sigma_a: Color,
    sigma_s: Color,
    sigma_t: Color,
    phase: HenyeyGreenstein,
}

impl HomogeneousMedium {
    pub fn new(sigma_a: Color, sigma_s: Color, g: f32) -> Result<Self, BuildError> {
        for (name, sigma) in [("sigma_a", sigma_a), ("sigma_s", sigma_s)] {
            if !sigma.is_finite() || sigma.has_negative() {
                return Err(BuildError::invalid(
                    name,
                    format!("expected non-negative coefficients, got {}", sigma),
                ));
            }
        }
        if !(g > -1.0 && g < 1.0) {
            return Err(BuildError::invalid("g", format!("must lie in (-1, 1), got {}", g)));
        }
        Ok(Self {
            sigma_a,
            sigma_s,
            sigma_t: sigma_a + sigma_s,
            phase: HenyeyGreenstein::new(g),
        })
    }

    pub fn sigma_t(&self) -> Color {
        self.sigma_t
    }

    /// Beer-Lambert transmittance over `distance`; channels with zero extinction always transmit
    /// fully, even over an infinite distance.
    fn transmittance(&self, distance: f32) -> Color {
        self.sigma_t.map(|sigma_t| {
            if sigma_t == 0.0 {
                1.0
            } else {
                (-sigma_t * distance).exp()
            }
        })
    }
}

impl Medium for HomogeneousMedium {
    fn tr(&self, ray: &Ray) -> Color {
        self.transmittance((ray.t_max - ray.t_min) * ray.dir.norm())
    }

    fn sample(&self, ray: &Ray, rng: &mut dyn RngCore) -> MediumSample {
        // Picks the channel that drives the distance sampling.
        let channel = rng.gen_range(0..3);
        let u: f32 = rng.gen();
        let dir_length = ray.dir.norm();
        let dist = -(1.0 - u).ln() / self.sigma_t[channel];
        let t = (ray.t_min + dist / dir_length).min(ray.t_max);
        let sampled_medium = t < ray.t_max;
        let tr = self.transmittance((t - ray.t_min) * dir_length);

        if sampled_medium {
            let density = tr * self.sigma_t;
            let pdf = density.average().max(MIN_PDF);
            let isect = Interaction::in_medium(ray.position_at(t), t, -ray.dir.hat());
            MediumSample {
                weight: tr * self.sigma_s / pdf,
                scatter: Some(MediumInteraction {
                    isect,
                    phase: self.phase,
                }),
            }
        } else {
            let pdf = tr.average();
            let weight = if pdf == 0.0 { Color::black() } else { tr / pdf };
            MediumSample {
                weight,
                scatter: None,
            }
        }
    }

    fn summary(&self) -> String {
        format!(
            "HomogeneousMedium{{ sigma_a = {}, sigma_s = {}, g = {} }}",
            self.sigma_a,
            self.sigma_s,
            self.phase.g()
        )
    }
}
