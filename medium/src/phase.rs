use math::float::INV_4PI;
use math::hcm::{self, Vec3};
use std::f32::consts::PI;

/// Henyey-Greenstein phase function. `g` is the mean cosine between the propagation directions
/// before and after scattering: positive values scatter forward, negative ones backward.
///
/// Directions follow the BSDF convention: `wo` and `wi` both point away from the scattering point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HenyeyGreenstein {
    g: f32,
}

impl HenyeyGreenstein {
    pub fn new(g: f32) -> Self {
        Self { g }
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    /// Phase function value in terms of `cos_theta = dot(wo, wi)`.
    fn eval_cos(&self, cos_theta: f32) -> f32 {
        let g = self.g;
        let denom = 1.0 + g * g + 2.0 * g * cos_theta;
        INV_4PI * (1.0 - g * g) / (denom * denom.max(0.0).sqrt())
    }

    pub fn p(&self, wo: Vec3, wi: Vec3) -> f32 {
        self.eval_cos(wo.dot(wi))
    }

    /// Samples `wi` with density exactly `p(wo, wi)`; returns the direction and the density.
    pub fn sample_p(&self, wo: Vec3, (u, v): (f32, f32)) -> (Vec3, f32) {
        let g = self.g;
        // Cosine between the propagation direction (-wo) and wi.
        let cos_mu = if g.abs() < 1e-3 {
            1.0 - 2.0 * u
        } else {
            let sqr_term = (1.0 - g * g) / (1.0 - g + 2.0 * g * u);
            (1.0 + g * g - sqr_term * sqr_term) / (2.0 * g)
        }
        .clamp(-1.0, 1.0);
        let sin_mu = (1.0 - cos_mu * cos_mu).max(0.0).sqrt();
        let forward = -wo.hat();
        let (v1, v2) = hcm::make_coord_system(forward);
        let local = hcm::spherical_direction(sin_mu, cos_mu, 2.0 * PI * v);
        let wi = v1 * local.x + v2 * local.y + forward * local.z;
        (wi, self.eval_cos(-cos_mu))
    }
}
