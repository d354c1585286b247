use crate::bxdf::Omega;
use std::f32::consts::{FRAC_PI_2, PI};

/// Trowbridge-Reitz (GGX) microfacet distribution.
///
/// Models the micro-structure of rough surfaces (frosted glass, for instance) by providing the
/// distribution of microfacet normals as a continuous hemisphere distribution. All directions are
/// in the local shading frame, and microfacet normals always lie in the +z hemisphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrowbridgeReitz {
    alpha_x: f32,
    alpha_y: f32,
}

impl TrowbridgeReitz {
    pub fn new(alpha_x: f32, alpha_y: f32) -> Self {
        Self { alpha_x, alpha_y }
    }

    /// Isotropic distribution for a perceptual roughness value: `alpha = roughness^2`, clamped to
    /// `[0.001, 1]` so that near-smooth surfaces remain numerically tractable.
    pub fn from_roughness(roughness: f32) -> Self {
        let alpha = roughness.powi(2).clamp(1e-3, 1.0);
        Self::new(alpha, alpha)
    }

    pub fn alpha(&self) -> (f32, f32) {
        (self.alpha_x, self.alpha_y)
    }

    /// Differential area of microfacets of normal `wh`.
    /// Should satisfy
    /// ```ignore
    ///  integrate(hemisphere, D(wh) cos_theta(wh) d(wh)) = 1
    /// ```
    pub fn d(&self, wh: Omega) -> f32 {
        let tan2_theta = wh.tan2_theta();
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }
        let cos4_theta = wh.cos2_theta().powi(2);
        let e = wh.cos2_phi() / self.alpha_x.powi(2) + wh.sin2_phi() / self.alpha_y.powi(2);
        ((1.0 + e * tan2_theta).powi(2) * (PI * self.alpha_x * self.alpha_y * cos4_theta)).recip()
    }

    /// Measures invisible masked microfacet area, per visibile microfacet area, or in math:
    ///
    /// A-(w) / (A+(w) - A-(w))
    fn lambda(&self, w: Omega) -> f32 {
        let tan2_theta = w.tan2_theta();
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }
        let alpha2 = w.cos2_phi() * self.alpha_x.powi(2) + w.sin2_phi() * self.alpha_y.powi(2);
        (-1.0 + (1.0 + alpha2 * tan2_theta).sqrt()) * 0.5
    }

    /// Masking function, giving the fraction of microfacets that is visible from angle `w`.
    /// ```ignore
    /// integrate(g1(w) * max(0.0, dot(w, wh)) * D(wh) d(wh) in hemisphere) = cos_theta(w)
    /// ```
    pub fn g1(&self, w: Omega) -> f32 {
        (1.0 + self.lambda(w)).recip()
    }

    /// Separable masking-shadowing: the fraction of microfacets visible from both `wo` and `wi`,
    /// assuming that masking and shadowing are independent.
    pub fn g(&self, wo: Omega, wi: Omega) -> f32 {
        self.g1(wo) * self.g1(wi)
    }

    /// Density of `sample_wh()` with respect to solid angle of the microfacet normal.
    pub fn pdf(&self, wh: Omega) -> f32 {
        self.d(wh) * wh.cos_theta().abs()
    }

    /// Samples a microfacet normal in the +z hemisphere, proportional to `D(wh) cos_theta(wh)`.
    pub fn sample_wh(&self, rnd2: (f32, f32)) -> Omega {
        let (u, v) = rnd2;
        let (tan2_theta, phi) = if self.alpha_x == self.alpha_y {
            (self.alpha_x.powi(2) * u / (1.0 - u), 2.0 * PI * v)
        } else {
            let mut phi = (self.alpha_y / self.alpha_x * (2.0 * PI * v + FRAC_PI_2).tan()).atan();
            if v > 0.5 {
                phi += PI;
            }
            let (sin_phi, cos_phi) = phi.sin_cos();
            let alpha2 =
                ((cos_phi / self.alpha_x).powi(2) + (sin_phi / self.alpha_y).powi(2)).recip();
            (alpha2 * u / (1.0 - u), phi)
        };
        let cos_theta = (1.0 + tan2_theta).sqrt().recip();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        Omega(math::hcm::spherical_direction(sin_theta, cos_theta, phi))
    }
}
