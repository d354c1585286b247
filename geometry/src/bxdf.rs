use crate::microfacet::TrowbridgeReitz;
use enum_dispatch::enum_dispatch;
use math::float::{Float, INV_PI};
use math::hcm::{self, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Unit-length direction in the local shading frame, where +z is the shading normal.
///
/// All trigonometric helpers assume the direction is normalized. Spherical angles follow the
/// usual convention: theta is measured from +z, phi from +x around +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Omega(pub Vec3);

impl Omega {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }
    pub fn normalize(x: f32, y: f32, z: f32) -> Self {
        Self(hcm::normalize(x, y, z))
    }
    /// The local +z direction.
    pub fn normal() -> Self {
        Self(Vec3::Z)
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }
    pub fn y(&self) -> f32 {
        self.0.y
    }
    pub fn z(&self) -> f32 {
        self.0.z
    }

    pub fn cos_theta(&self) -> f32 {
        self.0.z
    }
    pub fn cos2_theta(&self) -> f32 {
        self.0.z.powi(2)
    }
    pub fn sin2_theta(&self) -> f32 {
        (1.0 - self.cos2_theta()).max(0.0)
    }
    pub fn sin_theta(&self) -> f32 {
        self.sin2_theta().sqrt()
    }
    pub fn tan2_theta(&self) -> f32 {
        self.sin2_theta() / self.cos2_theta()
    }

    pub fn cos_phi(&self) -> f32 {
        let sin_theta = self.sin_theta();
        if sin_theta == 0.0 {
            1.0
        } else {
            (self.0.x / sin_theta).clamp(-1.0, 1.0)
        }
    }
    pub fn sin_phi(&self) -> f32 {
        let sin_theta = self.sin_theta();
        if sin_theta == 0.0 {
            0.0
        } else {
            (self.0.y / sin_theta).clamp(-1.0, 1.0)
        }
    }
    pub fn cos2_phi(&self) -> f32 {
        self.cos_phi().powi(2)
    }
    pub fn sin2_phi(&self) -> f32 {
        self.sin_phi().powi(2)
    }

    pub fn dot(self, other: Self) -> f32 {
        self.0.dot(other.0)
    }

    /// Flips `self` if it is not on the same side as `other`.
    pub fn face_forward(self, other: Self) -> Self {
        Self(self.0.face_forward(other.0))
    }

    pub fn same_hemisphere(self, other: Self) -> bool {
        self.0.z * other.0.z > 0.0
    }

    /// Mirrors the direction across the local normal.
    pub fn reflected(self) -> Self {
        Self::new(-self.0.x, -self.0.y, self.0.z)
    }

    /// Cuts the upper hemisphere into `count` x `4 * count` cells of equal angular span and
    /// returns the direction at the center of each cell, along with the (d_theta, d_phi) span.
    pub fn tesselate_hemi(count: usize) -> (Vec<Omega>, (f32, f32)) {
        let d_theta = FRAC_PI_2 / count as f32;
        let d_phi = 2.0 * PI / (4 * count) as f32;
        let mut dirs = Vec::with_capacity(4 * count * count);
        for i in 0..count {
            let theta = (i as f32 + 0.5) * d_theta;
            for j in 0..4 * count {
                let phi = (j as f32 + 0.5) * d_phi;
                dirs.push(Omega(hcm::spherical_direction(theta.sin(), theta.cos(), phi)));
            }
        }
        (dirs, (d_theta, d_phi))
    }
}

impl std::ops::Neg for Omega {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::fmt::Display for Omega {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ω{}", self.0)
    }
}

/// Maps a point in the unit square to the unit disk, preserving relative areas.
pub fn concentric_sample_disk(uv: (f32, f32)) -> (f32, f32) {
    let x = uv.0 * 2.0 - 1.0;
    let y = uv.1 * 2.0 - 1.0;
    if x == 0.0 && y == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if x.abs() > y.abs() {
        (x, FRAC_PI_4 * (y / x))
    } else {
        (y, FRAC_PI_2 - FRAC_PI_4 * (x / y))
    };
    let (sin_theta, cos_theta) = theta.sin_cos();
    (r * cos_theta, r * sin_theta)
}

/// Samples a direction on the upper hemisphere with density proportional to `cos_theta`.
pub fn cos_sample_hemisphere(uv: (f32, f32)) -> Omega {
    let (x, y) = concentric_sample_disk(uv);
    let z = 1.0f32.cathetus(x.hypot(y));
    Omega::new(x, y, z)
}

pub fn cos_hemisphere_pdf(w: Omega) -> f32 {
    w.cos_theta().abs() * INV_PI
}

pub fn uniform_sample_sphere(uv: (f32, f32)) -> Vec3 {
    let z = 1.0 - 2.0 * uv.0;
    let r = 1.0f32.cathetus(z);
    let phi = 2.0 * PI * uv.1;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

pub const UNIFORM_SPHERE_PDF: f32 = math::float::INV_4PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothnessType {
    Diffuse,
    Glossy,
    Specular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrusionType {
    Reflection,
    Transmission,
    ReflectTransmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BxDFType {
    pub intrusion: IntrusionType,
    pub smooth: SmoothnessType,
}

impl BxDFType {
    pub fn is_specular(&self) -> bool {
        self.smooth == SmoothnessType::Specular
    }
    pub fn has_transmission(&self) -> bool {
        self.intrusion != IntrusionType::Reflection
    }
}

/// Describes the ray scattering behaviors in a probabilistic way. All vectors involved are in the
/// intersection coordinate system: +Z being the normal vector. To interact with the models, one
/// should convert the outgoing/incident directions to local coordinates.
///
/// BSDF plays a key role in the rendering integration:
/// ```ignore
///             /
/// L_o - L_e = | L(wi) * f(wo, wi) * abscos(wi) d(wi)
///            / Sphere
/// ```
/// By Monte-Carlo integration, the integral is estimated as the expectation of the following:
/// ```ignore
/// L_o - L_e = L(wi) * f(wo, wi) * abscos(wi) / pdf(wi)
/// ```
/// where `wi` is a randomly generated unit-length 3D vector, denoting the incident direction.
///
/// Specular models return black from `eval()` and zero from `pdf()`; their `sample()` returns a
/// [`Prob::Mass`] carrying the probability of choosing the returned discrete direction.
#[enum_dispatch]
pub trait BxDF {
    fn get_type(&self) -> BxDFType;

    /// Evaluates the BSDF function at given in-out angles.
    fn eval(&self, wo: Omega, wi: Omega) -> Color;

    /// Produces an incident direction given the outgoing direction, consuming up to three
    /// uniform random numbers. Returns the BSDF value, the sampled direction and its probability.
    /// A zero-valued or zero-probability result means the sample should be discarded.
    fn sample(&self, wo: Omega, rnd: (f32, f32, f32)) -> (Color, Omega, Prob);

    /// Density of `sample()` producing `wi`, with respect to solid angle.
    fn pdf(&self, wo: Omega, wi: Omega) -> f32;
}

#[enum_dispatch(BxDF)]
#[derive(Debug, Clone)]
pub enum BXDF {
    SpecularReflection,
    FresnelSpecular,
    RoughDielectric,
    LambertianReflection,
}

fn null_sample() -> (Color, Omega, Prob) {
    (Color::black(), Omega::normal(), Prob::Density(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fresnel {
    /// Reflects everything.
    Nop,
    Dielectric { eta_i: f32, eta_t: f32 },
}

impl Fresnel {
    pub fn dielectric(eta_i: f32, eta_t: f32) -> Self {
        Self::Dielectric { eta_i, eta_t }
    }

    /// Computes ratio of reflected radiance from the surface scattering.
    /// If `cos_theta_i` is negative, then the refractive index will be inverted before calculation.
    pub fn refl_coeff(&self, cos_theta_i: f32) -> f32 {
        match *self {
            Self::Nop => 1.0,
            Self::Dielectric { eta_i, eta_t } => {
                let cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
                let (eta_i, eta_t, cos_theta_i) = if cos_theta_i > 0.0 {
                    (eta_i, eta_t, cos_theta_i)
                } else {
                    (eta_t, eta_i, -cos_theta_i)
                };

                let sin_theta_i = 1.0f32.cathetus(cos_theta_i);
                let sin_theta_t = eta_i / eta_t * sin_theta_i;
                if sin_theta_t >= 1.0 {
                    return 1.0;
                }
                let cos_theta_t = 1.0f32.cathetus(sin_theta_t);
                // perp  /n_i cos_i - n_t cos_t\ 2  parl  /n_i cos_t - n_t cos_i\ 2
                // R_s = |---------------------|    R_p = |---------------------|
                //       \n_i cos_i + n_t cos_t/          \n_i cos_t + n_t cos_i/
                let r_perpendicular = (eta_i * cos_theta_i - eta_t * cos_theta_t)
                    / (eta_i * cos_theta_i + eta_t * cos_theta_t);
                let r_parallel = (eta_t * cos_theta_i - eta_i * cos_theta_t)
                    / (eta_t * cos_theta_i + eta_i * cos_theta_t);
                (r_parallel.powi(2) + r_perpendicular.powi(2)) * 0.5
            }
        }
    }
}

// ---------------------------

/// BSDF that represents specular reflection. All transmission energy is absorbed.
///
/// `sample()` returns perfect reflected direction across the normal (z-axis in the local
/// coordinate), and uses the underlying Fresnel model to modulate the reflectivity.
#[derive(Debug, Clone)]
pub struct SpecularReflection {
    albedo: Color,
    fresnel: Fresnel,
}

impl SpecularReflection {
    pub fn new(albedo: Color, fresnel: Fresnel) -> Self {
        Self { albedo, fresnel }
    }
}

impl BxDF for SpecularReflection {
    fn get_type(&self) -> BxDFType {
        BxDFType {
            intrusion: IntrusionType::Reflection,
            smooth: SmoothnessType::Specular,
        }
    }

    fn eval(&self, _wo: Omega, _wi: Omega) -> Color {
        Color::black()
    }

    fn sample(&self, wo: Omega, _rnd: (f32, f32, f32)) -> (Color, Omega, Prob) {
        let wi = wo.reflected();
        let cos_theta = wi.cos_theta();
        if cos_theta == 0.0 {
            return null_sample();
        }
        let f = self.albedo * self.fresnel.refl_coeff(cos_theta) / cos_theta.abs();
        (f, wi, Prob::Mass(1.0))
    }

    fn pdf(&self, _wo: Omega, _wi: Omega) -> f32 {
        0.0
    }
}

/// BSDF representing smooth dielectric material (e.g., glass). Ray scattering is both reflective
/// and transmissive, and the lobe is chosen with probability equal to its Fresnel weight.
#[derive(Debug, Clone)]
pub struct FresnelSpecular {
    reflect_albedo: Color,
    transmit_albedo: Color,
    eta_a: f32,
    eta_b: f32,
}

impl FresnelSpecular {
    /// Makes a new specular dielectric BSDF.
    /// - `reflect_albedo` and `transmit_albedo` is often the same.
    /// - `eta_a` is the IOR of the medium on the positive side of the normal vector, and `eta_b`
    ///   the opposite side.
    #[rustfmt::skip]
    pub fn new(reflect_albedo: Color, transmit_albedo: Color, eta_a: f32, eta_b: f32) -> Self {
        Self { reflect_albedo, transmit_albedo, eta_a, eta_b }
    }
}

impl BxDF for FresnelSpecular {
    fn get_type(&self) -> BxDFType {
        BxDFType {
            intrusion: IntrusionType::ReflectTransmit,
            smooth: SmoothnessType::Specular,
        }
    }

    fn eval(&self, _wo: Omega, _wi: Omega) -> Color {
        Color::black()
    }

    fn sample(&self, wo: Omega, rnd: (f32, f32, f32)) -> (Color, Omega, Prob) {
        let cos_o = wo.cos_theta();
        if cos_o == 0.0 {
            return null_sample();
        }
        let refl_coeff = Fresnel::dielectric(self.eta_a, self.eta_b).refl_coeff(cos_o);
        if rnd.0 < refl_coeff {
            let wi = wo.reflected();
            let f = self.reflect_albedo * refl_coeff / cos_o.abs();
            return (f, wi, Prob::Mass(refl_coeff));
        }
        // Computes the normal for computing the refraction. It is flipped to the side forming an
        // acute angle with `wo`.
        let (eta_i, eta_t, normal) = if cos_o > 0.0 {
            (self.eta_a, self.eta_b, Vec3::Z)
        } else {
            (self.eta_b, self.eta_a, -Vec3::Z)
        };
        match hcm::refract(normal, wo.0, eta_i / eta_t) {
            hcm::FullReflect(_) => null_sample(),
            hcm::Transmit(wi) => {
                let wi = Omega(wi);
                if wi.cos_theta() == 0.0 {
                    return null_sample();
                }
                let transmit_coeff = 1.0 - refl_coeff;
                let f = self.transmit_albedo * transmit_coeff / wi.cos_theta().abs();
                (f, wi, Prob::Mass(transmit_coeff))
            }
        }
    }

    fn pdf(&self, _wo: Omega, _wi: Omega) -> f32 {
        0.0
    }
}

/// Rough dielectric interface with a GGX microfacet distribution, both reflecting and
/// transmitting. `eta_a` is the IOR on the +z side and `eta_b` on the -z side.
#[derive(Debug, Clone)]
pub struct RoughDielectric {
    reflect_albedo: Color,
    transmit_albedo: Color,
    eta_a: f32,
    eta_b: f32,
    distrib: TrowbridgeReitz,
}

impl RoughDielectric {
    #[rustfmt::skip]
    pub fn new(
        reflect_albedo: Color, transmit_albedo: Color, eta_a: f32, eta_b: f32, roughness: f32,
    ) -> Self {
        let distrib = TrowbridgeReitz::from_roughness(roughness);
        Self { reflect_albedo, transmit_albedo, eta_a, eta_b, distrib }
    }

    /// IORs on the side of `wo` and the other side.
    fn etas(&self, wo: Omega) -> (f32, f32) {
        if wo.cos_theta() > 0.0 {
            (self.eta_a, self.eta_b)
        } else {
            (self.eta_b, self.eta_a)
        }
    }

    /// Computes the microfacet normal (oriented to +z) that scatters `wo` into `wi`, and whether
    /// the scattering is a reflection. Returns `None` for degenerate or back-facing
    /// configurations.
    fn half_vector(&self, wo: Omega, wi: Omega) -> Option<(Omega, bool)> {
        let (cos_o, cos_i) = (wo.cos_theta(), wi.cos_theta());
        if cos_o == 0.0 || cos_i == 0.0 {
            return None;
        }
        let is_reflection = cos_o * cos_i > 0.0;
        let wh = if is_reflection {
            wo.0 + wi.0
        } else {
            let (eta_i, eta_t) = self.etas(wo);
            wo.0 * eta_i + wi.0 * eta_t
        };
        let wh = Omega(wh.try_hat()?).face_forward(Omega::normal());
        if wh.dot(wo) * cos_o <= 0.0 || wh.dot(wi) * cos_i <= 0.0 {
            return None;
        }
        Some((wh, is_reflection))
    }

    fn refl_coeff(&self, wo: Omega, wh: Omega) -> f32 {
        Fresnel::dielectric(self.eta_a, self.eta_b).refl_coeff(wo.dot(wh))
    }
}

impl BxDF for RoughDielectric {
    fn get_type(&self) -> BxDFType {
        BxDFType {
            intrusion: IntrusionType::ReflectTransmit,
            smooth: SmoothnessType::Glossy,
        }
    }

    fn eval(&self, wo: Omega, wi: Omega) -> Color {
        let Some((wh, is_reflection)) = self.half_vector(wo, wi) else {
            return Color::black();
        };
        let (cos_o, cos_i) = (wo.cos_theta(), wi.cos_theta());
        let fr = self.refl_coeff(wo, wh);
        let dg = self.distrib.d(wh) * self.distrib.g(wo, wi);
        if is_reflection {
            self.reflect_albedo * (fr * dg / (4.0 * cos_o * cos_i)).abs()
        } else {
            let (eta_i, eta_t) = self.etas(wo);
            let eta = eta_t / eta_i;
            let denom = wo.dot(wh) + eta * wi.dot(wh);
            if denom.abs() < 1e-6 {
                return Color::black();
            }
            let value = (1.0 - fr) * dg * eta.powi(2) * (wi.dot(wh) * wo.dot(wh)).abs()
                / (cos_i * cos_o * denom.powi(2)).abs();
            self.transmit_albedo * value
        }
    }

    fn sample(&self, wo: Omega, rnd: (f32, f32, f32)) -> (Color, Omega, Prob) {
        let cos_o = wo.cos_theta();
        if cos_o == 0.0 {
            return null_sample();
        }
        let wh = self.distrib.sample_wh((rnd.0, rnd.1));
        if wo.dot(wh) * cos_o <= 0.0 {
            return null_sample();
        }
        let fr = self.refl_coeff(wo, wh);
        let wi = if rnd.2 < fr {
            let wi = Omega(hcm::reflect(wh.0, wo.0));
            if !wi.same_hemisphere(wo) {
                return null_sample();
            }
            wi
        } else {
            let (eta_i, eta_t) = self.etas(wo);
            let facing_wh = if cos_o > 0.0 { wh } else { -wh };
            match hcm::refract(facing_wh.0, wo.0, eta_i / eta_t) {
                hcm::FullReflect(_) => return null_sample(),
                hcm::Transmit(wi) => {
                    let wi = Omega(wi);
                    if wi.cos_theta() * cos_o >= 0.0 {
                        return null_sample();
                    }
                    wi
                }
            }
        };
        let pdf = self.pdf(wo, wi);
        if pdf <= 0.0 {
            return null_sample();
        }
        (self.eval(wo, wi), wi, Prob::Density(pdf))
    }

    fn pdf(&self, wo: Omega, wi: Omega) -> f32 {
        let Some((wh, is_reflection)) = self.half_vector(wo, wi) else {
            return 0.0;
        };
        let fr = self.refl_coeff(wo, wh);
        let pdf_wh = self.distrib.pdf(wh);
        if is_reflection {
            fr * pdf_wh / (4.0 * wo.dot(wh).abs())
        } else {
            let (eta_i, eta_t) = self.etas(wo);
            let eta = eta_t / eta_i;
            let denom = wo.dot(wh) + eta * wi.dot(wh);
            if denom.abs() < 1e-6 {
                return 0.0;
            }
            (1.0 - fr) * pdf_wh * eta.powi(2) * wi.dot(wh).abs() / denom.powi(2)
        }
    }
}

#[derive(Debug, Clone)]
pub struct LambertianReflection {
    albedo: Color,
}

impl LambertianReflection {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl BxDF for LambertianReflection {
    fn get_type(&self) -> BxDFType {
        BxDFType {
            intrusion: IntrusionType::Reflection,
            smooth: SmoothnessType::Diffuse,
        }
    }

    fn eval(&self, wo: Omega, wi: Omega) -> Color {
        if wo.same_hemisphere(wi) {
            self.albedo * INV_PI
        } else {
            Color::black()
        }
    }

    fn sample(&self, wo: Omega, rnd: (f32, f32, f32)) -> (Color, Omega, Prob) {
        let wi = cos_sample_hemisphere((rnd.0, rnd.1));
        let wi = if wo.cos_theta() < 0.0 { Omega::new(wi.x(), wi.y(), -wi.z()) } else { wi };
        let pdf = self.pdf(wo, wi);
        if pdf == 0.0 {
            return null_sample();
        }
        (self.eval(wo, wi), wi, Prob::Density(pdf))
    }

    fn pdf(&self, wo: Omega, wi: Omega) -> f32 {
        if wo.same_hemisphere(wi) {
            cos_hemisphere_pdf(wi)
        } else {
            0.0
        }
    }
}
