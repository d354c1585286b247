use geometry::bxdf::{BxDF, BxDFType, Omega, BXDF};
use geometry::Interaction;
use math::hcm::{Mat3, Vec3};
use math::prob::Prob;
use radiometry::color::Color;

/// Models the scattering of rays at a surface intersection, in the global coordinate space.
///
/// Wraps a local-frame [`BXDF`] together with the shading frame of the interaction; all
/// directions passed in and out are unit world-space vectors pointing away from the surface.
#[derive(Debug, Clone)]
pub struct Bsdf {
    frame: Mat3,
    bxdf: BXDF,
}

impl Bsdf {
    pub fn new(isect: &Interaction, bxdf: BXDF) -> Self {
        debug_assert!(isect.has_valid_frame());
        Self {
            frame: isect.shading_frame(),
            bxdf,
        }
    }

    pub fn frame(&self) -> Mat3 {
        self.frame
    }

    pub fn bxdf_type(&self) -> BxDFType {
        self.bxdf.get_type()
    }

    pub fn is_specular(&self) -> bool {
        self.bxdf.get_type().is_specular()
    }

    pub fn eval(&self, wo: Vec3, wi: Vec3) -> Color {
        let wo = self.world_to_local(wo);
        if wo.z() == 0.0 {
            return Color::black();
        }
        self.bxdf.eval(wo, self.world_to_local(wi))
    }

    pub fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
        self.bxdf
            .pdf(self.world_to_local(wo), self.world_to_local(wi))
    }

    /// Samples an incident direction. Returns the BSDF value, the world-space direction and its
    /// probability; a zero probability marks a discarded sample.
    pub fn sample(&self, wo: Vec3, rnd: (f32, f32, f32)) -> (Color, Vec3, Prob) {
        let wo = self.world_to_local(wo);
        if wo.z() == 0.0 {
            return (Color::black(), Vec3::ZERO, Prob::Density(0.0));
        }
        let (f, wi, pr) = self.bxdf.sample(wo, rnd);
        (f, self.local_to_world(wi), pr)
    }

    pub fn world_to_local(&self, world: Vec3) -> Omega {
        let cols = self.frame.cols;
        Omega::new(cols[0].dot(world), cols[1].dot(world), cols[2].dot(world))
    }

    pub fn local_to_world(&self, local: Omega) -> Vec3 {
        let cols = self.frame.cols;
        local.x() * cols[0] + local.y() * cols[1] + local.z() * cols[2]
    }
}
