mod bsdf;

use geometry::bxdf::{self, Fresnel, BXDF};
use geometry::error::require_positive;
use geometry::{BuildError, Interaction};
use radiometry::color::Color;
use std::sync::Arc;
use texture::{Solid, Texture};

pub use bsdf::Bsdf;

/// Describes how light scatters at a surface. Materials are immutable and shared across render
/// threads; the per-hit scattering function is produced by `bsdf_at()`.
pub trait Material: Send + Sync + std::fmt::Debug {
    /// Computes the BSDF at a surface interaction. Returns `None` if the surface only marks a
    /// boundary between media, in which case rays pass through it unchanged.
    fn bsdf_at(&self, isect: &Interaction) -> Option<Bsdf>;

    fn summary(&self) -> String;
}

fn validate_albedo(name: &'static str, albedo: Color) -> Result<Color, BuildError> {
    if albedo.is_finite() && !albedo.has_negative() {
        Ok(albedo)
    } else {
        Err(BuildError::invalid(
            name,
            format!("expected a non-negative color, got {}", albedo),
        ))
    }
}

/// Lambertian diffuse surface with a (possibly textured) albedo.
#[derive(Debug, Clone)]
pub struct Matte {
    pub albedo: Arc<dyn Texture>,
}

impl Matte {
    pub fn textured(albedo: Arc<dyn Texture>) -> Self {
        Matte { albedo }
    }

    pub fn solid(c: Color) -> Result<Self, BuildError> {
        let albedo = validate_albedo("albedo", c)?;
        Ok(Self::textured(Arc::new(Solid::new(albedo))))
    }
}

impl Material for Matte {
    fn bsdf_at(&self, isect: &Interaction) -> Option<Bsdf> {
        let point_albedo = self.albedo.value(isect.uv, isect.pos);
        let lambertian = bxdf::LambertianReflection::new(point_albedo);
        Some(Bsdf::new(isect, lambertian.into()))
    }

    fn summary(&self) -> String {
        format!("Matte{{ {:?} }}", self.albedo)
    }
}

/// Ideal specular reflector.
#[derive(Debug, Clone)]
pub struct Mirror {
    pub albedo: Color,
}

impl Mirror {
    pub fn new(albedo: Color) -> Result<Self, BuildError> {
        Ok(Self {
            albedo: validate_albedo("albedo", albedo)?,
        })
    }
}

impl Material for Mirror {
    fn bsdf_at(&self, isect: &Interaction) -> Option<Bsdf> {
        let specular = bxdf::SpecularReflection::new(self.albedo, Fresnel::Nop);
        Some(Bsdf::new(isect, specular.into()))
    }

    fn summary(&self) -> String {
        format!("Mirror{{ albedo = {} }}", self.albedo)
    }
}

/// Smooth dielectric (glass, water). The index of refraction is that of the inside of the shape,
/// relative to the outside, where the outside is the side the geometric normal points to.
#[derive(Debug, Clone)]
pub struct Glass {
    pub refract_index: f32,
    pub reflect: Color,
    pub transmit: Color,
}

impl Glass {
    pub fn new(refract_index: f32) -> Result<Self, BuildError> {
        Ok(Self {
            refract_index: require_positive("refract_index", refract_index)?,
            reflect: Color::white(),
            transmit: Color::white(),
        })
    }

    pub fn with_colors(self, reflect: Color, transmit: Color) -> Result<Self, BuildError> {
        Ok(Self {
            reflect: validate_albedo("reflect", reflect)?,
            transmit: validate_albedo("transmit", transmit)?,
            ..self
        })
    }
}

impl Material for Glass {
    fn bsdf_at(&self, isect: &Interaction) -> Option<Bsdf> {
        let dielectric =
            bxdf::FresnelSpecular::new(self.reflect, self.transmit, 1.0, self.refract_index);
        Some(Bsdf::new(isect, dielectric.into()))
    }

    fn summary(&self) -> String {
        format!("Glass{{ ior = {} }}", self.refract_index)
    }
}

/// Rough dielectric with a GGX microfacet distribution.
#[derive(Debug, Clone)]
pub struct RoughGlass {
    pub refract_index: f32,
    pub roughness: f32,
    pub reflect: Color,
    pub transmit: Color,
}

impl RoughGlass {
    pub fn new(refract_index: f32, roughness: f32) -> Result<Self, BuildError> {
        if !(roughness.is_finite() && roughness >= 0.0) {
            return Err(BuildError::invalid(
                "roughness",
                format!("expected a non-negative value, got {}", roughness),
            ));
        }
        Ok(Self {
            refract_index: require_positive("refract_index", refract_index)?,
            roughness,
            reflect: Color::white(),
            transmit: Color::white(),
        })
    }

    pub fn with_colors(self, reflect: Color, transmit: Color) -> Result<Self, BuildError> {
        Ok(Self {
            reflect: validate_albedo("reflect", reflect)?,
            transmit: validate_albedo("transmit", transmit)?,
            ..self
        })
    }
}

impl Material for RoughGlass {
    fn bsdf_at(&self, isect: &Interaction) -> Option<Bsdf> {
        let rough = bxdf::RoughDielectric::new(
            self.reflect,
            self.transmit,
            1.0,
            self.refract_index,
            self.roughness,
        );
        Some(Bsdf::new(isect, BXDF::from(rough)))
    }

    fn summary(&self) -> String {
        format!(
            "RoughGlass{{ ior = {}, roughness = {} }}",
            self.refract_index, self.roughness
        )
    }
}

/// Invisible boundary of a participating medium.
#[derive(Debug, Clone, Default)]
pub struct Interface;

impl Material for Interface {
    fn bsdf_at(&self, _isect: &Interaction) -> Option<Bsdf> {
        None
    }

    fn summary(&self) -> String {
        String::from("Interface")
    }
}
