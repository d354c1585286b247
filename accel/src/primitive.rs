use geometry::bbox::BBox;
use geometry::{BuildError, Interaction};
use light::DiffuseAreaLight;
use material::Material;
use math::hcm::Vec3;
use medium::Medium;
use radiometry::color::Color;
use shape::Shape;
use std::sync::Arc;

/// A shape placed in the scene together with what it looks like: its material, an optional area
/// light when the shape emits, and an optional medium filling its interior.
#[derive(Clone)]
pub struct Primitive {
    pub shape: Arc<dyn Shape>,
    pub material: Arc<dyn Material>,
    pub area_light: Option<Arc<DiffuseAreaLight>>,
    pub medium: Option<Arc<dyn Medium>>,
}

impl std::fmt::Debug for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Primitive[{}, {}{}{}]",
            self.shape.summary(),
            self.material.summary(),
            if self.area_light.is_some() { ", emissive" } else { "" },
            if self.medium.is_some() { ", with medium" } else { "" }
        )
    }
}

impl Primitive {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn Material>) -> Self {
        Primitive {
            shape,
            material,
            area_light: None,
            medium: None,
        }
    }

    pub fn from_raw<S: 'static, M: 'static>(shape: S, mtl: M) -> Self
    where
        S: Shape,
        M: Material,
    {
        Primitive::new(Arc::new(shape), Arc::new(mtl))
    }

    /// Makes the shape emit `radiance` from its front side.
    pub fn emissive(self, radiance: Color) -> Result<Self, BuildError> {
        let light = DiffuseAreaLight::new(radiance, self.shape.clone())?;
        Ok(self.with_area_light(Arc::new(light)))
    }

    /// Attaches an existing area light, which must be bound to the same shape.
    pub fn with_area_light(self, light: Arc<DiffuseAreaLight>) -> Self {
        debug_assert!(Arc::ptr_eq(light.shape(), &self.shape));
        Primitive {
            area_light: Some(light),
            ..self
        }
    }

    pub fn with_medium(self, medium: Arc<dyn Medium>) -> Self {
        Primitive {
            medium: Some(medium),
            ..self
        }
    }

    pub fn bbox(&self) -> BBox {
        self.shape.bbox()
    }

    /// Radiance emitted from `isect` (a point on this primitive) towards `w`.
    pub fn le(&self, isect: &Interaction, w: Vec3) -> Color {
        match &self.area_light {
            Some(light) => light.l(isect, w),
            None => Color::black(),
        }
    }
}
