mod infinite;

use geometry::bxdf::cos_sample_hemisphere;
use geometry::error::require_positive;
use geometry::ray::Ray;
use geometry::{BuildError, Interaction};
use math::float::INV_PI;
use math::hcm::{make_coord_system, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use shape::{area_to_solid_angle, Shape};
use std::f32::consts::PI;
use std::sync::Arc;

pub use infinite::InfiniteAreaLight;

/// An emission ray leaving a light, with the densities of its origin (per unit area) and its
/// direction (per unit solid angle).
#[derive(Debug, Clone, Copy)]
pub struct EmissionSample {
    pub radiance: Color,
    pub ray: Ray,
    pub normal: Vec3,
    pub pdf_pos: f32,
    pub pdf_dir: f32,
}

impl EmissionSample {
    fn none(ray: Ray) -> Self {
        Self {
            radiance: Color::black(),
            ray,
            normal: Vec3::ZERO,
            pdf_pos: 0.0,
            pdf_dir: 0.0,
        }
    }
}

pub trait Light: Send + Sync + std::fmt::Debug {
    /// Samples a direction along which the light illuminates `target`, regardless of occlusion.
    /// - Returns the incident radiance, the incident direction `wi` (pointing away from
    ///   `target`), the solid-angle density of `wi`, and the ray to test the visibility with.
    /// - A zero density (and black radiance) means the sample failed.
    fn sample_li(&self, target: &Interaction, rnd2: (f32, f32)) -> (Color, Vec3, Prob, Ray);

    /// Solid-angle density that `sample_li` from `target` produces `wi`.
    fn pdf_li(&self, target: &Interaction, wi: Vec3) -> f32;

    /// Total emitted power.
    fn power(&self) -> Color;

    /// Radiance carried by a ray that escapes the scene. Only infinite lights emit any.
    fn le(&self, _ray: &Ray) -> Color {
        Color::black()
    }

    /// Samples a ray leaving the light.
    fn sample_le(&self, rnd_pos: (f32, f32), rnd_dir: (f32, f32)) -> EmissionSample;

    fn is_infinite(&self) -> bool {
        false
    }

    fn summary(&self) -> String;
}

/// Area light emitting a constant radiance from the front side (the side the normal faces) of a
/// shape, or from both sides if it is two-sided.
#[derive(Debug)]
pub struct DiffuseAreaLight {
    emit_radiance: Color,
    shape: Arc<dyn Shape>,
    area: f32,
    two_sided: bool,
}

impl DiffuseAreaLight {
    pub fn new(emit_radiance: Color, shape: Arc<dyn Shape>) -> Result<Self, BuildError> {
        if !emit_radiance.is_finite() || emit_radiance.has_negative() {
            return Err(BuildError::invalid(
                "emit_radiance",
                format!("expected a non-negative finite color, got {}", emit_radiance),
            ));
        }
        let area = require_positive("area", shape.area())?;
        Ok(Self {
            emit_radiance,
            shape,
            area,
            two_sided: false,
        })
    }

    pub fn two_sided(self, two_sided: bool) -> Self {
        Self { two_sided, ..self }
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }

    /// Radiance leaving the surface point `isect` in direction `w`.
    pub fn l(&self, isect: &Interaction, w: Vec3) -> Color {
        if self.two_sided || isect.normal.dot(w) > 0.0 {
            self.emit_radiance
        } else {
            Color::black()
        }
    }
}

impl Light for DiffuseAreaLight {
    fn sample_li(&self, target: &Interaction, rnd2: (f32, f32)) -> (Color, Vec3, Prob, Ray) {
        let (point, pdf_area) = self.shape.sample(rnd2);
        let vis_ray = target.spawn_ray_to(point.pos);
        let wi = match (point.pos - target.pos).try_hat() {
            Some(wi) => wi,
            None => return (Color::black(), Vec3::ZERO, Prob::Density(0.0), vis_ray),
        };
        let pdf = area_to_solid_angle(
            pdf_area,
            point.pos.squared_distance_to(target.pos),
            point.normal.dot(wi),
        );
        if pdf == 0.0 {
            return (Color::black(), wi, Prob::Density(0.0), vis_ray);
        }
        (self.l(&point, -wi), wi, Prob::Density(pdf), vis_ray)
    }

    fn pdf_li(&self, target: &Interaction, wi: Vec3) -> f32 {
        self.shape.pdf_solid_angle(target, wi)
    }

    fn power(&self) -> Color {
        let sides = if self.two_sided { 2.0 } else { 1.0 };
        self.emit_radiance * (self.area * PI * sides)
    }

    fn sample_le(&self, rnd_pos: (f32, f32), rnd_dir: (f32, f32)) -> EmissionSample {
        let (point, pdf_pos) = self.shape.sample(rnd_pos);
        let (u, v) = rnd_dir;
        // Two-sided lights pick a side with the first coordinate and rescale it.
        let (side, u, side_pr) = match (self.two_sided, u < 0.5) {
            (false, _) => (1.0, u, 1.0),
            (true, true) => (1.0, u * 2.0, 0.5),
            (true, false) => (-1.0, (u - 0.5) * 2.0, 0.5),
        };
        let local = cos_sample_hemisphere((u.min(math::float::ONE_MINUS_EPSILON), v));
        let normal = point.normal * side;
        let (tangent, bitangent) = make_coord_system(normal);
        let dir = tangent * local.x() + bitangent * local.y() + normal * local.z();
        let ray = point.spawn_ray(dir);
        let pdf_dir = local.z() * INV_PI * side_pr;
        if pdf_dir == 0.0 {
            return EmissionSample::none(ray);
        }
        EmissionSample {
            radiance: self.l(&point, dir),
            ray,
            normal: point.normal,
            pdf_pos,
            pdf_dir,
        }
    }

    fn summary(&self) -> String {
        format!(
            "DiffuseAreaLight{{radiance = {}, two_sided = {}, shape = {}}}",
            self.emit_radiance,
            self.two_sided,
            self.shape.summary()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3};
    use shape::Sphere;

    fn unit_sphere_light() -> DiffuseAreaLight {
        let sphere = Sphere::from_raw((0.0, 0.0, 0.0), 1.0).unwrap();
        DiffuseAreaLight::new(Color::gray(2.0), Arc::new(sphere)).unwrap()
    }

    #[test]
    fn rejects_negative_radiance() {
        let sphere = Arc::new(Sphere::from_raw((0.0, 0.0, 0.0), 1.0).unwrap());
        assert!(DiffuseAreaLight::new(Color::new(1.0, -1.0, 0.0), sphere).is_err());
    }

    #[test]
    fn power_counts_sides() {
        let light = unit_sphere_light();
        let one_sided = light.power();
        assert!((one_sided.average() - 2.0 * 4.0 * PI * PI).abs() < 1e-3);
        let light = light.two_sided(true);
        assert!((light.power().average() - 2.0 * one_sided.average()).abs() < 1e-3);
    }

    #[test]
    fn emits_towards_the_front_only() {
        let light = unit_sphere_light();
        let isect = Interaction::rayless(point3(0.0, 0.0, 1.0), (0.0, 0.0), Vec3::Z);
        assert_eq!(light.l(&isect, vec3(0.0, 0.3, 1.0)), Color::gray(2.0));
        assert!(light.l(&isect, vec3(0.0, 0.3, -1.0)).is_black());
    }

    #[test]
    fn sample_li_faces_the_target() {
        let light = unit_sphere_light();
        let target = Interaction::rayless(point3(0.0, 0.0, 5.0), (0.0, 0.0), Vec3::Z);
        let (radiance, wi, pdf, vis) = light.sample_li(&target, (0.3, 0.7));
        if pdf.density() > 0.0 && !radiance.is_black() {
            assert!(wi.dot(-Vec3::Z) > 0.0);
            assert!(vis.t_max < 1.0);
        }
    }
}
