mod sphere;
mod triangle;

use geometry::bbox::BBox;
use geometry::ray::Ray;
use geometry::Interaction;
use math::hcm::Vec3;

pub use sphere::Sphere;
pub use triangle::{Triangle, TriangleMesh};

/// The cheap result of a ray-shape intersection test: the ray parameter of the hit and the
/// shape-specific parametric coordinates (barycentrics for triangles, spherical angles for
/// spheres). Enough to decide the nearest candidate; the full [`Interaction`] is computed from it
/// later, once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub t: f32,
    pub uv: (f32, f32),
}

/// Represents the characteristics of a shape: has a bounding box, and can interact with a ray.
///
/// Intersection is a two-phase protocol:
/// - `intersect()` is called for every candidate during acceleration structure traversal and only
///   computes a [`SurfacePoint`];
/// - `interaction()` turns the surface point of the final nearest hit into a full shading
///   [`Interaction`] (position, normal, texture coordinates, shading frame).
///
/// Implementations in this crate: [`Sphere`] and [`Triangle`].
pub trait Shape: Send + Sync + std::fmt::Debug {
    fn summary(&self) -> String;
    fn bbox(&self) -> BBox;

    /// Finds the nearest intersection within the extent of `r`.
    fn intersect(&self, r: &Ray) -> Option<SurfacePoint>;

    /// Computes the full interaction for a hit previously returned by `intersect(r)`.
    fn interaction(&self, r: &Ray, hit: &SurfacePoint) -> Interaction;

    fn occludes(&self, r: &Ray) -> bool {
        self.intersect(r).is_some()
    }

    /// World-space surface area.
    fn area(&self) -> f32;

    /// Samples a point uniformly by area on the surface. Returns the point and its density with
    /// respect to surface area.
    fn sample(&self, rnd2: (f32, f32)) -> (Interaction, f32);

    /// Density, with respect to solid angle at `reference`, that sampling the shape by area
    /// produces the direction `wi`. Returns 0 if `wi` misses the shape or the density is
    /// infinite.
    fn pdf_solid_angle(&self, reference: &Interaction, wi: Vec3) -> f32 {
        let ray = reference.spawn_ray(wi);
        let hit = match self.intersect(&ray) {
            Some(hit) => hit,
            None => return 0.0,
        };
        let light_point = self.interaction(&ray, &hit);
        area_to_solid_angle(
            self.area().recip(),
            reference.pos.squared_distance_to(light_point.pos),
            light_point.normal.dot(-wi.hat()),
        )
    }
}

/// Converts an area density to a solid-angle density: `pdf_area * distance^2 / |cos(theta)|`.
/// Returns 0 instead of infinity.
pub fn area_to_solid_angle(pdf_area: f32, distance_squared: f32, cos_theta: f32) -> f32 {
    let pdf = pdf_area * distance_squared / cos_theta.abs();
    if pdf.is_finite() {
        pdf
    } else {
        0.0
    }
}
