use crate::{Shape, SurfacePoint};
use geometry::bbox::BBox;
use geometry::bxdf::uniform_sample_sphere;
use geometry::error::require_positive;
use geometry::ray::Ray;
use geometry::{AffineTransform, BuildError, Interaction, Transform};
use math::float::min_max;
use math::hcm::{Point3, Vec3};
use std::f32::consts::PI;

/// Sphere centered at the origin of its object space. The object-to-world transform may rotate,
/// translate and uniformly scale, but not shear or scale non-uniformly.
#[derive(Debug, Clone)]
pub struct Sphere {
    to_world: AffineTransform,
    to_object: AffineTransform,
    radius: f32,
    world_radius: f32,
}

impl Sphere {
    pub fn new(to_world: AffineTransform, radius: f32) -> Result<Sphere, BuildError> {
        let radius = require_positive("radius", radius)?;
        let scale = to_world
            .uniform_scale()
            .ok_or(BuildError::NonUniformScale("Sphere"))?;
        Ok(Sphere {
            to_object: to_world.inverse(),
            to_world,
            radius,
            world_radius: radius * scale,
        })
    }

    /// Makes a sphere with given world-space center and radius.
    pub fn from_raw(center: (f32, f32, f32), radius: f32) -> Result<Sphere, BuildError> {
        let (x, y, z) = center;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(BuildError::invalid("center", "must be finite"));
        }
        Self::new(AffineTransform::translater(Vec3::new(x, y, z)), radius)
    }

    pub fn center(&self) -> Point3 {
        self.to_world.apply(Point3::ORIGIN)
    }
    pub fn radius(&self) -> f32 {
        self.world_radius
    }

    /// Spherical (u, v) coordinates of an object-space point on the sphere.
    fn uv_of(&self, p: Vec3) -> (f32, f32) {
        let phi = p.y.atan2(p.x);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        let theta = (p.z / self.radius).clamp(-1.0, 1.0).acos();
        (phi / (2.0 * PI), theta / PI)
    }

    fn surface_interaction(&self, p_obj: Vec3, ray_t: f32, wo: Vec3) -> Interaction {
        // Reprojects the point onto the surface to reduce the error of the ray evaluation.
        let p_obj = p_obj * (self.radius / p_obj.norm());
        let pos = self.to_world.apply(Point3::from(p_obj));
        let normal = self.to_world.apply_normal(p_obj).hat();
        // For an object-space point (x, y, z), rotating (x, y) by 90 degrees around z gives
        // dpdu = (-y, x, 0); at the poles it vanishes and a tangent is picked arbitrarily.
        let dpdu = self.to_world.apply(Vec3::new(-p_obj.y, p_obj.x, 0.0));
        Interaction::new(pos, ray_t, self.uv_of(p_obj), normal, wo).with_dpdu(dpdu)
    }
}

impl Shape for Sphere {
    fn summary(&self) -> String {
        format!(
            "Sphere{{ {}, radius = {} }}",
            self.center(),
            self.world_radius
        )
    }

    fn bbox(&self) -> BBox {
        let half_diagonal = Vec3::new(1.0, 1.0, 1.0) * self.world_radius;
        let center = self.center();
        BBox::new(center - half_diagonal, center + half_diagonal)
    }

    fn intersect(&self, r: &Ray) -> Option<SurfacePoint> {
        // r = o + td
        // sphere: p * p = radius^2
        // t^2 d^2 + 2t d * o + o^2 - radius^2 = 0
        let r_obj = self.to_object.apply(*r);
        let f = Vec3::from(r_obj.origin);
        let d = r_obj.dir;
        let a = d.norm_squared();
        let b_prime = -f.dot(d);
        // Computed as radius^2 - |f + b'/a * d|^2 instead of b'^2 - ac, which loses precision
        // when the ray origin is far from the sphere.
        let delta = self.radius * self.radius - (f + b_prime / a * d).norm_squared();
        if delta < 0.0 {
            return None;
        }
        let c = f.norm_squared() - self.radius * self.radius;
        let q = b_prime + b_prime.signum() * (delta * a).sqrt();
        let (t_low, t_high) = min_max(c / q, q / a);
        let t = r.truncated_t(t_low).or_else(|| r.truncated_t(t_high))?;
        let uv = self.uv_of(Vec3::from(r_obj.position_at(t)));
        Some(SurfacePoint { t, uv })
    }

    fn interaction(&self, r: &Ray, hit: &SurfacePoint) -> Interaction {
        let r_obj = self.to_object.apply(*r);
        let p_obj = Vec3::from(r_obj.position_at(hit.t));
        self.surface_interaction(p_obj, hit.t, -r.dir.hat())
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.world_radius.powi(2)
    }

    fn sample(&self, rnd2: (f32, f32)) -> (Interaction, f32) {
        let p_obj = uniform_sample_sphere(rnd2) * self.radius;
        let point = self.surface_interaction(p_obj, f32::INFINITY, Vec3::ZERO);
        (point, self.area().recip())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_bad_construction() {
        assert!(Sphere::from_raw((0.0, 0.0, 0.0), 0.0).is_err());
        assert!(Sphere::from_raw((0.0, 0.0, 0.0), -1.0).is_err());
        assert!(Sphere::from_raw((f32::NAN, 0.0, 0.0), 1.0).is_err());
        let squash = AffineTransform::scaler(Vec3::new(1.0, 2.0, 1.0)).unwrap();
        assert_eq!(
            Sphere::new(squash, 1.0).unwrap_err(),
            BuildError::NonUniformScale("Sphere")
        );
    }

    #[test]
    fn scaled_sphere_radius() {
        let to_world = AffineTransform::translater(Vec3::new(1.0, 0.0, 0.0))
            * AffineTransform::scaler(Vec3::new(2.0, 2.0, 2.0)).unwrap();
        let sphere = Sphere::new(to_world, 1.5).unwrap();
        assert!((sphere.radius() - 3.0).abs() < 1e-5);
        assert!((sphere.area() - 36.0 * PI).abs() < 1e-3);
        assert_eq!(sphere.center(), Point3::new(1.0, 0.0, 0.0));
    }
}
