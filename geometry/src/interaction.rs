use crate::bxdf::Omega;
use crate::ray::Ray;
use math::hcm::{make_coord_system, Mat3, Point3, Vec3};
use std::fmt::{Display, Formatter, Result};

/// Relative offset applied to spawned ray origins along the geometric normal.
const RAY_OFFSET: f32 = 1e-4;
/// Fraction of a shadow ray trimmed at the target end.
const SHADOW_EPSILON: f32 = 1e-4;

/// Contains geometric information on a ray-surface intersection (or a scattering point inside a
/// medium, which has no normal):
///  - `pos`: position of intersection
///  - `ray_t`: t-value of the ray at the intersection.
///  - `normal`: unit geometric normal of the surface, facing the shape's outside.
///  - `uv`: shape-specific surface parameterization.
///  - `wo`: unit direction pointing back towards where the incoming ray came from.
///  - a tangent-bitangent-normal shading frame, whose normal may differ from `normal` for
///    surfaces with interpolated normals.
#[derive(Debug, Clone, Copy)]
pub struct Interaction {
    pub pos: Point3,
    pub ray_t: f32,
    pub uv: (f32, f32),
    pub normal: Vec3,
    pub wo: Vec3,
    tbn_frame: Mat3,
}

impl Interaction {
    pub fn new(pos: Point3, ray_t: f32, uv: (f32, f32), normal: Vec3, wo: Vec3) -> Interaction {
        Interaction {
            pos,
            ray_t,
            uv,
            normal,
            wo,
            tbn_frame: Mat3::ZERO,
        }
    }

    /// A surface point that doesn't originate from a ray, e.g., a point sampled on a light.
    pub fn rayless(pos: Point3, uv: (f32, f32), normal: Vec3) -> Interaction {
        Self::new(pos, f32::INFINITY, uv, normal, Vec3::ZERO)
    }

    /// A scattering point inside a participating medium. It has neither normal nor shading frame,
    /// and rays spawned from it are not offset.
    pub fn in_medium(pos: Point3, ray_t: f32, wo: Vec3) -> Interaction {
        Self::new(pos, ray_t, (0.0, 0.0), Vec3::ZERO, wo)
    }

    pub fn is_surface(&self) -> bool {
        !self.normal.is_zero()
    }

    pub fn tangent(&self) -> Vec3 {
        self.tbn_frame.cols[0]
    }

    pub fn shading_normal(&self) -> Vec3 {
        self.tbn_frame.cols[2]
    }

    /// Columns are the tangent, bitangent and shading normal.
    pub fn shading_frame(&self) -> Mat3 {
        self.tbn_frame
    }

    /// Builds the tangent-bitangent-normal frame with the given tangent and the geometric normal.
    pub fn with_dpdu(self, dpdu: Vec3) -> Interaction {
        self.with_shading_frame(self.normal, dpdu)
    }

    /// Builds the shading frame around `shading_normal` (flipped to the geometric normal's side
    /// if necessary). A tangent that is parallel to the normal is replaced with an arbitrary one.
    pub fn with_shading_frame(self, shading_normal: Vec3, dpdu: Vec3) -> Interaction {
        let normal = shading_normal
            .try_hat()
            .unwrap_or(self.normal)
            .face_forward(self.normal);
        let (dpdu, bitangent) = match normal.cross(dpdu).try_hat() {
            Some(bitangent) => (bitangent.cross(normal), bitangent),
            None => {
                let (t, b) = make_coord_system(normal);
                (t, b)
            }
        };
        Self {
            tbn_frame: Mat3::from_cols(dpdu, bitangent, normal),
            ..self
        }
    }

    /// Expresses `world` in the shading frame. The vector is not renormalized.
    pub fn world_to_local(&self, world: Vec3) -> Omega {
        debug_assert!(self.has_valid_frame());
        let cols = self.tbn_frame.cols;
        Omega::new(cols[0].dot(world), cols[1].dot(world), cols[2].dot(world))
    }

    pub fn local_to_world(&self, local: Omega) -> Vec3 {
        debug_assert!(self.has_valid_frame());
        let cols = self.tbn_frame.cols;
        local.x() * cols[0] + local.y() * cols[1] + local.z() * cols[2]
    }

    fn offset_origin(&self, dir: Vec3) -> Point3 {
        let scale = RAY_OFFSET * (1.0 + Vec3::from(self.pos).abs().max_component());
        let out_normal = dir.dot(self.normal).signum() * self.normal;
        self.pos + out_normal * scale
    }

    /// Spawns a ray leaving the surface along `dir`, offset to the side `dir` points to.
    pub fn spawn_ray(&self, dir: Vec3) -> Ray {
        Ray::new(self.offset_origin(dir), dir)
    }

    /// Spawns a ray towards `target` whose extent stops just short of it. `t` runs from 0 at the
    /// (offset) origin to 1 at the target.
    pub fn spawn_ray_to(&self, target: Point3) -> Ray {
        let origin = self.offset_origin(target - self.pos);
        Ray::new(origin, target - origin).with_extent(1.0 - SHADOW_EPSILON)
    }

    pub fn has_valid_frame(&self) -> bool {
        let cols = self.tbn_frame.cols;
        let det = cols[0].cross(cols[1]).dot(cols[2]);
        (det - 1.0).abs() < 1e-4
    }
}

impl Display for Interaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let (u, v) = self.uv;
        write!(
            f,
            "pos = {}, t = {:.2}, uv = ({:.2}, {:.2}), normal = {}",
            self.pos, self.ray_t, u, v, self.normal
        )
    }
}
