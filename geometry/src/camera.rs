use crate::error::BuildError;
use crate::ray::Ray;
use math::hcm::{Mat3, Point3, Vec3};

/// Pinhole camera in a left-handed coordinate system: x rightward, y upward, z forward.
///
/// Pixel `(row, col)` covers the square `[col, col + 1) x [row, row + 1)` on the film, with row 0
/// at the top.
#[derive(Debug, Clone)]
pub struct Camera {
    center: Point3,
    a: Vec3,
    b: Vec3,
    c: Vec3,

    // Film image resolution.
    width: u32,
    height: u32,

    orientation: Mat3,
}

impl Camera {
    /// Makes a camera at the origin looking at +z. `fov_y` is the vertical field of view in
    /// radians and must lie in `(0, pi)`.
    pub fn new(resolution: (u32, u32), fov_y: f32) -> Result<Camera, BuildError> {
        let (width, height) = resolution;
        if width == 0 || height == 0 {
            return Err(BuildError::invalid("resolution", "must be nonzero"));
        }
        if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
            return Err(BuildError::invalid("fov_y", "must lie in (0, pi)"));
        }
        let aspect_ratio = width as f32 / height as f32;
        let half_vertical = (fov_y * 0.5).tan();
        let half_horizontal = half_vertical * aspect_ratio;

        Ok(Camera {
            center: Point3::ORIGIN,
            a: Vec3::new(2.0 * half_horizontal / width as f32, 0.0, 0.0),
            b: Vec3::new(0.0, -2.0 * half_vertical / height as f32, 0.0),
            c: Vec3::new(-half_horizontal, half_vertical, 1.0),
            width,
            height,
            orientation: Mat3::IDENTITY,
        })
    }

    pub fn looking_at(self, from: Point3, target: Point3, up: Vec3) -> Self {
        let forward = (target - from).hat(); // new z-axis
        let right = (up.cross(forward)).hat(); // new x-axis, equals to cross(y, z)
        let up = forward.cross(right); // adjusted y-axis, equals to cross(z, x)

        Self {
            orientation: Mat3::from_cols(right, up, forward),
            center: from,
            ..self
        }
    }

    /// Generates a ray through pixel `(row, col)`, displaced by `(dx, dy)` within the pixel.
    /// Returns `None` if the pixel lies outside of the film.
    pub fn shoot_ray(&self, row: u32, col: u32, (dx, dy): (f32, f32)) -> Option<Ray> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let x = col as f32 + dx.fract();
        let y = row as f32 + dy.fract();
        let dir = self.orientation * (self.c + self.a * x + self.b * y);
        Some(Ray::new(self.center, dir.hat()))
    }

    /// Returns resolution (width x height) of the camera film.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
