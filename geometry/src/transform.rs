use crate::bbox::BBox;
use crate::error::BuildError;
use crate::ray::Ray;
use math::hcm::{Mat4, Point3, Vec3};
use std::ops::Mul;

/// Invertible affine transform; the inverse is kept alongside so that points, directions and
/// normals can be mapped both ways without refactoring the matrix.
#[derive(Debug, Clone, Copy)]
pub struct AffineTransform {
    forward: Mat4,
    inverse: Mat4,
}

pub trait Transform<T> {
    fn apply(&self, x: T) -> T;
}

impl std::fmt::Display for AffineTransform {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.forward;
        write!(
            f,
            "\n|{:5.2} {:5.2} {:5.2} {:5.2}|\
             \n|{:5.2} {:5.2} {:5.2} {:5.2}|\
             \n|{:5.2} {:5.2} {:5.2} {:5.2}|\n",
            m.cols[0][0], m.cols[1][0], m.cols[2][0], m.cols[3][0],
            m.cols[0][1], m.cols[1][1], m.cols[2][1], m.cols[3][1],
            m.cols[0][2], m.cols[1][2], m.cols[2][2], m.cols[3][2],
        )
    }
}

impl AffineTransform {
    /// Wraps an arbitrary affine matrix. The bottom row must be (0, 0, 0, 1) and the matrix must
    /// be invertible.
    pub fn new(forward: Mat4) -> Result<Self, BuildError> {
        let bottom_row = [
            forward.cols[0][3],
            forward.cols[1][3],
            forward.cols[2][3],
            forward.cols[3][3],
        ];
        if bottom_row != [0.0, 0.0, 0.0, 1.0] {
            return Err(BuildError::invalid(
                "transform",
                format!("not affine, bottom row is {:?}", bottom_row),
            ));
        }
        let inverse = forward
            .try_inverse()
            .ok_or_else(|| BuildError::SingularTransform(forward.determinant()))?;
        Ok(Self { forward, inverse })
    }
    pub fn identity() -> Self {
        Self {
            forward: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
        }
    }
    pub fn translater(t: Vec3) -> Self {
        Self {
            forward: Mat4::translater(t),
            inverse: Mat4::translater(-t),
        }
    }
    /// Rotation of `angle` radians around `axis`.
    pub fn rotater(axis: Vec3, angle: f32) -> Result<Self, BuildError> {
        if axis.try_hat().is_none() || !angle.is_finite() {
            return Err(BuildError::invalid(
                "rotation",
                format!("axis {} / angle {} is degenerate", axis, angle),
            ));
        }
        let forward = Mat4::rotater(axis, angle);
        Ok(Self {
            forward,
            inverse: forward.transpose(),
        })
    }
    pub fn scaler(scale: Vec3) -> Result<Self, BuildError> {
        let Vec3 { x, y, z } = scale;
        let det = x * y * z;
        if det == 0.0 || !det.is_finite() {
            return Err(BuildError::SingularTransform(det));
        }
        let scale_inv = Vec3::new(1.0 / x, 1.0 / y, 1.0 / z);
        Ok(Self {
            forward: Mat4::nonuniform_scale(scale),
            inverse: Mat4::nonuniform_scale(scale_inv),
        })
    }

    pub fn inverse(&self) -> Self {
        Self {
            forward: self.inverse,
            inverse: self.forward,
        }
    }

    /// Returns the uniform scale factor if the linear part is a rotation times a uniform scale.
    pub fn uniform_scale(&self) -> Option<f32> {
        let m = self.forward.orientation();
        let gram = m.transpose() * m;
        let s2 = gram.cols[0][0];
        let tolerance = 1e-4 * s2;
        let is_uniform = (0..3).all(|i| {
            (0..3).all(|j| {
                let expected = if i == j { s2 } else { 0.0 };
                (gram.cols[i][j] - expected).abs() <= tolerance
            })
        });
        is_uniform.then(|| s2.sqrt())
    }

    /// Maps a surface normal: normals transform with the inverse transpose of the linear part.
    pub fn apply_normal(&self, n: Vec3) -> Vec3 {
        self.inverse.orientation().transpose() * n
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;
    fn mul(self, rhs: Self) -> Self::Output {
        // self * rhs -> self.forward * rhs.forward, rhs.inverse * self.inverse.
        Self {
            forward: self.forward * rhs.forward,
            inverse: rhs.inverse * self.inverse,
        }
    }
}

// Transforms on:
// - Vec3
// - Point3
// - Ray
// - BBox
// -------------------------------------------------------------------------------------------------

impl Transform<Vec3> for AffineTransform {
    fn apply(&self, x: Vec3) -> Vec3 {
        self.forward * x
    }
}
impl Transform<Point3> for AffineTransform {
    fn apply(&self, p: Point3) -> Point3 {
        self.forward * p
    }
}
impl Transform<Ray> for AffineTransform {
    /// The direction is not renormalized, so ray parameters `t` stay meaningful across spaces.
    fn apply(&self, r: Ray) -> Ray {
        Ray::new(self.apply(r.origin), self.apply(r.dir))
            .with_t_min(r.t_min)
            .with_extent(r.t_max)
    }
}
impl Transform<BBox> for AffineTransform {
    fn apply(&self, b: BBox) -> BBox {
        if b.is_empty() {
            return b;
        }
        b.all_corners()
            .iter()
            .fold(BBox::empty(), |res, corner| res.union(self.apply(*corner)))
    }
}
