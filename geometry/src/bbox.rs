use std::fmt::{Display, Formatter, Result};

use crate::ray::Ray;
use math::{
    float::{gamma, min_max},
    hcm::{Point3, Vec3},
};

/// 3D axis-aligned bounding-box type. Boundary check is closed (`[min, max]`) on all axes, and
/// boxes collapsed to zero extent on some axes are valid.
/// - Build one from 2 `Point3`s, or start from `BBox::empty()`;
/// - Expand it by `b.union()` or `union(b1, b2)`;
/// - Check if it `contains()` a point, `encloses()` or `overlaps()` another box, or
///   `intersect()`s a `Ray`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    min: Point3,
    max: Point3,
}

impl BBox {
    pub fn empty() -> BBox {
        BBox {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(-f32::INFINITY, -f32::INFINITY, -f32::INFINITY),
        }
    }
    pub fn new(p0: Point3, p1: Point3) -> BBox {
        let (xmin, xmax) = min_max(p0.x, p1.x);
        let (ymin, ymax) = min_max(p0.y, p1.y);
        let (zmin, zmax) = min_max(p0.z, p1.z);
        BBox {
            min: Point3::new(xmin, ymin, zmin),
            max: Point3::new(xmax, ymax, zmax),
        }
    }

    /// Expands the box so that it covers `p`.
    pub fn union(self, p: Point3) -> BBox {
        BBox {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn midpoint(&self) -> Point3 {
        (self.max - self.min) * 0.5 + self.min
    }

    pub fn diag(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn all_corners(&self) -> [Point3; 8] {
        let mut res = [Point3::ORIGIN; 8];
        for (i, corner) in res.iter_mut().enumerate() {
            for axis in 0..3 {
                corner[axis] = if i & (1 << axis) == 0 {
                    self.min[axis]
                } else {
                    self.max[axis]
                };
            }
        }
        res
    }
    pub fn min(&self) -> Point3 {
        self.min
    }
    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Computes the surface area of the bounding box. Empty boxes have zero area.
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let Vec3 { x, y, z } = self.diag();
        (x * y + y * z + z * x) * 2.0
    }

    /// Index of the axis along which the box is the longest.
    pub fn max_extent(&self) -> usize {
        self.diag().max_dimension()
    }

    /// Position of `p` relative to the box corners: `min` maps to 0 and `max` to 1 on each axis.
    /// Axes with zero extent map to 0.
    pub fn offset(&self, p: Point3) -> Vec3 {
        let mut o = p - self.min;
        for axis in 0..3 {
            let extent = self.max[axis] - self.min[axis];
            o[axis] = if extent > 0.0 { o[axis] / extent } else { 0.0 };
        }
        o
    }

    /// Center and radius of a sphere enclosing the box.
    pub fn bounding_sphere(&self) -> (Point3, f32) {
        if self.is_empty() {
            return (Point3::ORIGIN, 0.0);
        }
        let center = self.midpoint();
        (center, center.distance_to(self.max))
    }

    /// Slab test against the ray's parametric range `(t_min, t_max)`.
    pub fn intersect(&self, r: &Ray) -> bool {
        let (mut t_min, mut t_max) = (r.t_min, r.t_max);
        let inv_dir = r.inv_dir();
        for axis in 0..3 {
            let t0 = (self.min[axis] - r.origin[axis]) * inv_dir[axis];
            let t1 = (self.max[axis] - r.origin[axis]) * inv_dir[axis];
            let (t0, t1) = min_max(t0, t1);
            // Widens the far end so that rounding never misses a grazing hit.
            let t1 = t1 * (1.0 + 2.0 * gamma(3));
            // Shrinks [t_min, t_max] by intersecting it with [t0, t1]. NaN from 0 * inf leaves
            // the range unchanged because `f32::max`/`f32::min` ignore NaN operands.
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return false;
            }
        }
        true
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.max[axis] >= other.min[axis] && self.min[axis] <= other.max[axis])
    }

    pub fn encloses(&self, other: Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && self.max[axis] >= other.max[axis])
    }

    pub fn contains(&self, p: Point3) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }
}

impl Display for BBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "box[{} -> {}]", self.min, self.max)
    }
}

pub fn union(b0: BBox, b1: BBox) -> BBox {
    BBox {
        min: b0.min.min(b1.min),
        max: b0.max.max(b1.max),
    }
}
