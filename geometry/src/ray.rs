use std::fmt::{Display, Formatter, Result};

use math::hcm;

/// Represents a ray:
///
///   origin + t * direction
///
/// where t lies in `(t_min, t_max)`.
///
/// The extent of the ray is by default infinite; intersection routines shrink `t_max` as closer
/// hits are found, which is what prunes the acceleration structure traversal.
///
/// The reciprocal direction is cached at construction for slab tests, so the direction is only
/// settable through constructors.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: hcm::Point3,
    pub dir: hcm::Vec3,
    pub t_min: f32,
    pub t_max: f32,
    inv_dir: hcm::Vec3,
}

impl Ray {
    pub fn new(origin: hcm::Point3, dir: hcm::Vec3) -> Self {
        Ray {
            origin,
            dir,
            t_min: 0.0,
            t_max: f32::INFINITY,
            inv_dir: hcm::Vec3::new(dir.x.recip(), dir.y.recip(), dir.z.recip()),
        }
    }

    pub fn with_extent(self, t_max: f32) -> Self {
        Ray { t_max, ..self }
    }

    pub fn with_t_min(self, t_min: f32) -> Self {
        Ray { t_min, ..self }
    }

    pub fn inv_dir(&self) -> hcm::Vec3 {
        self.inv_dir
    }

    /// Returns `None` if the given `t` is outside the ray's extent (`t_min`, `t_max`).
    /// `Some(t)` otherwise.
    pub fn truncated_t(&self, t: f32) -> Option<f32> {
        if t <= self.t_min || t >= self.t_max || t.is_nan() {
            None
        } else {
            Some(t)
        }
    }

    pub fn position_at(&self, t: f32) -> hcm::Point3 {
        self.origin + t * self.dir
    }
}

impl Display for Ray {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "{:.precision$} + t{:.precision$}, t in ({}, {})",
            self.origin,
            self.dir,
            self.t_min,
            self.t_max,
            precision = precision
        )
    }
}
