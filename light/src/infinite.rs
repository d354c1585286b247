use crate::{EmissionSample, Light};
use geometry::bbox::BBox;
use geometry::bxdf::concentric_sample_disk;
use geometry::ray::Ray;
use geometry::{AffineTransform, BuildError, Interaction, Transform};
use math::distrib::Distribution2D;
use math::hcm::{make_coord_system, Point3, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use rayon::prelude::*;
use std::f32::consts::PI;
use texture::ImageMap;

/// Environment light: radiance arriving from infinitely far away, stored in an equirectangular
/// map. In model space, `v` runs from the +y pole (`v = 0`) to the -y pole, and `u` winds around
/// the y axis starting from -z.
#[derive(Debug)]
pub struct InfiniteAreaLight {
    radiance_map: ImageMap,
    to_world: AffineTransform,
    to_model: AffineTransform,
    distrib: Distribution2D,
    avg_radiance: Color,
    world_center: Point3,
    world_radius: f32,
}

impl InfiniteAreaLight {
    /// Builds the light and precomputes the importance-sampling distribution of `radiance_map`.
    pub fn new(radiance_map: ImageMap, to_world: AffineTransform) -> Result<Self, BuildError> {
        let (width, height) = radiance_map.resolution();
        let has_bad_texel = (0..height)
            .flat_map(|row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| radiance_map.texel(col, row))
            .any(|c| !c.is_finite() || c.has_negative());
        if has_bad_texel {
            return Err(BuildError::invalid(
                "radiance_map",
                "expected non-negative finite texels",
            ));
        }

        // Rows are independent; each one produces its sin-weighted luminance and its color sum,
        // and the partial sums are reduced once all rows are done.
        let rows: Vec<(Vec<f32>, Color)> = (0..height)
            .into_par_iter()
            .map(|row| {
                let sin_theta = (PI * (row as f32 + 0.5) / height as f32).sin();
                let texels = (0..width).map(|col| radiance_map.texel(col, row));
                let weights = texels.clone().map(|c| c.luminance() * sin_theta).collect();
                (weights, texels.sum())
            })
            .collect();
        let mut func = Vec::with_capacity(width * height);
        let mut color_sum = Color::black();
        for (weights, row_sum) in rows {
            func.extend(weights);
            color_sum += row_sum;
        }
        let avg_radiance = color_sum / (width * height) as f32;
        let distrib = Distribution2D::new(&func, width, height);
        log::info!(
            "environment map {}x{} precomputed, average radiance = {}",
            width,
            height,
            avg_radiance
        );

        Ok(Self {
            radiance_map,
            to_world,
            to_model: to_world.inverse(),
            distrib,
            avg_radiance,
            world_center: Point3::ORIGIN,
            world_radius: 0.0,
        })
    }

    /// Records the bounding sphere of the scene; needed by visibility rays, emission sampling
    /// and the power estimate.
    pub fn set_world_bound(&mut self, bound: &BBox) {
        let (center, radius) = bound.bounding_sphere();
        self.world_center = center;
        self.world_radius = radius;
    }

    /// Model-space direction for map coordinates `(u, v)`, with `sin(theta)`.
    fn direction_of((u, v): (f32, f32)) -> (Vec3, f32) {
        let (sin_theta, cos_theta) = (v * PI).sin_cos();
        let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
        let dir = Vec3::new(sin_theta * sin_phi, cos_theta, -sin_theta * cos_phi);
        (dir, sin_theta)
    }

    /// Map coordinates of a normalized model-space direction.
    fn uv_of(dir: Vec3) -> (f32, f32) {
        let theta = dir.y.clamp(-1.0, 1.0).acos();
        let phi = dir.x.atan2(-dir.z);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        (phi / (2.0 * PI), theta / PI)
    }

    fn density_to_solid_angle(map_pdf: f32, sin_theta: f32) -> f32 {
        if sin_theta <= 0.0 {
            0.0
        } else {
            map_pdf / (2.0 * PI * PI * sin_theta)
        }
    }
}

impl Light for InfiniteAreaLight {
    fn sample_li(&self, target: &Interaction, rnd2: (f32, f32)) -> (Color, Vec3, Prob, Ray) {
        let (uv, map_pdf) = self.distrib.sample_continuous(rnd2);
        let (dir, sin_theta) = Self::direction_of(uv);
        let wi = self.to_world.apply(dir).hat();
        let far_point = target.pos + wi * (2.0 * self.world_radius.max(1.0));
        let vis_ray = target.spawn_ray_to(far_point);
        let pdf = Self::density_to_solid_angle(map_pdf, sin_theta);
        if pdf == 0.0 {
            return (Color::black(), wi, Prob::Density(0.0), vis_ray);
        }
        (self.radiance_map.lookup(uv), wi, Prob::Density(pdf), vis_ray)
    }

    fn pdf_li(&self, _target: &Interaction, wi: Vec3) -> f32 {
        let dir = match self.to_model.apply(wi).try_hat() {
            Some(dir) => dir,
            None => return 0.0,
        };
        let uv = Self::uv_of(dir);
        let sin_theta = (uv.1 * PI).sin();
        Self::density_to_solid_angle(self.distrib.pdf(uv), sin_theta)
    }

    fn power(&self) -> Color {
        self.avg_radiance * (PI * self.world_radius * self.world_radius)
    }

    fn le(&self, ray: &Ray) -> Color {
        match self.to_model.apply(ray.dir).try_hat() {
            Some(dir) => self.radiance_map.lookup(Self::uv_of(dir)),
            None => Color::black(),
        }
    }

    fn sample_le(&self, rnd_pos: (f32, f32), rnd_dir: (f32, f32)) -> EmissionSample {
        let (uv, map_pdf) = self.distrib.sample_continuous(rnd_dir);
        let (dir, sin_theta) = Self::direction_of(uv);
        // The emitted ray travels opposite to the direction the radiance arrives from.
        let d = -self.to_world.apply(dir).hat();
        let (v1, v2) = make_coord_system(d);
        let (cx, cy) = concentric_sample_disk(rnd_pos);
        let disk_point = self.world_center + (v1 * cx + v2 * cy) * self.world_radius;
        let ray = Ray::new(disk_point + d * -self.world_radius, d);
        let pdf_dir = Self::density_to_solid_angle(map_pdf, sin_theta);
        let disk_area = PI * self.world_radius * self.world_radius;
        if pdf_dir == 0.0 || disk_area == 0.0 {
            return EmissionSample::none(ray);
        }
        EmissionSample {
            radiance: self.radiance_map.lookup(uv),
            ray,
            normal: d,
            pdf_pos: disk_area.recip(),
            pdf_dir,
        }
    }

    fn is_infinite(&self) -> bool {
        true
    }

    fn summary(&self) -> String {
        let (w, h) = self.radiance_map.resolution();
        format!(
            "InfiniteAreaLight{{map = {}x{}, average = {}, world radius = {:.2}}}",
            w, h, self.avg_radiance, self.world_radius
        )
    }
}
