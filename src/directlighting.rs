//! Direct lighting estimation with multiple importance sampling.
//!
//! Two strategies estimate the light arriving at a scattering point from one light: sampling the
//! light, and sampling the scattering function. Each sample is weighted by the power heuristic:
//!
//!   weight_i(X) = p_i(X)^2 / (p_light(X)^2 + p_scatter(X)^2)
//!
//! so that the sum of the two weighted estimates stays unbiased while whichever strategy has the
//! larger density at a direction dominates there.

use accel::{Primitive, SurfaceInteraction};
use geometry::ray::Ray;
use geometry::Interaction;
use light::Light;
use material::Bsdf;
use math::hcm::{Point3, Vec3};
use medium::{HenyeyGreenstein, Medium};
use radiometry::color::Color;
use rand::Rng;
use scene::Scene;
use std::sync::Arc;

/// Upper limit of medium boundaries a single ray segment is followed through.
const MAX_INTERFACE_CROSSINGS: usize = 32;

/// Power heuristic with exponent 2 for `nf` samples of density `f_pdf` against `ng` samples of
/// density `g_pdf`. Returns 0 if `f_pdf` is 0.
pub fn power_heuristic(nf: f32, f_pdf: f32, ng: f32, g_pdf: f32) -> f32 {
    let f = nf * f_pdf;
    let g = ng * g_pdf;
    if f == 0.0 {
        return 0.0;
    }
    let ratio = g / f;
    1.0 / (1.0 + ratio * ratio)
}

/// What scatters light at a path vertex: a surface BSDF or a medium phase function.
#[derive(Debug, Clone, Copy)]
pub enum Scatterer<'a> {
    Surface { bsdf: &'a Bsdf, shading_normal: Vec3 },
    Medium(&'a HenyeyGreenstein),
}

impl<'a> Scatterer<'a> {
    /// Scattering value (cosine-weighted for surfaces) and the density of sampling `wi`.
    fn eval(&self, wo: Vec3, wi: Vec3) -> (Color, f32) {
        match self {
            Scatterer::Surface {
                bsdf,
                shading_normal,
            } => (
                bsdf.eval(wo, wi) * wi.dot(*shading_normal).abs(),
                bsdf.pdf(wo, wi),
            ),
            Scatterer::Medium(phase) => {
                let p = phase.p(wo, wi);
                (Color::gray(p), p)
            }
        }
    }

    /// Samples `wi`; returns the cosine-weighted scattering value, `wi`, its density, and whether
    /// it was drawn from a specular lobe.
    fn sample<R: Rng>(&self, wo: Vec3, rng: &mut R) -> (Color, Vec3, f32, bool) {
        match self {
            Scatterer::Surface {
                bsdf,
                shading_normal,
            } => {
                let (f, wi, pr) = bsdf.sample(wo, rng.gen());
                (
                    f * wi.dot(*shading_normal).abs(),
                    wi,
                    pr.value(),
                    !pr.is_density(),
                )
            }
            Scatterer::Medium(phase) => {
                let (wi, pdf) = phase.sample_p(wo, rng.gen());
                (Color::gray(pdf), wi, pdf, false)
            }
        }
    }
}

/// Medium that a ray travels in after crossing the surface of `prim` along `dir`. Only primitives
/// carrying a medium change it: entering (against the normal) makes it current, leaving restores
/// vacuum.
pub fn crossed_medium(
    current: Option<Arc<dyn Medium>>, prim: &Primitive, dir: Vec3, normal: Vec3,
) -> Option<Arc<dyn Medium>> {
    match &prim.medium {
        None => current,
        Some(inside) if dir.dot(normal) < 0.0 => Some(inside.clone()),
        Some(_) => None,
    }
}

/// Where a ray ends up after passing through medium boundaries.
struct Traced<'a> {
    hit: Option<SurfaceInteraction<'a>>,
    last_segment: Ray,
    tr: Color,
}

/// Follows `ray` through surfaces without a BSDF (medium boundaries), accumulating the
/// transmittance of the media on the way, until it reaches a scattering surface, leaves the
/// scene, or reaches its far end. If `target` is given, segments after a boundary are aimed at it
/// (the ray is a shadow ray towards `target`).
fn trace_through_interfaces<'a>(
    scene: &'a Scene, mut ray: Ray, mut medium: Option<Arc<dyn Medium>>, target: Option<Point3>,
) -> Traced<'a> {
    let mut tr = Color::ONE;
    for _ in 0..MAX_INTERFACE_CROSSINGS {
        let hit = scene.intersect(&mut ray);
        if let Some(m) = &medium {
            tr *= m.tr(&ray);
        }
        let si = match hit {
            None => {
                return Traced {
                    hit: None,
                    last_segment: ray,
                    tr,
                }
            }
            Some(si) => si,
        };
        if si.primitive.material.bsdf_at(&si.hit).is_some() {
            return Traced {
                hit: Some(si),
                last_segment: ray,
                tr,
            };
        }
        medium = crossed_medium(medium, si.primitive, ray.dir, si.hit.normal);
        ray = match target {
            Some(p) => si.hit.spawn_ray_to(p),
            None => si.hit.spawn_ray(ray.dir),
        };
    }
    Traced {
        hit: None,
        last_segment: ray,
        tr: Color::black(),
    }
}

/// Transmittance along a shadow ray: black if a scattering surface blocks it.
fn shadow_transmittance(scene: &Scene, vis_ray: &Ray, medium: Option<Arc<dyn Medium>>) -> Color {
    if !scene.intersect_any(vis_ray) {
        return match &medium {
            Some(m) => m.tr(vis_ray),
            None => Color::ONE,
        };
    }
    // Something is in the way, but it may only be a medium boundary.
    let target = vis_ray.position_at(1.0);
    let traced = trace_through_interfaces(scene, *vis_ray, medium, Some(target));
    if traced.hit.is_some() {
        Color::black()
    } else {
        traced.tr
    }
}

fn is_same_light(area_light: &Arc<light::DiffuseAreaLight>, light: &Arc<dyn Light>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(area_light) as *const u8,
        Arc::as_ptr(light) as *const u8,
    )
}

/// Estimates the radiance scattered towards `wo` at `isect` due to light arriving directly from
/// `light`, combining one light sample and one scattering sample with MIS.
#[allow(clippy::too_many_arguments)]
pub fn estimate_direct<R: Rng>(
    scatterer: Scatterer, isect: &Interaction, wo: Vec3, light: &Arc<dyn Light>,
    rnd2_light: (f32, f32), scene: &Scene, medium: Option<Arc<dyn Medium>>, rng: &mut R,
) -> Color {
    let mut radiance_d = Color::black();

    // Samples the light.
    let (light_radiance, wi, light_pr, vis_ray) = light.sample_li(isect, rnd2_light);
    let light_pdf = light_pr.density();
    if light_pdf > 0.0 && !light_radiance.is_black() {
        let (f, scatter_pdf) = scatterer.eval(wo, wi);
        if !f.is_black() {
            let tr = shadow_transmittance(scene, &vis_ray, medium.clone());
            if !tr.is_black() {
                let weight = power_heuristic(1.0, light_pdf, 1.0, scatter_pdf);
                radiance_d += f * light_radiance * tr * (weight / light_pdf);
            }
        }
    }

    // Samples the scattering function.
    let (f, wi, scatter_pdf, sampled_specular) = scatterer.sample(wo, rng);
    if f.is_black() || scatter_pdf <= 0.0 {
        return radiance_d;
    }
    let weight = if sampled_specular {
        1.0
    } else {
        let light_pdf = light.pdf_li(isect, wi);
        if light_pdf == 0.0 {
            return radiance_d;
        }
        power_heuristic(1.0, scatter_pdf, 1.0, light_pdf)
    };
    let traced = trace_through_interfaces(scene, isect.spawn_ray(wi), medium, None);
    let incident_radiance = match &traced.hit {
        Some(si) => match &si.primitive.area_light {
            Some(area_light) if is_same_light(area_light, light) => {
                area_light.l(&si.hit, -wi)
            }
            _ => Color::black(),
        },
        None => light.le(&traced.last_segment),
    };
    if !incident_radiance.is_black() {
        radiance_d += f * incident_radiance * traced.tr * (weight / scatter_pdf);
    }
    radiance_d
}

/// Estimates direct lighting from one light chosen uniformly at random, scaled by the number of
/// lights.
pub fn uniform_sample_one_light<R: Rng>(
    scatterer: Scatterer, isect: &Interaction, wo: Vec3, scene: &Scene,
    medium: Option<Arc<dyn Medium>>, rng: &mut R,
) -> Color {
    let lights = scene.lights();
    if lights.is_empty() {
        return Color::black();
    }
    let chosen = &lights[rng.gen_range(0..lights.len())];
    let rnd2_light = rng.gen::<(f32, f32)>();
    estimate_direct(scatterer, isect, wo, chosen, rnd2_light, scene, medium, rng)
        * lights.len() as f32
}
