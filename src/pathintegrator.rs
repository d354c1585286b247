use crate::directlighting::{self, Scatterer};
use geometry::ray::Ray;
use math::prob::Prob;
use medium::Medium;
use radiometry::color::Color;
use rand::Rng;
use scene::Scene;
use std::sync::Arc;

/// How light arriving directly from emitters is accounted for along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightStrategy {
    /// Emission is only picked up when a sampled direction happens to hit an emitter.
    #[default]
    BxdfOnly,
    /// Direct lighting is estimated at every non-specular vertex by sampling one light and the
    /// BSDF, combined with the power heuristic. Emitters hit by non-specular bounces are then
    /// skipped by the path itself to avoid counting them twice.
    Mis,
}

/// Unidirectional path tracer.
#[derive(Debug, Clone, Copy)]
pub struct PathIntegrator {
    max_depth: u32,
    rr_threshold: f32,
    strategy: LightStrategy,
}

impl Default for PathIntegrator {
    fn default() -> Self {
        Self {
            max_depth: 5,
            rr_threshold: 1.0,
            strategy: LightStrategy::BxdfOnly,
        }
    }
}

impl PathIntegrator {
    pub fn with_max_depth(self, max_depth: u32) -> Self {
        Self { max_depth, ..self }
    }

    /// Russian roulette only considers paths whose largest throughput channel is below this.
    /// A threshold of 0 disables it.
    pub fn with_rr_threshold(self, rr_threshold: f32) -> Self {
        Self {
            rr_threshold,
            ..self
        }
    }

    pub fn with_strategy(self, strategy: LightStrategy) -> Self {
        Self { strategy, ..self }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn rr_threshold(&self) -> f32 {
        self.rr_threshold
    }

    pub fn strategy(&self) -> LightStrategy {
        self.strategy
    }

    /// Whether the path should pick up emission found by its own sampled directions.
    fn counts_hit_emission(&self, bounces: u32, specular_bounce: bool) -> bool {
        bounces == 0 || specular_bounce || self.strategy == LightStrategy::BxdfOnly
    }

    /// Estimates the radiance arriving at the origin of `ray` from its direction.
    pub fn li<R: Rng>(&self, mut ray: Ray, scene: &Scene, rng: &mut R) -> Color {
        let mut radiance = Color::black();
        let mut beta = Color::ONE;
        let mut specular_bounce = false;
        let mut medium: Option<Arc<dyn Medium>> = None;
        let mut bounces = 0;

        while bounces < self.max_depth {
            // Intersects ray with scene.
            let hit = scene.intersect(&mut ray);

            // Samples the participating medium, if any.
            if let Some(m) = &medium {
                let medium_sample = m.sample(&ray, rng);
                beta *= medium_sample.weight;
                if beta.is_black() {
                    break;
                }
                if let Some(mi) = medium_sample.scatter {
                    let wo = mi.isect.wo;
                    if self.strategy == LightStrategy::Mis && bounces + 1 < self.max_depth {
                        radiance += beta
                            * directlighting::uniform_sample_one_light(
                                Scatterer::Medium(&mi.phase),
                                &mi.isect,
                                wo,
                                scene,
                                medium.clone(),
                                rng,
                            );
                    }
                    let (wi, _) = mi.phase.sample_p(wo, rng.gen());
                    ray = mi.isect.spawn_ray(wi);
                    specular_bounce = false;
                    bounces += 1;
                    if !self.survives_roulette(bounces, &mut beta, rng) {
                        break;
                    }
                    continue;
                }
            }

            // Possibly adds emitted light at the intersection, or from the environment.
            let si = match hit {
                Some(si) => si,
                None => {
                    if self.counts_hit_emission(bounces, specular_bounce) {
                        let env: Color = scene.infinite_lights().iter().map(|l| l.le(&ray)).sum();
                        radiance += beta * env;
                    }
                    break;
                }
            };
            let wo = si.hit.wo;
            if self.counts_hit_emission(bounces, specular_bounce) {
                radiance += beta * si.primitive.le(&si.hit, wo);
            }

            // Skips over medium boundaries without counting a bounce.
            let bsdf = match si.primitive.material.bsdf_at(&si.hit) {
                Some(bsdf) => bsdf,
                None => {
                    medium = directlighting::crossed_medium(
                        medium,
                        si.primitive,
                        ray.dir,
                        si.hit.normal,
                    );
                    ray = si.hit.spawn_ray(ray.dir);
                    continue;
                }
            };
            let shading_normal = si.hit.shading_normal();
            let scatterer = Scatterer::Surface {
                bsdf: &bsdf,
                shading_normal,
            };

            // Samples illumination from lights to find the path contribution.
            if self.strategy == LightStrategy::Mis
                && !bsdf.is_specular()
                && bounces + 1 < self.max_depth
            {
                radiance += beta
                    * directlighting::uniform_sample_one_light(
                        scatterer,
                        &si.hit,
                        wo,
                        scene,
                        medium.clone(),
                        rng,
                    );
            }

            // Samples the BSDF to get the new path direction.
            let (f, wi, pr) = bsdf.sample(wo, rng.gen());
            if f.is_black() {
                break;
            }
            if pr.is_positive() {
                beta *= f * (wi.dot(shading_normal).abs() / pr.value());
            } else {
                log::warn!(
                    "bsdf {} sampled value {} with zero probability",
                    si.primitive.material.summary(),
                    f
                );
            }
            specular_bounce = matches!(pr, Prob::Mass(_));
            medium = directlighting::crossed_medium(medium, si.primitive, wi, si.hit.normal);
            ray = si.hit.spawn_ray(wi);
            bounces += 1;

            if !self.survives_roulette(bounces, &mut beta, rng) {
                break;
            }
        }
        radiance
    }

    /// Terminates paths with low throughput probabilistically, boosting the survivors so the
    /// estimate stays unbiased. `bounces` counts the vertices already scattered at.
    fn survives_roulette<R: Rng>(&self, bounces: u32, beta: &mut Color, rng: &mut R) -> bool {
        if bounces <= 4 {
            return true;
        }
        let max_channel = beta.max_channel();
        if max_channel >= self.rr_threshold {
            return true;
        }
        let q = (1.0 - max_channel).max(0.05);
        if rng.gen::<f32>() < q {
            return false;
        }
        *beta = *beta / (1.0 - q);
        true
    }
}
