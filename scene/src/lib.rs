pub mod preset;

use accel::{Bvh, BvhConfig, Primitive, SurfaceInteraction};
use geometry::bbox::BBox;
use geometry::ray::Ray;
use geometry::BuildError;
use light::{InfiniteAreaLight, Light};
use std::sync::Arc;

/// Everything the integrator needs to know about the world: the primitives organized in a BVH,
/// and the lights. Built once, then shared read-only by all render threads.
#[derive(Debug)]
pub struct Scene {
    bvh: Bvh,
    lights: Vec<Arc<dyn Light>>,
    infinite_lights: Vec<Arc<dyn Light>>,
}

impl Scene {
    /// Builds the BVH over `primitives` and collects the lights: the area lights attached to
    /// emissive primitives, and the environment light if any.
    pub fn new(
        primitives: Vec<Primitive>, env_light: Option<InfiniteAreaLight>, config: BvhConfig,
    ) -> Result<Scene, BuildError> {
        let mut lights: Vec<Arc<dyn Light>> = primitives
            .iter()
            .filter_map(|p| p.area_light.clone())
            .map(|l| l as Arc<dyn Light>)
            .collect();
        let bvh = Bvh::build(primitives, config)?;

        let mut infinite_lights = vec![];
        if let Some(mut env_light) = env_light {
            env_light.set_world_bound(&bvh.bbox());
            let env_light: Arc<dyn Light> = Arc::new(env_light);
            lights.push(env_light.clone());
            infinite_lights.push(env_light);
        }
        log::debug!(
            "scene built: {} primitives, {} lights ({} infinite), bound = {}",
            bvh.primitives().len(),
            lights.len(),
            infinite_lights.len(),
            bvh.bbox()
        );
        for light in lights.iter() {
            log::debug!("  light: {}", light.summary());
        }
        Ok(Scene {
            bvh,
            lights,
            infinite_lights,
        })
    }

    /// Nearest hit along `ray`; shrinks `ray.t_max` to the hit.
    pub fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction<'_>> {
        self.bvh.intersect(ray)
    }

    /// Returns true if anything blocks `ray` within its extent.
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        self.bvh.intersect_any(ray)
    }

    pub fn world_bound(&self) -> BBox {
        self.bvh.bbox()
    }

    /// All lights, including the infinite ones.
    pub fn lights(&self) -> &[Arc<dyn Light>] {
        &self.lights
    }

    pub fn infinite_lights(&self) -> &[Arc<dyn Light>] {
        &self.infinite_lights
    }

    pub fn primitives(&self) -> &[Primitive] {
        self.bvh.primitives()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use material::Matte;
    use math::hcm::{Point3, Vec3};
    use radiometry::color::Color;
    use shape::Sphere;
    use texture::ImageMap;

    #[test]
    fn collects_lights() {
        let _ = env_logger::builder().is_test(true).try_init();
        let matte = Arc::new(Matte::solid(Color::gray(0.5)).unwrap());
        let lamp = Sphere::from_raw((0.0, 3.0, 0.0), 0.5).unwrap();
        let ball = Sphere::from_raw((0.0, 0.0, 0.0), 1.0).unwrap();
        let primitives = vec![
            Primitive::new(Arc::new(lamp), matte.clone())
                .emissive(Color::gray(4.0))
                .unwrap(),
            Primitive::new(Arc::new(ball), matte),
        ];
        let env = InfiniteAreaLight::new(
            ImageMap::constant(Color::gray(0.2)).unwrap(),
            geometry::AffineTransform::identity(),
        )
        .unwrap();
        let scene = Scene::new(primitives, Some(env), BvhConfig::default()).unwrap();
        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.infinite_lights().len(), 1);
        // The environment light sees the world bound.
        assert!(!scene.infinite_lights()[0].power().is_black());

        let mut ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::Z);
        let hit = scene.intersect(&mut ray).unwrap();
        assert!(hit.primitive.area_light.is_none());
        assert!((hit.hit.ray_t - 4.0).abs() < 1e-4);
    }
}
