use accel::{Bvh, BvhConfig, Primitive, SplitMethod};
use geometry::ray::Ray;
use itertools::iproduct;
use material::Matte;
use math::hcm::{point3, Point3, Vec3};
use radiometry::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shape::{Shape, Sphere, Triangle};
use std::sync::Arc;

fn random_point(rng: &mut StdRng, extent: f32) -> Point3 {
    point3(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if v.norm_squared() > 1e-3 && v.norm_squared() <= 1.0 {
            return v.hat();
        }
    }
}

/// A mix of small spheres and triangles scattered in a cube.
fn random_primitives(rng: &mut StdRng, count: usize) -> Vec<Primitive> {
    let material = Arc::new(Matte::solid(Color::gray(0.5)).unwrap());
    (0..count)
        .map(|i| {
            let shape: Arc<dyn Shape> = if i % 2 == 0 {
                let c = random_point(rng, 10.0);
                Arc::new(Sphere::from_raw((c.x, c.y, c.z), rng.gen_range(0.1..1.0)).unwrap())
            } else {
                let p0 = random_point(rng, 10.0);
                let p1 = p0 + random_unit_vector(rng) * rng.gen_range(0.5..2.0);
                let p2 = p0 + random_unit_vector(rng) * rng.gen_range(0.5..2.0);
                match Triangle::from_points(p0, p1, p2) {
                    Ok(t) => Arc::new(t),
                    Err(_) => Arc::new(Sphere::from_raw((p0.x, p0.y, p0.z), 0.5).unwrap()),
                }
            };
            Primitive::new(shape, material.clone())
        })
        .collect()
}

fn brute_force_nearest(prims: &[Primitive], ray: &Ray) -> Option<(usize, f32)> {
    let mut ray = *ray;
    let mut nearest = None;
    for (i, p) in prims.iter().enumerate() {
        if let Some(hit) = p.shape.intersect(&ray) {
            ray.t_max = hit.t;
            nearest = Some((i, hit.t));
        }
    }
    nearest
}

#[test]
fn nearest_hit_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(1);
    let prims = random_primitives(&mut rng, 300);
    let rays: Vec<_> = (0..2000)
        .map(|_| Ray::new(random_point(&mut rng, 15.0), random_unit_vector(&mut rng)))
        .collect();
    let expected: Vec<_> = rays.iter().map(|r| brute_force_nearest(&prims, r)).collect();
    assert!(expected.iter().filter(|e| e.is_some()).count() > 200);

    let methods = [SplitMethod::EqualCounts, SplitMethod::Middle, SplitMethod::Sah];
    for (method, leaf_size) in iproduct!(methods, [1, 4, 16]) {
        let config = BvhConfig::default()
            .with_split_method(method)
            .with_max_prims_in_node(leaf_size);
        let bvh = Bvh::build(prims.clone(), config).unwrap();
        assert_eq!(bvh.primitives().len(), prims.len());
        for (ray, expected) in rays.iter().zip(expected.iter()) {
            let mut r = *ray;
            let hit = bvh.intersect(&mut r);
            match (hit, expected) {
                (None, None) => (),
                (Some(si), Some((index, t))) => {
                    assert!(
                        (si.hit.ray_t - t).abs() < 1e-4,
                        "{:?}: t = {} vs brute force {}",
                        method,
                        si.hit.ray_t,
                        t
                    );
                    assert!(Arc::ptr_eq(&si.primitive.shape, &prims[*index].shape));
                    assert_eq!(r.t_max, si.hit.ray_t);
                    let expected_pos = ray.position_at(*t);
                    assert!(si.hit.pos.distance_to(expected_pos) < 1e-3);
                }
                (hit, expected) => panic!(
                    "{:?}: bvh hit {:?} vs brute force {:?} for {:?}",
                    method,
                    hit.map(|si| si.hit.ray_t),
                    expected,
                    ray
                ),
            }
            assert_eq!(bvh.intersect_any(ray), expected.is_some());
        }
    }
}

#[test]
fn any_hit_respects_the_extent() {
    let sphere = Sphere::from_raw((0.0, 0.0, 5.0), 1.0).unwrap();
    let material = Matte::solid(Color::ONE).unwrap();
    let bvh = Bvh::build(vec![Primitive::from_raw(sphere, material)], BvhConfig::default()).unwrap();
    let ray = Ray::new(Point3::ORIGIN, Vec3::Z);
    assert!(bvh.intersect_any(&ray));
    assert!(!bvh.intersect_any(&ray.with_extent(3.9)));
    assert!(bvh.intersect_any(&ray.with_extent(4.1)));
}

#[test]
fn empty_bvh_never_hits() {
    let bvh = Bvh::build(vec![], BvhConfig::default()).unwrap();
    let mut ray = Ray::new(Point3::ORIGIN, Vec3::X);
    assert!(bvh.intersect(&mut ray).is_none());
    assert!(!bvh.intersect_any(&ray));
    assert!(bvh.bbox().is_empty());
}

#[test]
fn rejects_bad_leaf_size() {
    for size in [0, 256] {
        let config = BvhConfig::default().with_max_prims_in_node(size);
        assert!(Bvh::build(vec![], config).is_err());
    }
}

#[test]
fn coincident_primitives_share_a_leaf() {
    let material = Arc::new(Matte::solid(Color::ONE).unwrap());
    let prims: Vec<_> = (0..10)
        .map(|_| {
            let sphere = Sphere::from_raw((1.0, 2.0, 3.0), 0.5).unwrap();
            Primitive::new(Arc::new(sphere), material.clone())
        })
        .collect();
    let bvh = Bvh::build(prims, BvhConfig::default()).unwrap();
    assert_eq!(bvh.node_count(), 1);
    let mut ray = Ray::new(Point3::ORIGIN, point3(1.0, 2.0, 3.0) - Point3::ORIGIN);
    assert!(bvh.intersect(&mut ray).is_some());
}

#[test]
fn skewed_scene_stays_shallow() {
    // Centroids growing geometrically make every midpoint split peel off a single primitive.
    let material = Arc::new(Matte::solid(Color::ONE).unwrap());
    let prims: Vec<_> = (0..48)
        .map(|i| {
            let x = 3.0f32.powi(i);
            let sphere = Sphere::from_raw((x, 0.0, 0.0), 0.25).unwrap();
            Primitive::new(Arc::new(sphere), material.clone())
        })
        .collect();
    let config = BvhConfig::default().with_split_method(SplitMethod::Middle);
    let bvh = Bvh::build(prims, config).unwrap();
    assert!(bvh.depth() < 40, "depth = {}", bvh.depth());

    let mut ray = Ray::new(point3(3.0, 5.0, 0.0), -Vec3::Y);
    let hit = bvh.intersect(&mut ray).unwrap();
    assert!((hit.hit.pos.x - 3.0).abs() < 1e-4);
}
