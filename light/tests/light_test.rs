use geometry::bbox::BBox;
use geometry::ray::Ray;
use geometry::{AffineTransform, Interaction};
use light::{DiffuseAreaLight, InfiniteAreaLight, Light};
use math::hcm::{point3, vec3, Point3, Vec3};
use radiometry::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shape::{Shape, Triangle};
use std::f32::consts::PI;
use std::sync::Arc;
use texture::ImageMap;

fn surface_point(pos: Point3, normal: Vec3) -> Interaction {
    Interaction::rayless(pos, (0.0, 0.0), normal)
}

/// 8x4 map, brighter towards the +y pole with a hot spot.
fn gradient_map() -> ImageMap {
    let (w, h) = (8, 4);
    let data = (0..h)
        .flat_map(|row| (0..w).map(move |col| (col, row)))
        .map(|(col, row)| {
            let base = 1.0 + (h - row) as f32;
            if (col, row) == (5, 1) {
                Color::new(base * 10.0, base, base)
            } else {
                Color::new(base, base * 0.5, base * 0.25)
            }
        })
        .collect();
    ImageMap::new(w, h, data).unwrap()
}

#[test]
fn area_light_pdf_matches_sample_li() {
    let triangle = Triangle::from_points(
        point3(-1.0, 2.0, -1.0),
        point3(1.0, 2.0, -1.0),
        point3(0.0, 2.0, 1.5),
    )
    .unwrap();
    let normal = triangle.sample((0.2, 0.2)).0.normal;
    let light = DiffuseAreaLight::new(Color::gray(3.0), Arc::new(triangle)).unwrap();
    let target = surface_point(point3(0.2, 0.0, 0.1), Vec3::Y);

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let (radiance, wi, pdf, vis) = light.sample_li(&target, rng.gen());
        let pdf = pdf.density();
        if pdf == 0.0 {
            continue;
        }
        let expected_radiance = if normal.dot(-wi) > 0.0 {
            Color::gray(3.0)
        } else {
            Color::black()
        };
        assert_eq!(radiance, expected_radiance);
        let pdf_li = light.pdf_li(&target, wi);
        assert!(
            (pdf - pdf_li).abs() <= 1e-3 * pdf,
            "sample_li pdf {} vs pdf_li {}",
            pdf,
            pdf_li
        );
        // The visibility ray stops short of the light.
        assert!(vis.t_max < 1.0);
    }
}

#[test]
fn area_light_pdf_is_zero_off_the_shape() {
    let triangle = Triangle::from_points(
        point3(-1.0, 2.0, -1.0),
        point3(1.0, 2.0, -1.0),
        point3(0.0, 2.0, 1.5),
    )
    .unwrap();
    let light = DiffuseAreaLight::new(Color::gray(3.0), Arc::new(triangle)).unwrap();
    let target = surface_point(Point3::ORIGIN, Vec3::Y);
    assert_eq!(light.pdf_li(&target, vec3(1.0, 0.1, 0.0).hat()), 0.0);
}

#[test]
fn area_light_emission_samples_leave_the_front() {
    let triangle = Triangle::from_points(
        point3(0.0, 0.0, 0.0),
        point3(1.0, 0.0, 0.0),
        point3(0.0, 1.0, 0.0),
    )
    .unwrap();
    let light = DiffuseAreaLight::new(Color::ONE, Arc::new(triangle)).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let sample = light.sample_le(rng.gen(), rng.gen());
        if sample.pdf_dir == 0.0 {
            continue;
        }
        assert!(sample.ray.dir.dot(sample.normal) > 0.0);
        assert!((sample.pdf_pos - 2.0).abs() < 1e-4);
        assert_eq!(sample.radiance, Color::ONE);
    }
}

#[test]
fn infinite_light_pdf_matches_sample_li() {
    let rotation = AffineTransform::rotater(vec3(1.0, 1.0, 0.0), 0.7).unwrap();
    let light = InfiniteAreaLight::new(gradient_map(), rotation).unwrap();
    let target = surface_point(Point3::ORIGIN, Vec3::Y);
    let mut rng = StdRng::seed_from_u64(11);
    // Directions that land within rounding distance of a texel border may be looked up in the
    // neighboring texel; tolerate a handful of those.
    let mut mismatches = 0;
    for _ in 0..1000 {
        let (radiance, wi, pdf, _) = light.sample_li(&target, rng.gen());
        let pdf = pdf.density();
        if pdf == 0.0 {
            continue;
        }
        let pdf_li = light.pdf_li(&target, wi);
        let escaped = light.le(&Ray::new(Point3::ORIGIN, wi));
        if (pdf - pdf_li).abs() > 2e-3 * pdf || radiance != escaped {
            mismatches += 1;
        }
    }
    assert!(mismatches <= 5, "{} mismatching samples", mismatches);
}

#[test]
fn infinite_light_estimates_total_irradiance() {
    let map = gradient_map();
    let (w, h) = map.resolution();
    // Integral of the radiance over the sphere of directions, cell by cell.
    let mut expected = Color::black();
    for row in 0..h {
        let cos0 = (PI * row as f32 / h as f32).cos();
        let cos1 = (PI * (row + 1) as f32 / h as f32).cos();
        let solid_angle = (cos0 - cos1) * 2.0 * PI / w as f32;
        for col in 0..w {
            expected += map.texel(col, row) * solid_angle;
        }
    }

    let light = InfiniteAreaLight::new(map, AffineTransform::identity()).unwrap();
    let target = surface_point(Point3::ORIGIN, Vec3::Y);
    let mut rng = StdRng::seed_from_u64(5);
    let n = 200_000;
    let mut estimate = Color::black();
    for _ in 0..n {
        let (radiance, _, pdf, _) = light.sample_li(&target, rng.gen());
        if pdf.density() > 0.0 {
            estimate += radiance / pdf.density();
        }
    }
    let estimate = estimate / n as f32;
    for c in 0..3 {
        let rel = (estimate[c] - expected[c]).abs() / expected[c];
        assert!(rel < 0.03, "channel {}: {} vs {}", c, estimate[c], expected[c]);
    }
}

#[test]
fn infinite_light_power_uses_world_bound() {
    let mut light =
        InfiniteAreaLight::new(ImageMap::constant(Color::ONE).unwrap(), AffineTransform::identity())
            .unwrap();
    assert!(light.is_infinite());
    assert!(light.power().is_black());
    light.set_world_bound(&BBox::new(point3(-1.0, -1.0, -1.0), point3(1.0, 1.0, 1.0)));
    let r2 = 3.0;
    assert!((light.power().average() - PI * r2).abs() < 1e-3);

    let sample = light.sample_le((0.3, 0.6), (0.25, 0.5));
    assert!((sample.pdf_pos - 1.0 / (PI * r2)).abs() < 1e-4);
    assert!(sample.pdf_dir > 0.0);
}
