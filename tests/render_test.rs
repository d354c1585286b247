use pbrs_core::{render, LightStrategy, RenderOptions};
use scene::preset;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn small_options() -> RenderOptions {
    RenderOptions {
        spp: 2,
        tile_size: 5,
        seed: 99,
        ..RenderOptions::default()
    }
}

#[test]
fn image_does_not_depend_on_threading() {
    init_logger();
    let (scene, camera) = preset::cornell_box((16, 12)).unwrap();
    let parallel = render(&scene, &camera, &small_options());
    let sequential = render(
        &scene,
        &camera,
        &RenderOptions {
            use_multi_thread: false,
            ..small_options()
        },
    );
    assert_eq!(parallel, sequential);
    assert_eq!(parallel.resolution(), (16, 12));
    assert!(!parallel.mean().is_black());

    let reseeded = render(
        &scene,
        &camera,
        &RenderOptions {
            seed: 100,
            ..small_options()
        },
    );
    assert_ne!(parallel, reseeded);
}

#[test]
fn dark_scene_renders_black() {
    init_logger();
    let (scene, camera) = preset::dark_sky((12, 8)).unwrap();
    let film = render(&scene, &camera, &small_options());
    assert!(film.pixels().iter().all(|p| p.is_black()));
}

#[test]
fn every_preset_renders_finite_radiance() {
    init_logger();
    let resolution = (10, 8);
    let presets = [
        preset::cornell_box(resolution).unwrap(),
        preset::foggy_ball(resolution).unwrap(),
        preset::sky_spheres(resolution).unwrap(),
    ];
    for (scene, camera) in presets.iter() {
        for strategy in [LightStrategy::BxdfOnly, LightStrategy::Mis] {
            let options = RenderOptions {
                strategy,
                ..small_options()
            };
            let film = render(scene, camera, &options);
            let pixels = film.pixels();
            assert_eq!(pixels.len(), 80);
            assert!(pixels.iter().all(|p| p.is_finite() && !p.has_negative()));
            assert!(!film.mean().is_black(), "{:?}", strategy);
        }
    }
}

#[test]
fn film_averages_samples() {
    init_logger();
    let radiance = radiometry::color::Color::new(0.5, 1.0, 2.0);
    let (scene, camera) = preset::emissive_sphere(radiance, (9, 9)).unwrap();
    let film = render(&scene, &camera, &small_options());
    // The sphere fills the view around the center pixel.
    let center = film.pixel(4, 4);
    for i in 0..3 {
        assert!((center[i] - radiance[i]).abs() < 1e-5, "center = {}", center);
    }
}
