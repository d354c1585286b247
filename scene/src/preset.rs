//! Small built-in scenes, each returned with a camera that frames it.

use crate::Scene;
use accel::{BvhConfig, Primitive};
use geometry::camera::Camera;
use geometry::{AffineTransform, BuildError};
use light::{DiffuseAreaLight, InfiniteAreaLight};
use material::{Glass, Interface, Material, Matte, Mirror, RoughGlass};
use math::hcm::{point3, vec3, Point3, Vec3};
use medium::HomogeneousMedium;
use radiometry::color::Color;
use shape::{Shape, Sphere, Triangle, TriangleMesh};
use std::f32::consts::PI;
use std::sync::Arc;
use texture::ImageMap;

pub type PresetResult = Result<(Scene, Camera), BuildError>;

/// A parallelogram made of two triangles; its front side faces `edge_u x edge_v`.
pub fn quad(origin: Point3, edge_u: Vec3, edge_v: Vec3) -> Result<Vec<Triangle>, BuildError> {
    let positions = vec![origin, origin + edge_u, origin + edge_u + edge_v, origin + edge_v];
    let uvs = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
    let mesh = TriangleMesh::new(
        AffineTransform::identity(),
        positions,
        vec![[0, 1, 2], [0, 2, 3]],
        vec![],
        uvs,
    )?;
    Ok(mesh.triangles())
}

fn add_quad(
    prims: &mut Vec<Primitive>, corners: (Point3, Vec3, Vec3), mtl: &Arc<dyn Material>,
    emission: Option<Color>,
) -> Result<(), BuildError> {
    let (origin, edge_u, edge_v) = corners;
    for tri in quad(origin, edge_u, edge_v)? {
        let prim = Primitive::new(Arc::new(tri), mtl.clone());
        prims.push(match emission {
            Some(radiance) => prim.emissive(radiance)?,
            None => prim,
        });
    }
    Ok(())
}

/// A single emissive sphere in front of the camera, nothing else.
pub fn emissive_sphere(radiance: Color, resolution: (u32, u32)) -> PresetResult {
    let sphere = Sphere::from_raw((0.0, 0.0, 5.0), 1.0)?;
    let prim = Primitive::from_raw(sphere, Matte::solid(Color::gray(0.5))?).emissive(radiance)?;
    let scene = Scene::new(vec![prim], None, BvhConfig::default())?;
    let camera = Camera::new(resolution, PI / 9.0)?;
    Ok((scene, camera))
}

/// Diffuse geometry with no lights at all.
pub fn dark_sky(resolution: (u32, u32)) -> PresetResult {
    let matte: Arc<dyn Material> = Arc::new(Matte::solid(Color::gray(0.7))?);
    let mut prims = vec![Primitive::new(
        Arc::new(Sphere::from_raw((0.0, 1.0, 4.0), 1.0)?),
        matte.clone(),
    )];
    let floor = (point3(-5.0, 0.0, 0.0), vec3(0.0, 0.0, 10.0), vec3(10.0, 0.0, 0.0));
    add_quad(&mut prims, floor, &matte, None)?;
    let scene = Scene::new(prims, None, BvhConfig::default())?;
    let camera = Camera::new(resolution, PI / 4.0)?.looking_at(
        point3(0.0, 2.0, -2.0),
        point3(0.0, 1.0, 4.0),
        Vec3::Y,
    );
    Ok((scene, camera))
}

/// The camera sits at the center of a sphere of radius 10 whose inside is a Lambertian surface
/// with the given `albedo`, emitting `radiance` from both sides.
pub fn furnace(albedo: f32, radiance: f32) -> PresetResult {
    let shape: Arc<dyn Shape> = Arc::new(Sphere::from_raw((0.0, 0.0, 0.0), 10.0)?);
    let light = DiffuseAreaLight::new(Color::gray(radiance), shape.clone())?.two_sided(true);
    let prim = Primitive::new(shape, Arc::new(Matte::solid(Color::gray(albedo))?))
        .with_area_light(Arc::new(light));
    let scene = Scene::new(vec![prim], None, BvhConfig::default())?;
    let camera = Camera::new((8, 8), PI / 2.0)?;
    Ok((scene, camera))
}

/// A closed box lit by a small ceiling light, with a glass ball, a rough glass ball and a mirror
/// ball inside.
pub fn cornell_box(resolution: (u32, u32)) -> PresetResult {
    let red: Arc<dyn Material> = Arc::new(Matte::solid(Color::new(0.65, 0.05, 0.05))?);
    let green: Arc<dyn Material> = Arc::new(Matte::solid(Color::new(0.12, 0.45, 0.15))?);
    let white: Arc<dyn Material> = Arc::new(Matte::solid(Color::gray(0.73))?);

    let s = 2.0;
    let mut prims = vec![];
    #[rustfmt::skip]
    let walls = [
        ((point3(0.0, 0.0, 0.0), vec3(0.0, 0.0, s), vec3(0.0, s, 0.0)), &red),   // left
        ((point3(s, 0.0, 0.0), vec3(0.0, s, 0.0), vec3(0.0, 0.0, s)), &green),   // right
        ((point3(0.0, 0.0, 0.0), vec3(s, 0.0, 0.0), vec3(0.0, 0.0, s)), &white), // floor
        ((point3(0.0, s, 0.0), vec3(0.0, 0.0, s), vec3(s, 0.0, 0.0)), &white),   // ceiling
        ((point3(0.0, 0.0, s), vec3(0.0, s, 0.0), vec3(s, 0.0, 0.0)), &white),   // back
    ];
    for (corners, mtl) in walls {
        add_quad(&mut prims, corners, mtl, None)?;
    }
    let lamp = (point3(0.7, s - 1e-3, 0.7), vec3(0.6, 0.0, 0.0), vec3(0.0, 0.0, 0.6));
    add_quad(&mut prims, lamp, &white, Some(Color::gray(12.0)))?;

    prims.push(Primitive::from_raw(Sphere::from_raw((0.5, 0.35, 1.3), 0.35)?, Glass::new(1.5)?));
    prims.push(Primitive::from_raw(
        Sphere::from_raw((1.45, 0.35, 1.4), 0.35)?,
        RoughGlass::new(1.5, 0.3)?,
    ));
    prims.push(Primitive::from_raw(
        Sphere::from_raw((1.0, 0.25, 0.6), 0.25)?,
        Mirror::new(Color::gray(0.9))?,
    ));

    let scene = Scene::new(prims, None, BvhConfig::default())?;
    let camera = Camera::new(resolution, 0.7)?.looking_at(
        point3(1.0, 1.0, -2.5),
        point3(1.0, 1.0, 0.0),
        Vec3::Y,
    );
    Ok((scene, camera))
}

/// A ball of scattering fog, bounded by an invisible interface, standing on a floor under a
/// quad light.
pub fn foggy_ball(resolution: (u32, u32)) -> PresetResult {
    let white: Arc<dyn Material> = Arc::new(Matte::solid(Color::gray(0.6))?);
    let mut prims = vec![];
    let floor = (point3(-4.0, 0.0, -4.0), vec3(0.0, 0.0, 8.0), vec3(8.0, 0.0, 0.0));
    add_quad(&mut prims, floor, &white, None)?;
    let lamp = (point3(-1.0, 4.0, -1.0), vec3(2.0, 0.0, 0.0), vec3(0.0, 0.0, 2.0));
    add_quad(&mut prims, lamp, &white, Some(Color::gray(8.0)))?;

    let fog = HomogeneousMedium::new(Color::gray(0.05), Color::new(0.9, 0.7, 0.5), 0.3)?;
    let ball = Primitive::from_raw(Sphere::from_raw((0.0, 1.2, 0.0), 1.2)?, Interface)
        .with_medium(Arc::new(fog));
    prims.push(ball);

    let scene = Scene::new(prims, None, BvhConfig::default())?;
    let camera = Camera::new(resolution, PI / 4.0)?.looking_at(
        point3(0.0, 2.0, -5.0),
        point3(0.0, 1.0, 0.0),
        Vec3::Y,
    );
    Ok((scene, camera))
}

/// A blue-to-white sky map with a bright sun patch.
pub fn sky_map(width: usize, height: usize) -> Result<ImageMap, BuildError> {
    let sky_top = Color::new(0.5, 0.7, 1.0);
    let sky_bottom = Color::white();
    let data = (0..height)
        .flat_map(|row| (0..width).map(move |col| (col, row)))
        .map(|(col, row)| {
            // Row 0 is the +y pole.
            let y = (PI * (row as f32 + 0.5) / height as f32).cos();
            let t = (y + 1.0) * 0.5;
            let sun = col == width / 3 && row == height / 5;
            let base = sky_top * t + sky_bottom * (1.0 - t);
            if sun {
                base * 50.0
            } else {
                base
            }
        })
        .collect();
    ImageMap::new(width, height, data)
}

/// Spheres on a huge ground sphere under an environment-mapped sky.
pub fn sky_spheres(resolution: (u32, u32)) -> PresetResult {
    let prims = vec![
        Primitive::from_raw(
            Sphere::from_raw((0.0, -1000.0, 0.0), 1000.0)?,
            Matte::solid(Color::gray(0.5))?,
        ),
        Primitive::from_raw(Sphere::from_raw((0.0, 1.0, 0.0), 1.0)?, Glass::new(1.5)?),
        Primitive::from_raw(
            Sphere::from_raw((-2.2, 1.0, 0.0), 1.0)?,
            Matte::solid(Color::new(0.4, 0.2, 0.1))?,
        ),
        Primitive::from_raw(
            Sphere::from_raw((2.2, 1.0, 0.0), 1.0)?,
            Mirror::new(Color::new(0.7, 0.6, 0.5))?,
        ),
    ];
    let sky = InfiniteAreaLight::new(sky_map(64, 32)?, AffineTransform::identity())?;
    let scene = Scene::new(prims, Some(sky), BvhConfig::default())?;
    let camera = Camera::new(resolution, PI / 6.0)?.looking_at(
        point3(3.0, 2.0, -12.0),
        point3(0.0, 1.0, 0.0),
        Vec3::Y,
    );
    Ok((scene, camera))
}
