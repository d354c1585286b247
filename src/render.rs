use crate::options::RenderOptions;
use crate::pathintegrator::PathIntegrator;
use geometry::camera::Camera;
use radiometry::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use scene::Scene;

/// Accumulates radiance sums per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    width: u32,
    height: u32,
    spp: u32,
    sums: Vec<Color>,
}

impl Film {
    pub fn new((width, height): (u32, u32), spp: u32) -> Self {
        Self {
            width,
            height,
            spp,
            sums: vec![Color::black(); width as usize * height as usize],
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn spp(&self) -> u32 {
        self.spp
    }

    /// Row-major offset of pixel `(row, col)`, computed in `usize`.
    fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    /// Average radiance of pixel `(row, col)`.
    pub fn pixel(&self, row: u32, col: u32) -> Color {
        self.sums[self.index(row, col)] / self.spp.max(1) as f32
    }

    /// Averages of all pixels, row-major.
    pub fn pixels(&self) -> Vec<Color> {
        let n = self.spp.max(1) as f32;
        self.sums.iter().map(|&sum| sum / n).collect()
    }

    /// Mean of all pixel averages.
    pub fn mean(&self) -> Color {
        let count = self.sums.len().max(1) as f32;
        self.pixels().into_iter().sum::<Color>() / count
    }

    fn merge(&mut self, tile: Tile) {
        let width = (tile.col_end - tile.col_begin) as usize;
        for (i, row) in (tile.row_begin..tile.row_end).enumerate() {
            let src = &tile.sums[i * width..(i + 1) * width];
            let begin = self.index(row, tile.col_begin);
            for (dst, &sum) in self.sums[begin..begin + width].iter_mut().zip(src) {
                *dst += sum;
            }
        }
    }
}

/// A rectangular block of pixels rendered as one task.
#[derive(Debug)]
struct Tile {
    row_begin: u32,
    row_end: u32,
    col_begin: u32,
    col_end: u32,
    sums: Vec<Color>,
}

fn split_into_tiles((width, height): (u32, u32), tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let mut tiles = vec![];
    for row_begin in (0..height).step_by(tile_size as usize) {
        for col_begin in (0..width).step_by(tile_size as usize) {
            let row_end = (row_begin + tile_size).min(height);
            let col_end = (col_begin + tile_size).min(width);
            tiles.push(Tile {
                row_begin,
                row_end,
                col_begin,
                col_end,
                sums: Vec::with_capacity(
                    (row_end - row_begin) as usize * (col_end - col_begin) as usize,
                ),
            });
        }
    }
    tiles
}

/// Seeds the generator of a tile from the render seed and the tile index so that results do not
/// depend on which thread renders the tile.
fn tile_rng(seed: u64, tile_index: usize) -> StdRng {
    let mixed = seed ^ (tile_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed)
}

fn render_tile(
    mut tile: Tile, tile_index: usize, scene: &Scene, camera: &Camera,
    integrator: &PathIntegrator, options: &RenderOptions,
) -> Tile {
    let mut rng = tile_rng(options.seed, tile_index);
    for row in tile.row_begin..tile.row_end {
        for col in tile.col_begin..tile.col_end {
            let mut sum = Color::black();
            for _ in 0..options.spp {
                let ray = match camera.shoot_ray(row, col, rng.gen()) {
                    Some(ray) => ray,
                    None => continue,
                };
                let radiance = integrator.li(ray, scene, &mut rng);
                if radiance.is_finite() && !radiance.has_negative() {
                    sum += radiance;
                } else {
                    log::warn!(
                        "dropping radiance sample {} at pixel ({}, {})",
                        radiance,
                        row,
                        col
                    );
                }
            }
            tile.sums.push(sum);
        }
    }
    log::debug!(
        "tile #{} (rows {}..{}, cols {}..{}) done",
        tile_index,
        tile.row_begin,
        tile.row_end,
        tile.col_begin,
        tile.col_end
    );
    tile
}

/// Renders the scene as seen by `camera` with `options.spp` samples per pixel.
pub fn render(scene: &Scene, camera: &Camera, options: &RenderOptions) -> Film {
    let start_time = std::time::Instant::now();
    let integrator = options.integrator();
    let resolution = camera.resolution();
    let tiles = split_into_tiles(resolution, options.tile_size);

    let rendered: Vec<Tile> = if options.use_multi_thread {
        tiles
            .into_par_iter()
            .enumerate()
            .map(|(i, tile)| render_tile(tile, i, scene, camera, &integrator, options))
            .collect()
    } else {
        tiles
            .into_iter()
            .enumerate()
            .map(|(i, tile)| render_tile(tile, i, scene, camera, &integrator, options))
            .collect()
    };

    let mut film = Film::new(resolution, options.spp);
    for tile in rendered {
        film.merge(tile);
    }
    log::info!(
        "rendered {}x{} at {} spp in {:.2?}",
        resolution.0,
        resolution.1,
        options.spp,
        start_time.elapsed()
    );
    film
}
