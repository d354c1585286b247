use geometry::BuildError;
use math::hcm::Point3;
use radiometry::color::Color;

/// A spatially-varying color parameter, looked up by surface coordinates and position.
pub trait Texture: Send + Sync + std::fmt::Debug {
    fn value(&self, uv: (f32, f32), p: Point3) -> Color;
}

#[derive(Debug, Clone)]
pub struct Solid {
    value: Color,
}

impl Solid {
    pub fn new(value: Color) -> Solid {
        Solid { value }
    }
}

impl Texture for Solid {
    fn value(&self, _: (f32, f32), _: Point3) -> Color {
        self.value
    }
}

/// Row-major texel grid held in memory; row 0 is at `v = 0`. Lookups are nearest-texel and the
/// (u, v) coordinates wrap around.
#[derive(Debug, Clone)]
pub struct ImageMap {
    data: Vec<Color>,
    width: usize,
    height: usize,
}

impl ImageMap {
    pub fn new(width: usize, height: usize, data: Vec<Color>) -> Result<ImageMap, BuildError> {
        if width == 0 || height == 0 {
            return Err(BuildError::invalid("image", "resolution must be nonzero"));
        }
        if data.len() != width * height {
            return Err(BuildError::AttributeCountMismatch {
                attribute: "texels",
                expected: width * height,
                actual: data.len(),
            });
        }
        if let Some(texel) = data.iter().find(|c| !c.is_finite() || c.has_negative()) {
            return Err(BuildError::invalid(
                "image",
                format!("texel {} is negative or not finite", texel),
            ));
        }
        Ok(ImageMap {
            data,
            width,
            height,
        })
    }

    /// A 1x1 image of a single color.
    pub fn constant(color: Color) -> Result<ImageMap, BuildError> {
        Self::new(1, 1, vec![color])
    }

    pub fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn texel(&self, col: usize, row: usize) -> Color {
        self.data[row * self.width + col]
    }

    /// Nearest-texel lookup.
    pub fn lookup(&self, (u, v): (f32, f32)) -> Color {
        let wrap = |x: f32, n: usize| {
            let x = x.rem_euclid(1.0);
            ((x * n as f32) as usize).min(n - 1)
        };
        self.texel(wrap(u, self.width), wrap(v, self.height))
    }
}

impl Texture for ImageMap {
    fn value(&self, uv: (f32, f32), _: Point3) -> Color {
        self.lookup(uv)
    }
}
