use std::{
    iter::Sum,
    ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Sub},
};

/// Linear RGB triple. Used for radiance, reflectance, path throughput and transmittance alike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b }
    }
    pub const fn gray(level: f32) -> Color {
        Color::new(level, level, level)
    }
    pub const fn black() -> Color {
        Color::gray(0.0)
    }
    pub const fn white() -> Color {
        Color::gray(1.0)
    }
    pub const ONE: Color = Self::gray(1.0);

    /// Builds a color channel by channel.
    pub fn from_fn(mut f: impl FnMut(usize) -> f32) -> Color {
        Color::new(f(0), f(1), f(2))
    }
    pub fn map(self, mut f: impl FnMut(f32) -> f32) -> Color {
        Color::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn is_black(&self) -> bool {
        self.r <= 0.0 && self.g <= 0.0 && self.b <= 0.0
    }
    pub fn has_nan(&self) -> bool {
        self.r.is_nan() || self.g.is_nan() || self.b.is_nan()
    }
    /// Returns true iff all RGB components are finite and free of NaNs.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
    pub fn has_negative(&self) -> bool {
        self.r < 0.0 || self.g < 0.0 || self.b < 0.0
    }

    pub fn max_channel(&self) -> f32 {
        self.r.max(self.g).max(self.b)
    }
    pub fn average(&self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }
    /// Y component of the CIE XYZ color corresponding to this linear sRGB color.
    #[rustfmt::skip]
    pub fn luminance(&self) -> f32 {
        0.21267127 * self.r + 0.71515972 * self.g + 0.07216883 * self.b
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, rhs: Self) -> Self {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Self) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Sub for Color {
    type Output = Color;
    fn sub(self, rhs: Self) -> Self::Output {
        Color::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Self {
        Color::new(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Color> for f32 {
    type Output = Color;
    fn mul(self, c: Color) -> Color {
        c * self
    }
}

impl Mul for Color {
    type Output = Color;
    fn mul(self, rhs: Color) -> Self::Output {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl MulAssign for Color {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl MulAssign<f32> for Color {
    fn mul_assign(&mut self, s: f32) {
        *self = *self * s;
    }
}

impl Div<f32> for Color {
    type Output = Color;
    fn div(self, s: f32) -> Self {
        self * s.recip()
    }
}

impl Index<usize> for Color {
    type Output = f32;
    fn index(&self, channel: usize) -> &f32 {
        match channel {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("invalid channel {}", channel),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "rgb({:.precision$}, {:.precision$}, {:.precision$})",
            self.r,
            self.g,
            self.b,
            precision = precision
        )
    }
}

impl Sum for Color {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Color::black(), |c0, c1| c0 + c1)
    }
}

#[cfg(test)]
mod test {
    use super::Color;

    #[test]
    fn white_has_unit_luminance() {
        assert!((Color::white().luminance() - 1.0).abs() < 1e-6);
        assert_eq!(Color::new(0.2, 0.7, 0.1).max_channel(), 0.7);
    }

    #[test]
    fn channels_are_indexable() {
        let c = Color::from_fn(|i| i as f32 + 1.0);
        assert_eq!((c[0], c[1], c[2]), (1.0, 2.0, 3.0));
        assert_eq!(c.map(|x| x * 2.0)[2], 6.0);
    }
}
