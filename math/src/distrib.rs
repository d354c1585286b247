//! Piecewise-constant distributions over `[0, 1)` and `[0, 1)^2`.

/// Tabulated 1D function with its normalized CDF.
#[derive(Debug, Clone)]
pub struct Distribution1D {
    func: Vec<f32>,
    cdf: Vec<f32>,
    func_int: f32,
}

impl Distribution1D {
    /// Builds the distribution from non-negative function values sampled at equal spacing.
    /// An all-zero function degrades to the uniform distribution for sampling purposes while
    /// still reporting zero densities.
    pub fn new(func: &[f32]) -> Self {
        assert!(!func.is_empty());
        let n = func.len();
        let func: Vec<f32> = func.iter().map(|f| f.max(0.0)).collect();
        let mut cdf = Vec::with_capacity(n + 1);
        cdf.push(0.0);
        for i in 0..n {
            cdf.push(cdf[i] + func[i] / n as f32);
        }
        let func_int = cdf[n];
        if func_int == 0.0 {
            cdf.iter_mut()
                .enumerate()
                .for_each(|(i, c)| *c = i as f32 / n as f32);
        } else {
            cdf.iter_mut().for_each(|c| *c /= func_int);
        }
        Self {
            func,
            cdf,
            func_int,
        }
    }

    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Integral of the tabulated function over `[0, 1]`.
    pub fn integral(&self) -> f32 {
        self.func_int
    }

    pub fn value_at(&self, index: usize) -> f32 {
        self.func[index]
    }

    /// Maps a uniform `u` to a point in `[0, 1)`. Returns the point, its density, and the index of
    /// the segment it falls into.
    pub fn sample_continuous(&self, u: f32) -> (f32, f32, usize) {
        let n = self.count();
        // Last index whose cdf is <= u.
        let offset = self
            .cdf
            .partition_point(|c| *c <= u)
            .saturating_sub(1)
            .min(n - 1);
        let mut du = u - self.cdf[offset];
        let width = self.cdf[offset + 1] - self.cdf[offset];
        if width > 0.0 {
            du /= width;
        }
        let pdf = if self.func_int > 0.0 {
            self.func[offset] / self.func_int
        } else {
            0.0
        };
        let x = ((offset as f32 + du) / n as f32).min(crate::float::ONE_MINUS_EPSILON);
        (x, pdf, offset)
    }

    /// Density of the continuous distribution at `x` in `[0, 1)`.
    pub fn pdf(&self, x: f32) -> f32 {
        if self.func_int == 0.0 {
            return 0.0;
        }
        let n = self.count();
        let index = ((x * n as f32) as usize).min(n - 1);
        self.func[index] / self.func_int
    }
}

/// Piecewise-constant 2D distribution: a marginal over rows and one conditional per row.
#[derive(Debug, Clone)]
pub struct Distribution2D {
    conditionals: Vec<Distribution1D>,
    marginal: Distribution1D,
}

impl Distribution2D {
    /// `func` holds `nv` rows of `nu` values each, row-major.
    pub fn new(func: &[f32], nu: usize, nv: usize) -> Self {
        assert_eq!(func.len(), nu * nv);
        let conditionals: Vec<_> = func.chunks(nu).map(Distribution1D::new).collect();
        let row_integrals: Vec<_> = conditionals.iter().map(|c| c.integral()).collect();
        let marginal = Distribution1D::new(&row_integrals);
        Self {
            conditionals,
            marginal,
        }
    }

    pub fn integral(&self) -> f32 {
        self.marginal.integral()
    }

    /// Maps a uniform pair to `(u, v)` in `[0, 1)^2`, returning it with its joint density.
    pub fn sample_continuous(&self, rnd2: (f32, f32)) -> ((f32, f32), f32) {
        let (d1, pdf1, v) = self.marginal.sample_continuous(rnd2.1);
        let (d0, pdf0, _) = self.conditionals[v].sample_continuous(rnd2.0);
        ((d0, d1), pdf0 * pdf1)
    }

    pub fn pdf(&self, uv: (f32, f32)) -> f32 {
        let integral = self.marginal.integral();
        if integral == 0.0 {
            return 0.0;
        }
        let nu = self.conditionals[0].count();
        let nv = self.conditionals.len();
        let iu = ((uv.0 * nu as f32).max(0.0) as usize).min(nu - 1);
        let iv = ((uv.1 * nv as f32).max(0.0) as usize).min(nv - 1);
        self.conditionals[iv].value_at(iu) / integral
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn sampled_density_matches_pdf_1d() {
        let d = Distribution1D::new(&[1.0, 3.0, 0.0, 4.0]);
        assert_eq!(d.integral(), 2.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let (x, pdf, offset) = d.sample_continuous(rng.gen());
            assert_ne!(offset, 2, "zero-valued segment must never be sampled");
            assert!((pdf - d.pdf(x)).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_function_is_sampled_uniformly_with_zero_density() {
        let d = Distribution1D::new(&[0.0; 4]);
        let (x, pdf, offset) = d.sample_continuous(0.6);
        assert_eq!(offset, 2);
        assert!((x - 0.6).abs() < 1e-6);
        assert_eq!(pdf, 0.0);
    }

    #[test]
    fn distribution_2d_pdf_integrates_to_one() {
        let (nu, nv) = (5, 3);
        let func: Vec<f32> = (0..nu * nv).map(|i| (i % 7) as f32 + 0.5).collect();
        let d = Distribution2D::new(&func, nu, nv);
        let cell = 1.0 / (nu * nv) as f32;
        let total: f32 = itertools::iproduct!(0..nu, 0..nv)
            .map(|(u, v)| {
                let uv = ((u as f32 + 0.5) / nu as f32, (v as f32 + 0.5) / nv as f32);
                d.pdf(uv) * cell
            })
            .sum();
        assert!((total - 1.0).abs() < 1e-4, "total = {}", total);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let (uv, pdf) = d.sample_continuous(rng.gen());
            assert!((pdf - d.pdf(uv)).abs() < 1e-4 * pdf.max(1.0));
        }
    }
}
