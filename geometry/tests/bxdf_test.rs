use geometry::bxdf::{self, BxDF, Omega, BXDF};
use math::float::linspace;
use math::hcm::{spherical_direction, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{FRAC_PI_2, PI};

fn f32_close(a: f32, b: f32) -> bool {
    b / a > 0.999 && b / a < 1.001
}

#[test]
fn local_trigonometry_test() {
    let w = Omega::new(0.64, 0.48, 0.6);
    assert!(f32_close(w.cos_theta(), 0.6));
    assert!(f32_close(w.cos2_theta(), 0.36));
    assert!(f32_close(w.sin2_theta(), 0.64));
    assert!(f32_close(w.sin_theta(), 0.8));
    assert!(f32_close(w.tan2_theta(), 0.64 / 0.36));
    assert!(f32_close(w.cos_phi(), 0.8));
    assert!(f32_close(w.sin_phi(), 0.6));
    assert!(f32_close(w.cos2_phi(), 0.64), "actual value = {}", w.cos2_phi());
    assert!(f32_close(w.sin2_phi(), 0.36), "actual value = {}", w.sin2_phi());

    let pole = Omega::normal();
    assert_eq!(pole.cos_phi(), 1.0);
    assert_eq!(pole.sin_phi(), 0.0);
}

#[test]
fn fresnel_test() {
    let glass = bxdf::Fresnel::dielectric(1.0, 2.0);
    let invert_glass = bxdf::Fresnel::dielectric(2.0, 1.0);

    let cos_thetas = [0.3f32, 0.9];
    let expected_forward_values = [0.26872247f32, 0.112083375];
    let expected_inverted_values = [1.0f32, 0.1645631];
    for i in 0..cos_thetas.len() {
        let cos_theta_i = cos_thetas[i];
        let actual_forward_value = glass.refl_coeff(cos_theta_i);
        let actual_inverted_value = invert_glass.refl_coeff(cos_theta_i);
        assert!((actual_forward_value - expected_forward_values[i]).abs() < 1e-5);
        assert!((actual_inverted_value - expected_inverted_values[i]).abs() < 1e-5);

        assert_eq!(actual_forward_value, invert_glass.refl_coeff(-cos_theta_i));
        assert_eq!(actual_inverted_value, glass.refl_coeff(-cos_theta_i));
    }
    assert_eq!(bxdf::Fresnel::Nop.refl_coeff(0.3), 1.0);
}

#[test]
fn specular_refl_test() {
    let mirror = bxdf::SpecularReflection::new(Color::white(), bxdf::Fresnel::Nop);
    let wo = Omega::new(0.8, 0.0, 0.6);
    let (bsdf_value, wi, pdf) = mirror.sample(wo, (0.3, 0.4, 0.5));
    assert_eq!(wi.x(), -0.8);
    assert_eq!(wi.y(), -0.0);
    assert_eq!(wi.z(), 0.6);
    assert_eq!(pdf, Prob::Mass(1.0));
    assert!(f32_close(bsdf_value.r, 1.0 / 0.6));
    assert!(mirror.eval(wo, wi).is_black());
    assert_eq!(mirror.pdf(wo, wi), 0.0);
    assert!(mirror.get_type().is_specular());

    let grazing = mirror.sample(Omega::new(1.0, 0.0, 0.0), (0.5, 0.5, 0.5));
    assert!(grazing.0.is_black());
}

#[test]
fn fresnel_specular_test() {
    let glass = bxdf::FresnelSpecular::new(Color::white(), Color::white(), 1.0, 2.0);
    let wo = Omega::new(0.8, 0.0, 0.6);
    let refl_coeff = bxdf::Fresnel::dielectric(1.0, 2.0).refl_coeff(0.6);

    let (f, wi, pr) = glass.sample(wo, (0.0, 0.5, 0.5));
    assert_eq!(wi, wo.reflected());
    assert_eq!(pr, Prob::Mass(refl_coeff));
    assert!(f32_close(f.g * 0.6 / pr.mass(), 1.0));

    let (f, wi, pr) = glass.sample(wo, (0.999, 0.5, 0.5));
    // Snell's law: sin_t = sin_i / 2.
    assert!((wi.x() + 0.4).abs() < 1e-5, "wi = {}", wi);
    assert!(wi.y().abs() < 1e-6);
    assert!((wi.z() + 0.84f32.sqrt()).abs() < 1e-5, "wi = {}", wi);
    assert_eq!(pr, Prob::Mass(1.0 - refl_coeff));
    // No radiance scaling: throughput weight is exactly the albedo.
    assert!(f32_close(f.b * wi.cos_theta().abs() / pr.mass(), 1.0));

    // Total internal reflection from the inside always picks the reflective lobe.
    let wo_inside = Omega::normalize(0.9, 0.0, -0.3);
    let (_, wi, pr) = glass.sample(wo_inside, (0.99, 0.5, 0.5));
    assert_eq!(pr, Prob::Mass(1.0));
    assert!(wi.z() < 0.0);
}

#[test]
fn diffuse_refl_test() {
    let albedo = Color::new(0.2, 0.5, 0.9);
    let matte = BXDF::from(bxdf::LambertianReflection::new(albedo));
    assert!(!matte.get_type().is_specular());

    let pdf_hemisphere_integral = riemann_integral_pdf(&matte, Omega::new(0.48, 0.64, 0.6));
    assert!(
        (pdf_hemisphere_integral - 1.0).abs() < 1e-3,
        "Hemisphere pdf doesn't integrate to 1.0 ({} instead)",
        pdf_hemisphere_integral
    );

    let mc_rho = montecarlo_integrate_rho(&matte, Omega::normalize(0.2, -0.1, 0.9), 800);
    assert!(
        color_is_close(albedo, mc_rho),
        "Monte-carlo integrated rho doesn't euqal to albedo: {} vs {}",
        albedo,
        mc_rho
    );

    // Lambertian surfaces reflect on whichever side the outgoing direction is.
    let below = Omega::normalize(0.2, -0.1, -0.9);
    let (_, wi, pr) = matte.sample(below, (0.3, 0.7, 0.0));
    assert!(wi.z() < 0.0);
    assert!(pr.density() > 0.0);
    assert!(matte.eval(below, Omega::normal()).is_black());
}

#[test]
fn rough_dielectric_pdf_integral() {
    for (roughness, wo) in [
        (0.5, Omega::normalize(0.3, 0.2, 0.9)),
        (0.7, Omega::normalize(-0.5, 0.1, 0.4)),
        (0.6, Omega::normalize(0.2, 0.3, -0.8)),
    ] {
        let glass = BXDF::from(bxdf::RoughDielectric::new(
            Color::white(),
            Color::white(),
            1.0,
            1.5,
            roughness,
        ));
        let integral = riemann_integral_pdf(&glass, wo);
        assert!(
            integral > 0.85 && integral < 1.01,
            "roughness {}: pdf integral = {}",
            roughness,
            integral
        );
    }
}

#[test]
fn rough_dielectric_consistency() {
    let glass = bxdf::RoughDielectric::new(Color::white(), Color::white(), 1.0, 1.5, 0.5);
    let mut rng = StdRng::seed_from_u64(7);
    for wo in [Omega::normalize(0.3, 0.2, 0.9), Omega::normalize(0.1, -0.2, -0.9)] {
        let mut num_transmit = 0;
        for _ in 0..2000 {
            let (f, wi, pr) = glass.sample(wo, rng.gen());
            if !pr.is_positive() {
                continue;
            }
            assert!(pr.is_density());
            assert!(!wi.0.has_nan());
            assert!((wi.0.norm() - 1.0).abs() < 1e-3);
            if !wi.same_hemisphere(wo) {
                num_transmit += 1;
            }
            let eval = glass.eval(wo, wi);
            let pdf = glass.pdf(wo, wi);
            assert!((eval.r - f.r).abs() <= 1e-4 * f.r.max(1.0));
            assert!((pdf - pr.density()).abs() <= 1e-4 * pdf.max(1.0));
        }
        // Transmission dominates for a dielectric seen at moderate angles.
        assert!(num_transmit > 1200, "only {} transmissions", num_transmit);
    }

    // Tangent directions are degenerate.
    let tangent = Omega::new(1.0, 0.0, 0.0);
    assert_eq!(glass.pdf(tangent, Omega::normal()), 0.0);
    assert!(glass.eval(Omega::normal(), tangent).is_black());
}

#[test]
fn rough_dielectric_albedo() {
    let glass = BXDF::from(bxdf::RoughDielectric::new(
        Color::white(),
        Color::white(),
        1.0,
        1.5,
        0.4,
    ));
    for wo in [Omega::normalize(0.1, 0.2, 0.9), Omega::normalize(0.1, 0.3, -0.7)] {
        let rho = montecarlo_integrate_rho(&glass, wo, 20000);
        assert!(rho.g > 0.85 && rho.g < 1.001, "albedo = {}", rho);
    }
}

/// Compares the histogram of sampled directions with the pdf integrated over each cell, with
/// cells laid out uniformly in (cos_theta, phi) over the entire sphere.
#[test]
fn rough_dielectric_chi_square() {
    const COS_BINS: usize = 10;
    const PHI_BINS: usize = 20;
    const SUBDIV: usize = 16;
    const SAMPLES: usize = 200_000;

    let glass = bxdf::RoughDielectric::new(Color::white(), Color::white(), 1.0, 1.5, 0.7);
    let bin_of = |w: Omega| {
        let cos_bin = (((w.z() + 1.0) * 0.5 * COS_BINS as f32) as usize).min(COS_BINS - 1);
        let phi = w.y().atan2(w.x()).rem_euclid(2.0 * PI);
        let phi_bin = ((phi / (2.0 * PI) * PHI_BINS as f32) as usize).min(PHI_BINS - 1);
        cos_bin * PHI_BINS + phi_bin
    };

    let mut rng = StdRng::seed_from_u64(1234);
    for wo in [Omega::normalize(0.4, 0.1, 0.8), Omega::normalize(-0.2, 0.3, -0.7)] {
        let mut observed = vec![0.0f64; COS_BINS * PHI_BINS];
        for _ in 0..SAMPLES {
            let (_, wi, pr) = glass.sample(wo, rng.gen());
            if pr.is_positive() {
                observed[bin_of(wi)] += 1.0;
            }
        }

        let d_cos = 2.0 / (COS_BINS * SUBDIV) as f32;
        let d_phi = 2.0 * PI / (PHI_BINS * SUBDIV) as f32;
        let mut expected = vec![0.0f64; COS_BINS * PHI_BINS];
        for i in 0..COS_BINS * SUBDIV {
            let cos_theta = -1.0 + (i as f32 + 0.5) * d_cos;
            let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
            for j in 0..PHI_BINS * SUBDIV {
                let phi = (j as f32 + 0.5) * d_phi;
                let wi = Omega(spherical_direction(sin_theta, cos_theta, phi));
                let pdf = glass.pdf(wo, wi) as f64;
                expected[(i / SUBDIV) * PHI_BINS + j / SUBDIV] +=
                    pdf * (d_cos * d_phi) as f64 * SAMPLES as f64;
            }
        }

        let (mut chi2, mut dof) = (0.0f64, 0);
        let (mut pooled_obs, mut pooled_exp) = (0.0f64, 0.0f64);
        for (obs, exp) in observed.iter().zip(expected.iter()) {
            if *exp < 5.0 {
                pooled_obs += obs;
                pooled_exp += exp;
            } else {
                chi2 += (obs - exp).powi(2) / exp;
                dof += 1;
            }
        }
        if pooled_exp >= 5.0 {
            chi2 += (pooled_obs - pooled_exp).powi(2) / pooled_exp;
            dof += 1;
        }
        assert!(dof > 20, "too few populated cells: {}", dof);
        // Generous bound: mean of chi-square is dof, standard deviation sqrt(2 dof).
        let bound = dof as f64 + 5.0 * (2.0 * dof as f64).sqrt();
        assert!(chi2 < bound, "chi2 = {}, dof = {}, wo = {}", chi2, dof, wo);
    }
}

// Utility functions.
// ----------------------------------------------------------------------------

fn color_is_close(c0: Color, c1: Color) -> bool {
    let v0 = Vec3::new(c0.r, c0.g, c0.b);
    let v1 = Vec3::new(c1.r, c1.g, c1.b);
    if v0.is_zero() || v1.is_zero() {
        (v0 - v1).norm_squared() < 1e-6
    } else {
        let longer_length = v0.norm_squared().max(v1.norm_squared());
        (v0 - v1).norm_squared() / longer_length < 1e-3
    }
}

/// Integrates `pdf(wo, wi)` over the whole sphere of `wi`.
fn riemann_integral_pdf(bsdf: &BXDF, wo: Omega) -> f32 {
    let mut pdf_integral = 0.0;
    const N: i32 = 200;
    let (thetas, d_theta) = linspace((0.0, PI), N);
    let (phis, d_phi) = linspace((0.0, PI * 2.0), N * 2);
    for theta in thetas.into_iter() {
        for phi in phis.iter().copied() {
            let (sin_theta, cos_theta) = theta.sin_cos();
            let wi = Omega(spherical_direction(sin_theta, cos_theta, phi));
            pdf_integral += bsdf.pdf(wo, wi) * sin_theta * d_theta * d_phi;
        }
    }
    debug_assert!(d_theta < FRAC_PI_2);
    pdf_integral
}

fn montecarlo_integrate_rho(bsdf: &BXDF, wo: Omega, trials: usize) -> Color {
    let mut rng = StdRng::seed_from_u64(trials as u64);
    (1.0 / trials as f32)
        * (0..trials)
            .map(|_| {
                let (bsdf_value, wi, pr) = bsdf.sample(wo, rng.gen());
                assert!(!wi.0.has_nan());
                match pr {
                    Prob::Density(pdf) if pdf > 0.0 => bsdf_value * wi.cos_theta().abs() / pdf,
                    Prob::Density(_) => Color::black(),
                    Prob::Mass(_) => panic!("smooth bxdf returned a probability mass"),
                }
            })
            .fold(Color::black(), |c0, c1| c0 + c1)
}
