//! Validation of the interpolant against an analytic point source.
//!
//! A monopolar current source in an infinite homogeneous medium has the
//! closed-form potential V(r) = I / (4 pi sigma r). Sampling that field
//! on an irregular cloud and re-evaluating it through the interpolant
//! gives a ground-truth accuracy check that no synthetic affine field
//! can provide.
//!
//! Two kinds of assertion are made. Structural properties (affine
//! reproduction, vertex reproduction, the range bound) hold exactly for
//! piecewise-linear interpolation on any valid tetrahedralisation and
//! are asserted tightly. The 1/r field is curved, so its assertions are
//! statistical: with the source several cloud-diameters away the second
//! derivative is small over any one cell and the interpolation error
//! stays well under the bounds used here.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use galvana_core::interp::FieldInterpolant;
use galvana_core::pointsource::{potential, SIGMA_SALINE};
use galvana_core::types::{FieldSample, FieldSampleSet};

/// Edge of the sampled cube in metres (a 100 um block of tissue).
const SIDE: f64 = 1.0e-4;

/// Source electrode 400 um above the block, on its vertical axis.
const SOURCE: [f64; 3] = [5.0e-5, 5.0e-5, 5.0e-4];

const PROBE_AMPS: f64 = 1.0e-6;
const CLOUD_SIZE: usize = 500;
const PROBE_COUNT: usize = 20;

fn random_cloud(seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..CLOUD_SIZE)
        .map(|_| {
            [
                rng.gen_range(0.0..SIDE),
                rng.gen_range(0.0..SIDE),
                rng.gen_range(0.0..SIDE),
            ]
        })
        .collect()
}

/// Probes drawn from the central half of the block, comfortably inside
/// the convex hull of any 500-point cloud.
fn central_probes(seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..PROBE_COUNT)
        .map(|_| {
            [
                rng.gen_range(0.25 * SIDE..0.75 * SIDE),
                rng.gen_range(0.25 * SIDE..0.75 * SIDE),
                rng.gen_range(0.25 * SIDE..0.75 * SIDE),
            ]
        })
        .collect()
}

fn source_field(points: &[[f64; 3]]) -> FieldSampleSet {
    points
        .iter()
        .map(|&p| FieldSample::new(p, potential(PROBE_AMPS, SIGMA_SALINE, SOURCE, p)))
        .collect()
}

#[test]
fn point_source_field_is_recovered_within_tolerance() {
    let points = random_cloud(0x5EED);
    let samples = source_field(&points);
    let interpolant = FieldInterpolant::build(&samples).unwrap();
    assert_eq!(interpolant.vertex_count(), CLOUD_SIZE);

    let (lo, hi) = samples.potential_range().unwrap();

    let mut max_rel = 0.0_f64;
    let mut sum_rel = 0.0_f64;
    eprintln!("probe                                analytic      interp        rel err");
    for p in central_probes(0xCAFE) {
        let exact = potential(PROBE_AMPS, SIGMA_SALINE, SOURCE, p);
        let got = interpolant.evaluate(p).unwrap();
        let rel = ((got - exact) / exact).abs();
        eprintln!(
            "({:.2e}, {:.2e}, {:.2e})  {:.6e}  {:.6e}  {:.3e}",
            p[0], p[1], p[2], exact, got, rel
        );

        // Interior evaluations are convex combinations of sample
        // values and can never leave the sampled range.
        let slack = 1.0e-9 * (hi - lo);
        assert!(got >= lo - slack && got <= hi + slack);

        max_rel = max_rel.max(rel);
        sum_rel += rel;
    }
    let mean_rel = sum_rel / PROBE_COUNT as f64;
    eprintln!("max rel err  {max_rel:.3e}");
    eprintln!("mean rel err {mean_rel:.3e}");

    // First-order terms cancel exactly in barycentric interpolation, so
    // the per-cell error scales with (cell span / source distance)^2.
    // At 400 um stand-off that is well under a percent for typical
    // cells; the bounds leave room for the occasional poorly shaped one.
    assert!(max_rel < 0.15, "max relative error {max_rel:.3e} too large");
    assert!(mean_rel < 0.03, "mean relative error {mean_rel:.3e} too large");
}

#[test]
fn affine_field_is_exact_on_an_irregular_cloud() {
    let points = random_cloud(0x5EED);
    let f = |p: &[f64; 3]| 2.0 * p[0] - 3.0 * p[1] + p[2] + 5.0e-4;
    let samples: FieldSampleSet = points
        .iter()
        .map(|p| FieldSample::new(*p, f(p)))
        .collect();
    let interpolant = FieldInterpolant::build(&samples).unwrap();

    for p in central_probes(0xBEEF) {
        let got = interpolant.evaluate(p).unwrap();
        assert_relative_eq!(got, f(&p), max_relative = 1.0e-6);
    }
}

#[test]
fn cloud_vertices_reproduce_their_samples() {
    let points = random_cloud(0x5EED);
    let samples = source_field(&points);
    let interpolant = FieldInterpolant::build(&samples).unwrap();

    for &index in &[0_usize, 123, 250, 499] {
        let p = points[index];
        let expected = potential(PROBE_AMPS, SIGMA_SALINE, SOURCE, p);
        let got = interpolant.evaluate(p).unwrap();
        assert_relative_eq!(got, expected, max_relative = 1.0e-9);
    }
}
