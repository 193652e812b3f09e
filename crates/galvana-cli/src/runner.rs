//! Mapping runner: ties together profile, model, interpolant and stores.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use galvana_core::interp::FieldInterpolant;
use galvana_core::pointsource::{potential, SIGMA_SALINE};
use galvana_core::slice::{sample_plane, PlaneMap, SlicePlane};
use galvana_core::snapshot::GeometryProvider;
use galvana_core::transfer::{
    map_transfer_resistances, OutOfDomainPolicy, ProbeCurrent, TransferEntry, TransferMap,
};
use galvana_core::types::{FieldSample, FieldSampleSet};
use galvana_io::profile::load_profile;
use galvana_io::sections::load_sections;
use galvana_io::store::{load_positional, save_keyed, save_positional};
use galvana_model::builder::straight_fibre;
use galvana_model::section::CableModel;
use galvana_model::transform::Frame;

use crate::config::{FrameConfig, JobConfig, ModelConfig, PlaneConfig};

/// Run a full mapping job from a parsed configuration.
pub fn run(job: &JobConfig, emit_plane: bool) -> Result<()> {
    let samples = load_profile(&job.profile.path)
        .context(format!("loading profile '{}'", job.profile.path))?;
    println!(
        "  Profile: {} samples from '{}'",
        samples.len(),
        job.profile.path
    );
    if let Some(bounds) = samples.bounding_box() {
        let extent = bounds.extent();
        println!(
            "  Extent: {:.3e} x {:.3e} x {:.3e}",
            extent[0], extent[1], extent[2]
        );
    }

    let interpolant = FieldInterpolant::build(&samples)?;
    println!(
        "  Interpolant: {} vertices, {} cells",
        interpolant.vertex_count(),
        interpolant.cell_count()
    );

    let mut model = build_model(&job.model)?;
    if let Some(frame) = &job.frame {
        model = model.transformed(&build_frame(frame));
    }
    println!("  Model: {} sections", model.len());

    let snapshot = model.snapshot()?;
    let probe = ProbeCurrent::new(job.mapping.probe_current_amps)?;
    let map = map_transfer_resistances(&interpolant, &snapshot, probe, job.mapping.out_of_domain)?;

    if let Some((lo, hi)) = map.range() {
        println!(
            "  Mapped {} compartments: {:.3e} to {:.3e} ohm",
            map.len(),
            lo,
            hi
        );
    }
    if map.extrapolated_count() > 0 {
        println!(
            "  Nearest-sample substitutions: {}",
            map.extrapolated_count()
        );
    }

    save_positional(&job.output.resistances, &map.values())?;
    println!("Resistances written to: {}", job.output.resistances);

    // Close the loop the way the consuming simulator would: read the
    // store back and land the values on the model's sections.
    let restored = load_positional(&job.output.resistances)?;
    snapshot
        .apply(&restored, &mut model)
        .context("re-applying the stored resistances")?;
    println!("Applied {} values back onto the model.", restored.len());

    if let Some(path) = &job.output.keyed {
        save_keyed(path, &map)?;
        println!("Keyed store written to: {path}");
    }
    if let Some(path) = &job.output.report {
        write_report(Path::new(path), &map, job)?;
    }

    if emit_plane {
        let plane_config = job.plane.as_ref().context(
            "--emit-plane needs a [plane] section in the configuration",
        )?;
        let plane = build_plane(plane_config)?;
        let slice_map = sample_plane(
            &interpolant,
            plane,
            plane_config.extent,
            plane_config.nu,
            plane_config.nv,
        );
        println!(
            "  Plane: {}/{} nodes inside the sampled domain",
            slice_map.inside_count(),
            slice_map.values.len()
        );
        write_plane_csv(&slice_map, &plane_config.axis, Path::new(&plane_config.path))?;
    }

    Ok(())
}

/// Check a job's inputs and coverage without writing anything.
pub fn validate(job: &JobConfig, analytic: bool) -> Result<()> {
    let samples = load_profile(&job.profile.path)
        .context(format!("loading profile '{}'", job.profile.path))?;
    let interpolant = FieldInterpolant::build(&samples)?;

    let mut model = build_model(&job.model)?;
    if let Some(frame) = &job.frame {
        model = model.transformed(&build_frame(frame));
    }
    let snapshot = model.snapshot()?;
    ProbeCurrent::new(job.mapping.probe_current_amps)?;

    let mut outside = 0_usize;
    let mut worst = 0.0_f64;
    for compartment in snapshot.iter() {
        if interpolant.evaluate(compartment.anchor).is_err() {
            outside += 1;
            worst = worst.max(interpolant.distance_to_hull(compartment.anchor));
        }
    }

    println!("Profile:     {} samples", samples.len());
    println!(
        "Interpolant: {} vertices, {} cells",
        interpolant.vertex_count(),
        interpolant.cell_count()
    );
    println!("Model:       {} sections", model.len());
    println!(
        "Coverage:    {}/{} anchors inside the sampled domain",
        snapshot.len() - outside,
        snapshot.len()
    );
    if outside > 0 {
        println!("Worst anchor: {worst:.3e} from the hull");
        if job.mapping.out_of_domain == OutOfDomainPolicy::Reject {
            bail!("{outside} anchors fall outside the sampled domain");
        }
        println!("Policy 'nearest-sample' will substitute for them.");
    }

    if analytic {
        analytic_self_check()?;
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Summarise an exported field profile.
pub fn inspect_profile(path: &Path) -> Result<()> {
    let samples =
        load_profile(path).context(format!("loading profile '{}'", path.display()))?;
    println!("Samples:   {}", samples.len());
    if let Some(bounds) = samples.bounding_box() {
        println!(
            "Bounds:    x=[{:.6e}, {:.6e}] y=[{:.6e}, {:.6e}] z=[{:.6e}, {:.6e}]",
            bounds.min[0], bounds.max[0], bounds.min[1], bounds.max[1], bounds.min[2],
            bounds.max[2]
        );
    }
    if let Some((lo, hi)) = samples.potential_range() {
        println!("Potential: {lo:.6e} to {hi:.6e} V");
    }
    Ok(())
}

/// Summarise a positional resistance store.
pub fn inspect_store(path: &Path) -> Result<()> {
    let values =
        load_positional(path).context(format!("loading store '{}'", path.display()))?;
    println!("Values: {}", values.len());
    if let (Some(lo), Some(hi)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) {
        println!("Range:  {lo:.6e} to {hi:.6e} ohm");
    }
    Ok(())
}

/// Build the cable model from the TOML model configuration.
fn build_model(config: &ModelConfig) -> Result<CableModel> {
    match config {
        ModelConfig::File { path } => {
            load_sections(path).context(format!("loading section list '{path}'"))
        }
        ModelConfig::Fibre {
            prefix,
            start,
            direction,
            sections,
            section_length,
            nseg,
        } => Ok(straight_fibre(
            prefix,
            *start,
            *direction,
            *sections,
            *section_length,
            *nseg,
        )?),
    }
}

/// Compose the configured frame pieces: scale, then rotation, then translation.
fn build_frame(config: &FrameConfig) -> Frame {
    let mut frame = Frame::identity();
    if let Some(factor) = config.scale {
        frame = frame.then(&Frame::uniform_scale(factor));
    }
    if let Some(degrees) = config.rotate_x_deg {
        frame = frame.then(&Frame::rotation_x_deg(degrees));
    }
    if let Some(offset) = config.translate {
        frame = frame.then(&Frame::translation(offset));
    }
    frame
}

/// Build a slice plane from the TOML plane configuration.
fn build_plane(config: &PlaneConfig) -> Result<SlicePlane> {
    if config.nu < 2 || config.nv < 2 {
        bail!(
            "Plane resolution {}x{} is too coarse; both nu and nv must be at least 2",
            config.nu,
            config.nv
        );
    }
    match config.axis.as_str() {
        "xy" => Ok(SlicePlane::XY { z: config.level }),
        "xz" => Ok(SlicePlane::XZ { y: config.level }),
        "yz" => Ok(SlicePlane::YZ { x: config.level }),
        other => bail!("Unsupported plane axis '{other}'. Valid axes: xy, xz, yz"),
    }
}

/// Compare the interpolation pipeline against the closed-form potential of
/// a monopole over a synthetic sample grid. Catches gross errors (units,
/// axis order, sign) without any input files.
fn analytic_self_check() -> Result<()> {
    const SIDE: f64 = 1.0e-4;
    const SOURCE: [f64; 3] = [5.0e-5, 5.0e-5, 5.0e-4];
    const AMPS: f64 = 1.0e-6;
    const N: usize = 6;

    let step = SIDE / (N - 1) as f64;
    let mut samples = FieldSampleSet::default();
    for i in 0..N {
        for j in 0..N {
            for k in 0..N {
                let p = [i as f64 * step, j as f64 * step, k as f64 * step];
                samples.push(FieldSample::new(p, potential(AMPS, SIGMA_SALINE, SOURCE, p)));
            }
        }
    }
    let interpolant = FieldInterpolant::build(&samples)?;

    let mut max_rel = 0.0_f64;
    let mut sum_rel = 0.0_f64;
    let mut count = 0_usize;
    for i in 0..N - 1 {
        for j in 0..N - 1 {
            for k in 0..N - 1 {
                let p = [
                    (i as f64 + 0.5) * step,
                    (j as f64 + 0.5) * step,
                    (k as f64 + 0.5) * step,
                ];
                let exact = potential(AMPS, SIGMA_SALINE, SOURCE, p);
                let got = interpolant.evaluate(p)?;
                max_rel = max_rel.max(((got - exact) / exact).abs());
                sum_rel += ((got - exact) / exact).abs();
                count += 1;
            }
        }
    }
    println!(
        "Analytic check: {} probes, max rel err {:.3e}, mean rel err {:.3e}",
        count,
        max_rel,
        sum_rel / count as f64
    );
    if max_rel > 0.2 {
        bail!("analytic self-check failed: max relative error {max_rel:.3e}");
    }
    Ok(())
}

/// JSON run report.
#[derive(Serialize)]
struct RunReport<'a> {
    compartments: usize,
    extrapolated: usize,
    probe_current_amps: f64,
    ohms_min: Option<f64>,
    ohms_max: Option<f64>,
    entries: &'a [TransferEntry],
}

fn write_report(path: &Path, map: &TransferMap, job: &JobConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let range = map.range();
    let report = RunReport {
        compartments: map.len(),
        extrapolated: map.extrapolated_count(),
        probe_current_amps: job.mapping.probe_current_amps,
        ohms_min: range.map(|r| r.0),
        ohms_max: range.map(|r| r.1),
        entries: map.entries(),
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Report written to: {}", path.display());
    Ok(())
}

/// Write a sampled plane to a CSV file with a metadata header.
fn write_plane_csv(map: &PlaneMap, axis: &str, path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "# Galvana — potential slice")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# Plane: {axis}")?;
    writeln!(file, "# Grid: {}x{}", map.nu, map.nv)?;
    writeln!(
        file,
        "# Extent: u=[{:.6}, {:.6}] v=[{:.6}, {:.6}]",
        map.extent[0], map.extent[1], map.extent[2], map.extent[3],
    )?;
    writeln!(file, "#")?;
    writeln!(file, "x,y,z,potential_v")?;

    for (pos, value) in map.positions.iter().zip(map.values.iter()) {
        match value {
            Some(v) => writeln!(
                file,
                "{:.6},{:.6},{:.6},{:.6e}",
                pos[0], pos[1], pos[2], v
            )?,
            // Outside nodes keep their row so the grid stays rectangular.
            None => writeln!(file, "{:.6},{:.6},{:.6},", pos[0], pos[1], pos[2])?,
        }
    }

    println!("Plane written to: {}", path.display());
    Ok(())
}
