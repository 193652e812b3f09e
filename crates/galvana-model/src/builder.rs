//! Procedural fibre construction.
//!
//! Test rigs and the CLI need model geometry without a live simulator
//! attached. The builder lays out the canonical benchmark arrangement: a
//! straight multi-section fibre along an arbitrary direction.

use log::debug;

use crate::section::{CableModel, ModelError, Section};

/// Build a straight fibre of `n_sections` equal sections.
///
/// Sections are named `{prefix}[{k}]` for `k` in `0..n_sections` and laid
/// end to end from `start` along `direction`, which is normalised here and
/// need not be a unit vector. Each section carries `nseg` segments.
pub fn straight_fibre(
    prefix: &str,
    start: [f64; 3],
    direction: [f64; 3],
    n_sections: usize,
    section_length: f64,
    nseg: u32,
) -> Result<CableModel, ModelError> {
    if n_sections == 0 {
        return Err(ModelError::EmptyFibre);
    }
    if !section_length.is_finite() || section_length <= 0.0 {
        return Err(ModelError::InvalidLength {
            length: section_length,
        });
    }
    if nseg == 0 {
        return Err(ModelError::InvalidSegments { nseg });
    }
    let norm = (direction[0] * direction[0]
        + direction[1] * direction[1]
        + direction[2] * direction[2])
        .sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(ModelError::InvalidDirection);
    }
    let unit = [direction[0] / norm, direction[1] / norm, direction[2] / norm];

    let mut model = CableModel::new();
    for k in 0..n_sections {
        let a = k as f64 * section_length;
        let b = a + section_length;
        model.add_section(Section::new(
            format!("{prefix}[{k}]"),
            [
                start[0] + a * unit[0],
                start[1] + a * unit[1],
                start[2] + a * unit[2],
            ],
            [
                start[0] + b * unit[0],
                start[1] + b * unit[1],
                start[2] + b * unit[2],
            ],
            nseg,
        ))?;
    }
    debug!(
        "built straight fibre '{prefix}' with {n_sections} sections of length {section_length}"
    );
    Ok(model)
}
