//! Exported field-profile parsing.
//!
//! The EM solver side exports scattered potential samples as plain
//! whitespace-delimited text: four columns `x y z V` per line, with
//! `%`-prefixed comments in the MATLAB style of the export scripts and
//! blank lines ignored. Every line is validated on its own, so a
//! malformed export fails with the offending line number instead of
//! feeding a silently shifted column into the interpolant.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use thiserror::Error;

use galvana_core::types::{FieldSample, FieldSampleSet};

/// Errors from profile parsing.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile line {line}: {message}")]
    Format { line: usize, message: String },
}

/// Parse a field profile from a reader.
///
/// Line numbers in errors are 1-based. A `%` starts a comment anywhere in
/// a line; what precedes it is still parsed. Coordinates and potentials
/// must be finite: a NaN or infinity in an export is an upstream solver
/// problem and is rejected here rather than propagated into the mesh.
pub fn parse_profile<R: BufRead>(reader: R) -> Result<FieldSampleSet, ProfileError> {
    let mut samples = FieldSampleSet::default();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let number = number + 1;
        let data = match line.find('%') {
            Some(at) => &line[..at],
            None => line.as_str(),
        };
        if data.trim().is_empty() {
            continue;
        }

        let columns: Vec<&str> = data.split_whitespace().collect();
        if columns.len() != 4 {
            return Err(ProfileError::Format {
                line: number,
                message: format!("expected 4 columns (x y z V), found {}", columns.len()),
            });
        }

        let mut values = [0.0_f64; 4];
        for (at, column) in columns.iter().enumerate() {
            let value: f64 = column.parse().map_err(|_| ProfileError::Format {
                line: number,
                message: format!("column {} is not a number: '{column}'", at + 1),
            })?;
            if !value.is_finite() {
                return Err(ProfileError::Format {
                    line: number,
                    message: format!("column {} is not finite: '{column}'", at + 1),
                });
            }
            values[at] = value;
        }
        samples.push(FieldSample::new(
            [values[0], values[1], values[2]],
            values[3],
        ));
    }
    Ok(samples)
}

/// Load a field profile from a file.
pub fn load_profile(path: impl AsRef<Path>) -> Result<FieldSampleSet, ProfileError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let samples = parse_profile(BufReader::new(file))?;
    info!(
        "loaded {} field samples from {}",
        samples.len(),
        path.display()
    );
    Ok(samples)
}
