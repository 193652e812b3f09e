//! Section-list files.
//!
//! Rig geometry for runs without a live simulator attached: one section
//! per line, eight whitespace-delimited columns
//!
//! ```text
//! name  x0 y0 z0  x1 y1 z1  nseg
//! ```
//!
//! with `%` comments and blank lines ignored, matching the profile
//! format conventions.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use thiserror::Error;

use galvana_model::section::{CableModel, ModelError, Section};

/// Errors from section-list parsing.
#[derive(Debug, Error)]
pub enum SectionsError {
    #[error("section list I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("section list line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("section list line {line}: {source}")]
    Model {
        line: usize,
        #[source]
        source: ModelError,
    },
}

/// Parse a section list from a reader.
pub fn parse_sections<R: BufRead>(reader: R) -> Result<CableModel, SectionsError> {
    let mut model = CableModel::new();
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
        if columns.len() != 8 {
            return Err(SectionsError::Format {
                line: number,
                message: format!(
                    "expected 8 columns (name x0 y0 z0 x1 y1 z1 nseg), found {}",
                    columns.len()
                ),
            });
        }

        let mut coords = [0.0_f64; 6];
        for (at, column) in columns[1..7].iter().enumerate() {
            let value: f64 = column.parse().map_err(|_| SectionsError::Format {
                line: number,
                message: format!("column {} is not a number: '{column}'", at + 2),
            })?;
            if !value.is_finite() {
                return Err(SectionsError::Format {
                    line: number,
                    message: format!("column {} is not finite: '{column}'", at + 2),
                });
            }
            coords[at] = value;
        }

        let nseg: u32 = columns[7].parse().map_err(|_| SectionsError::Format {
            line: number,
            message: format!("nseg is not an integer: '{}'", columns[7]),
        })?;
        if nseg == 0 {
            return Err(SectionsError::Format {
                line: number,
                message: "nseg must be at least 1".to_string(),
            });
        }

        let section = Section::new(
            columns[0],
            [coords[0], coords[1], coords[2]],
            [coords[3], coords[4], coords[5]],
            nseg,
        );
        model
            .add_section(section)
            .map_err(|source| SectionsError::Model {
                line: number,
                source,
            })?;
    }
    Ok(model)
}

/// Load a section list from a file.
pub fn load_sections(path: impl AsRef<Path>) -> Result<CableModel, SectionsError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let model = parse_sections(BufReader::new(file))?;
    info!("loaded {} sections from {}", model.len(), path.display());
    Ok(model)
}
