//! Transfer-resistance store files.
//!
//! Two formats cover the two consumers of a mapping run. The positional
//! format is the hand-off contract with the simulator: one value per
//! line, six fixed decimals, row `k` for compartment `k` and nothing
//! else, so the reading side needs no parser beyond "one float per
//! line". The keyed format pairs each value with its compartment name
//! (`name<TAB>value`) for inspection and diffing; [`verify_keyed`]
//! checks such a file against a snapshot before anyone trusts it.
//!
//! Writing rounds to six decimals, so a written value and its re-read
//! counterpart agree to within `5e-7` absolute. Consumers that need the
//! full f64 keep the in-memory map.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use thiserror::Error;

use galvana_core::snapshot::GeometrySnapshot;
use galvana_core::transfer::TransferMap;

/// Errors from store reading, writing and verification.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("value {index} is not finite and cannot be stored")]
    NonFinite { index: usize },

    #[error("store line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("store line {line}: keyed to '{found}' but the snapshot has '{expected}' there")]
    IdMismatch {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("store holds {entries} entries for {compartments} compartments")]
    CountMismatch {
        entries: usize,
        compartments: usize,
    },
}

/// Write values in the positional format, one per line, in order.
///
/// Non-finite values are refused before anything is written: a NaN row
/// would round-trip as a parse error on the consuming side, long after
/// the producing run is gone.
pub fn write_positional<W: Write>(mut writer: W, values: &[f64]) -> Result<(), StoreError> {
    for (index, value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(StoreError::NonFinite { index });
        }
    }
    for value in values {
        writeln!(writer, "{value:.6}")?;
    }
    Ok(())
}

/// Write a positional store file.
pub fn save_positional(path: impl AsRef<Path>, values: &[f64]) -> Result<(), StoreError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_positional(&mut writer, values)?;
    writer.flush()?;
    info!("wrote {} resistances to {}", values.len(), path.display());
    Ok(())
}

/// Read a positional store from a reader.
///
/// The format is strict: every line must be a single finite number.
/// Blank lines are an error, since in a positional file a skipped row
/// silently shifts every value after it onto the wrong compartment.
pub fn read_positional<R: BufRead>(reader: R) -> Result<Vec<f64>, StoreError> {
    let mut values = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let number = number + 1;
        let text = line.trim();
        if text.is_empty() {
            return Err(StoreError::Format {
                line: number,
                message: "blank line in a positional store".to_string(),
            });
        }
        let value: f64 = text.parse().map_err(|_| StoreError::Format {
            line: number,
            message: format!("not a number: '{text}'"),
        })?;
        if !value.is_finite() {
            return Err(StoreError::Format {
                line: number,
                message: format!("not finite: '{text}'"),
            });
        }
        values.push(value);
    }
    Ok(values)
}

/// Load a positional store file.
pub fn load_positional(path: impl AsRef<Path>) -> Result<Vec<f64>, StoreError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let values = read_positional(BufReader::new(file))?;
    info!("read {} resistances from {}", values.len(), path.display());
    Ok(values)
}

/// Write a transfer map in the keyed format, `name<TAB>value` per line.
pub fn write_keyed<W: Write>(mut writer: W, map: &TransferMap) -> Result<(), StoreError> {
    for (index, entry) in map.iter().enumerate() {
        if !entry.ohms.is_finite() {
            return Err(StoreError::NonFinite { index });
        }
        writeln!(writer, "{}\t{:.6}", entry.id, entry.ohms)?;
    }
    Ok(())
}

/// Write a keyed store file.
pub fn save_keyed(path: impl AsRef<Path>, map: &TransferMap) -> Result<(), StoreError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_keyed(&mut writer, map)?;
    writer.flush()?;
    info!("wrote {} keyed resistances to {}", map.len(), path.display());
    Ok(())
}

/// Read a keyed store from a reader.
pub fn read_keyed<R: BufRead>(reader: R) -> Result<Vec<(String, f64)>, StoreError> {
    let mut entries = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let number = number + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '\t');
        let id = parts.next().unwrap_or_default();
        let value_text = match parts.next() {
            Some(text) => text.trim(),
            None => {
                return Err(StoreError::Format {
                    line: number,
                    message: "expected name<TAB>value".to_string(),
                })
            }
        };
        let value: f64 = value_text.parse().map_err(|_| StoreError::Format {
            line: number,
            message: format!("not a number: '{value_text}'"),
        })?;
        entries.push((id.to_string(), value));
    }
    Ok(entries)
}

/// Load a keyed store file.
pub fn load_keyed(path: impl AsRef<Path>) -> Result<Vec<(String, f64)>, StoreError> {
    let file = File::open(path.as_ref())?;
    read_keyed(BufReader::new(file))
}

/// Check keyed entries against a snapshot's order and identity.
///
/// Every entry must sit at the position its compartment holds in the
/// snapshot. The first disagreement is reported with its line number.
pub fn verify_keyed(
    entries: &[(String, f64)],
    snapshot: &GeometrySnapshot,
) -> Result<(), StoreError> {
    if entries.len() != snapshot.len() {
        return Err(StoreError::CountMismatch {
            entries: entries.len(),
            compartments: snapshot.len(),
        });
    }
    for (at, ((found, _), compartment)) in entries.iter().zip(snapshot.iter()).enumerate() {
        if found != &compartment.id {
            return Err(StoreError::IdMismatch {
                line: at + 1,
                expected: compartment.id.clone(),
                found: found.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn positional_round_trip_holds_six_decimals() {
        let values = vec![1.0e7, 40_000_000.0000004, -3.141592653589793, 0.0];
        let mut buffer = Vec::new();
        write_positional(&mut buffer, &values).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert_eq!(text.lines().count(), values.len());
        assert_eq!(text.lines().next().unwrap(), "10000000.000000");

        let back = read_positional(Cursor::new(buffer)).unwrap();
        assert_eq!(back.len(), values.len());
        for (orig, read) in values.iter().zip(&back) {
            assert!(
                (orig - read).abs() <= 5.0e-7,
                "{orig} re-read as {read}"
            );
        }
    }

    #[test]
    fn non_finite_values_refuse_to_write() {
        let mut buffer = Vec::new();
        let err = write_positional(&mut buffer, &[1.0, f64::NAN, 2.0]).unwrap_err();
        assert!(matches!(err, StoreError::NonFinite { index: 1 }));
        // Nothing was written before the rejection.
        assert!(buffer.is_empty());
    }

    #[test]
    fn blank_line_in_positional_store_is_an_error() {
        let err = read_positional(Cursor::new("1.5\n\n2.5\n")).unwrap_err();
        assert!(matches!(err, StoreError::Format { line: 2, .. }));
    }

    #[test]
    fn positional_parse_failure_reports_the_line() {
        let err = read_positional(Cursor::new("1.5\nohms\n")).unwrap_err();
        match err {
            StoreError::Format { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("ohms"));
            }
            other => panic!("expected a format error, got {other}"),
        }
    }

    #[test]
    fn keyed_round_trip_preserves_names() {
        let text = "axon[0]\t10000000.000000\naxon[1]\t20000000.500000\n";
        let entries = read_keyed(Cursor::new(text)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "axon[0]");
        assert_eq!(entries[1].1, 2.00000005e7);
    }

    #[test]
    fn keyed_line_without_a_tab_is_an_error() {
        let err = read_keyed(Cursor::new("axon[0] 1.0\n")).unwrap_err();
        assert!(matches!(err, StoreError::Format { line: 1, .. }));
    }

    #[test]
    fn verify_keyed_accepts_matching_order() {
        let snapshot = GeometrySnapshot::from_pairs([
            ("a", [0.0, 0.0, 0.0]),
            ("b", [1.0, 0.0, 0.0]),
        ])
        .unwrap();
        let entries = vec![("a".to_string(), 1.0), ("b".to_string(), 2.0)];
        verify_keyed(&entries, &snapshot).unwrap();
    }

    #[test]
    fn verify_keyed_rejects_reordered_names() {
        let snapshot = GeometrySnapshot::from_pairs([
            ("a", [0.0, 0.0, 0.0]),
            ("b", [1.0, 0.0, 0.0]),
        ])
        .unwrap();
        let entries = vec![("b".to_string(), 2.0), ("a".to_string(), 1.0)];
        let err = verify_keyed(&entries, &snapshot).unwrap_err();
        match err {
            StoreError::IdMismatch {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 1);
                assert_eq!(expected, "a");
                assert_eq!(found, "b");
            }
            other => panic!("expected an id mismatch, got {other}"),
        }
    }

    #[test]
    fn verify_keyed_rejects_count_mismatch() {
        let snapshot = GeometrySnapshot::from_pairs([("a", [0.0, 0.0, 0.0])]).unwrap();
        let entries = vec![("a".to_string(), 1.0), ("b".to_string(), 2.0)];
        let err = verify_keyed(&entries, &snapshot).unwrap_err();
        assert!(matches!(
            err,
            StoreError::CountMismatch {
                entries: 2,
                compartments: 1
            }
        ));
    }
}
