//! Transfer-resistance mapping from an interpolated field onto a geometry
//! snapshot.
//!
//! The EM solve that produced the field profile drove a known probe current
//! through the stimulating contact. Dividing the interpolated potential at a
//! compartment anchor by that current gives the transfer resistance the
//! cable model uses as its extracellular coupling coefficient:
//! volts / amperes = ohms. The mapping is positional: entry `k` of the
//! result belongs to compartment `k` of the snapshot.

use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interp::{Extrapolation, FieldInterpolant, InterpError};
use crate::snapshot::GeometrySnapshot;

/// Errors from transfer-resistance mapping.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("probe current must be finite and non-zero, got {amps} A")]
    InvalidProbeCurrent { amps: f64 },

    #[error(
        "compartment '{id}' anchor {anchor:?} lies outside the sampled domain \
         ({distance:.3e} from the hull)"
    )]
    OutOfDomain {
        id: String,
        anchor: [f64; 3],
        distance: f64,
    },

    #[error("interpolation failed: {0}")]
    Interpolation(#[from] InterpError),
}

/// Probe current driven through the stimulating contact during the EM solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeCurrent(f64);

impl ProbeCurrent {
    /// One microampere, the conventional unit probe current.
    pub const MICROAMP: ProbeCurrent = ProbeCurrent(1e-6);

    /// A probe current in amperes. Zero and non-finite currents are
    /// rejected: dividing by them would manufacture non-physical
    /// resistances.
    pub fn new(amps: f64) -> Result<Self, TransferError> {
        if !amps.is_finite() || amps == 0.0 {
            return Err(TransferError::InvalidProbeCurrent { amps });
        }
        Ok(Self(amps))
    }

    /// The current in amperes.
    pub fn amps(&self) -> f64 {
        self.0
    }
}

/// How compartment anchors outside the sampled domain are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutOfDomainPolicy {
    /// Abort the whole mapping on the first out-of-domain anchor.
    #[default]
    Reject,
    /// Substitute the nearest sample's value and flag the entry.
    NearestSample,
}

/// One mapped compartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    /// Compartment identity, as registered in the snapshot.
    pub id: String,
    /// Anchor the field was evaluated at.
    pub anchor: [f64; 3],
    /// Transfer resistance (ohms).
    pub ohms: f64,
    /// Present when the value came from nearest-sample substitution.
    pub extrapolated: Option<Extrapolation>,
}

/// Ordered mapping result, one entry per snapshot compartment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferMap {
    entries: Vec<TransferEntry>,
}

impl TransferMap {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in snapshot order.
    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    /// Iterate over the entries in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, TransferEntry> {
        self.entries.iter()
    }

    /// The ordered resistance vector, ready for the positional store.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.ohms).collect()
    }

    /// How many entries needed nearest-sample substitution.
    pub fn extrapolated_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.extrapolated.is_some())
            .count()
    }

    /// Smallest and largest resistance, or `None` when empty.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.entries.iter();
        let first = iter.next()?.ohms;
        let mut range = (first, first);
        for e in iter {
            range.0 = range.0.min(e.ohms);
            range.1 = range.1.max(e.ohms);
        }
        Some(range)
    }
}

/// Evaluate the field at every compartment anchor and convert to transfer
/// resistances.
///
/// Evaluation runs in parallel but the result is ordered like the snapshot,
/// and under [`OutOfDomainPolicy::Reject`] the reported failure is the first
/// offending compartment in snapshot order, not whichever thread lost the
/// race. No partial map is ever returned.
pub fn map_transfer_resistances(
    interpolant: &FieldInterpolant,
    snapshot: &GeometrySnapshot,
    probe_current: ProbeCurrent,
    policy: OutOfDomainPolicy,
) -> Result<TransferMap, TransferError> {
    let amps = probe_current.amps();
    let results: Vec<Result<TransferEntry, TransferError>> = snapshot
        .compartments()
        .par_iter()
        .map(|compartment| match policy {
            OutOfDomainPolicy::Reject => interpolant
                .evaluate(compartment.anchor)
                .map(|potential| TransferEntry {
                    id: compartment.id.clone(),
                    anchor: compartment.anchor,
                    ohms: potential / amps,
                    extrapolated: None,
                })
                .map_err(|err| match err {
                    InterpError::OutOfDomain { distance, .. } => TransferError::OutOfDomain {
                        id: compartment.id.clone(),
                        anchor: compartment.anchor,
                        distance,
                    },
                    other => TransferError::Interpolation(other),
                }),
            OutOfDomainPolicy::NearestSample => {
                let (potential, extrapolated) = interpolant.evaluate_or_nearest(compartment.anchor);
                if let Some(marker) = &extrapolated {
                    warn!(
                        "compartment '{}' anchor {:?} is outside the sampled domain \
                         ({:.3e} from the hull); using its nearest sample",
                        compartment.id, compartment.anchor, marker.distance
                    );
                }
                Ok(TransferEntry {
                    id: compartment.id.clone(),
                    anchor: compartment.anchor,
                    ohms: potential / amps,
                    extrapolated,
                })
            }
        })
        .collect();

    let mut entries = Vec::with_capacity(results.len());
    for result in results {
        entries.push(result?);
    }
    let map = TransferMap { entries };
    if map.extrapolated_count() > 0 {
        warn!(
            "{} of {} compartments were mapped by nearest-sample substitution",
            map.extrapolated_count(),
            map.len()
        );
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::GeometrySnapshot;
    use crate::types::{FieldSample, FieldSampleSet};
    use approx::assert_relative_eq;

    /// Cube on [0, 100]^3 with V = z volts.
    fn cube_interpolant() -> FieldInterpolant {
        let mut set = FieldSampleSet::default();
        for &(x, y) in &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)] {
            set.push(FieldSample::new([x, y, 0.0], 0.0));
            set.push(FieldSample::new([x, y, 100.0], 100.0));
        }
        FieldInterpolant::build(&set).unwrap()
    }

    #[test]
    fn potentials_divide_by_the_probe_current() {
        let interpolant = cube_interpolant();
        let snapshot = GeometrySnapshot::from_pairs([
            ("a[0]", [50.0, 50.0, 10.0]),
            ("a[1]", [50.0, 50.0, 40.0]),
            ("a[2]", [50.0, 50.0, 90.0]),
        ])
        .unwrap();
        let map = map_transfer_resistances(
            &interpolant,
            &snapshot,
            ProbeCurrent::MICROAMP,
            OutOfDomainPolicy::Reject,
        )
        .unwrap();
        assert_eq!(map.len(), 3);
        let values = map.values();
        assert_relative_eq!(values[0], 1.0e7, max_relative = 1e-9);
        assert_relative_eq!(values[1], 4.0e7, max_relative = 1e-9);
        assert_relative_eq!(values[2], 9.0e7, max_relative = 1e-9);
        assert_eq!(map.extrapolated_count(), 0);
        assert_eq!(map.entries()[1].id, "a[1]");
    }

    #[test]
    fn reject_policy_reports_the_first_offender_in_order() {
        let interpolant = cube_interpolant();
        // two offenders; "mid" comes first in registration order
        let snapshot = GeometrySnapshot::from_pairs([
            ("inside", [50.0, 50.0, 50.0]),
            ("mid", [50.0, 50.0, 150.0]),
            ("far", [50.0, 50.0, 400.0]),
        ])
        .unwrap();
        let err = map_transfer_resistances(
            &interpolant,
            &snapshot,
            ProbeCurrent::MICROAMP,
            OutOfDomainPolicy::Reject,
        )
        .unwrap_err();
        match err {
            TransferError::OutOfDomain { id, distance, .. } => {
                assert_eq!(id, "mid");
                assert_relative_eq!(distance, 50.0, max_relative = 1e-9);
            }
            other => panic!("expected OutOfDomain, got {other:?}"),
        }
    }

    #[test]
    fn nearest_sample_policy_flags_substitutions() {
        let interpolant = cube_interpolant();
        let snapshot = GeometrySnapshot::from_pairs([
            ("inside", [50.0, 50.0, 50.0]),
            ("outside", [50.0, 50.0, 200.0]),
        ])
        .unwrap();
        let map = map_transfer_resistances(
            &interpolant,
            &snapshot,
            ProbeCurrent::MICROAMP,
            OutOfDomainPolicy::NearestSample,
        )
        .unwrap();
        assert_eq!(map.extrapolated_count(), 1);
        let outside = &map.entries()[1];
        assert!(outside.extrapolated.is_some());
        // nearest samples are the top-face corners at 100 V
        assert_relative_eq!(outside.ohms, 1.0e8, max_relative = 1e-9);
        assert!(map.entries()[0].extrapolated.is_none());
    }

    #[test]
    fn empty_snapshot_maps_to_an_empty_vector() {
        let interpolant = cube_interpolant();
        let snapshot = GeometrySnapshot::from_pairs(Vec::<(String, [f64; 3])>::new()).unwrap();
        let map = map_transfer_resistances(
            &interpolant,
            &snapshot,
            ProbeCurrent::MICROAMP,
            OutOfDomainPolicy::Reject,
        )
        .unwrap();
        assert!(map.is_empty());
        assert!(map.range().is_none());
    }

    #[test]
    fn invalid_probe_currents_are_rejected() {
        assert!(matches!(
            ProbeCurrent::new(0.0),
            Err(TransferError::InvalidProbeCurrent { .. })
        ));
        assert!(matches!(
            ProbeCurrent::new(f64::NAN),
            Err(TransferError::InvalidProbeCurrent { .. })
        ));
        assert!(matches!(
            ProbeCurrent::new(f64::INFINITY),
            Err(TransferError::InvalidProbeCurrent { .. })
        ));
        assert_relative_eq!(ProbeCurrent::new(-2.0e-6).unwrap().amps(), -2.0e-6);
    }
}
