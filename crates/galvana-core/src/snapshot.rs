//! Ordered geometry snapshots of a compartmental neuron model.
//!
//! A snapshot freezes the model's compartments in registration order. That
//! order is the positional contract every downstream consumer relies on,
//! from the mapper's result vector to the one-value-per-line store format:
//! value `k` belongs to compartment `k`, nothing else ties them together.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from snapshot construction and value re-application.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("duplicate compartment id '{id}' at position {position}")]
    DuplicateId { id: String, position: usize },

    #[error("cannot apply {values} values to {compartments} compartments")]
    CountMismatch { values: usize, compartments: usize },

    #[error("sink rejected compartment '{id}': {message}")]
    Sink { id: String, message: String },
}

/// A single compartment: identity plus representative anchor coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    /// Identity in the source model (the section name).
    pub id: String,
    /// Representative anchor in the shared physical frame (the proximal end
    /// of the section).
    pub anchor: [f64; 3],
}

/// An ordered, immutable snapshot of a model's compartments.
///
/// Iteration order equals construction order, always. The snapshot does not
/// observe later model changes; re-extract to pick them up.
#[derive(Debug, Clone, Default)]
pub struct GeometrySnapshot {
    compartments: Vec<Compartment>,
    index: HashMap<String, usize>,
}

impl GeometrySnapshot {
    /// Build a snapshot from `(id, anchor)` pairs in registration order.
    ///
    /// Ids must be unique; a repeated id fails with
    /// [`SnapshotError::DuplicateId`].
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (S, [f64; 3])>,
        S: Into<String>,
    {
        let mut compartments = Vec::new();
        let mut index = HashMap::new();
        for (id, anchor) in pairs {
            let id = id.into();
            let position = compartments.len();
            if index.insert(id.clone(), position).is_some() {
                return Err(SnapshotError::DuplicateId { id, position });
            }
            compartments.push(Compartment { id, anchor });
        }
        Ok(Self {
            compartments,
            index,
        })
    }

    /// Number of compartments.
    pub fn len(&self) -> usize {
        self.compartments.len()
    }

    /// Whether the snapshot holds no compartments.
    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }

    /// Compartments in registration order.
    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    /// Iterate over the compartments in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Compartment> {
        self.compartments.iter()
    }

    /// Compartment at registration position `position`.
    pub fn get(&self, position: usize) -> Option<&Compartment> {
        self.compartments.get(position)
    }

    /// Registration position of `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Anchor coordinates in registration order.
    pub fn anchors(&self) -> Vec<[f64; 3]> {
        self.compartments.iter().map(|c| c.anchor).collect()
    }

    /// Deliver one value per compartment, in order, to `sink`.
    ///
    /// The value count must match the compartment count exactly; on mismatch
    /// nothing is delivered and [`SnapshotError::CountMismatch`] is returned.
    /// A sink failure aborts the remaining deliveries.
    pub fn apply<S: ResistanceSink>(
        &self,
        values: &[f64],
        sink: &mut S,
    ) -> Result<(), SnapshotError> {
        if values.len() != self.compartments.len() {
            return Err(SnapshotError::CountMismatch {
                values: values.len(),
                compartments: self.compartments.len(),
            });
        }
        for (compartment, &ohms) in self.compartments.iter().zip(values) {
            sink.assign(compartment, ohms)?;
        }
        Ok(())
    }
}

/// Source of geometry snapshots; the coupling seam to a live neuron model.
pub trait GeometryProvider: Send + Sync {
    /// Extract an ordered snapshot of the current geometry.
    fn snapshot(&self) -> Result<GeometrySnapshot, SnapshotError>;
}

/// Receiver for per-compartment resistance values.
pub trait ResistanceSink {
    /// Accept the value for one compartment.
    fn assign(&mut self, compartment: &Compartment, ohms: f64) -> Result<(), SnapshotError>;
}
