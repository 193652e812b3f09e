//! Compartmental cable geometry.
//!
//! A [`CableModel`] is the bridge-side stand-in for a live neuron model:
//! an ordered list of named straight sections, each of which can carry the
//! extracellular transfer resistance once a mapping run has delivered it.
//! Section names follow the compartmental-simulator convention of an array
//! name with an index, `axon[3]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use galvana_core::snapshot::{
    Compartment, GeometryProvider, GeometrySnapshot, ResistanceSink, SnapshotError,
};

use crate::transform::Frame;

/// Errors from model construction.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate section name '{name}'")]
    DuplicateSection { name: String },

    #[error("fibre direction must be finite and non-zero")]
    InvalidDirection,

    #[error("section length must be positive and finite, got {length}")]
    InvalidLength { length: f64 },

    #[error("sections carry at least one segment, got {nseg}")]
    InvalidSegments { nseg: u32 },

    #[error("a fibre needs at least one section")]
    EmptyFibre,
}

/// A straight cable section between two points in the shared frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Simulator-side name, unique within the model.
    pub name: String,
    /// Proximal (0-end) coordinate in metres.
    pub start: [f64; 3],
    /// Distal (1-end) coordinate in metres.
    pub end: [f64; 3],
    /// Number of electrical segments along the section.
    pub nseg: u32,
    /// Extracellular transfer resistance at the proximal end, in ohms,
    /// once a mapping run has assigned it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_ohms: Option<f64>,
}

impl Section {
    /// A bare section with no resistance assigned.
    ///
    /// Callers constructing sections from external input validate `nseg`
    /// first; passing zero here is a programming error.
    pub fn new(name: impl Into<String>, start: [f64; 3], end: [f64; 3], nseg: u32) -> Self {
        assert!(nseg >= 1, "sections carry at least one segment");
        Self {
            name: name.into(),
            start,
            end,
            nseg,
            rx_ohms: None,
        }
    }

    /// Euclidean length of the section.
    pub fn length(&self) -> f64 {
        let dx = self.end[0] - self.start[0];
        let dy = self.end[1] - self.start[1];
        let dz = self.end[2] - self.start[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// An ordered collection of uniquely named sections.
///
/// Registration order is the positional order every snapshot taken from
/// this model carries, and therefore the order of any resistance vector
/// applied back onto it.
#[derive(Debug, Clone, Default)]
pub struct CableModel {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl CableModel {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section at the end of the model.
    pub fn add_section(&mut self, section: Section) -> Result<(), ModelError> {
        if self.index.contains_key(&section.name) {
            return Err(ModelError::DuplicateSection {
                name: section.name.clone(),
            });
        }
        self.index.insert(section.name.clone(), self.sections.len());
        self.sections.push(section);
        Ok(())
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the model holds no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in registration order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterate over the sections in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    /// Section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.index.get(name).map(|&at| &self.sections[at])
    }

    /// The model re-expressed in another frame.
    ///
    /// Assigned resistances refer to the old coordinates and are dropped.
    pub fn transformed(&self, frame: &Frame) -> CableModel {
        let mut model = CableModel::new();
        for section in &self.sections {
            // Names stay unique, so the index can be rebuilt without checks.
            model.index.insert(section.name.clone(), model.sections.len());
            model.sections.push(Section {
                name: section.name.clone(),
                start: frame.apply(&section.start),
                end: frame.apply(&section.end),
                nseg: section.nseg,
                rx_ohms: None,
            });
        }
        model
    }
}

impl GeometryProvider for CableModel {
    /// Snapshot of section names and proximal ends, in registration order.
    fn snapshot(&self) -> Result<GeometrySnapshot, SnapshotError> {
        GeometrySnapshot::from_pairs(self.sections.iter().map(|s| (s.name.clone(), s.start)))
    }
}

impl ResistanceSink for CableModel {
    fn assign(&mut self, compartment: &Compartment, ohms: f64) -> Result<(), SnapshotError> {
        match self.index.get(&compartment.id) {
            Some(&at) => {
                self.sections[at].rx_ohms = Some(ohms);
                Ok(())
            }
            None => Err(SnapshotError::Sink {
                id: compartment.id.clone(),
                message: "no section with this name".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_section_model() -> CableModel {
        let mut model = CableModel::new();
        model
            .add_section(Section::new("axon[0]", [0.0, 0.0, 0.0], [0.0, 0.0, 10.0], 3))
            .unwrap();
        model
            .add_section(Section::new("axon[1]", [0.0, 0.0, 10.0], [0.0, 0.0, 20.0], 3))
            .unwrap();
        model
    }

    #[test]
    fn sections_register_in_order() {
        let model = two_section_model();
        assert_eq!(model.len(), 2);
        assert_eq!(model.section("axon[1]").unwrap().start, [0.0, 0.0, 10.0]);
        assert_eq!(model.section("axon[1]").unwrap().length(), 10.0);
        assert!(model.section("dendrite[0]").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut model = two_section_model();
        let result =
            model.add_section(Section::new("axon[0]", [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], 1));
        assert!(matches!(
            result,
            Err(ModelError::DuplicateSection { name }) if name == "axon[0]"
        ));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn snapshot_carries_proximal_ends_in_order() {
        let model = two_section_model();
        let snapshot = model.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(0).unwrap().id, "axon[0]");
        assert_eq!(snapshot.get(1).unwrap().anchor, [0.0, 0.0, 10.0]);
    }

    #[test]
    fn applied_values_land_on_the_named_sections() {
        let mut model = two_section_model();
        let snapshot = model.snapshot().unwrap();
        snapshot.apply(&[1.5e6, 2.5e6], &mut model).unwrap();
        assert_eq!(model.section("axon[0]").unwrap().rx_ohms, Some(1.5e6));
        assert_eq!(model.section("axon[1]").unwrap().rx_ohms, Some(2.5e6));
    }

    #[test]
    fn assigning_to_an_unknown_section_fails() {
        let other = {
            let mut model = CableModel::new();
            model
                .add_section(Section::new("soma", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1))
                .unwrap();
            model
        };
        let snapshot = other.snapshot().unwrap();

        let mut model = two_section_model();
        let result = snapshot.apply(&[7.0], &mut model);
        assert!(matches!(
            result,
            Err(SnapshotError::Sink { id, .. }) if id == "soma"
        ));
    }

    #[test]
    fn transformed_moves_endpoints_and_clears_resistances() {
        let mut model = two_section_model();
        let snapshot = model.snapshot().unwrap();
        snapshot.apply(&[1.0, 2.0], &mut model).unwrap();

        let moved = model.transformed(&Frame::translation([5.0, 0.0, 0.0]));
        let section = moved.section("axon[1]").unwrap();
        assert_eq!(section.start, [5.0, 0.0, 10.0]);
        assert_eq!(section.end, [5.0, 0.0, 20.0]);
        assert_eq!(section.rx_ohms, None);
        // The source model keeps its values.
        assert_eq!(model.section("axon[1]").unwrap().rx_ohms, Some(2.0));
    }
}
