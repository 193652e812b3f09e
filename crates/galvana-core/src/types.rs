//! Core types shared across the Galvana pipeline.
//!
//! This module defines the fundamental data structures exchanged between the
//! field-transfer stages: scattered potential samples as exported by the EM
//! solver, and the axis-aligned bounds used for domain reporting.

use serde::{Deserialize, Serialize};

/// A single scattered sample of the extracellular potential field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    /// Sample position in the shared physical frame (metres).
    pub position: [f64; 3],
    /// Extracellular potential at `position` (volts).
    pub potential: f64,
}

impl FieldSample {
    /// Create a sample from a position and a potential.
    pub fn new(position: [f64; 3], potential: f64) -> Self {
        Self {
            position,
            potential,
        }
    }
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Smallest coordinate along each axis.
    pub min: [f64; 3],
    /// Largest coordinate along each axis.
    pub max: [f64; 3],
}

impl Aabb {
    /// Bounding box of a point set, or `None` for an empty set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Aabb {
            min: first,
            max: first,
        };
        for p in iter {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    /// Extent along each axis.
    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Length of the main diagonal.
    pub fn diagonal(&self) -> f64 {
        let e = self.extent();
        (e[0] * e[0] + e[1] * e[1] + e[2] * e[2]).sqrt()
    }

    /// Midpoint of the box.
    pub fn centre(&self) -> [f64; 3] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }
}

/// An ordered collection of field samples.
///
/// Order is the order of the source export and is preserved verbatim: the
/// interpolator's duplicate handling and every line-numbered diagnostic
/// refer back to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSampleSet {
    samples: Vec<FieldSample>,
}

impl FieldSampleSet {
    /// Wrap an ordered sample vector.
    pub fn new(samples: Vec<FieldSample>) -> Self {
        Self { samples }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The samples, in export order.
    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    /// Iterate over the samples in export order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldSample> {
        self.samples.iter()
    }

    /// Append a sample.
    pub fn push(&mut self, sample: FieldSample) {
        self.samples.push(sample);
    }

    /// Sample positions, in order.
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.samples.iter().map(|s| s.position).collect()
    }

    /// Sample potentials, in order.
    pub fn potentials(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.potential).collect()
    }

    /// Bounding box of the sample positions.
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.samples.iter().map(|s| &s.position))
    }

    /// Smallest and largest potential in the set.
    pub fn potential_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter();
        let first = iter.next()?.potential;
        let mut range = (first, first);
        for s in iter {
            range.0 = range.0.min(s.potential);
            range.1 = range.1.max(s.potential);
        }
        Some(range)
    }
}

impl FromIterator<FieldSample> for FieldSampleSet {
    fn from_iter<I: IntoIterator<Item = FieldSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
