//! Piecewise-linear interpolation of a scattered potential field.
//!
//! [`FieldInterpolant`] tetrahedralises the sample cloud once and then
//! answers point queries by barycentric interpolation inside the containing
//! cell. Every interpolated value is a convex combination of the four cell
//! vertices' potentials, so results never leave the sampled range, and any
//! affine field is reproduced exactly.
//!
//! Queries outside the convex hull of the samples are a first-class case:
//! [`FieldInterpolant::evaluate`] rejects them with the distance to the
//! hull, while [`FieldInterpolant::evaluate_or_nearest`] substitutes the
//! nearest sample's value and says so in its return value. Evaluation is
//! `&self` and side-effect-free; the interpolant is `Send + Sync` and can be
//! queried from many threads at once.

pub(crate) mod triangulation;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{info, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FieldSampleSet;
use triangulation::{point_triangle_distance, sub, Triangulation, EPS_BARY};

/// Errors from interpolant construction and evaluation.
#[derive(Debug, Clone, Error)]
pub enum InterpError {
    #[error("interpolation in 3-D needs at least 4 distinct sample points, found {found}")]
    InsufficientData { found: usize },

    #[error("sample points all lie in one plane; no tetrahedron can be formed")]
    DegenerateGeometry,

    #[error("point {point:?} lies outside the sampled domain ({distance:.3e} from the hull)")]
    OutOfDomain { point: [f64; 3], distance: f64 },
}

/// Marker attached to a value obtained by nearest-sample substitution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrapolation {
    /// Distance from the query point to the sampled domain's hull.
    pub distance: f64,
    /// Index of the substituted vertex in the interpolant's vertex array.
    pub nearest_sample: usize,
}

/// A piecewise-linear interpolant over the convex hull of a sample cloud.
///
/// Built once with [`FieldInterpolant::build`], immutable afterwards.
#[derive(Debug, Clone)]
pub struct FieldInterpolant {
    tri: Triangulation,
    /// Potential per distinct vertex, aligned with the triangulation's points.
    values: Vec<f64>,
    /// Cell adjacency across each face, for walking point location.
    neighbours: Vec<[Option<usize>; 4]>,
    /// Hull facets as vertex triples, for distance-to-hull queries.
    boundary: Vec<[usize; 3]>,
}

impl FieldInterpolant {
    /// Build the interpolant from a sample set.
    ///
    /// Duplicate sample positions collapse to one vertex; the first value in
    /// export order wins. Fewer than four distinct points fail with
    /// [`InterpError::InsufficientData`]; four or more coplanar points fail
    /// with [`InterpError::DegenerateGeometry`].
    pub fn build(samples: &FieldSampleSet) -> Result<Self, InterpError> {
        let mut points: Vec<[f64; 3]> = Vec::with_capacity(samples.len());
        let mut values: Vec<f64> = Vec::with_capacity(samples.len());
        let mut seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(samples.len());
        let mut duplicates = 0usize;
        for sample in samples.iter() {
            match seen.entry(position_key(sample.position)) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(points.len());
                    points.push(sample.position);
                    values.push(sample.potential);
                }
            }
        }
        if duplicates > 0 {
            warn!("collapsed {duplicates} duplicate sample positions (first value kept)");
        }
        if points.len() < 4 {
            return Err(InterpError::InsufficientData {
                found: points.len(),
            });
        }

        let tri =
            Triangulation::build(points).map_err(|_| InterpError::DegenerateGeometry)?;
        let neighbours = build_neighbours(&tri);
        let boundary: Vec<[usize; 3]> = tri
            .boundary_facets()
            .into_iter()
            .map(|(ci, fi)| tri.cells[ci].face(fi))
            .collect();
        info!(
            "field interpolant ready: {} vertices, {} tetrahedra, {} hull facets",
            tri.points.len(),
            tri.cells.len(),
            boundary.len()
        );
        Ok(Self {
            tri,
            values,
            neighbours,
            boundary,
        })
    }

    /// Number of distinct sample vertices.
    pub fn vertex_count(&self) -> usize {
        self.tri.points.len()
    }

    /// Number of tetrahedral cells.
    pub fn cell_count(&self) -> usize {
        self.tri.cells.len()
    }

    /// Position of vertex `i`.
    pub fn vertex_position(&self, i: usize) -> [f64; 3] {
        self.tri.points[i]
    }

    /// Interpolate the potential at `p`.
    ///
    /// Points on the hull boundary count as inside. Outside the hull the
    /// query fails with [`InterpError::OutOfDomain`] carrying the Euclidean
    /// distance from `p` to the hull surface.
    pub fn evaluate(&self, p: [f64; 3]) -> Result<f64, InterpError> {
        match self.locate(p) {
            Some(ci) => Ok(self.value_in_cell(ci, p)),
            None => Err(InterpError::OutOfDomain {
                point: p,
                distance: self.distance_to_hull(p),
            }),
        }
    }

    /// Interpolate at `p`, substituting the nearest sample's value when `p`
    /// is outside the hull.
    ///
    /// Inside the hull this is identical to [`FieldInterpolant::evaluate`]
    /// and the marker is `None`; outside, the marker records the distance to
    /// the hull and which vertex supplied the value. Substitution is never
    /// silent at the API level; callers decide whether to accept it.
    pub fn evaluate_or_nearest(&self, p: [f64; 3]) -> (f64, Option<Extrapolation>) {
        match self.locate(p) {
            Some(ci) => (self.value_in_cell(ci, p), None),
            None => {
                let mut best = 0usize;
                let mut best_d2 = f64::INFINITY;
                for (i, &q) in self.tri.points.iter().enumerate() {
                    let d = sub(p, q);
                    let d2 = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
                    if d2 < best_d2 {
                        best_d2 = d2;
                        best = i;
                    }
                }
                let marker = Extrapolation {
                    distance: self.distance_to_hull(p),
                    nearest_sample: best,
                };
                (self.values[best], Some(marker))
            }
        }
    }

    /// Euclidean distance from `p` to the hull surface (zero on the hull).
    pub fn distance_to_hull(&self, p: [f64; 3]) -> f64 {
        self.boundary
            .iter()
            .map(|&[a, b, c]| {
                point_triangle_distance(p, self.tri.points[a], self.tri.points[b], self.tri.points[c])
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Find the cell containing `p`: walk from cell 0 towards `p`, falling
    /// back to a full scan when the walk exits the hull or runs too long.
    fn locate(&self, p: [f64; 3]) -> Option<usize> {
        let mut current = 0usize;
        for _ in 0..self.tri.cells.len() {
            let bary = self.tri.barycentric(current, p);
            let mut worst = 0usize;
            for k in 1..4 {
                if bary[k] < bary[worst] {
                    worst = k;
                }
            }
            if bary[worst] >= -EPS_BARY {
                return Some(current);
            }
            match self.neighbours[current][worst] {
                Some(next) => current = next,
                None => break,
            }
        }
        trace!("cell walk fell back to a linear scan for {p:?}");
        (0..self.tri.cells.len()).find(|&ci| self.tri.contains(ci, p))
    }

    fn value_in_cell(&self, ci: usize, p: [f64; 3]) -> f64 {
        let bary = self.tri.barycentric(ci, p);
        let verts = self.tri.cells[ci].vertices;
        (0..4).map(|k| bary[k] * self.values[verts[k]]).sum()
    }
}

/// Cell adjacency: for each cell, the neighbour across each of its faces.
fn build_neighbours(tri: &Triangulation) -> Vec<[Option<usize>; 4]> {
    let mut neighbours = vec![[None; 4]; tri.cells.len()];
    let mut open: HashMap<[usize; 3], (usize, usize)> = HashMap::new();
    for (ci, cell) in tri.cells.iter().enumerate() {
        for fi in 0..4 {
            let mut key = cell.face(fi);
            key.sort_unstable();
            match open.entry(key) {
                Entry::Occupied(entry) => {
                    let (cj, fj) = *entry.get();
                    neighbours[ci][fi] = Some(cj);
                    neighbours[cj][fj] = Some(ci);
                }
                Entry::Vacant(slot) => {
                    slot.insert((ci, fi));
                }
            }
        }
    }
    neighbours
}

/// Hash key for a position; `-0.0` and `0.0` collapse to the same key.
fn position_key(p: [f64; 3]) -> [u64; 3] {
    [
        (p[0] + 0.0).to_bits(),
        (p[1] + 0.0).to_bits(),
        (p[2] + 0.0).to_bits(),
    ]
}
