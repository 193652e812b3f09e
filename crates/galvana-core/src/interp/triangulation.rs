//! Incremental tetrahedralisation of a scattered point cloud.
//!
//! Builds a simplicial partition of the convex hull of the input points using
//! orientation predicates only. Points are inserted one at a time: a point
//! inside the current hull carves out the cavity of cells whose closure
//! contains it and re-fans the cavity boundary to the new vertex; a point
//! outside the hull is fanned to every boundary facet it strictly sees.
//! Because no circumsphere test is performed, cospherical inputs (regular
//! grids, box corners) never hit a degenerate predicate. The result is a
//! valid covering triangulation, not a Delaunay one, which is all
//! piecewise-linear interpolation requires.
//!
//! Construction scans the live cell list on each insertion, so building is
//! quadratic in the worst case; profiles of a few thousand samples build in
//! well under a second.

use std::collections::HashMap;

use log::debug;

/// Relative tolerance for orientation tests (scaled by edge lengths).
const EPS_ORIENT: f64 = 1e-9;

/// Tolerance on normalised barycentric coordinates; points this far past a
/// face still count as contained, so hull-boundary queries interpolate
/// instead of rejecting.
pub(crate) const EPS_BARY: f64 = 1e-9;

#[inline]
pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub(crate) fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Six times the signed volume of tetrahedron `(a, b, c, d)`.
///
/// Positive when `d` lies on the side of plane `(a, b, c)` given by the
/// right-hand rule on `(b - a) x (c - a)`.
pub(crate) fn orient3d(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    dot(cross(sub(b, a), sub(c, a)), sub(d, a))
}

/// Magnitude scale for [`orient3d`] tolerance comparisons.
fn orient_scale(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    norm(sub(b, a)) * norm(sub(c, a)) * norm(sub(d, a))
}

fn sorted3(mut face: [usize; 3]) -> [usize; 3] {
    face.sort_unstable();
    face
}

/// Euclidean distance from `p` to triangle `(a, b, c)`.
///
/// Closest-point classification against the triangle's vertex, edge, and
/// interior regions.
pub(crate) fn point_triangle_distance(p: [f64; 3], a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ap = sub(p, a);
    let d1 = dot(ab, ap);
    let d2 = dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return norm(ap);
    }

    let bp = sub(p, b);
    let d3 = dot(ab, bp);
    let d4 = dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return norm(bp);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return distance(p, add(a, scale(ab, t)));
    }

    let cp = sub(p, c);
    let d5 = dot(ab, cp);
    let d6 = dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return norm(cp);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return distance(p, add(a, scale(ac, t)));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return distance(p, add(b, scale(sub(c, b), t)));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    distance(p, add(a, add(scale(ab, v), scale(ac, w))))
}

/// A positively oriented tetrahedral cell, as indices into the point array.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tetrahedron {
    pub vertices: [usize; 4],
}

impl Tetrahedron {
    /// The face opposite vertex `i`: the three other vertices.
    pub(crate) fn face(&self, i: usize) -> [usize; 3] {
        match i {
            0 => [self.vertices[1], self.vertices[2], self.vertices[3]],
            1 => [self.vertices[0], self.vertices[2], self.vertices[3]],
            2 => [self.vertices[0], self.vertices[1], self.vertices[3]],
            _ => [self.vertices[0], self.vertices[1], self.vertices[2]],
        }
    }
}

/// The input admits no tetrahedron: every point lies in one plane (or line).
#[derive(Debug, Clone, Copy)]
pub(crate) struct DegenerateCloud;

/// A tetrahedral partition of the convex hull of a distinct point set.
#[derive(Debug, Clone)]
pub(crate) struct Triangulation {
    pub points: Vec<[f64; 3]>,
    pub cells: Vec<Tetrahedron>,
}

impl Triangulation {
    /// Tetrahedralise `points`; the caller guarantees they are pairwise
    /// distinct and at least four.
    pub(crate) fn build(points: Vec<[f64; 3]>) -> Result<Self, DegenerateCloud> {
        debug_assert!(points.len() >= 4);
        let seed = find_seed(&points).ok_or(DegenerateCloud)?;

        let [a, b, c, d] = seed;
        let o = orient3d(points[a], points[b], points[c], points[d]);
        let vertices = if o > 0.0 { [a, b, c, d] } else { [a, c, b, d] };
        let mut tri = Triangulation {
            points,
            cells: vec![Tetrahedron { vertices }],
        };

        for i in 0..tri.points.len() {
            if seed.contains(&i) {
                continue;
            }
            tri.insert(i);
        }
        debug!(
            "tetrahedralised {} points into {} cells",
            tri.points.len(),
            tri.cells.len()
        );
        Ok(tri)
    }

    /// Barycentric coordinates of `p` in cell `ci`.
    ///
    /// All four coordinates are non-negative (within [`EPS_BARY`]) exactly
    /// when the cell's closure contains `p`; they always sum to one.
    pub(crate) fn barycentric(&self, ci: usize, p: [f64; 3]) -> [f64; 4] {
        let [a, b, c, d] = self.cells[ci].vertices;
        let (pa, pb, pc, pd) = (self.points[a], self.points[b], self.points[c], self.points[d]);
        let vol = orient3d(pa, pb, pc, pd);
        [
            orient3d(p, pb, pc, pd) / vol,
            orient3d(pa, p, pc, pd) / vol,
            orient3d(pa, pb, p, pd) / vol,
            orient3d(pa, pb, pc, p) / vol,
        ]
    }

    /// Whether the closure of cell `ci` contains `p`.
    pub(crate) fn contains(&self, ci: usize, p: [f64; 3]) -> bool {
        self.barycentric(ci, p).iter().all(|&b| b >= -EPS_BARY)
    }

    /// Facets belonging to exactly one cell, as `(cell, face index)` pairs.
    ///
    /// Together these triangulate the hull surface; the vertex opposite
    /// facet `(ci, fi)` is `cells[ci].vertices[fi]`.
    pub(crate) fn boundary_facets(&self) -> Vec<(usize, usize)> {
        let mut faces: HashMap<[usize; 3], (usize, usize, usize)> = HashMap::new();
        for (ci, cell) in self.cells.iter().enumerate() {
            for fi in 0..4 {
                faces
                    .entry(sorted3(cell.face(fi)))
                    .and_modify(|entry| entry.2 += 1)
                    .or_insert((ci, fi, 1));
            }
        }
        faces
            .into_values()
            .filter(|&(_, _, count)| count == 1)
            .map(|(ci, fi, _)| (ci, fi))
            .collect()
    }

    fn insert(&mut self, pi: usize) {
        let p = self.points[pi];
        let cavity: Vec<usize> = (0..self.cells.len())
            .filter(|&ci| self.contains(ci, p))
            .collect();
        if cavity.is_empty() {
            self.insert_outside(pi);
            return;
        }

        // Faces shared by two cavity cells are interior to the cavity; the
        // rest form its boundary and get re-fanned to the new vertex.
        let mut face_count: HashMap<[usize; 3], ([usize; 3], usize)> = HashMap::new();
        for &ci in &cavity {
            for fi in 0..4 {
                let face = self.cells[ci].face(fi);
                face_count
                    .entry(sorted3(face))
                    .and_modify(|entry| entry.1 += 1)
                    .or_insert((face, 1));
            }
        }

        let mut doomed = cavity;
        doomed.sort_unstable_by(|x, y| y.cmp(x));
        for ci in doomed {
            self.cells.swap_remove(ci);
        }

        for (face, count) in face_count.into_values() {
            if count == 1 {
                self.push_cell(face, pi);
            }
        }
    }

    /// Connect an outside point to every hull facet it strictly sees.
    fn insert_outside(&mut self, pi: usize) {
        let p = self.points[pi];
        let mut visible: Vec<[usize; 3]> = Vec::new();
        for (ci, fi) in self.boundary_facets() {
            let face = self.cells[ci].face(fi);
            let opposite = self.cells[ci].vertices[fi];
            let [f0, f1, f2] = face;
            let (pf0, pf1, pf2) = (self.points[f0], self.points[f1], self.points[f2]);
            let o_p = orient3d(pf0, pf1, pf2, p);
            let o_inner = orient3d(pf0, pf1, pf2, self.points[opposite]);
            // strictly visible: p and the cell's fourth vertex on opposite
            // sides of the facet plane
            if o_p.abs() > EPS_ORIENT * orient_scale(pf0, pf1, pf2, p) && o_p * o_inner < 0.0 {
                visible.push(face);
            }
        }
        for face in visible {
            self.push_cell(face, pi);
        }
    }

    /// Append cell `(face, apex)` with positive orientation; a coplanar apex
    /// would make a zero-volume cell and is dropped instead.
    fn push_cell(&mut self, face: [usize; 3], apex: usize) {
        let [f0, f1, f2] = face;
        let (pa, pb, pc, pd) = (
            self.points[f0],
            self.points[f1],
            self.points[f2],
            self.points[apex],
        );
        let o = orient3d(pa, pb, pc, pd);
        if o.abs() <= EPS_ORIENT * orient_scale(pa, pb, pc, pd) {
            return;
        }
        let vertices = if o > 0.0 {
            [f0, f1, f2, apex]
        } else {
            [f0, f2, f1, apex]
        };
        self.cells.push(Tetrahedron { vertices });
    }
}

/// First tetrahedron with meaningful volume: the first two points, the first
/// point off their line, and the first point off their plane.
fn find_seed(points: &[[f64; 3]]) -> Option<[usize; 4]> {
    let a = 0;
    let b = 1;
    let ab = sub(points[b], points[a]);
    let ab_norm = norm(ab);

    let mut c = None;
    for (i, &p) in points.iter().enumerate().skip(2) {
        let ap = sub(p, points[a]);
        if norm(cross(ab, ap)) > EPS_ORIENT * ab_norm * norm(ap) {
            c = Some(i);
            break;
        }
    }
    let c = c?;

    for (i, &p) in points.iter().enumerate().skip(2) {
        if i == c {
            continue;
        }
        let o = orient3d(points[a], points[b], points[c], p);
        if o.abs() > EPS_ORIENT * orient_scale(points[a], points[b], points[c], p) {
            return Some([a, b, c, i]);
        }
    }
    None
}
