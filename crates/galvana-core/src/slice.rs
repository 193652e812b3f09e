//! Planar sampling of an interpolated field, for inspection and plotting.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::interp::FieldInterpolant;

/// Axis-aligned plane through the sampled volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlicePlane {
    /// Plane of constant `z`.
    XY { z: f64 },
    /// Plane of constant `y`.
    XZ { y: f64 },
    /// Plane of constant `x`.
    YZ { x: f64 },
}

/// A regular grid of interpolated potentials on a [`SlicePlane`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneMap {
    /// Grid node positions, row-major with the first in-plane axis fastest.
    pub positions: Vec<[f64; 3]>,
    /// Interpolated potential at each node; `None` outside the sampled hull.
    pub values: Vec<Option<f64>>,
    /// Number of nodes along the first in-plane axis.
    pub nu: usize,
    /// Number of nodes along the second in-plane axis.
    pub nv: usize,
    /// In-plane extent: `[u_min, u_max, v_min, v_max]`.
    pub extent: [f64; 4],
}

impl PlaneMap {
    /// Number of nodes that fell inside the sampled domain.
    pub fn inside_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Sample the interpolant on a regular `nu x nv` grid over `plane`.
///
/// Nodes outside the sampled domain yield `None`; no extrapolation is
/// performed here. `nu` and `nv` must both be at least 2.
pub fn sample_plane(
    interpolant: &FieldInterpolant,
    plane: SlicePlane,
    extent: [f64; 4],
    nu: usize,
    nv: usize,
) -> PlaneMap {
    assert!(nu >= 2 && nv >= 2, "plane resolution must be at least 2x2");
    let [u_min, u_max, v_min, v_max] = extent;
    let du = (u_max - u_min) / (nu - 1) as f64;
    let dv = (v_max - v_min) / (nv - 1) as f64;

    let mut positions = Vec::with_capacity(nu * nv);
    let mut values = Vec::with_capacity(nu * nv);
    for j in 0..nv {
        for i in 0..nu {
            let u = u_min + du * i as f64;
            let v = v_min + dv * j as f64;
            let p = match plane {
                SlicePlane::XY { z } => [u, v, z],
                SlicePlane::XZ { y } => [u, y, v],
                SlicePlane::YZ { x } => [x, u, v],
            };
            positions.push(p);
            values.push(interpolant.evaluate(p).ok());
        }
    }

    let map = PlaneMap {
        positions,
        values,
        nu,
        nv,
        extent,
    };
    debug!(
        "plane slice: {}/{} nodes inside the sampled domain",
        map.inside_count(),
        nu * nv
    );
    map
}
