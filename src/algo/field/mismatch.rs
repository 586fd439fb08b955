//! Integer mismatch of a combed field across edges.

use std::f64::consts::{FRAC_PI_2, PI};

use rayon::prelude::*;

use super::{transport, CombedField};
use crate::mesh::TriMesh;

/// Per directed edge: quarter turns aligning the neighbor's combed field.
///
/// For edge `e` of face `f` with neighbor `g`, the value `k` satisfies
/// `bis1[f] ≈ rot90^k(T(bis1[g]))`, where `T` transports across the edge. The
/// leftover angle after removing `k` quarter turns is kept as the residual, in
/// `[-π/4, π/4]`. Boundary edges have no mismatch.
#[derive(Debug, Clone)]
pub struct MismatchField {
    pub(crate) values: Vec<[Option<u8>; 3]>,
    pub(crate) residuals: Vec<[f64; 3]>,
}

impl MismatchField {
    /// Mismatch of edge `e` of face `f`, `None` on the boundary.
    #[inline]
    pub fn get(&self, f: usize, e: usize) -> Option<u8> {
        self.values[f][e]
    }

    /// Residual angle of edge `e` of face `f` (zero on the boundary).
    #[inline]
    pub fn residual(&self, f: usize, e: usize) -> f64 {
        self.residuals[f][e]
    }

    /// All per-face mismatch triples.
    #[inline]
    pub fn values(&self) -> &[[Option<u8>; 3]] {
        &self.values
    }

    /// Number of undirected edges with a nonzero mismatch.
    pub fn nonzero_count(&self, mesh: &TriMesh) -> usize {
        mesh.edges()
            .filter(|&(f, e)| matches!(self.values[f][e], Some(k) if k != 0))
            .count()
    }
}

/// Compute the mismatch of every interior edge.
pub fn compute_mismatch(mesh: &TriMesh, combed: &CombedField, parallel: bool) -> MismatchField {
    let n = mesh.num_faces();

    let per_face = |f: usize| {
        let mut values = [None; 3];
        let mut residuals = [0.0; 3];
        for e in 0..3 {
            if let Some((k, eps)) = edge_mismatch(mesh, combed, f, e) {
                values[e] = Some(k);
                residuals[e] = eps;
            }
        }
        (values, residuals)
    };

    let rows: Vec<([Option<u8>; 3], [f64; 3])> = if parallel {
        (0..n).into_par_iter().map(per_face).collect()
    } else {
        (0..n).map(per_face).collect()
    };
    let (values, residuals) = rows.into_iter().unzip();

    MismatchField { values, residuals }
}

fn edge_mismatch(mesh: &TriMesh, combed: &CombedField, f: usize, e: usize) -> Option<(u8, f64)> {
    let (g, ge) = mesh.neighbor(f, e)?;
    let frame = mesh.frame(f);
    let incoming = transport(mesh, g, ge, &combed.bis1[g]);

    let mut delta = frame.angle_of(&combed.bis1[f]) - frame.angle_of(&incoming);
    if delta > PI {
        delta -= 2.0 * PI;
    } else if delta <= -PI {
        delta += 2.0 * PI;
    }

    Some(split_quarter_turns(delta))
}

/// Angles this close to an odd multiple of π/4 count as ties.
const TIE_TOLERANCE: f64 = 1e-9;

/// Split an angle in `(-π, π]` into quarter turns modulo 4 and a residual in
/// `[-π/4, π/4]`.
///
/// Ties round towards zero so that both sides of an edge agree, and so that a
/// tree edge combed at exactly 45 degrees keeps a zero mismatch.
fn split_quarter_turns(delta: f64) -> (u8, f64) {
    let q = delta / FRAC_PI_2;
    let turns = if (q.abs().fract() - 0.5).abs() < TIE_TOLERANCE {
        q.trunc()
    } else {
        q.round()
    };
    let k = (turns as i64).rem_euclid(4) as u8;
    (k, delta - turns * FRAC_PI_2)
}
