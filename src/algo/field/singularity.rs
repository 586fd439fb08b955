//! Singularity detection from edge mismatches.
//!
//! Walking counter-clockwise around an interior vertex, the combed field turns
//! by the quarter turns recorded in the mismatch plus the small residual angles,
//! while parallel transport turns by the angle defect. The index of the vertex
//! (in quarter turns) is
//!
//! ```text
//! index = (2/π) (K_v + Σ ε_i)
//! ```
//!
//! which is an integer congruent to `-Σ k_i (mod 4)`. Residuals cancel pairwise
//! over the whole surface, so the indices of a closed surface sum to `4χ`.

use std::f64::consts::FRAC_PI_2;

use super::MismatchField;
use crate::mesh::TriMesh;

/// Signed singularity index per vertex, in quarter turns.
///
/// Zero means regular. Boundary vertices are always regular.
#[derive(Debug, Clone)]
pub struct SingularityField {
    pub(crate) index: Vec<i32>,
    /// Sum of the fan mismatches modulo 4.
    pub(crate) turns: Vec<u8>,
}

impl SingularityField {
    /// Index of a vertex.
    #[inline]
    pub fn index(&self, v: usize) -> i32 {
        self.index[v]
    }

    /// All indices.
    #[inline]
    pub fn indices(&self) -> &[i32] {
        &self.index
    }

    /// Whether a vertex is singular.
    #[inline]
    pub fn is_singular(&self, v: usize) -> bool {
        self.index[v] != 0
    }

    /// Quarter turns the field picks up around a vertex, modulo 4.
    #[inline]
    pub fn fan_turns(&self, v: usize) -> u8 {
        self.turns[v]
    }

    /// Singular vertices in increasing order.
    pub fn singular_vertices(&self) -> Vec<usize> {
        (0..self.index.len()).filter(|&v| self.is_singular(v)).collect()
    }

    /// Number of singular vertices.
    pub fn count(&self) -> usize {
        self.index.iter().filter(|&&i| i != 0).count()
    }

    /// Sum of all indices.
    pub fn total_index(&self) -> i64 {
        self.index.iter().map(|&i| i as i64).sum()
    }
}

/// Compute the singularity index of every vertex.
pub fn detect_singularities(mesh: &TriMesh, mismatch: &MismatchField) -> SingularityField {
    let n = mesh.num_vertices();
    let mut index = vec![0i32; n];
    let mut turns = vec![0u8; n];

    for v in 0..n {
        if mesh.is_boundary_vertex(v) {
            continue;
        }

        let fan = mesh.fan(v);
        let mut k_sum: i64 = 0;
        let mut residual = 0.0;
        // Crossing from fan[i] into fan[i + 1] uses the outgoing edge of the
        // later corner, which is shared with the earlier face.
        for i in 0..fan.len() {
            let next = fan[(i + 1) % fan.len()];
            k_sum += mismatch.get(next.face, next.corner).map_or(0, i64::from);
            residual += mismatch.residual(next.face, next.corner);
        }

        let raw = (mesh.angle_defect(v) + residual) / FRAC_PI_2;
        let wraps = ((raw + k_sum as f64) / 4.0).round() as i64;
        index[v] = (4 * wraps - k_sum) as i32;
        turns[v] = k_sum.rem_euclid(4) as u8;
    }

    SingularityField { index, turns }
}
