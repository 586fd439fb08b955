//! Cross fields on triangle meshes.
//!
//! A cross field assigns each face a direction that is only defined up to
//! rotations by 90 degrees. The stages in this module turn such a field into the
//! discrete data the parametrization needs:
//!
//! 1. [`solve_frame_field`] designs a smooth field from direction constraints
//! 2. [`compute_bisectors`] picks a canonical orthogonal pair per face
//! 3. [`comb_bisectors`] makes the choice of representative consistent across
//!    a spanning tree of the dual graph
//! 4. [`compute_mismatch`] measures the remaining quarter-turn jumps per edge
//! 5. [`detect_singularities`] sums those jumps around every vertex
//!
//! [`comb_frame_field`] finally carries the combing back to the frame field.
//!
//! # Example
//!
//! ```
//! use crossfield::algo::field::*;
//! use crossfield::mesh::primitives;
//! use nalgebra::Vector3;
//!
//! let mesh = primitives::grid(3).unwrap();
//! let constraints = [DirectionConstraint::hard(0, Vector3::x())];
//!
//! let field = solve_frame_field(&mesh, &constraints, &FrameFieldOptions::default()).unwrap();
//! let bisectors = compute_bisectors(&mesh, &field, true).unwrap();
//! let combed = comb_bisectors(&mesh, &bisectors);
//! let mismatch = compute_mismatch(&mesh, &combed, true);
//! let singularities = detect_singularities(&mesh, &mismatch);
//! assert_eq!(singularities.count(), 0);
//! ```

mod bisector;
mod comb;
mod mismatch;
mod nrosy;
mod singularity;

pub use bisector::{compute_bisectors, BisectorField};
pub use comb::{comb_bisectors, comb_frame_field, CombedField};
pub use mismatch::{compute_mismatch, MismatchField};
pub use nrosy::{solve_frame_field, FrameFieldOptions};
pub use singularity::{detect_singularities, SingularityField};

use nalgebra::Vector3;

use crate::mesh::TriMesh;

/// A direction prescribed on one face.
///
/// Hard constraints are interpolated exactly. Soft constraints are pulled
/// towards with the given weight, traded off against smoothness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionConstraint {
    /// Constrained face.
    pub face: usize,
    /// Desired direction. Only its tangential part is used.
    pub direction: Vector3<f64>,
    /// `None` for a hard constraint, otherwise the soft weight.
    pub weight: Option<f64>,
}

impl DirectionConstraint {
    /// A hard constraint.
    pub fn hard(face: usize, direction: Vector3<f64>) -> Self {
        Self {
            face,
            direction,
            weight: None,
        }
    }

    /// A soft constraint with the given weight.
    pub fn soft(face: usize, direction: Vector3<f64>, weight: f64) -> Self {
        Self {
            face,
            direction,
            weight: Some(weight),
        }
    }

    /// Whether the constraint must be met exactly.
    #[inline]
    pub fn is_hard(&self) -> bool {
        self.weight.is_none()
    }
}

/// A smooth 4-symmetric direction field as an orthonormal pair per face.
///
/// `x2` is always `x1` rotated by 90 degrees about the face normal, so the pair
/// `(x1, x2)` stands for the whole class `{±x1, ±x2}`.
#[derive(Debug, Clone)]
pub struct FrameField {
    pub(crate) x1: Vec<Vector3<f64>>,
    pub(crate) x2: Vec<Vector3<f64>>,
}

impl FrameField {
    /// Build a frame field from its two directions per face.
    pub fn new(x1: Vec<Vector3<f64>>, x2: Vec<Vector3<f64>>) -> Self {
        debug_assert_eq!(x1.len(), x2.len());
        Self { x1, x2 }
    }

    /// Representative direction of a face.
    #[inline]
    pub fn direction(&self, f: usize) -> Vector3<f64> {
        self.x1[f]
    }

    /// First direction of every face.
    #[inline]
    pub fn x1(&self) -> &[Vector3<f64>] {
        &self.x1
    }

    /// Second direction of every face.
    #[inline]
    pub fn x2(&self) -> &[Vector3<f64>] {
        &self.x2
    }

    /// Number of faces.
    #[inline]
    pub fn len(&self) -> usize {
        self.x1.len()
    }

    /// Whether the field is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1.is_empty()
    }
}

/// Rotate one tangent vector per face by `angle` about the face normal.
pub fn rotate_vectors(mesh: &TriMesh, vectors: &[Vector3<f64>], angle: f64) -> Vec<Vector3<f64>> {
    let (s, c) = angle.sin_cos();
    vectors
        .iter()
        .zip(mesh.frames())
        .map(|(v, frame)| v * c + frame.rotate90(v) * s)
        .collect()
}

/// Parallel transport of a tangent vector of face `f` across its edge `e`.
///
/// The component along the shared edge is kept; the in-plane perpendicular
/// component is hinged onto the neighbor. Boundary edges return `d` unchanged.
pub(crate) fn transport(mesh: &TriMesh, f: usize, e: usize, d: &Vector3<f64>) -> Vector3<f64> {
    let Some((g, _)) = mesh.neighbor(f, e) else {
        return *d;
    };
    let edge = mesh.edge_vector(f, e).normalize();
    let perp_f = mesh.frame(f).normal.cross(&edge);
    let perp_g = mesh.frame(g).normal.cross(&edge);
    edge * d.dot(&edge) + perp_g * d.dot(&perp_f)
}

/// `v` rotated by `k` quarter turns about `normal`.
#[inline]
pub(crate) fn quarter_turns(normal: &Vector3<f64>, v: &Vector3<f64>, k: u8) -> Vector3<f64> {
    match k % 4 {
        0 => *v,
        1 => normal.cross(v),
        2 => -v,
        _ => -normal.cross(v),
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::fixtures;

    #[test]
    fn test_transport_on_flat_mesh_is_identity() {
        let mesh = fixtures::grid(2);
        let d = Vector3::new(0.6, 0.8, 0.0);
        for f in 0..mesh.num_faces() {
            for e in 0..3 {
                assert!((transport(&mesh, f, e, &d) - d).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_transport_stays_tangent() {
        let mesh = fixtures::icosahedron();
        for f in 0..mesh.num_faces() {
            let d = mesh.frame(f).direction(0.3);
            for e in 0..3 {
                let (g, ge) = mesh.neighbor(f, e).unwrap();
                let t = transport(&mesh, f, e, &d);
                assert!(t.dot(&mesh.frame(g).normal).abs() < 1e-12);
                assert!((t.norm() - 1.0).abs() < 1e-12);
                // Transporting back recovers the vector.
                assert!((transport(&mesh, g, ge, &t) - d).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_rotate_vectors() {
        let mesh = fixtures::square();
        let x = vec![Vector3::x(), Vector3::x()];
        let rotated = rotate_vectors(&mesh, &x, FRAC_PI_2);
        for v in &rotated {
            assert!((v - Vector3::y()).norm() < 1e-12);
        }
        let n = Vector3::z();
        assert!((quarter_turns(&n, &Vector3::x(), 3) + Vector3::y()).norm() < 1e-12);
    }
}
