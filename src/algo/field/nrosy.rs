//! Smooth 4-RoSy field design.
//!
//! Each face direction at angle `θ` (measured in the face's local frame) is
//! encoded as `u = e^{4iθ}`, which is invariant under quarter turns. Across an
//! interior edge the encodings of two faces are compared after a change of frame
//! `r = e^{4i(α_g - α_f)}`, where `α` is the angle of the shared edge in each
//! frame. The smoothness energy
//!
//! ```text
//! E = s Σ_edges |r u_f - u_g|² + (1 - s) Σ_soft w_i |u_f - c_i|²
//! ```
//!
//! is a Hermitian quadratic form in the face unknowns. Hard constraints are
//! eliminated, and the remaining system is solved with conjugate gradients.
//! The relaxed solution is then normalized and solved again with a weak pull
//! towards unit length; faces whose value still vanishes take the value of a
//! neighbor. Directions are decoded with the canonical fourth root
//! `θ = arg(u) / 4`.
//!
//! # References
//!
//! - Knöppel, F., Crane, K., Pinkall, U., & Schröder, P. (2013). "Globally
//!   optimal direction fields." ACM SIGGRAPH.

use std::collections::VecDeque;

use nalgebra::{Complex, Vector3};

use super::{DirectionConstraint, FrameField};
use crate::algo::sparse::{HermitianSystem, SolverSettings};
use crate::error::{Error, Result, ValidationError};
use crate::mesh::TriMesh;

/// Symmetry degree of the field.
const N: f64 = 4.0;

/// Encoded values below this magnitude carry no direction.
const MIN_MAGNITUDE: f64 = 1e-12;

/// Relaxed values this much smaller than the largest one count as vanishing.
const VANISHING_RATIO: f64 = 1e-6;

/// Weight of the pull towards the normalized field, relative to smoothness.
const REFINEMENT_PULL: f64 = 0.1;

/// Options for the frame-field solve.
#[derive(Debug, Clone)]
pub struct FrameFieldOptions {
    /// Weight of smoothness against soft constraints, in `(0, 1]`.
    ///
    /// With `1.0` soft constraints are ignored.
    pub smoothness_weight: f64,

    /// Maximum iterations for the conjugate gradient solver.
    pub max_iterations: usize,

    /// Convergence tolerance for the CG solver.
    pub tolerance: f64,

    /// Number of re-solves pulled towards the normalized field.
    pub refinement_iterations: usize,
}

impl Default for FrameFieldOptions {
    fn default() -> Self {
        Self {
            smoothness_weight: 0.5,
            max_iterations: 10_000,
            tolerance: 1e-10,
            refinement_iterations: 2,
        }
    }
}

impl FrameFieldOptions {
    /// Set the smoothness weight.
    pub fn with_smoothness_weight(mut self, weight: f64) -> Self {
        self.smoothness_weight = weight;
        self
    }

    /// Set the maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the number of refinement passes.
    pub fn with_refinement_iterations(mut self, iterations: usize) -> Self {
        self.refinement_iterations = iterations;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.smoothness_weight > 0.0 && self.smoothness_weight <= 1.0) {
            return Err(Error::invalid_param(
                "smoothness_weight",
                self.smoothness_weight,
                "must be in (0, 1]",
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_param("max_iterations", 0, "must be positive"));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::invalid_param("tolerance", self.tolerance, "must be positive"));
        }
        Ok(())
    }
}

/// Compute a smooth 4-symmetric frame field.
///
/// Connected components without any constraint get their lowest face fixed to
/// its first local axis, which yields an arbitrary but smooth field there.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for out-of-range options
/// - [`Error::MeshValidation`] with [`ValidationError::InvalidConstraint`] if a
///   constraint names a missing face or has no tangential component
/// - [`Error::Solver`] / [`Error::ConvergenceFailed`] if the system cannot be solved
/// - [`Error::DegenerateField`] if a face ends up with a vanishing value
pub fn solve_frame_field(
    mesh: &TriMesh,
    constraints: &[DirectionConstraint],
    options: &FrameFieldOptions,
) -> Result<FrameField> {
    options.validate()?;
    let n = mesh.num_faces();

    // Encoded targets; later constraints on the same face win.
    let mut hard: Vec<Option<Complex<f64>>> = vec![None; n];
    let mut soft: Vec<(usize, Complex<f64>, f64)> = Vec::new();
    for c in constraints {
        let u = encode_constraint(mesh, c)?;
        match c.weight {
            None => hard[c.face] = Some(u),
            Some(w) if w.is_finite() && w >= 0.0 => soft.push((c.face, u, w)),
            Some(_) => {
                return Err(ValidationError::InvalidConstraint {
                    face: c.face,
                    reason: "soft weight must be finite and non-negative",
                }
                .into())
            }
        }
    }

    let s = options.smoothness_weight;
    let soft_scale = 1.0 - s;
    let soft_active = soft_scale > 0.0 && soft.iter().any(|&(_, _, w)| w > 0.0);

    // Anchor components the constraints do not reach.
    let (component, count) = mesh.face_components();
    let mut anchored = vec![false; count];
    for (f, h) in hard.iter().enumerate() {
        if h.is_some() {
            anchored[component[f]] = true;
        }
    }
    if soft_active {
        for &(f, _, w) in &soft {
            if w > 0.0 {
                anchored[component[f]] = true;
            }
        }
    }
    for f in 0..n {
        let comp = component[f];
        if !anchored[comp] {
            log::debug!("frame field: component {} has no constraint, fixing face {}", comp, f);
            hard[f] = Some(Complex::new(1.0, 0.0));
            anchored[comp] = true;
        }
    }

    // Unknowns are the faces without a hard value.
    let mut column = vec![usize::MAX; n];
    let mut unknowns = 0;
    for f in 0..n {
        if hard[f].is_none() {
            column[f] = unknowns;
            unknowns += 1;
        }
    }

    let mut encoded: Vec<Complex<f64>> = hard.iter().map(|h| h.unwrap_or_default()).collect();

    if unknowns > 0 {
        let mut system = HermitianSystem::new(unknowns);

        for (f, e) in mesh.edges() {
            if let Some((g, r)) = edge_rotation(mesh, f, e) {
                add_edge_term(&mut system, &column, &hard, f, g, r, s);
            }
        }

        if soft_scale > 0.0 {
            for &(f, c, w) in &soft {
                if column[f] == usize::MAX || w == 0.0 {
                    continue;
                }
                let weight = soft_scale * w;
                system.add(column[f], column[f], Complex::new(weight, 0.0));
                system.add_rhs(column[f], c * weight);
            }
        }

        let settings = SolverSettings {
            stage: "frame field",
            max_iterations: options.max_iterations,
            tolerance: options.tolerance,
        };
        scatter(&mut encoded, &column, &system.solve(&settings)?);

        // The relaxed values may cancel out, e.g. on faces placed
        // symmetrically to the anchors. Each pass re-solves pulled towards
        // the normalized field.
        let pull = Complex::new(REFINEMENT_PULL * s, 0.0);
        for pass in 0..options.refinement_iterations {
            let filled = normalize_field(mesh, &mut encoded);
            if filled > 0 {
                log::debug!("frame field: pass {} filled {} vanishing faces", pass, filled);
            }
            let mut refined = system.clone();
            for (f, &col) in column.iter().enumerate() {
                if col != usize::MAX {
                    refined.add(col, col, pull);
                    refined.add_rhs(col, encoded[f] * pull);
                }
            }
            scatter(&mut encoded, &column, &refined.solve(&settings)?);
        }

        let filled = normalize_field(mesh, &mut encoded);
        if filled > 0 {
            log::debug!("frame field: filled {} vanishing faces", filled);
        }
    }

    decode(mesh, &encoded)
}

/// Neighbor across edge `e` of `f` and the change of frame `r` that makes
/// `r u_f` comparable with `u_g`.
fn edge_rotation(mesh: &TriMesh, f: usize, e: usize) -> Option<(usize, Complex<f64>)> {
    let (g, _) = mesh.neighbor(f, e)?;
    let edge = mesh.edge_vector(f, e);
    let alpha_f = mesh.frame(f).angle_of(&edge);
    let alpha_g = mesh.frame(g).angle_of(&edge);
    Some((g, Complex::from_polar(1.0, N * (alpha_g - alpha_f))))
}

fn scatter(encoded: &mut [Complex<f64>], column: &[usize], solution: &[Complex<f64>]) {
    for (u, &col) in encoded.iter_mut().zip(column) {
        if col != usize::MAX {
            *u = solution[col];
        }
    }
}

/// Scale every value to unit length, filling vanishing faces breadth-first
/// from an already filled neighbor. Returns the number of filled faces.
fn normalize_field(mesh: &TriMesh, encoded: &mut [Complex<f64>]) -> usize {
    let largest = encoded.iter().map(|u| u.norm()).fold(0.0, f64::max);
    let threshold = (largest * VANISHING_RATIO).max(MIN_MAGNITUDE);

    let mut known = vec![false; encoded.len()];
    let mut queue = VecDeque::new();
    for (f, u) in encoded.iter_mut().enumerate() {
        let norm = u.norm();
        if norm > threshold {
            *u = u.unscale(norm);
            known[f] = true;
            queue.push_back(f);
        }
    }

    let mut filled = 0;
    while let Some(g) = queue.pop_front() {
        for e in 0..3 {
            let Some((f, r)) = edge_rotation(mesh, g, e) else {
                continue;
            };
            if known[f] {
                continue;
            }
            // Minimizer of the edge term with u_g held fixed.
            encoded[f] = r * encoded[g];
            known[f] = true;
            filled += 1;
            queue.push_back(f);
        }
    }
    filled
}

/// Add `s |r u_f - u_g|²`, moving known values to the right-hand side.
fn add_edge_term(
    system: &mut HermitianSystem,
    column: &[usize],
    hard: &[Option<Complex<f64>>],
    f: usize,
    g: usize,
    r: Complex<f64>,
    s: f64,
) {
    let w = Complex::new(s, 0.0);
    // Row f: w u_f - w conj(r) u_g; row g: w u_g - w r u_f.
    let entries = [(f, f, w), (g, g, w), (f, g, -w * r.conj()), (g, f, -w * r)];
    for (row, col, value) in entries {
        if column[row] == usize::MAX {
            continue;
        }
        match hard[col] {
            Some(known) if column[col] == usize::MAX => system.add_rhs(column[row], -value * known),
            _ => system.add(column[row], column[col], value),
        }
    }
}

/// Encode a constraint direction as `e^{4iθ}` in its face frame.
fn encode_constraint(mesh: &TriMesh, c: &DirectionConstraint) -> Result<Complex<f64>> {
    if c.face >= mesh.num_faces() {
        return Err(ValidationError::InvalidConstraint {
            face: c.face,
            reason: "face index out of range",
        }
        .into());
    }
    let frame = mesh.frame(c.face);
    let tangent = frame.project(&c.direction);
    let norm = c.direction.norm();
    if !norm.is_finite() || !(tangent.norm() > MIN_MAGNITUDE * norm.max(1.0)) {
        return Err(ValidationError::InvalidConstraint {
            face: c.face,
            reason: "direction has no tangential component",
        }
        .into());
    }
    Ok(Complex::from_polar(1.0, N * frame.angle_of(&tangent)))
}

/// Decode per-face values into an orthonormal pair with the canonical root.
fn decode(mesh: &TriMesh, encoded: &[Complex<f64>]) -> Result<FrameField> {
    let mut x1: Vec<Vector3<f64>> = Vec::with_capacity(encoded.len());
    let mut x2 = Vec::with_capacity(encoded.len());

    for (f, u) in encoded.iter().enumerate() {
        if !(u.norm() > MIN_MAGNITUDE) {
            return Err(Error::DegenerateField { face: f });
        }
        let frame = mesh.frame(f);
        let d = frame.direction(u.arg() / N);
        x2.push(frame.rotate90(&d));
        x1.push(d);
    }

    Ok(FrameField::new(x1, x2))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::fixtures;

    /// Angle between two cross directions, modulo quarter turns.
    fn cross_angle(a: &Vector3<f64>, b: &Vector3<f64>, normal: &Vector3<f64>) -> f64 {
        let theta = normal.cross(a).dot(b).atan2(a.dot(b));
        let r = theta.rem_euclid(FRAC_PI_2);
        r.min(FRAC_PI_2 - r)
    }

    #[test]
    fn test_constrained_flat_field_is_constant() {
        let mesh = fixtures::grid(4);
        let dir = Vector3::new(1.0, 2.0, 0.0).normalize();
        let field = solve_frame_field(
            &mesh,
            &[DirectionConstraint::hard(5, dir)],
            &FrameFieldOptions::default(),
        )
        .unwrap();

        for f in 0..mesh.num_faces() {
            assert!(cross_angle(&field.direction(f), &dir, &Vector3::z()) < 1e-6);
        }
    }

    #[test]
    fn test_frames_are_orthonormal_and_tangent() {
        let mesh = fixtures::icosahedron();
        let field = solve_frame_field(&mesh, &[], &FrameFieldOptions::default()).unwrap();
        assert_eq!(field.len(), 20);
        for f in 0..mesh.num_faces() {
            let n = mesh.frame(f).normal;
            let (a, b) = (field.x1()[f], field.x2()[f]);
            assert!((a.norm() - 1.0).abs() < 1e-12);
            assert!((b.norm() - 1.0).abs() < 1e-12);
            assert!(a.dot(&b).abs() < 1e-12);
            assert!(a.dot(&n).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hard_constraint_is_exact() {
        let mesh = fixtures::icosahedron();
        let dir = mesh.edge_vector(3, 1);
        let field = solve_frame_field(
            &mesh,
            &[DirectionConstraint::hard(3, dir)],
            &FrameFieldOptions::default(),
        )
        .unwrap();
        assert!(cross_angle(&field.direction(3), &dir.normalize(), &mesh.frame(3).normal) < 1e-12);
    }

    #[test]
    fn test_soft_constraints_pull_field() {
        let mesh = fixtures::grid(3);
        let dir = Vector3::new(1.0, 1.0, 0.0);
        let constraints: Vec<_> = (0..mesh.num_faces())
            .map(|f| DirectionConstraint::soft(f, dir, 1.0))
            .collect();
        let field = solve_frame_field(&mesh, &constraints, &FrameFieldOptions::default()).unwrap();
        for f in 0..mesh.num_faces() {
            assert!(cross_angle(&field.direction(f), &dir.normalize(), &Vector3::z()) < 1e-6);
        }
    }

    #[test]
    fn test_symmetric_sphere_has_no_vanishing_faces() {
        let mesh = fixtures::icosahedron();
        let anchored = [DirectionConstraint::hard(0, mesh.edge_vector(0, 0))];
        for constraints in [&[][..], &anchored[..]] {
            for weight in [0.1, 0.5, 1.0] {
                for passes in [0, 2] {
                    let options = FrameFieldOptions::default()
                        .with_smoothness_weight(weight)
                        .with_refinement_iterations(passes);
                    let field = solve_frame_field(&mesh, constraints, &options).unwrap();
                    for f in 0..mesh.num_faces() {
                        let x1 = field.x1()[f];
                        assert!((x1.norm() - 1.0).abs() < 1e-12, "face {} weight {}", f, weight);
                        assert!(x1.dot(&mesh.frame(f).normal).abs() < 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_vanishing_faces_take_neighbor_value() {
        let mesh = fixtures::grid(2);
        let mut encoded = vec![Complex::new(2.0, 0.0); mesh.num_faces()];
        encoded[3] = Complex::new(1e-15, 0.0);

        assert_eq!(normalize_field(&mesh, &mut encoded), 1);
        assert!(encoded.iter().all(|u| (u.norm() - 1.0).abs() < 1e-12));
        // The filled value agrees exactly with one neighbor.
        let agrees = (0..3)
            .filter_map(|e| edge_rotation(&mesh, 3, e))
            .any(|(g, r)| (r * encoded[3] - encoded[g]).norm() < 1e-12);
        assert!(agrees);
    }

    #[test]
    fn test_invalid_constraints() {
        let mesh = fixtures::square();
        let options = FrameFieldOptions::default();

        let err = solve_frame_field(&mesh, &[DirectionConstraint::hard(9, Vector3::x())], &options)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MeshValidation(ValidationError::InvalidConstraint { face: 9, .. })
        ));

        // Parallel to the normal.
        let err = solve_frame_field(&mesh, &[DirectionConstraint::hard(0, Vector3::z())], &options)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MeshValidation(ValidationError::InvalidConstraint { face: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_options() {
        let mesh = fixtures::square();
        let options = FrameFieldOptions::default().with_smoothness_weight(0.0);
        assert!(matches!(
            solve_frame_field(&mesh, &[], &options),
            Err(Error::InvalidParameter { name: "smoothness_weight", .. })
        ));
    }
}
