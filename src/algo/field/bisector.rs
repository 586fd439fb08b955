//! Canonical bisectors of a frame field.

use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector3;
use rayon::prelude::*;

use super::FrameField;
use crate::error::{Error, Result};
use crate::mesh::TriMesh;

/// Two orthogonal unit directions per face, halfway between the frame axes.
///
/// `bis1` is the representative whose angle from the face's first local axis
/// lies in `[0, π/2)`, and `bis2 = normal × bis1`. The choice depends only on the
/// face itself, never on its neighbors.
#[derive(Debug, Clone)]
pub struct BisectorField {
    pub(crate) bis1: Vec<Vector3<f64>>,
    pub(crate) bis2: Vec<Vector3<f64>>,
}

impl BisectorField {
    /// First bisector of every face.
    #[inline]
    pub fn bis1(&self) -> &[Vector3<f64>] {
        &self.bis1
    }

    /// Second bisector of every face.
    #[inline]
    pub fn bis2(&self) -> &[Vector3<f64>] {
        &self.bis2
    }

    /// Number of faces.
    #[inline]
    pub fn len(&self) -> usize {
        self.bis1.len()
    }

    /// Whether the field is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bis1.is_empty()
    }
}

/// Derive the bisector field of a frame field.
///
/// # Errors
/// Returns [`Error::DegenerateField`] for the first face whose frame vectors
/// cancel out.
pub fn compute_bisectors(mesh: &TriMesh, field: &FrameField, parallel: bool) -> Result<BisectorField> {
    let n = mesh.num_faces();
    if field.len() != n {
        return Err(Error::invalid_param("field", field.len(), "must have one entry per face"));
    }

    let pairs: Vec<Result<(Vector3<f64>, Vector3<f64>)>> = if parallel {
        (0..n).into_par_iter().map(|f| face_bisectors(mesh, field, f)).collect()
    } else {
        (0..n).map(|f| face_bisectors(mesh, field, f)).collect()
    };

    let mut bis1 = Vec::with_capacity(n);
    let mut bis2 = Vec::with_capacity(n);
    for pair in pairs {
        let (a, b) = pair?;
        bis1.push(a);
        bis2.push(b);
    }

    Ok(BisectorField { bis1, bis2 })
}

fn face_bisectors(mesh: &TriMesh, field: &FrameField, f: usize) -> Result<(Vector3<f64>, Vector3<f64>)> {
    let frame = mesh.frame(f);
    let sum = frame.project(&(field.x1[f] + field.x2[f]));
    let norm = sum.norm();
    if !(norm > 1e-12) {
        return Err(Error::DegenerateField { face: f });
    }

    let angle = frame.angle_of(&sum).rem_euclid(FRAC_PI_2);
    // rem_euclid can round up to the period itself.
    let angle = if angle >= FRAC_PI_2 { 0.0 } else { angle };
    let b1 = frame.direction(angle);
    Ok((b1, frame.rotate90(&b1)))
}
