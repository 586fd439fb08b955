//! Combing: a consistent choice of cross representative across the mesh.
//!
//! The dual graph is walked breadth-first from the lowest unvisited face of every
//! component. Each newly reached face takes the quarter-turn of its bisector that
//! lies closest to the parent's direction transported across the shared edge.
//! The edges of this breadth-first tree therefore carry no rotation; all the
//! field's holonomy is pushed onto the remaining edges.

use std::collections::VecDeque;

use nalgebra::Vector3;
use rayon::prelude::*;

use super::{quarter_turns, transport, BisectorField, FrameField};
use crate::error::{Error, Result};
use crate::mesh::TriMesh;

/// Combed bisector field.
///
/// Along every edge of the combing tree the two faces' `bis1` agree up to
/// parallel transport.
#[derive(Debug, Clone)]
pub struct CombedField {
    pub(crate) bis1: Vec<Vector3<f64>>,
    pub(crate) bis2: Vec<Vector3<f64>>,
    /// Quarter turns applied to each face's canonical bisector.
    pub(crate) rotation: Vec<u8>,
    /// Whether each face edge belongs to the combing tree.
    pub(crate) tree: Vec<[bool; 3]>,
}

impl CombedField {
    /// First combed direction of every face.
    #[inline]
    pub fn bis1(&self) -> &[Vector3<f64>] {
        &self.bis1
    }

    /// Second combed direction of every face.
    #[inline]
    pub fn bis2(&self) -> &[Vector3<f64>] {
        &self.bis2
    }

    /// Quarter turns applied to the canonical bisector of a face.
    #[inline]
    pub fn rotation(&self, f: usize) -> u8 {
        self.rotation[f]
    }

    /// Whether edge `e` of face `f` is an edge of the combing tree.
    #[inline]
    pub fn is_tree_edge(&self, f: usize, e: usize) -> bool {
        self.tree[f][e]
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

/// Comb a bisector field over the dual graph.
pub fn comb_bisectors(mesh: &TriMesh, bisectors: &BisectorField) -> CombedField {
    let n = mesh.num_faces();
    let mut bis1 = bisectors.bis1.clone();
    let mut rotation = vec![0u8; n];
    let mut tree = vec![[false; 3]; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(f) = queue.pop_front() {
            for e in 0..3 {
                let Some((g, ge)) = mesh.neighbor(f, e) else {
                    continue;
                };
                if visited[g] {
                    continue;
                }
                visited[g] = true;

                let reference = transport(mesh, f, e, &bis1[f]);
                let k = closest_quarter_turn(&mesh.frame(g).normal, &bisectors.bis1[g], &reference);
                bis1[g] = quarter_turns(&mesh.frame(g).normal, &bisectors.bis1[g], k);
                rotation[g] = k;
                tree[f][e] = true;
                tree[g][ge] = true;
                queue.push_back(g);
            }
        }
    }

    let bis2 = bis1
        .iter()
        .zip(mesh.frames())
        .map(|(b, frame)| frame.rotate90(b))
        .collect();

    CombedField {
        bis1,
        bis2,
        rotation,
        tree,
    }
}

/// Quarter turn of `v` that best matches `reference`; ties go to the smaller turn.
pub(crate) fn closest_quarter_turn(normal: &Vector3<f64>, v: &Vector3<f64>, reference: &Vector3<f64>) -> u8 {
    let mut best = 0u8;
    let mut best_dot = f64::NEG_INFINITY;
    for k in 0..4u8 {
        let dot = quarter_turns(normal, v, k).dot(reference);
        if dot > best_dot {
            best_dot = dot;
            best = k;
        }
    }
    best
}

/// Re-express a frame field with the branch picked by the combed bisectors.
///
/// For every face the cyclic representative `(x1, x2)` whose bisector
/// `normalize(x1 + x2)` is closest to the combed `bis1` is selected, so that
/// the returned frame field is combed along the same tree.
pub fn comb_frame_field(
    mesh: &TriMesh,
    field: &FrameField,
    combed: &CombedField,
    parallel: bool,
) -> Result<FrameField> {
    let n = mesh.num_faces();
    if field.len() != n || combed.len() != n {
        return Err(Error::invalid_param("field", field.len(), "must have one entry per face"));
    }

    let pick = |f: usize| {
        let normal = mesh.frame(f).normal;
        let bisector = field.x1[f] + field.x2[f];
        let k = closest_quarter_turn(&normal, &bisector, &combed.bis1[f]);
        let x1 = quarter_turns(&normal, &field.x1[f], k);
        (x1, normal.cross(&x1))
    };

    let pairs: Vec<(Vector3<f64>, Vector3<f64>)> = if parallel {
        (0..n).into_par_iter().map(pick).collect()
    } else {
        (0..n).map(pick).collect()
    };
    let (x1, x2) = pairs.into_iter().unzip();

    Ok(FrameField::new(x1, x2))
}
