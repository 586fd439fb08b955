//! UV coordinates of a cut mesh.
//!
//! A [`ParametrizedMesh`] shares its face ordering with the input mesh but has
//! its own vertex set: a vertex of the input appears once per side of every seam
//! it touches. Face `f` of the UV mesh uses the UV vertices `fuv[f]` at the same
//! corner positions as `faces[f]`.

use nalgebra::{Point2, Vector2};

use crate::error::{Error, Result};
use crate::mesh::{FaceId, UvVertexId};

/// Integer transition across one seam edge.
///
/// For the seam edge `edge` of `face`, UV coordinates on this side relate to the
/// neighbor's by `w = i^{-rotation} w' + translation` (complex notation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeamTranslation {
    /// Face on the canonical side (the smaller face index).
    pub face: usize,
    /// Edge of `face` on the seam.
    pub edge: usize,
    /// Quarter turns between the two sides.
    pub rotation: u8,
    /// Translation in lattice units.
    pub translation: Vector2<f64>,
}

impl SeamTranslation {
    /// Whether the translation lies on the integer lattice.
    pub fn is_integer(&self, tolerance: f64) -> bool {
        (self.translation.x - self.translation.x.round()).abs() <= tolerance
            && (self.translation.y - self.translation.y.round()).abs() <= tolerance
    }
}

/// Per-corner UV parametrization with its UV triangle table.
///
/// Coordinates are stored in lattice units: one unit equals the target edge
/// length. [`uv_scaled`](Self::uv_scaled) returns world-scaled coordinates.
#[derive(Debug, Clone)]
pub struct ParametrizedMesh {
    pub(crate) uv: Vec<Point2<f64>>,
    pub(crate) fuv: Vec<[usize; 3]>,
    pub(crate) target_edge_length: f64,
    pub(crate) seam_translations: Vec<SeamTranslation>,
    pub(crate) unrounded: usize,
}

impl ParametrizedMesh {
    /// Create a parametrization from UV coordinates and a UV face table.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if a face references a missing UV vertex.
    pub fn new(uv: Vec<Point2<f64>>, fuv: Vec<[usize; 3]>, target_edge_length: f64) -> Result<Self> {
        for face in &fuv {
            for &u in face {
                if u >= uv.len() {
                    return Err(Error::IndexOutOfRange {
                        kind: "uv vertex",
                        index: u,
                        len: uv.len(),
                    });
                }
            }
        }
        Ok(Self {
            uv,
            fuv,
            target_edge_length,
            seam_translations: Vec::new(),
            unrounded: 0,
        })
    }

    /// UV coordinates in lattice units, indexed by UV vertex.
    #[inline]
    pub fn uv(&self) -> &[Point2<f64>] {
        &self.uv
    }

    /// UV triangle table, parallel to the input faces.
    #[inline]
    pub fn fuv(&self) -> &[[usize; 3]] {
        &self.fuv
    }

    /// Number of UV vertices.
    #[inline]
    pub fn num_uv_vertices(&self) -> usize {
        self.uv.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.fuv.len()
    }

    /// UV vertex used by a face corner.
    #[inline]
    pub fn corner_vertex(&self, f: FaceId, corner: usize) -> UvVertexId {
        UvVertexId::new(self.fuv[f.index()][corner])
    }

    /// UV coordinate of a face corner.
    #[inline]
    pub fn corner_uv(&self, f: usize, corner: usize) -> Point2<f64> {
        self.uv[self.fuv[f][corner]]
    }

    /// Lattice spacing in world units.
    #[inline]
    pub fn target_edge_length(&self) -> f64 {
        self.target_edge_length
    }

    /// UV coordinates scaled back to world units.
    pub fn uv_scaled(&self) -> Vec<Point2<f64>> {
        let h = self.target_edge_length;
        self.uv.iter().map(|p| Point2::from(p.coords * h)).collect()
    }

    /// Integer transitions across the seam edges.
    #[inline]
    pub fn seam_translations(&self) -> &[SeamTranslation] {
        &self.seam_translations
    }

    /// Number of integer unknowns that were left continuous.
    #[inline]
    pub fn unrounded(&self) -> usize {
        self.unrounded
    }

    /// Whether every integer unknown was rounded.
    #[inline]
    pub fn is_fully_rounded(&self) -> bool {
        self.unrounded == 0
    }

    /// Signed area of a face in UV space (positive when orientation is kept).
    pub fn signed_area(&self, f: usize) -> f64 {
        let [a, b, c] = self.fuv[f];
        let (p0, p1, p2) = (self.uv[a], self.uv[b], self.uv[c]);
        0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y))
    }

    /// Signed UV area of every face.
    pub fn signed_areas(&self) -> Vec<f64> {
        (0..self.fuv.len()).map(|f| self.signed_area(f)).collect()
    }

    /// Faces whose UV triangle has zero or negative area.
    pub fn folded_faces(&self) -> Vec<usize> {
        (0..self.fuv.len())
            .filter(|&f| self.signed_area(f) <= 0.0)
            .collect()
    }

    /// Bounding box of the UV coordinates, `None` if there are none.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.uv.first()?;
        Some(self.uv.iter().fold((first, first), |(min, max), p| {
            (
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ParametrizedMesh {
        let uv = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        ParametrizedMesh::new(uv, vec![[0, 1, 2], [0, 2, 3]], 0.5).unwrap()
    }

    #[test]
    fn test_signed_area_and_folds() {
        let mut p = square();
        assert!((p.signed_area(0) - 2.0).abs() < 1e-12);
        assert!(p.folded_faces().is_empty());

        p.fuv[1] = [0, 3, 2];
        assert_eq!(p.folded_faces(), vec![1]);
        assert!((p.signed_areas()[1] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_and_scaling() {
        let p = square();
        let (min, max) = p.bounding_box().unwrap();
        assert_eq!(min, Point2::new(0.0, 0.0));
        assert_eq!(max, Point2::new(2.0, 2.0));
        assert_eq!(p.uv_scaled()[2], Point2::new(1.0, 1.0));
        assert_eq!(p.corner_vertex(FaceId::new(1), 2), UvVertexId::new(3));
        assert_eq!(p.corner_uv(1, 2), Point2::new(0.0, 2.0));
    }

    #[test]
    fn test_rejects_bad_uv_index() {
        let err = ParametrizedMesh::new(vec![Point2::origin()], vec![[0, 0, 4]], 1.0).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 4, len: 1, .. }));
    }

    #[test]
    fn test_integer_translation() {
        let t = SeamTranslation {
            face: 0,
            edge: 1,
            rotation: 1,
            translation: Vector2::new(2.0, -1.0 + 1e-12),
        };
        assert!(t.is_integer(1e-9));
        let t = SeamTranslation {
            translation: Vector2::new(0.5, 0.0),
            ..t
        };
        assert!(!t.is_integer(1e-9));
    }
}
