//! Immutable triangle mesh with cached adjacency and per-face geometry.
//!
//! The mesh keeps the face-vertex table exactly as supplied and derives
//! everything the field and parametrization stages need:
//!
//! - face-face adjacency across each of the three edges, together with the index
//!   of the shared edge inside the neighbor (`TT`/`TTi` in libigl terms)
//! - a counter-clockwise ordered face fan per vertex
//! - per-face area and orthonormal local frame
//!
//! Edge `e` of a face runs from corner `e` to corner `(e + 1) % 3`.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};

use super::index::{Corner, FaceId, VertexId};

/// Orthonormal tangent frame of a face.
///
/// `b1` points along the face's first edge, `normal` follows the face winding and
/// `b2 = normal × b1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// First tangent axis.
    pub b1: Vector3<f64>,
    /// Second tangent axis.
    pub b2: Vector3<f64>,
    /// Unit face normal.
    pub normal: Vector3<f64>,
}

impl LocalFrame {
    /// Angle of a tangent vector measured from `b1` towards `b2`.
    #[inline]
    pub fn angle_of(&self, v: &Vector3<f64>) -> f64 {
        v.dot(&self.b2).atan2(v.dot(&self.b1))
    }

    /// Unit tangent vector at the given angle from `b1`.
    #[inline]
    pub fn direction(&self, angle: f64) -> Vector3<f64> {
        self.b1 * angle.cos() + self.b2 * angle.sin()
    }

    /// Rotate a tangent vector by 90 degrees counter-clockwise about the normal.
    #[inline]
    pub fn rotate90(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.normal.cross(v)
    }

    /// Remove the normal component of a vector.
    #[inline]
    pub fn project(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v - self.normal * v.dot(&self.normal)
    }
}

/// A validated, consistently oriented 2-manifold triangle mesh.
///
/// Construct with [`TriMesh::new`] or [`build_from_triangles`](super::build_from_triangles).
#[derive(Debug, Clone)]
pub struct TriMesh {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) faces: Vec<[usize; 3]>,
    /// Neighbor face and its edge index across each edge, `None` on the boundary.
    pub(crate) adjacency: Vec<[Option<(usize, usize)>; 3]>,
    pub(crate) areas: Vec<f64>,
    pub(crate) frames: Vec<LocalFrame>,
    /// Counter-clockwise fan of corners around each vertex. Boundary fans start at
    /// the face whose outgoing edge lies on the boundary.
    pub(crate) fans: Vec<Vec<Corner>>,
    pub(crate) boundary_vertices: Vec<bool>,
}

impl TriMesh {
    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edges().count()
    }

    /// All vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// The face-vertex table.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Vertex indices of a face.
    #[inline]
    pub fn face(&self, f: FaceId) -> [usize; 3] {
        self.faces[f.index()]
    }

    /// Vertex at a corner.
    #[inline]
    pub fn corner_vertex(&self, c: Corner) -> usize {
        self.faces[c.face][c.corner]
    }

    /// Neighbor across edge `e` of face `f` as `(face, edge in that face)`.
    #[inline]
    pub fn neighbor(&self, f: usize, e: usize) -> Option<(usize, usize)> {
        self.adjacency[f][e]
    }

    /// Whether edge `e` of face `f` lies on the mesh boundary.
    #[inline]
    pub fn is_boundary_edge(&self, f: usize, e: usize) -> bool {
        self.adjacency[f][e].is_none()
    }

    /// Area of a face.
    #[inline]
    pub fn area(&self, f: usize) -> f64 {
        self.areas[f]
    }

    /// Local tangent frame of a face.
    #[inline]
    pub fn frame(&self, f: usize) -> &LocalFrame {
        &self.frames[f]
    }

    /// All local frames, indexed by face.
    #[inline]
    pub fn frames(&self) -> &[LocalFrame] {
        &self.frames
    }

    /// Counter-clockwise fan of corners incident to a vertex.
    #[inline]
    pub fn fan(&self, v: usize) -> &[Corner] {
        &self.fans[v]
    }

    /// Whether a vertex lies on the boundary.
    #[inline]
    pub fn is_boundary_vertex(&self, v: usize) -> bool {
        self.boundary_vertices[v]
    }

    /// Whether the mesh has any boundary.
    pub fn has_boundary(&self) -> bool {
        self.boundary_vertices.iter().any(|&b| b)
    }

    // ==================== Iteration ====================

    /// Iterate over undirected edges, each reported once as `(face, edge)`.
    ///
    /// Interior edges are reported from the face with the smaller index.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.faces.len()).flat_map(move |f| {
            (0..3).filter_map(move |e| match self.adjacency[f][e] {
                Some((g, _)) if g < f => None,
                _ => Some((f, e)),
            })
        })
    }

    /// Iterate over face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.positions.len()).map(VertexId::new)
    }

    // ==================== Geometry ====================

    /// Positions of the three corners of a face.
    pub fn face_positions(&self, f: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[f];
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    /// Vector along edge `e` of face `f`.
    pub fn edge_vector(&self, f: usize, e: usize) -> Vector3<f64> {
        let face = self.faces[f];
        self.positions[face[(e + 1) % 3]] - self.positions[face[e]]
    }

    /// Barycenter of a face.
    pub fn barycenter(&self, f: usize) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Average length over all undirected edges.
    pub fn average_edge_length(&self) -> f64 {
        let (sum, count) = self
            .edges()
            .fold((0.0, 0usize), |(s, n), (f, e)| (s + self.edge_vector(f, e).norm(), n + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Interior angle at a corner.
    pub fn corner_angle(&self, c: Corner) -> f64 {
        let p = self.positions[self.corner_vertex(c)];
        let a = self.positions[self.corner_vertex(c.next())] - p;
        let b = self.positions[self.corner_vertex(c.prev())] - p;
        a.cross(&b).norm().atan2(a.dot(&b))
    }

    /// Angle defect (discrete Gaussian curvature) at an interior vertex.
    ///
    /// Boundary vertices report the geodesic curvature defect `π - Σ angles`.
    pub fn angle_defect(&self, v: usize) -> f64 {
        let total: f64 = self.fans[v].iter().map(|&c| self.corner_angle(c)).sum();
        if self.boundary_vertices[v] {
            PI - total
        } else {
            2.0 * PI - total
        }
    }

    /// Gradients of the three linear hat functions of a face.
    ///
    /// Entry `i` is the gradient of the barycentric coordinate of corner `i`; it
    /// lies in the face plane and has length `1 / height_i`.
    pub fn hat_gradients(&self, f: usize) -> [Vector3<f64>; 3] {
        let [p0, p1, p2] = self.face_positions(f);
        let n = self.frames[f].normal;
        let inv_2a = 1.0 / (2.0 * self.areas[f]);
        [
            n.cross(&(p2 - p1)) * inv_2a,
            n.cross(&(p0 - p2)) * inv_2a,
            n.cross(&(p1 - p0)) * inv_2a,
        ]
    }

    /// Euler characteristic `V - E + F`.
    pub fn euler_characteristic(&self) -> i64 {
        self.num_vertices() as i64 - self.num_edges() as i64 + self.num_faces() as i64
    }

    /// Connected components of the dual graph as a component id per face.
    ///
    /// Components are numbered in order of their smallest face.
    pub fn face_components(&self) -> (Vec<usize>, usize) {
        let n = self.faces.len();
        let mut component = vec![usize::MAX; n];
        let mut count = 0;
        let mut stack = Vec::new();

        for seed in 0..n {
            if component[seed] != usize::MAX {
                continue;
            }
            component[seed] = count;
            stack.push(seed);
            while let Some(f) = stack.pop() {
                for e in 0..3 {
                    if let Some((g, _)) = self.adjacency[f][e] {
                        if component[g] == usize::MAX {
                            component[g] = count;
                            stack.push(g);
                        }
                    }
                }
            }
            count += 1;
        }

        (component, count)
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures;

    use super::*;

    #[test]
    fn test_square_adjacency() {
        let mesh = fixtures::square();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.euler_characteristic(), 1);

        // Faces share exactly one edge.
        let shared: Vec<_> = (0..3).filter_map(|e| mesh.neighbor(0, e)).collect();
        assert_eq!(shared.len(), 1);
        let (g, ge) = shared[0];
        assert_eq!(g, 1);
        let back = mesh.neighbor(g, ge).unwrap();
        assert_eq!(back.0, 0);
        assert!(mesh.has_boundary());
    }

    #[test]
    fn test_closed_meshes_have_no_boundary() {
        for mesh in [fixtures::tetrahedron(), fixtures::icosahedron(), fixtures::torus(8, 6)] {
            assert!(!mesh.has_boundary());
            for f in 0..mesh.num_faces() {
                for e in 0..3 {
                    assert!(!mesh.is_boundary_edge(f, e));
                }
            }
        }
    }

    #[test]
    fn test_euler_characteristic() {
        assert_eq!(fixtures::tetrahedron().euler_characteristic(), 2);
        assert_eq!(fixtures::icosahedron().euler_characteristic(), 2);
        assert_eq!(fixtures::torus(8, 6).euler_characteristic(), 0);
        assert_eq!(fixtures::grid(3).euler_characteristic(), 1);
    }

    #[test]
    fn test_fans_are_ordered() {
        let mesh = fixtures::icosahedron();
        for v in 0..mesh.num_vertices() {
            let fan = mesh.fan(v);
            assert_eq!(fan.len(), 5);
            for (i, c) in fan.iter().enumerate() {
                assert_eq!(mesh.corner_vertex(*c), v);
                // Consecutive faces share the edge v -> prev corner of the current face.
                let next = fan[(i + 1) % fan.len()];
                let (g, ge) = mesh.neighbor(c.face, (c.corner + 2) % 3).unwrap();
                assert_eq!(g, next.face);
                assert_eq!(ge, next.corner);
            }
        }
    }

    #[test]
    fn test_boundary_fan_starts_on_boundary() {
        let mesh = fixtures::grid(2);
        for v in 0..mesh.num_vertices() {
            if mesh.is_boundary_vertex(v) {
                let first = mesh.fan(v)[0];
                assert!(mesh.is_boundary_edge(first.face, first.corner));
                let last = *mesh.fan(v).last().unwrap();
                assert!(mesh.is_boundary_edge(last.face, (last.corner + 2) % 3));
            }
        }
    }

    #[test]
    fn test_angle_defect_sums_to_gauss_bonnet() {
        let mesh = fixtures::icosahedron();
        let total: f64 = (0..mesh.num_vertices()).map(|v| mesh.angle_defect(v)).sum();
        assert!((total - 4.0 * PI).abs() < 1e-9);

        let torus = fixtures::torus(10, 7);
        let total: f64 = (0..torus.num_vertices()).map(|v| torus.angle_defect(v)).sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn test_local_frames_are_orthonormal() {
        let mesh = fixtures::icosahedron();
        for frame in mesh.frames() {
            assert!((frame.b1.norm() - 1.0).abs() < 1e-12);
            assert!((frame.b2.norm() - 1.0).abs() < 1e-12);
            assert!(frame.b1.dot(&frame.b2).abs() < 1e-12);
            assert!(frame.b1.dot(&frame.normal).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hat_gradients_reproduce_linear_functions() {
        let mesh = fixtures::icosahedron();
        for f in 0..mesh.num_faces() {
            let grads = mesh.hat_gradients(f);
            // Gradients of the partition of unity sum to zero.
            let sum = grads[0] + grads[1] + grads[2];
            assert!(sum.norm() < 1e-9);

            // Interpolating x reproduces the tangential part of e_x.
            let pos = mesh.face_positions(f);
            let g: Vector3<f64> = (0..3).map(|i| grads[i] * pos[i].x).sum();
            let expected = mesh.frame(f).project(&Vector3::x());
            assert!((g - expected).norm() < 1e-9);
        }
    }

    #[test]
    fn test_average_edge_length() {
        let mesh = fixtures::grid(2);
        // 12 unit edges and 4 diagonals of length sqrt(2).
        let expected = (12.0 + 4.0 * 2f64.sqrt()) / 16.0;
        assert!((mesh.average_edge_length() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_face_components() {
        let (component, count) = fixtures::icosahedron().face_components();
        assert_eq!(count, 1);
        assert!(component.iter().all(|&c| c == 0));
    }
}
