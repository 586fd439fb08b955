//! Mesh construction and validation.
//!
//! [`build_from_triangles`] checks every precondition the pipeline relies on and
//! fails fast with a [`ValidationError`] before any field or parametrization is
//! computed.

use std::collections::HashMap;

use nalgebra::Point3;

use super::index::Corner;
use super::trimesh::{LocalFrame, TriMesh};
use crate::error::{Result, ValidationError};

/// Faces whose doubled area falls below this fraction of their longest squared
/// edge are treated as zero-area.
const DEGENERATE_AREA_RATIO: f64 = 1e-12;

/// Build a validated triangle mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices, consistently oriented
///
/// # Errors
/// Returns [`Error::MeshValidation`](crate::Error::MeshValidation) if the mesh is
/// empty, has bad indices, degenerate or zero-area faces, non-finite coordinates,
/// unreferenced vertices, or is not an oriented 2-manifold.
///
/// # Example
/// ```
/// use crossfield::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<TriMesh> {
    TriMesh::new(vertices.to_vec(), faces.to_vec())
}

impl TriMesh {
    /// Validate the input and derive adjacency, frames and fans.
    pub fn new(positions: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if faces.is_empty() {
            return Err(ValidationError::EmptyMesh.into());
        }

        if let Some(vertex) = positions
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(ValidationError::NonFiniteCoordinate { vertex }.into());
        }

        // Validate vertex indices
        let mut referenced = vec![false; positions.len()];
        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= positions.len() {
                    return Err(ValidationError::InvalidVertexIndex { face: fi, vertex: vi }.into());
                }
                referenced[vi] = true;
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(ValidationError::DegenerateFace { face: fi }.into());
            }
        }
        if let Some(vertex) = referenced.iter().position(|&r| !r) {
            return Err(ValidationError::IsolatedVertex { vertex }.into());
        }

        let (areas, frames) = face_geometry(&positions, &faces)?;
        let adjacency = link_adjacency(&faces)?;

        let mut mesh = Self {
            positions,
            faces,
            adjacency,
            areas,
            frames,
            fans: Vec::new(),
            boundary_vertices: Vec::new(),
        };
        build_fans(&mut mesh)?;

        Ok(mesh)
    }
}

/// Compute face areas and local frames, rejecting zero-area faces.
fn face_geometry(
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<(Vec<f64>, Vec<LocalFrame>)> {
    let mut areas = Vec::with_capacity(faces.len());
    let mut frames = Vec::with_capacity(faces.len());

    for (fi, face) in faces.iter().enumerate() {
        let p0 = positions[face[0]];
        let e1 = positions[face[1]] - p0;
        let e2 = positions[face[2]] - p0;
        let cross = e1.cross(&e2);
        let doubled = cross.norm();

        let longest = e1
            .norm_squared()
            .max(e2.norm_squared())
            .max((e2 - e1).norm_squared());
        if !(doubled > DEGENERATE_AREA_RATIO * longest) {
            return Err(ValidationError::ZeroAreaFace { face: fi }.into());
        }

        let normal = cross / doubled;
        let b1 = e1.normalize();
        let b2 = normal.cross(&b1);
        areas.push(0.5 * doubled);
        frames.push(LocalFrame { b1, b2, normal });
    }

    Ok((areas, frames))
}

/// Link each directed face edge to its opposite.
fn link_adjacency(faces: &[[usize; 3]]) -> Result<Vec<[Option<(usize, usize)>; 3]>> {
    // Map from directed edge (v0, v1) to (face, edge)
    let mut edge_map: HashMap<(usize, usize), (usize, usize)> =
        HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        for e in 0..3 {
            let key = (face[e], face[(e + 1) % 3]);
            if edge_map.insert(key, (fi, e)).is_some() {
                // The same directed edge twice means a third face or a flipped one.
                return Err(ValidationError::NonManifoldEdge { v0: key.0, v1: key.1 }.into());
            }
        }
    }

    let mut adjacency = vec![[None; 3]; faces.len()];
    for (fi, face) in faces.iter().enumerate() {
        for e in 0..3 {
            let twin = (face[(e + 1) % 3], face[e]);
            adjacency[fi][e] = edge_map.get(&twin).copied();
        }
    }

    Ok(adjacency)
}

/// Order the corners around every vertex counter-clockwise.
fn build_fans(mesh: &mut TriMesh) -> Result<()> {
    let n = mesh.positions.len();
    let mut incident: Vec<Vec<Corner>> = vec![Vec::new(); n];
    for (fi, face) in mesh.faces.iter().enumerate() {
        for (c, &v) in face.iter().enumerate() {
            incident[v].push(Corner::new(fi, c));
        }
    }

    let mut fans = Vec::with_capacity(n);
    let mut boundary = vec![false; n];

    for (v, corners) in incident.iter().enumerate() {
        // A boundary fan must start at the corner whose outgoing edge is open.
        let mut starts = corners
            .iter()
            .filter(|c| mesh.adjacency[c.face][c.corner].is_none());
        let start = match (starts.next(), starts.next()) {
            (Some(&s), None) => {
                boundary[v] = true;
                s
            }
            (None, _) => corners[0],
            (Some(_), Some(_)) => {
                return Err(ValidationError::NonManifoldVertex { vertex: v }.into());
            }
        };

        let mut fan = Vec::with_capacity(corners.len());
        let mut current = start;
        loop {
            fan.push(current);
            if fan.len() > corners.len() {
                break;
            }
            match mesh.adjacency[current.face][current.prev().corner] {
                Some((g, ge)) => {
                    current = Corner::new(g, ge);
                    if current == start {
                        break;
                    }
                }
                None => break,
            }
        }

        if fan.len() != corners.len() {
            return Err(ValidationError::NonManifoldVertex { vertex: v }.into());
        }
        fans.push(fan);
    }

    mesh.fans = fans;
    mesh.boundary_vertices = boundary;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn validation_error(result: Result<TriMesh>) -> ValidationError {
        match result {
            Err(Error::MeshValidation(e)) => e,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    fn unit_vertices() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_build_square() {
        let mesh = build_from_triangles(&unit_vertices(), &[[0, 1, 2], [0, 2, 3]]).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert!((mesh.area(0) - 0.5).abs() < 1e-12);
        assert!((mesh.frame(0).normal - nalgebra::Vector3::z()).norm() < 1e-12);
        assert_eq!(mesh.fan(0).len(), 2);
        assert_eq!(mesh.fan(1).len(), 1);
    }

    #[test]
    fn test_empty_mesh() {
        let err = validation_error(build_from_triangles(&unit_vertices(), &[]));
        assert_eq!(err, ValidationError::EmptyMesh);
    }

    #[test]
    fn test_invalid_index() {
        let err = validation_error(build_from_triangles(&unit_vertices(), &[[0, 1, 7]]));
        assert_eq!(err, ValidationError::InvalidVertexIndex { face: 0, vertex: 7 });
    }

    #[test]
    fn test_duplicate_index() {
        let err = validation_error(build_from_triangles(&unit_vertices(), &[[0, 1, 1]]));
        assert_eq!(err, ValidationError::DegenerateFace { face: 0 });
    }

    #[test]
    fn test_zero_area() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let err = validation_error(build_from_triangles(&vertices, &[[0, 1, 2]]));
        assert_eq!(err, ValidationError::ZeroAreaFace { face: 0 });
    }

    #[test]
    fn test_non_finite() {
        let mut vertices = unit_vertices();
        vertices[2].y = f64::NAN;
        let err = validation_error(build_from_triangles(&vertices, &[[0, 1, 2]]));
        assert_eq!(err, ValidationError::NonFiniteCoordinate { vertex: 2 });
    }

    #[test]
    fn test_isolated_vertex() {
        let err = validation_error(build_from_triangles(&unit_vertices(), &[[0, 1, 2]]));
        assert_eq!(err, ValidationError::IsolatedVertex { vertex: 3 });
    }

    #[test]
    fn test_inconsistent_orientation() {
        // Second face traverses the shared edge 0 -> 2 in the same direction.
        let err = validation_error(build_from_triangles(&unit_vertices(), &[[0, 1, 2], [0, 2, 3], [2, 0, 1]]));
        assert!(matches!(err, ValidationError::NonManifoldEdge { .. }));

        let err = validation_error(build_from_triangles(&unit_vertices(), &[[0, 1, 2], [0, 3, 2]]));
        assert!(matches!(err, ValidationError::NonManifoldEdge { .. }));
    }

    #[test]
    fn test_bowtie_vertex() {
        // Two triangles touching only at vertex 0.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let err = validation_error(build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]));
        assert_eq!(err, ValidationError::NonManifoldVertex { vertex: 0 });
    }
}
