//! Core mesh data structures.
//!
//! The primary type is [`TriMesh`], an immutable, validated, consistently
//! oriented triangle mesh. It keeps the face-vertex table as given and caches
//! the adjacency the field and parametrization stages walk:
//!
//! - face-face adjacency across each edge, with the edge index in the neighbor
//! - counter-clockwise ordered corner fans around every vertex
//! - per-face area and orthonormal local frame ([`LocalFrame`])
//!
//! # Index Types
//!
//! - [`VertexId`] - a vertex of the input mesh
//! - [`FaceId`] - a face (shared by the input and UV mesh)
//! - [`UvVertexId`] - a vertex of the cut UV mesh
//! - [`Corner`] - a (face, slot) pair
//!
//! # Construction
//!
//! ```
//! use crossfield::mesh::{build_from_triangles, TriMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 5);
//! ```

mod builder;
mod index;
pub mod primitives;
mod trimesh;

pub use builder::build_from_triangles;
pub use index::{Corner, FaceId, UvVertexId, VertexId};
pub use trimesh::{LocalFrame, TriMesh};
