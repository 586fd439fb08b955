//! # Crossfield
//!
//! Cross-field design and mixed-integer quad parametrization for triangle
//! meshes.
//!
//! Crossfield takes a consistently oriented 2-manifold triangle mesh and
//! produces UV coordinates whose iso-lines follow a smooth 4-way symmetric
//! direction field. The UV layout is seamless: across every cut the
//! coordinates differ by a rotation by quarter turns and an integer
//! translation, so the integer grid maps to a quad-dominant layout.
//!
//! ## Features
//!
//! - **Validated mesh**: cached face adjacency, vertex fans and local frames
//! - **Frame-field design**: hard and soft direction constraints
//! - **Combing and mismatch**: the discrete holonomy of the field per edge
//! - **Singularities**: vertex indices that sum to `4χ` on closed surfaces
//! - **Cutting**: a seam graph connecting the singularities and the boundary
//! - **MIQ parametrization**: direct or iterative integer rounding
//! - **Correspondence**: vertex map between the mesh and its cut UV mesh
//!
//! ## Quick Start
//!
//! ```
//! use crossfield::prelude::*;
//! use crossfield::mesh::primitives;
//!
//! let mesh = primitives::icosahedron().unwrap();
//! let output = Pipeline::default().run(&mesh, &[]).unwrap();
//!
//! // Discrete Poincaré-Hopf on a sphere.
//! assert_eq!(output.singularities.total_index(), 8);
//!
//! for t in output.parametrization.seam_translations() {
//!     assert!(t.is_integer(1e-6));
//! }
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use crossfield::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.euler_characteristic(), 2);
//! ```
//!
//! ## Running Stages Individually
//!
//! Every stage is a free function taking the previous results by reference;
//! see [`algo::field`], [`algo::cut`] and [`algo::parameterize`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use crossfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::field::{DirectionConstraint, FrameFieldOptions};
    pub use crate::algo::parameterize::{CorrespondenceIndex, MiqOptions, ParametrizedMesh, RoundingPolicy};
    pub use crate::error::{Error, Result, ValidationError};
    pub use crate::mesh::{build_from_triangles, Corner, FaceId, TriMesh, UvVertexId, VertexId};
    pub use crate::pipeline::{Pipeline, PipelineOptions, PipelineOutput};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
