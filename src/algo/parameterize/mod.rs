//! Global seamless parametrization.
//!
//! This module turns a combed frame field and its cut graph into UV
//! coordinates whose gradients follow the field, with integer jumps across the
//! seams:
//!
//! - [`parametrize`]: mixed-integer quadrangulation solve
//! - [`ParametrizedMesh`]: the resulting per-corner UV layout
//! - [`CorrespondenceIndex`]: vertex map between the input and the UV mesh
//!
//! # Example
//!
//! ```
//! use crossfield::algo::cut::cut_seams;
//! use crossfield::algo::field::*;
//! use crossfield::algo::parameterize::{parametrize, CorrespondenceIndex, MiqOptions};
//! use crossfield::mesh::{primitives, VertexId};
//!
//! let mesh = primitives::grid(2).unwrap();
//! let field = solve_frame_field(&mesh, &[], &FrameFieldOptions::default()).unwrap();
//! let bisectors = compute_bisectors(&mesh, &field, true).unwrap();
//! let combed = comb_bisectors(&mesh, &bisectors);
//! let mismatch = compute_mismatch(&mesh, &combed, true);
//! let singularities = detect_singularities(&mesh, &mismatch);
//! let seams = cut_seams(&mesh, &combed, &singularities);
//! let frame = comb_frame_field(&mesh, &field, &combed, true).unwrap();
//!
//! let param = parametrize(&mesh, &frame, &mismatch, &singularities, &seams, &MiqOptions::default()).unwrap();
//! let index = CorrespondenceIndex::build(&mesh, &param).unwrap();
//! assert_eq!(index.forward(VertexId::new(0)).unwrap().len(), 1);
//! ```
//!
//! # References
//!
//! - Bommes, D., Zimmer, H., & Kobbelt, L. (2009). "Mixed-integer
//!   quadrangulation." ACM SIGGRAPH.

mod correspondence;
mod miq;
mod uv;

pub use correspondence::CorrespondenceIndex;
pub use miq::{parametrize, MiqOptions, RoundingPolicy};
pub use uv::{ParametrizedMesh, SeamTranslation};
