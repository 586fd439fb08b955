//! Cross-field and parametrization algorithms.
//!
//! The stages run in this order:
//!
//! - **Field design** ([`field`]): smooth frame field, bisectors, combing,
//!   mismatch and singularities
//! - **Cutting** ([`cut`]): seam graph connecting the singularities
//! - **Parametrization** ([`parameterize`]): mixed-integer UV solve and the
//!   vertex correspondence of the cut mesh
//!
//! [`sparse`] holds the linear algebra both global solves share.

pub mod cut;
pub mod field;
pub mod parameterize;
pub mod sparse;

mod progress;

pub use progress::Progress;
