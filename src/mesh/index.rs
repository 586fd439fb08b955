//! Index types for mesh elements.
//!
//! Vertices of the input surface, faces, and vertices of the cut (UV) mesh live in
//! different index spaces. The wrappers here keep them apart at compile time so a
//! UV vertex id can never be used to index the original positions by accident.

use std::fmt::{self, Debug};

/// A type-safe index of a vertex of the input mesh.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(usize);

/// A type-safe face index. Faces are shared by the input and the UV mesh.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(usize);

/// A type-safe index of a vertex of the cut (UV) mesh.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct UvVertexId(usize);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(FaceId, "F");
impl_index_type!(UvVertexId, "UV");

/// A face corner: the `corner`-th vertex slot (0, 1 or 2) of `face`.
///
/// Corner `c` of a face is also the start of the face's edge `c`, which runs from
/// corner `c` to corner `(c + 1) % 3`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Corner {
    /// The face owning the corner.
    pub face: usize,
    /// Slot within the face (0..3).
    pub corner: usize,
}

impl Corner {
    /// Create a corner reference.
    #[inline]
    pub const fn new(face: usize, corner: usize) -> Self {
        Self { face, corner }
    }

    /// The corner following this one in the face's winding order.
    #[inline]
    pub const fn next(self) -> Self {
        Self::new(self.face, (self.corner + 1) % 3)
    }

    /// The corner preceding this one in the face's winding order.
    #[inline]
    pub const fn prev(self) -> Self {
        Self::new(self.face, (self.corner + 2) % 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(VertexId::from(42), v);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(7)), "V(7)");
        assert_eq!(format!("{:?}", FaceId::new(3)), "F(3)");
        assert_eq!(format!("{:?}", UvVertexId::new(11)), "UV(11)");
    }

    #[test]
    fn test_corner_cycle() {
        let c = Corner::new(5, 2);
        assert_eq!(c.next(), Corner::new(5, 0));
        assert_eq!(c.prev(), Corner::new(5, 1));
        assert_eq!(c.next().prev(), c);
    }
}
