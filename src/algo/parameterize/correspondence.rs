//! Mapping between input vertices and UV vertices.

use super::uv::ParametrizedMesh;
use crate::error::{Error, Result};
use crate::mesh::{TriMesh, UvVertexId, VertexId};

/// Bidirectional vertex map between a mesh and its parametrization.
///
/// Every UV vertex has exactly one source vertex. A source vertex maps to one
/// UV vertex per side of the seams that meet at it.
#[derive(Debug, Clone)]
pub struct CorrespondenceIndex {
    /// CSR offsets into `forward`, one entry per input vertex plus one.
    offsets: Vec<usize>,
    forward: Vec<UvVertexId>,
    backward: Vec<VertexId>,
}

impl CorrespondenceIndex {
    /// Build the index from the shared face tables.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] for `fuv` if the tables disagree:
    /// the face counts differ, one UV vertex is used by corners of different
    /// input vertices, or a UV vertex is not used at all.
    pub fn build(mesh: &TriMesh, param: &ParametrizedMesh) -> Result<Self> {
        if param.num_faces() != mesh.num_faces() {
            return Err(Error::invalid_param(
                "fuv",
                format!("{} faces", param.num_faces()),
                "must have one row per mesh face",
            ));
        }

        let mut backward: Vec<Option<VertexId>> = vec![None; param.num_uv_vertices()];
        for (face, uv_face) in mesh.faces().iter().zip(param.fuv()) {
            for (&v, &u) in face.iter().zip(uv_face) {
                match backward[u] {
                    None => backward[u] = Some(VertexId::new(v)),
                    Some(existing) if existing.index() == v => {}
                    Some(existing) => {
                        return Err(Error::invalid_param(
                            "fuv",
                            format!("uv vertex {} at vertices {} and {}", u, existing.index(), v),
                            "uv vertex is shared by different mesh vertices",
                        ));
                    }
                }
            }
        }
        let backward = backward
            .into_iter()
            .enumerate()
            .map(|(u, v)| {
                v.ok_or_else(|| Error::invalid_param("fuv", format!("uv vertex {}", u), "uv vertex is not used by any face"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut offsets = Vec::with_capacity(mesh.num_vertices() + 1);
        let mut forward = Vec::new();
        offsets.push(0);
        for v in 0..mesh.num_vertices() {
            let start = forward.len();
            forward.extend(mesh.fan(v).iter().map(|c| UvVertexId::new(param.fuv()[c.face][c.corner])));
            forward[start..].sort_unstable();
            let mut tail = forward.split_off(start);
            tail.dedup();
            forward.append(&mut tail);
            offsets.push(forward.len());
        }

        Ok(Self {
            offsets,
            forward,
            backward,
        })
    }

    /// UV vertices that an input vertex was split into, in increasing order.
    pub fn forward(&self, v: VertexId) -> Result<&[UvVertexId]> {
        let i = v.index();
        if i >= self.num_vertices() {
            return Err(Error::IndexOutOfRange {
                kind: "vertex",
                index: i,
                len: self.num_vertices(),
            });
        }
        Ok(&self.forward[self.offsets[i]..self.offsets[i + 1]])
    }

    /// Input vertex a UV vertex was created from.
    pub fn backward(&self, u: UvVertexId) -> Result<VertexId> {
        self.backward.get(u.index()).copied().ok_or(Error::IndexOutOfRange {
            kind: "uv vertex",
            index: u.index(),
            len: self.backward.len(),
        })
    }

    /// Number of input vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of UV vertices.
    #[inline]
    pub fn num_uv_vertices(&self) -> usize {
        self.backward.len()
    }

    /// Whether the input vertex was duplicated along a seam.
    pub fn is_split(&self, v: VertexId) -> Result<bool> {
        Ok(self.forward(v)?.len() > 1)
    }
}
