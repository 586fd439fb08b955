//! Cut graph construction.
//!
//! The edges of the combing tree carry zero mismatch, so cutting the surface
//! along every other interior edge always yields a field that is single-valued
//! on the remainder. That cut graph is far larger than needed: its dangling
//! branches are pruned edge by edge from regular interior vertices until every
//! remaining branch ends at a singularity or on the boundary.
//!
//! What is left connects all singularities to each other and to the boundary.
//! On closed surfaces of higher genus it also keeps one loop per handle, which
//! carries the field's period across that handle.

use crate::algo::field::{CombedField, SingularityField};
use crate::mesh::TriMesh;

/// Seam flags per face edge. Both sides of an interior seam edge are flagged.
#[derive(Debug, Clone)]
pub struct SeamGraph {
    pub(crate) seams: Vec<[bool; 3]>,
}

impl SeamGraph {
    /// A graph without seams for a mesh with `num_faces` faces.
    pub fn empty(num_faces: usize) -> Self {
        Self {
            seams: vec![[false; 3]; num_faces],
        }
    }

    /// Whether edge `e` of face `f` is a seam.
    #[inline]
    pub fn is_seam(&self, f: usize, e: usize) -> bool {
        self.seams[f][e]
    }

    /// Per-face seam flags.
    #[inline]
    pub fn flags(&self) -> &[[bool; 3]] {
        &self.seams
    }

    /// Seam edges, each reported once from the face with the smaller index.
    pub fn seam_edges<'a>(&'a self, mesh: &'a TriMesh) -> impl Iterator<Item = (usize, usize)> + 'a {
        mesh.edges().filter(move |&(f, e)| self.seams[f][e])
    }

    /// Number of undirected seam edges.
    pub fn num_seam_edges(&self, mesh: &TriMesh) -> usize {
        self.seam_edges(mesh).count()
    }

    /// Whether the graph has no seams.
    pub fn is_empty(&self) -> bool {
        self.seams.iter().all(|s| !s.iter().any(|&b| b))
    }

    /// Per vertex: whether it touches a seam edge.
    pub fn seam_vertices(&self, mesh: &TriMesh) -> Vec<bool> {
        let mut on_seam = vec![false; mesh.num_vertices()];
        for (f, e) in self.seam_edges(mesh) {
            let face = mesh.faces()[f];
            on_seam[face[e]] = true;
            on_seam[face[(e + 1) % 3]] = true;
        }
        on_seam
    }
}

/// Build the cut graph for a combed field and its singularities.
pub fn cut_seams(mesh: &TriMesh, combed: &CombedField, singularities: &SingularityField) -> SeamGraph {
    let faces = mesh.faces();

    // Candidate seams: interior edges off the combing tree.
    let edges: Vec<(usize, usize)> = mesh
        .edges()
        .filter(|&(f, e)| !mesh.is_boundary_edge(f, e) && !combed.is_tree_edge(f, e))
        .collect();
    let mut alive = vec![true; edges.len()];

    // Incident candidate edges and boundary edges per vertex.
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); mesh.num_vertices()];
    for (i, &(f, e)) in edges.iter().enumerate() {
        incident[faces[f][e]].push(i);
        incident[faces[f][(e + 1) % 3]].push(i);
    }
    let mut degree: Vec<usize> = incident.iter().map(Vec::len).collect();
    for (f, e) in mesh.edges() {
        if mesh.is_boundary_edge(f, e) {
            degree[faces[f][e]] += 1;
            degree[faces[f][(e + 1) % 3]] += 1;
        }
    }

    let prunable = |v: usize, degree: &[usize]| degree[v] == 1 && !singularities.is_singular(v);
    let mut stack: Vec<usize> = (0..mesh.num_vertices()).rev().filter(|&v| prunable(v, &degree)).collect();

    while let Some(v) = stack.pop() {
        if !prunable(v, &degree) {
            continue;
        }
        let Some(&i) = incident[v].iter().find(|&&i| alive[i]) else {
            continue;
        };
        alive[i] = false;

        let (f, e) = edges[i];
        let (a, b) = (faces[f][e], faces[f][(e + 1) % 3]);
        let other = if a == v { b } else { a };
        degree[v] -= 1;
        degree[other] -= 1;
        if prunable(other, &degree) {
            stack.push(other);
        }
    }

    let mut graph = SeamGraph::empty(mesh.num_faces());
    for (i, &(f, e)) in edges.iter().enumerate() {
        if !alive[i] {
            continue;
        }
        if let Some((g, ge)) = mesh.neighbor(f, e) {
            graph.seams[f][e] = true;
            graph.seams[g][ge] = true;
        }
    }

    log::debug!(
        "seams: kept {} of {} candidate edges",
        alive.iter().filter(|&&a| a).count(),
        edges.len()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::field::{
        comb_bisectors, compute_bisectors, compute_mismatch, detect_singularities, solve_frame_field, transport,
        FrameFieldOptions, MismatchField,
    };
    use crate::fixtures;

    /// Largest angle between a combed direction and its neighbor's, over all
    /// interior edges that are not cut.
    fn max_uncut_angle(mesh: &TriMesh) -> f64 {
        let field = solve_frame_field(mesh, &[], &FrameFieldOptions::default()).unwrap();
        let bis = compute_bisectors(mesh, &field, true).unwrap();
        let combed = comb_bisectors(mesh, &bis);
        let mm = compute_mismatch(mesh, &combed, true);
        let sing = detect_singularities(mesh, &mm);
        let seams = cut_seams(mesh, &combed, &sing);

        let mut worst: f64 = 0.0;
        for (f, e) in mesh.edges() {
            let Some((g, ge)) = mesh.neighbor(f, e) else {
                continue;
            };
            if seams.is_seam(f, e) {
                continue;
            }
            let incoming = transport(mesh, g, ge, &combed.bis1()[g]);
            let cos = incoming.normalize().dot(&combed.bis1()[f].normalize()).clamp(-1.0, 1.0);
            worst = worst.max(cos.acos());
        }
        worst
    }

    fn cut(mesh: &TriMesh) -> (MismatchField, SingularityField, SeamGraph) {
        let field = solve_frame_field(mesh, &[], &FrameFieldOptions::default()).unwrap();
        let bis = compute_bisectors(mesh, &field, true).unwrap();
        let combed = comb_bisectors(mesh, &bis);
        let mm = compute_mismatch(mesh, &combed, true);
        let sing = detect_singularities(mesh, &mm);
        let seams = cut_seams(mesh, &combed, &sing);
        (mm, sing, seams)
    }

    fn assert_mismatch_on_seams(mesh: &TriMesh, mm: &MismatchField, seams: &SeamGraph) {
        for f in 0..mesh.num_faces() {
            for e in 0..3 {
                if let Some(k) = mm.get(f, e) {
                    if k != 0 {
                        assert!(seams.is_seam(f, e), "edge ({}, {}) has mismatch {} but is not cut", f, e, k);
                    }
                }
            }
        }
    }

    #[test]
    fn test_flat_disk_has_no_seams() {
        let mesh = fixtures::grid(4);
        let (_, _, seams) = cut(&mesh);
        assert!(seams.is_empty());
        assert_eq!(seams.num_seam_edges(&mesh), 0);
    }

    #[test]
    fn test_sphere_seams_reach_every_singularity() {
        let mesh = fixtures::icosahedron();
        let (mm, sing, seams) = cut(&mesh);
        assert!(!seams.is_empty());
        let on_seam = seams.seam_vertices(&mesh);
        for v in sing.singular_vertices() {
            assert!(on_seam[v], "singular vertex {} is isolated", v);
        }
        assert_mismatch_on_seams(&mesh, &mm, &seams);
    }

    #[test]
    fn test_sphere_seams_form_a_tree() {
        let mesh = fixtures::icosahedron();
        let (_, _, seams) = cut(&mesh);
        let on_seam = seams.seam_vertices(&mesh);
        let vertices = on_seam.iter().filter(|&&b| b).count();
        // A connected forest on a sphere: edges = vertices - components.
        assert!(seams.num_seam_edges(&mesh) < vertices);
    }

    #[test]
    fn test_torus_keeps_handle_loops() {
        let mesh = fixtures::torus(8, 6);
        let (mm, _, seams) = cut(&mesh);
        // Without any cut the torus cannot be opened into a disk.
        assert!(seams.num_seam_edges(&mesh) >= 2);
        assert_mismatch_on_seams(&mesh, &mm, &seams);
    }

    #[test]
    fn test_cylinder_connects_boundaries() {
        let mesh = fixtures::cylinder(8, 4);
        let (mm, _, seams) = cut(&mesh);
        assert!(!seams.is_empty());
        assert_mismatch_on_seams(&mesh, &mm, &seams);
    }

    #[test]
    fn test_developable_field_is_continuous_off_seams() {
        let mesh = fixtures::cylinder(8, 4);
        let worst = max_uncut_angle(&mesh);
        assert!(worst < 1e-4, "angle {} across an uncut edge", worst);
    }

    #[test]
    fn test_curved_field_is_continuous_off_seams() {
        let mesh = fixtures::torus(24, 12);
        let worst = max_uncut_angle(&mesh);
        assert!(worst < std::f64::consts::FRAC_PI_6, "angle {} across an uncut edge", worst);
    }

    #[test]
    fn test_seam_flags_are_symmetric() {
        let mesh = fixtures::icosahedron();
        let (_, _, seams) = cut(&mesh);
        for f in 0..mesh.num_faces() {
            for e in 0..3 {
                let (g, ge) = mesh.neighbor(f, e).unwrap();
                assert_eq!(seams.is_seam(f, e), seams.is_seam(g, ge));
            }
        }
    }
}
