//! End-to-end checks of the pipeline on meshes of known topology.

use crossfield::algo::parameterize::SeamTranslation;
use crossfield::mesh::primitives;
use crossfield::prelude::*;
use nalgebra::{Complex, Vector3};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(mesh: &TriMesh, constraints: &[DirectionConstraint]) -> PipelineOutput {
    init_logging();
    Pipeline::default().run(mesh, constraints).unwrap()
}

fn uv(out: &PipelineOutput, f: usize, c: usize) -> Complex<f64> {
    let p = out.parametrization.corner_uv(f, c);
    Complex::new(p.x, p.y)
}

fn i_pow(k: u8) -> Complex<f64> {
    (0..k % 4).fold(Complex::new(1.0, 0.0), |acc, _| acc * Complex::i())
}

fn translation_of(out: &PipelineOutput, f: usize, e: usize) -> Option<&SeamTranslation> {
    out.parametrization
        .seam_translations()
        .iter()
        .find(|t| t.face == f && t.edge == e)
}

/// Continuity across plain edges and integer transitions across seams.
fn assert_seamless(mesh: &TriMesh, out: &PipelineOutput) {
    let fuv = out.parametrization.fuv();
    for (f, e) in mesh.edges() {
        let Some((g, ge)) = mesh.neighbor(f, e) else {
            continue;
        };
        let (a_f, b_f) = (e, (e + 1) % 3);
        let (a_g, b_g) = ((ge + 1) % 3, ge);

        if !out.seams.is_seam(f, e) {
            assert_eq!(fuv[f][a_f], fuv[g][a_g], "edge ({}, {}) is split", f, e);
            assert_eq!(fuv[f][b_f], fuv[g][b_g], "edge ({}, {}) is split", f, e);
            continue;
        }

        let t = translation_of(out, f, e).expect("seam edge without translation");
        assert!(t.is_integer(1e-6), "translation {:?} is not integral", t);
        let shift = Complex::new(t.translation.x, t.translation.y);
        let rot = i_pow(t.rotation).conj();
        for (cf, cg) in [(a_f, a_g), (b_f, b_g)] {
            let expected = rot * uv(out, g, cg) + shift;
            assert!((uv(out, f, cf) - expected).norm() < 1e-6, "seam ({}, {}) does not match", f, e);
        }
    }
}

fn assert_round_trip(mesh: &TriMesh, out: &PipelineOutput) {
    let index = &out.correspondence;
    for v in mesh.vertex_ids() {
        let forward = index.forward(v).unwrap();
        assert!(!forward.is_empty());
        for &u in forward {
            assert_eq!(index.backward(u).unwrap(), v);
        }
    }
}

#[test]
fn flat_square_is_a_scaled_copy() {
    let mesh = primitives::square().unwrap();
    let out = run(&mesh, &[DirectionConstraint::hard(0, Vector3::x())]);

    assert_eq!(out.singularities.count(), 0);
    assert!(out.seams.is_empty());
    assert_eq!(out.parametrization.num_uv_vertices(), 4);

    // Distances scale by the inverse target edge length.
    let h = out.parametrization.target_edge_length();
    let uv = out.parametrization.uv();
    for a in 0..4 {
        for b in 0..4 {
            let world = (mesh.positions()[a] - mesh.positions()[b]).norm();
            assert!(((uv[a] - uv[b]).norm() * h - world).abs() < 1e-6);
        }
    }
    assert!(out.parametrization.folded_faces().is_empty());

    for v in mesh.vertex_ids() {
        assert_eq!(out.correspondence.forward(v).unwrap(), &[UvVertexId::new(v.index())]);
    }
}

#[test]
fn sphere_has_total_index_eight() {
    let mesh = primitives::icosahedron().unwrap();
    let out = run(&mesh, &[]);

    assert_eq!(mesh.euler_characteristic(), 2);
    assert_eq!(out.singularities.total_index(), 8);
    assert!(!out.seams.is_empty());

    let on_seam = out.seams.seam_vertices(&mesh);
    for v in out.singularities.singular_vertices() {
        assert!(on_seam[v], "singular vertex {} is not on a seam", v);
    }
}

#[test]
fn torus_has_total_index_zero() {
    let mesh = primitives::torus(12, 8).unwrap();
    let out = run(&mesh, &[]);
    assert_eq!(mesh.euler_characteristic(), 0);
    assert_eq!(out.singularities.total_index(), 0);
    // The handles stay cut even without singularities.
    assert!(!out.seams.is_empty());
}

#[test]
fn bisectors_are_orthonormal() {
    let mesh = primitives::torus(8, 6).unwrap();
    let out = run(&mesh, &[]);
    for (b1, b2) in out.bisectors.bis1().iter().zip(out.bisectors.bis2()) {
        assert!((b1.norm() - 1.0).abs() < 1e-9);
        assert!((b2.norm() - 1.0).abs() < 1e-9);
        assert!(b1.dot(b2).abs() < 1e-9);
    }
}

#[test]
fn nonzero_mismatch_only_on_seams() {
    for mesh in [
        primitives::icosahedron().unwrap(),
        primitives::torus(8, 6).unwrap(),
        primitives::cylinder(8, 4).unwrap(),
    ] {
        let out = run(&mesh, &[]);
        for f in 0..mesh.num_faces() {
            for e in 0..3 {
                match out.mismatch.get(f, e) {
                    Some(0) | None => {}
                    Some(_) => assert!(out.seams.is_seam(f, e)),
                }
            }
        }
    }
}

#[test]
fn parametrization_is_seamless() {
    for mesh in [
        primitives::grid(4).unwrap(),
        primitives::icosahedron().unwrap(),
        primitives::torus(8, 6).unwrap(),
        primitives::cylinder(8, 4).unwrap(),
    ] {
        let out = run(&mesh, &[]);
        assert!(out.parametrization.is_fully_rounded());
        assert_seamless(&mesh, &out);
        assert_round_trip(&mesh, &out);
    }
}

#[test]
fn flat_grid_does_not_fold() {
    let mesh = primitives::grid(5).unwrap();
    let out = run(&mesh, &[DirectionConstraint::hard(3, Vector3::new(1.0, 1.0, 0.0))]);
    assert!(out.parametrization.folded_faces().is_empty());
    assert!(out.parametrization.signed_areas().iter().all(|&a| a > 0.0));
    assert_eq!(out.correspondence.num_uv_vertices(), mesh.num_vertices());
}

#[test]
fn curved_cylinder_does_not_fold() {
    let mesh = primitives::cylinder(8, 4).unwrap();
    let out = run(&mesh, &[]);
    assert_eq!(out.singularities.count(), 0);
    assert!(!out.seams.is_empty());
    assert!(out.parametrization.folded_faces().is_empty());
    assert!(out.parametrization.signed_areas().iter().all(|&a| a > 0.0));
}

#[test]
fn folds_are_flagged_consistently() {
    init_logging();
    for mesh in [primitives::icosahedron().unwrap(), primitives::torus(12, 8).unwrap()] {
        let out = run(&mesh, &[]);
        let folded = out.parametrization.folded_faces();
        for &f in &folded {
            assert!(out.parametrization.signed_areas()[f] <= 0.0);
        }

        let strict = PipelineOptions::default().with_miq(MiqOptions::default().with_reject_folds(true));
        match Pipeline::new(strict).run(&mesh, &[]) {
            Ok(strict) => {
                assert!(folded.is_empty());
                assert!(strict.parametrization.folded_faces().is_empty());
            }
            Err(Error::Optimization { degraded, .. }) => {
                assert!(!folded.is_empty());
                assert_eq!(degraded.folded_faces(), folded);
            }
            Err(other) => panic!("unexpected error {}", other),
        }
    }
}

#[test]
fn field_is_continuous_across_uncut_edges() {
    let mesh = primitives::torus(24, 12).unwrap();
    let out = run(&mesh, &[]);
    for (f, e) in mesh.edges() {
        if out.seams.is_seam(f, e) {
            continue;
        }
        assert_eq!(out.mismatch.get(f, e), Some(0));
        let residual = out.mismatch.residual(f, e);
        assert!(
            residual.abs() < std::f64::consts::FRAC_PI_6,
            "edge ({}, {}) turns by {}",
            f,
            e,
            residual
        );
    }
}

#[test]
fn singular_vertices_sit_on_lattice_points() {
    let mesh = primitives::icosahedron().unwrap();
    let out = run(&mesh, &[]);
    let mut checked = 0;
    for f in 0..mesh.num_faces() {
        for c in 0..3 {
            let v = mesh.faces()[f][c];
            if out.singularities.fan_turns(v) == 0 {
                continue;
            }
            let w = uv(&out, f, c);
            assert!((w.re - w.re.round()).abs() < 1e-6, "vertex {} at {}", v, w);
            assert!((w.im - w.im.round()).abs() < 1e-6, "vertex {} at {}", v, w);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn continuous_output_keeps_fractional_jumps() {
    init_logging();
    let mesh = primitives::icosahedron().unwrap();
    let options = PipelineOptions::default().with_miq(MiqOptions::default().with_round_seams(false));
    let out = Pipeline::new(options).run(&mesh, &[]).unwrap();
    assert!(!out.parametrization.is_fully_rounded());
    assert_eq!(out.parametrization.num_faces(), mesh.num_faces());
}

#[test]
fn exhausted_rounding_budget_is_reported() {
    init_logging();
    let mesh = primitives::icosahedron().unwrap();
    let miq = MiqOptions::default().with_rounding(RoundingPolicy::Iterative { max_iterations: 0 });
    let err = Pipeline::new(PipelineOptions::default().with_miq(miq))
        .run(&mesh, &[])
        .unwrap_err();
    assert!(err.is_recoverable());
    match err {
        Error::Optimization { degraded, unrounded, .. } => {
            assert!(unrounded > 0);
            assert_eq!(degraded.num_faces(), mesh.num_faces());
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn invalid_mesh_is_rejected_up_front() {
    let vertices = vec![
        nalgebra::Point3::new(0.0, 0.0, 0.0),
        nalgebra::Point3::new(1.0, 0.0, 0.0),
        nalgebra::Point3::new(2.0, 0.0, 0.0),
    ];
    let err = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap_err();
    assert!(matches!(err, Error::MeshValidation(ValidationError::ZeroAreaFace { .. })));
    assert!(!err.is_recoverable());
}
