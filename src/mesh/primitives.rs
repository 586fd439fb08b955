//! Procedural meshes.
//!
//! Small closed and open surfaces of known topology, handy for experiments,
//! benchmarks and for checking index theorems.

use std::f64::consts::PI;

use nalgebra::Point3;

use super::builder::build_from_triangles;
use super::trimesh::TriMesh;
use crate::error::{Error, Result};

/// Unit square in the XY plane split along its diagonal into two triangles.
pub fn square() -> Result<TriMesh> {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]])
}

/// `n × n` grid of unit cells in the XY plane, two triangles per cell.
pub fn grid(n: usize) -> Result<TriMesh> {
    if n == 0 {
        return Err(Error::invalid_param("n", n, "grid needs at least one cell"));
    }

    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces)
}

/// Regular tetrahedron-like closed mesh with four faces.
pub fn tetrahedron() -> Result<TriMesh> {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 1.0, 0.0),
        Point3::new(0.5, 0.5, 1.0),
    ];
    build_from_triangles(&vertices, &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]])
}

/// Icosahedron inscribed in the unit sphere, outward oriented.
pub fn icosahedron() -> Result<TriMesh> {
    let t = (1.0 + 5f64.sqrt()) / 2.0;
    let raw = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ];
    let vertices: Vec<Point3<f64>> = raw
        .iter()
        .map(|&[x, y, z]| Point3::from(Point3::new(x, y, z).coords.normalize()))
        .collect();

    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    build_from_triangles(&vertices, &faces)
}

/// Torus of revolution with `major` segments around the axis and `minor`
/// segments around the tube.
pub fn torus(major: usize, minor: usize) -> Result<TriMesh> {
    if major < 3 || minor < 3 {
        return Err(Error::invalid_param(
            "segments",
            major.min(minor),
            "torus needs at least 3 segments in each direction",
        ));
    }

    let (big_r, small_r) = (2.0, 0.7);
    let mut vertices = Vec::with_capacity(major * minor);
    for i in 0..major {
        let theta = 2.0 * PI * i as f64 / major as f64;
        for j in 0..minor {
            let phi = 2.0 * PI * j as f64 / minor as f64;
            let ring = big_r + small_r * phi.cos();
            vertices.push(Point3::new(ring * theta.cos(), ring * theta.sin(), small_r * phi.sin()));
        }
    }

    let idx = |i: usize, j: usize| (i % major) * minor + (j % minor);
    let mut faces = Vec::with_capacity(2 * major * minor);
    for i in 0..major {
        for j in 0..minor {
            let a = idx(i, j);
            let b = idx(i + 1, j);
            let c = idx(i + 1, j + 1);
            let d = idx(i, j + 1);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }

    build_from_triangles(&vertices, &faces)
}

/// Open cylinder (two boundary loops) of unit radius and height `rings - 1`.
pub fn cylinder(segments: usize, rings: usize) -> Result<TriMesh> {
    if segments < 3 || rings < 2 {
        return Err(Error::invalid_param(
            "segments",
            segments,
            "cylinder needs at least 3 segments and 2 rings",
        ));
    }

    let mut vertices = Vec::with_capacity(segments * rings);
    for k in 0..rings {
        for i in 0..segments {
            let theta = 2.0 * PI * i as f64 / segments as f64;
            vertices.push(Point3::new(theta.cos(), theta.sin(), k as f64));
        }
    }

    let idx = |k: usize, i: usize| k * segments + (i % segments);
    let mut faces = Vec::with_capacity(2 * segments * (rings - 1));
    for k in 0..rings - 1 {
        for i in 0..segments {
            let a = idx(k, i);
            let b = idx(k, i + 1);
            let c = idx(k + 1, i + 1);
            let d = idx(k + 1, i);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }

    build_from_triangles(&vertices, &faces)
}
