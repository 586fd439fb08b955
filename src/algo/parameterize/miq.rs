//! Mixed-integer quadrangulation (MIQ) parametrization.
//!
//! UV coordinates are handled as complex numbers `w = u + iv`. Around every
//! vertex the corners are grouped into wedges separated by seam edges; each
//! wedge becomes one UV vertex. Across a seam edge between the canonical face
//! `C` (smaller index) and the other face `O`,
//!
//! ```text
//! w_C = i^{-k} w_O + t        k = mismatch of C across the edge
//! ```
//!
//! with one complex translation `t` per seam edge, shared by both endpoints.
//! Walking the fan of a vertex expresses every wedge through the first one.
//! Closing the walk yields a linear constraint: the loop transition either is a
//! pure translation or has the first wedge as its fixed point (singular
//! vertices). Constraints are eliminated by substitution.
//!
//! The energy `Σ_f w_f A_f |∇w - (X1 + i X2) / h|²` is then a Hermitian form in
//! the remaining unknowns: one complex value per free vertex and the surviving
//! translations. Translations and singular vertex positions are rounded to
//! Gaussian integers, directly or one at a time. While the rounded result
//! folds, distorted faces are stiffened and the whole solve is repeated.
//!
//! # References
//!
//! - Bommes, D., Zimmer, H., & Kobbelt, L. (2009). "Mixed-integer
//!   quadrangulation." ACM SIGGRAPH.

use std::collections::BTreeMap;

use nalgebra::{Complex, DVector, Point2, Vector2, Vector3};

use super::uv::{ParametrizedMesh, SeamTranslation};
use crate::algo::cut::SeamGraph;
use crate::algo::field::{FrameField, MismatchField, SingularityField};
use crate::algo::sparse::{to_complex, HermitianSystem, SolverSettings, SymmetricSystem};
use crate::error::{Error, Result};
use crate::mesh::TriMesh;

/// Sparse complex linear form over the unknowns.
type Linear = BTreeMap<usize, Complex<f64>>;

/// Coefficients below this magnitude are dropped.
const COEFF_EPS: f64 = 1e-12;

/// Rounding distance under which an integer unknown counts as already integral.
const INTEGRAL_EPS: f64 = 1e-6;

/// How integer unknowns are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingPolicy {
    /// Round everything after one relaxed solve, then solve once more.
    Direct,
    /// Round the least ambiguous unknown and re-solve, at most
    /// `max_iterations` times.
    Iterative {
        /// Budget of re-solves.
        max_iterations: usize,
    },
}

/// Options for [`parametrize`].
#[derive(Debug, Clone)]
pub struct MiqOptions {
    /// Lattice spacing in world units. Defaults to the average edge length.
    pub target_edge_length: Option<f64>,

    /// Weight increase per unit of distortion in each stiffening pass.
    pub stiffness: f64,

    /// Maximum number of stiffening passes.
    pub stiffness_iterations: usize,

    /// Rounding strategy for the seam translations.
    pub rounding: RoundingPolicy,

    /// Whether to round seam translations at all.
    ///
    /// With `false` the continuous solution is returned; seams then carry
    /// fractional jumps.
    pub round_seams: bool,

    /// Whether singular vertices are placed on lattice points.
    ///
    /// Only takes effect together with `round_seams`.
    pub round_singularities: bool,

    /// Maximum iterations for the conjugate gradient solver.
    pub max_iterations: usize,

    /// Convergence tolerance for the CG solver.
    pub tolerance: f64,

    /// Fail with [`Error::Optimization`] when the result has folded faces.
    pub reject_folds: bool,
}

impl Default for MiqOptions {
    fn default() -> Self {
        Self {
            target_edge_length: None,
            stiffness: 5.0,
            stiffness_iterations: 5,
            rounding: RoundingPolicy::Iterative { max_iterations: 1000 },
            round_seams: true,
            round_singularities: true,
            max_iterations: 20_000,
            tolerance: 1e-10,
            reject_folds: false,
        }
    }
}

impl MiqOptions {
    /// Set the target edge length (lattice spacing).
    pub fn with_target_edge_length(mut self, length: f64) -> Self {
        self.target_edge_length = Some(length);
        self
    }

    /// Set the stiffness weight.
    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    /// Set the number of stiffening passes.
    pub fn with_stiffness_iterations(mut self, iterations: usize) -> Self {
        self.stiffness_iterations = iterations;
        self
    }

    /// Set the rounding policy.
    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    /// Round all integer unknowns at once.
    pub fn direct_rounding(self) -> Self {
        self.with_rounding(RoundingPolicy::Direct)
    }

    /// Set whether seam translations are rounded.
    pub fn with_round_seams(mut self, round: bool) -> Self {
        self.round_seams = round;
        self
    }

    /// Set whether singular vertices are rounded to lattice points.
    pub fn with_round_singularities(mut self, round: bool) -> Self {
        self.round_singularities = round;
        self
    }

    /// Set the maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set whether folded faces are an error.
    pub fn with_reject_folds(mut self, reject: bool) -> Self {
        self.reject_folds = reject;
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(h) = self.target_edge_length {
            if !(h.is_finite() && h > 0.0) {
                return Err(Error::invalid_param("target_edge_length", h, "must be positive"));
            }
        }
        if !(self.stiffness.is_finite() && self.stiffness >= 0.0) {
            return Err(Error::invalid_param("stiffness", self.stiffness, "must be non-negative"));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_param("max_iterations", 0, "must be positive"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::invalid_param("tolerance", self.tolerance, "must be positive"));
        }
        Ok(())
    }
}

/// Compute a seamless integer-grid parametrization.
///
/// `frame` must be combed consistently with `mismatch` (see
/// [`comb_frame_field`](crate::algo::field::comb_frame_field)), and `seams` must
/// cut every edge with nonzero mismatch and reach every singular vertex.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for out-of-range options or mismatched inputs
/// - [`Error::Solver`] / [`Error::ConvergenceFailed`] if a linear solve fails
/// - [`Error::Optimization`] if the rounding budget runs out, or if folds are
///   rejected; the error carries the best available result
pub fn parametrize(
    mesh: &TriMesh,
    frame: &FrameField,
    mismatch: &MismatchField,
    singularities: &SingularityField,
    seams: &SeamGraph,
    options: &MiqOptions,
) -> Result<ParametrizedMesh> {
    options.validate()?;
    let n = mesh.num_faces();
    if frame.len() != n || mismatch.values.len() != n || seams.seams.len() != n {
        return Err(Error::invalid_param("frame", frame.len(), "inputs must have one entry per face"));
    }
    if singularities.indices().len() != mesh.num_vertices() {
        return Err(Error::invalid_param(
            "singularities",
            singularities.indices().len(),
            "must have one entry per vertex",
        ));
    }
    let on_seam = seams.seam_vertices(mesh);
    if let Some(v) = singularities.singular_vertices().into_iter().find(|&v| !on_seam[v]) {
        return Err(Error::invalid_param("seams", v, "singular vertex is not cut"));
    }
    if let Some((f, _)) = mesh
        .edges()
        .find(|&(f, e)| matches!(mismatch.get(f, e), Some(k) if k != 0) && !seams.is_seam(f, e))
    {
        return Err(Error::invalid_param("seams", f, "edge with nonzero mismatch is not cut"));
    }

    let h = options
        .target_edge_length
        .unwrap_or_else(|| mesh.average_edge_length());
    let round_singularities = options.round_seams && options.round_singularities;
    let layout = Layout::build(mesh, mismatch, singularities, seams, round_singularities);
    log::debug!(
        "miq: {} uv vertices, {} seam translations, {} unknowns ({} integer)",
        layout.origin.len(),
        layout.num_translations,
        layout.columns,
        layout.integer.len()
    );

    let settings = SolverSettings {
        stage: "parametrization",
        max_iterations: options.max_iterations,
        tolerance: options.tolerance,
    };

    let integer: Vec<usize> = layout
        .integer
        .iter()
        .flat_map(|&j| [j, layout.columns + j])
        .collect();

    // Mixed-integer solves, stiffening distorted faces while the result folds.
    let mut weights = vec![1.0; n];
    let mut guess: Option<DVector<f64>> = None;
    let mut pass = 0;
    let (x, unrounded) = loop {
        let system = layout.assemble(mesh, frame, h, &weights).to_real();
        let relaxed = system.solve_constrained(&vec![None; system.dim()], guess.as_ref(), &settings)?;

        let (x, unrounded) = if options.round_seams {
            match round(&system, relaxed.clone(), &integer, options.rounding, &settings) {
                Ok(x) => (x, 0),
                Err(Rounding::Exhausted { x, unrounded }) => {
                    let degraded = layout.finish(mesh, mismatch, &x, h, unrounded);
                    log::warn!(
                        "miq: rounding budget exhausted with {} of {} integer unknowns left",
                        unrounded,
                        integer.len()
                    );
                    return Err(Error::Optimization {
                        reason: "rounding budget exhausted".to_string(),
                        unrounded,
                        degraded: Box::new(degraded),
                    });
                }
                Err(Rounding::Failed(err)) => return Err(err),
            }
        } else {
            (relaxed.clone(), integer.len())
        };

        let w = layout.evaluate(&x);
        let folded = count_folds(mesh, &layout, &w);
        if folded == 0 || options.stiffness == 0.0 || pass == options.stiffness_iterations {
            break (x, unrounded);
        }
        pass += 1;
        log::debug!("miq: stiffening pass {} with {} folded faces", pass, folded);
        for (f, weight) in weights.iter_mut().enumerate() {
            *weight += options.stiffness * distortion(mesh, frame, &layout, &w, f, h);
        }
        guess = Some(relaxed);
    };

    let result = layout.finish(mesh, mismatch, &x, h, unrounded);
    let folded = result.folded_faces();
    if !folded.is_empty() {
        log::warn!("miq: {} of {} faces fold in uv space", folded.len(), n);
        if options.reject_folds {
            return Err(Error::Optimization {
                reason: format!("{} faces fold", folded.len()),
                unrounded,
                degraded: Box::new(result),
            });
        }
    }

    Ok(result)
}

/// Failure modes of the rounding loop.
enum Rounding {
    Exhausted { x: DVector<f64>, unrounded: usize },
    Failed(Error),
}

impl From<Error> for Rounding {
    fn from(err: Error) -> Self {
        Rounding::Failed(err)
    }
}

/// Round the integer unknowns of the real system.
fn round(
    system: &SymmetricSystem,
    mut x: DVector<f64>,
    integer: &[usize],
    policy: RoundingPolicy,
    settings: &SolverSettings,
) -> std::result::Result<DVector<f64>, Rounding> {
    if integer.is_empty() {
        return Ok(x);
    }
    let mut fixed: Vec<Option<f64>> = vec![None; system.dim()];

    match policy {
        RoundingPolicy::Direct => {
            for &i in integer {
                fixed[i] = Some(x[i].round());
            }
            Ok(system.solve_constrained(&fixed, Some(&x), settings)?)
        }
        RoundingPolicy::Iterative { max_iterations } => {
            let mut iterations = 0;
            loop {
                let pending: Vec<usize> = integer.iter().copied().filter(|&i| fixed[i].is_none()).collect();
                let Some(&best) = pending.iter().min_by(|&&a, &&b| {
                    let da = (x[a] - x[a].round()).abs();
                    let db = (x[b] - x[b].round()).abs();
                    da.total_cmp(&db)
                }) else {
                    log::debug!("miq: rounded {} unknowns in {} solves", integer.len(), iterations);
                    return Ok(x);
                };
                if iterations == max_iterations {
                    return Err(Rounding::Exhausted {
                        x,
                        unrounded: pending.len(),
                    });
                }

                fixed[best] = Some(x[best].round());
                for &i in &pending {
                    if (x[i] - x[i].round()).abs() < INTEGRAL_EPS {
                        fixed[i] = Some(x[i].round());
                    }
                }
                x = system.solve_constrained(&fixed, Some(&x), settings)?;
                iterations += 1;
            }
        }
    }
}

/// Unknowns and UV vertices of the cut mesh.
struct Layout {
    /// UV vertex per face corner.
    corner_uv: Vec<[usize; 3]>,
    /// Mesh vertex per UV vertex.
    origin: Vec<usize>,
    /// Value of every UV vertex as a linear form over the columns.
    values: Vec<Linear>,
    /// Canonical `(face, edge)` of every seam translation.
    translation_edges: Vec<(usize, usize)>,
    num_translations: usize,
    /// Number of complex columns.
    columns: usize,
    /// Columns rounded to Gaussian integers.
    integer: Vec<usize>,
}

impl Layout {
    fn build(
        mesh: &TriMesh,
        mismatch: &MismatchField,
        singularities: &SingularityField,
        seams: &SeamGraph,
        round_singularities: bool,
    ) -> Self {
        // One translation per seam edge, addressable from both sides.
        let mut translation_of = vec![[usize::MAX; 3]; mesh.num_faces()];
        let mut translation_edges = Vec::new();
        for (f, e) in seams.seam_edges(mesh) {
            if let Some((g, ge)) = mesh.neighbor(f, e) {
                translation_of[f][e] = translation_edges.len();
                translation_of[g][ge] = translation_edges.len();
                translation_edges.push((f, e));
            }
        }
        let num_translations = translation_edges.len();

        let (component, count) = mesh.face_components();
        let mut pinned = vec![false; count];
        let mut next_var = num_translations;
        // Whether each variable is rounded; translations come first.
        let mut is_integer = vec![true; num_translations];
        let mut corner_uv = vec![[usize::MAX; 3]; mesh.num_faces()];
        let mut origin = Vec::new();
        let mut values = Vec::new();
        let mut constraints: Vec<Linear> = Vec::new();

        for v in 0..mesh.num_vertices() {
            let fan = mesh.fan(v);
            let m = fan.len();
            let boundary = mesh.is_boundary_vertex(v);
            // Crossing i goes from fan[i] into fan[i + 1].
            let cuts = |i: usize| {
                let next = fan[(i + 1) % m];
                seams.is_seam(next.face, next.corner)
            };
            let closes = !boundary && (0..m).any(cuts);
            let start = if closes {
                (0..m).find(|&i| cuts(i)).map_or(0, |i| (i + 1) % m)
            } else {
                0
            };

            let first = origin.len();
            let mut p = Complex::new(1.0, 0.0);
            let mut q = Linear::new();
            let mut wedges = vec![(p, q.clone())];
            corner_uv[fan[start].face][fan[start].corner] = first;

            for t in 1..m {
                let prev = fan[(start + t - 1) % m];
                let cur = fan[(start + t) % m];
                if cuts((start + t - 1) % m) {
                    let tr = translation_of[cur.face][cur.corner];
                    cross(&mut p, &mut q, mesh, mismatch, &translation_edges, tr, prev.face);
                    wedges.push((p, q.clone()));
                }
                corner_uv[cur.face][cur.corner] = first + wedges.len() - 1;
            }

            let comp = component[fan[0].face];
            let root = if closes {
                let prev = fan[(start + m - 1) % m];
                let cur = fan[start];
                let tr = translation_of[cur.face][cur.corner];
                cross(&mut p, &mut q, mesh, mismatch, &translation_edges, tr, prev.face);
                let one = Complex::new(1.0, 0.0);
                if singularities.fan_turns(v) == 0 || (one - p).norm() < 1e-9 {
                    // The loop transition is a pure translation.
                    constraints.push(q);
                    None
                } else if round_singularities {
                    // Fixed point (1 - p) X = q with X on the lattice.
                    if pinned[comp] {
                        let mut fixed_point = scaled(&q, -one);
                        fixed_point.insert(next_var, one - p);
                        constraints.push(fixed_point);
                        is_integer.push(true);
                        next_var += 1;
                        Some(Linear::from([(next_var - 1, one)]))
                    } else {
                        // Translation gauge of the component, at the origin.
                        pinned[comp] = true;
                        constraints.push(q);
                        Some(Linear::new())
                    }
                } else {
                    // Fixed point of the loop transition.
                    Some(scaled(&q, one / (one - p)))
                }
            } else {
                None
            };
            let root = root.unwrap_or_else(|| {
                let mut free = Linear::new();
                if pinned[comp] {
                    free.insert(next_var, Complex::new(1.0, 0.0));
                    is_integer.push(false);
                    next_var += 1;
                } else {
                    // Translation gauge of the component.
                    pinned[comp] = true;
                }
                free
            });

            for (p, q) in wedges {
                let mut value = scaled(&root, p);
                axpy(&mut value, Complex::new(1.0, 0.0), &q);
                values.push(value);
                origin.push(v);
            }
        }

        let eliminated = eliminate(&constraints);

        // One column per surviving variable, in variable order.
        let mut column = vec![usize::MAX; next_var];
        let mut columns = 0;
        let mut integer = Vec::new();
        for (var, col) in column.iter_mut().enumerate() {
            if !eliminated.contains_key(&var) {
                *col = columns;
                if is_integer[var] {
                    integer.push(columns);
                }
                columns += 1;
            }
        }

        let values = values
            .iter()
            .map(|value| {
                substitute(value, &eliminated)
                    .into_iter()
                    .map(|(var, c)| (column[var], c))
                    .collect()
            })
            .collect();

        Self {
            corner_uv,
            origin,
            values,
            translation_edges,
            num_translations,
            columns,
            integer,
        }
    }

    /// Assemble the Hermitian energy for the given face weights.
    fn assemble(&self, mesh: &TriMesh, frame: &FrameField, h: f64, weights: &[f64]) -> HermitianSystem {
        let mut system = HermitianSystem::new(self.columns);

        for f in 0..mesh.num_faces() {
            let grads = mesh.hat_gradients(f);
            let scale = weights[f] * mesh.area(f);
            let corners = self.corner_uv[f];

            for c in 0..3 {
                let target = Complex::new(grads[c].dot(&frame.x1[f]), grads[c].dot(&frame.x2[f])) * (scale / h);
                for (&j, &a) in &self.values[corners[c]] {
                    system.add_rhs(j, a.conj() * target);
                }

                for d in 0..3 {
                    let l = scale * grads[c].dot(&grads[d]);
                    for (&j, &a) in &self.values[corners[c]] {
                        for (&k, &b) in &self.values[corners[d]] {
                            system.add(j, k, a.conj() * b * l);
                        }
                    }
                }
            }
        }

        system
    }

    /// Complex value of every UV vertex for a real solution vector.
    fn evaluate(&self, x: &DVector<f64>) -> Vec<Complex<f64>> {
        let z = to_complex(x);
        self.values
            .iter()
            .map(|value| value.iter().map(|(&j, &a)| a * z[j]).sum())
            .collect()
    }

    /// Build the parametrized mesh for a real solution vector.
    fn finish(
        &self,
        mesh: &TriMesh,
        mismatch: &MismatchField,
        x: &DVector<f64>,
        h: f64,
        unrounded: usize,
    ) -> ParametrizedMesh {
        let w = self.evaluate(x);

        let seam_translations = self
            .translation_edges
            .iter()
            .map(|&(f, e)| {
                let k = mismatch.get(f, e).unwrap_or(0);
                let translation = mesh.neighbor(f, e).map_or(Complex::new(0.0, 0.0), |(g, ge)| {
                    // Vertex at the start of edge e in f is corner (ge + 1) of g.
                    let here = w[self.corner_uv[f][e]];
                    let there = w[self.corner_uv[g][(ge + 1) % 3]];
                    here - i_pow(k).conj() * there
                });
                SeamTranslation {
                    face: f,
                    edge: e,
                    rotation: k,
                    translation: Vector2::new(translation.re, translation.im),
                }
            })
            .collect();

        ParametrizedMesh {
            uv: w.iter().map(|c| Point2::new(c.re, c.im)).collect(),
            fuv: self.corner_uv.clone(),
            target_edge_length: h,
            seam_translations,
            unrounded,
        }
    }
}

/// Walk across a seam edge from `from_face` into the other side.
fn cross(
    p: &mut Complex<f64>,
    q: &mut Linear,
    mesh: &TriMesh,
    mismatch: &MismatchField,
    translation_edges: &[(usize, usize)],
    translation: usize,
    from_face: usize,
) {
    let (canonical, edge) = translation_edges[translation];
    let rot = i_pow(mismatch.get(canonical, edge).unwrap_or(0));
    debug_assert!(mesh.neighbor(canonical, edge).is_some());

    if from_face == canonical {
        // w_O = i^k (w_C - t)
        *p *= rot;
        *q = scaled(q, rot);
        *q.entry(translation).or_default() -= rot;
    } else {
        // w_C = i^-k w_O + t
        *p *= rot.conj();
        *q = scaled(q, rot.conj());
        *q.entry(translation).or_default() += Complex::new(1.0, 0.0);
    }
    q.retain(|_, c| c.norm() > COEFF_EPS);
}

/// Eliminate closure constraints, preferring unit pivots to keep integrality.
fn eliminate(constraints: &[Linear]) -> BTreeMap<usize, Linear> {
    let mut eliminated: BTreeMap<usize, Linear> = BTreeMap::new();

    for constraint in constraints {
        let reduced = substitute(constraint, &eliminated);
        if reduced.is_empty() {
            continue;
        }

        let unit = reduced.iter().find(|(_, c)| is_unit(c)).map(|(&v, &c)| (v, c));
        let (pivot, coeff) = match unit {
            Some(p) => p,
            None => {
                let Some((&v, &c)) = reduced
                    .iter()
                    .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
                else {
                    continue;
                };
                log::warn!("miq: non-unit pivot {} for unknown {}; integrality may be lost", c, v);
                (v, c)
            }
        };

        let mut expr = Linear::new();
        for (&v, &c) in &reduced {
            if v != pivot {
                expr.insert(v, -c / coeff);
            }
        }

        let single = BTreeMap::from([(pivot, expr.clone())]);
        for existing in eliminated.values_mut() {
            *existing = substitute(existing, &single);
        }
        eliminated.insert(pivot, expr);
    }

    eliminated
}

fn substitute(form: &Linear, eliminated: &BTreeMap<usize, Linear>) -> Linear {
    let mut out = Linear::new();
    for (&var, &c) in form {
        match eliminated.get(&var) {
            Some(expr) => axpy(&mut out, c, expr),
            None => *out.entry(var).or_default() += c,
        }
    }
    out.retain(|_, c| c.norm() > COEFF_EPS);
    out
}

fn axpy(dst: &mut Linear, a: Complex<f64>, src: &Linear) {
    for (&var, &c) in src {
        *dst.entry(var).or_default() += a * c;
    }
}

fn scaled(form: &Linear, a: Complex<f64>) -> Linear {
    form.iter().map(|(&var, &c)| (var, a * c)).collect()
}

fn is_unit(c: &Complex<f64>) -> bool {
    let (re, im) = (c.re.abs(), c.im.abs());
    ((re - 1.0).abs() < 1e-9 && im < 1e-9) || (re < 1e-9 && (im - 1.0).abs() < 1e-9)
}

/// `i^k`.
fn i_pow(k: u8) -> Complex<f64> {
    match k % 4 {
        0 => Complex::new(1.0, 0.0),
        1 => Complex::new(0.0, 1.0),
        2 => Complex::new(-1.0, 0.0),
        _ => Complex::new(0.0, -1.0),
    }
}

fn count_folds(mesh: &TriMesh, layout: &Layout, w: &[Complex<f64>]) -> usize {
    (0..mesh.num_faces())
        .filter(|&f| {
            let [a, b, c] = layout.corner_uv[f];
            let (e1, e2) = (w[b] - w[a], w[c] - w[a]);
            (e1.conj() * e2).im <= 0.0
        })
        .count()
}

/// Relative squared deviation of a face's UV gradient from its target.
fn distortion(mesh: &TriMesh, frame: &FrameField, layout: &Layout, w: &[Complex<f64>], f: usize, h: f64) -> f64 {
    let grads = mesh.hat_gradients(f);
    let corners = layout.corner_uv[f];
    let (mut grad_u, mut grad_v) = (Vector3::zeros(), Vector3::zeros());
    for c in 0..3 {
        let value = w[corners[c]];
        grad_u += grads[c] * value.re;
        grad_v += grads[c] * value.im;
    }
    let target_u = frame.x1[f] / h;
    let target_v = frame.x2[f] / h;
    ((grad_u - target_u).norm_squared() + (grad_v - target_v).norm_squared()) * h * h / 2.0
}
