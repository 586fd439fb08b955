//! End-to-end driver from a triangle mesh to a seamless parametrization.
//!
//! [`Pipeline::run`] executes every stage in order and keeps each intermediate
//! result, so callers can inspect the field, its singularities and the seams
//! next to the final UV layout.
//!
//! # Example
//!
//! ```
//! use crossfield::prelude::*;
//! use crossfield::mesh::primitives;
//! use nalgebra::Vector3;
//!
//! let mesh = primitives::square().unwrap();
//! let constraints = [DirectionConstraint::hard(0, Vector3::x())];
//!
//! let output = Pipeline::default().run(&mesh, &constraints).unwrap();
//! assert_eq!(output.singularities.count(), 0);
//! assert!(output.seams.is_empty());
//! assert_eq!(output.parametrization.num_uv_vertices(), 4);
//! ```

use crate::algo::cut::{cut_seams, SeamGraph};
use crate::algo::field::{
    comb_bisectors, comb_frame_field, compute_bisectors, compute_mismatch, detect_singularities,
    solve_frame_field, BisectorField, CombedField, DirectionConstraint, FrameField, FrameFieldOptions,
    MismatchField, SingularityField,
};
use crate::algo::parameterize::{parametrize, CorrespondenceIndex, MiqOptions, ParametrizedMesh};
use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::TriMesh;

/// Number of stages reported through [`Progress`].
const STAGES: usize = 8;

/// Options for every stage of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Frame-field design.
    pub frame: FrameFieldOptions,

    /// Global parametrization.
    pub miq: MiqOptions,

    /// Run the per-face stages on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            frame: FrameFieldOptions::default(),
            miq: MiqOptions::default(),
            parallel: true,
        }
    }
}

impl PipelineOptions {
    /// Set the frame-field options.
    pub fn with_frame(mut self, frame: FrameFieldOptions) -> Self {
        self.frame = frame;
        self
    }

    /// Set the parametrization options.
    pub fn with_miq(mut self, miq: MiqOptions) -> Self {
        self.miq = miq;
        self
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Every intermediate result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Smooth frame field.
    pub frame_field: FrameField,
    /// Canonical bisectors of the frame field.
    pub bisectors: BisectorField,
    /// Combed bisectors.
    pub combed: CombedField,
    /// Quarter-turn mismatch per edge.
    pub mismatch: MismatchField,
    /// Vertex indices.
    pub singularities: SingularityField,
    /// Cut graph.
    pub seams: SeamGraph,
    /// Frame field combed along the same tree as `combed`.
    pub combed_frame: FrameField,
    /// UV layout.
    pub parametrization: ParametrizedMesh,
    /// Vertex map between the mesh and `parametrization`.
    pub correspondence: CorrespondenceIndex,
}

/// Runs the field-to-parametrization stages.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Options used by this pipeline.
    #[inline]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run all stages on a mesh.
    ///
    /// # Errors
    ///
    /// Fails with the error of the first stage that fails. No partial output is
    /// returned, except for the degraded parametrization carried by
    /// [`Error::Optimization`](crate::error::Error::Optimization).
    pub fn run(&self, mesh: &TriMesh, constraints: &[DirectionConstraint]) -> Result<PipelineOutput> {
        self.run_with_progress(mesh, constraints, &Progress::none())
    }

    /// Run all stages, reporting each one to `progress`.
    pub fn run_with_progress(
        &self,
        mesh: &TriMesh,
        constraints: &[DirectionConstraint],
        progress: &Progress,
    ) -> Result<PipelineOutput> {
        let opts = &self.options;
        let parallel = opts.parallel;

        progress.report(0, STAGES, "frame field");
        let frame_field = solve_frame_field(mesh, constraints, &opts.frame)?;
        log::info!(
            "frame field: {} faces, {} constraints",
            mesh.num_faces(),
            constraints.len()
        );

        progress.report(1, STAGES, "bisectors");
        let bisectors = compute_bisectors(mesh, &frame_field, parallel)?;

        progress.report(2, STAGES, "combing");
        let combed = comb_bisectors(mesh, &bisectors);

        progress.report(3, STAGES, "mismatch");
        let mismatch = compute_mismatch(mesh, &combed, parallel);
        log::info!("mismatch: {} edges with nonzero mismatch", mismatch.nonzero_count(mesh));

        progress.report(4, STAGES, "singularities");
        let singularities = detect_singularities(mesh, &mismatch);
        log::info!(
            "singularities: {} singular vertices, total index {}",
            singularities.count(),
            singularities.total_index()
        );

        progress.report(5, STAGES, "seams");
        let seams = cut_seams(mesh, &combed, &singularities);
        log::info!("seams: {} seam edges", seams.num_seam_edges(mesh));

        progress.report(6, STAGES, "parametrization");
        let combed_frame = comb_frame_field(mesh, &frame_field, &combed, parallel)?;
        let parametrization = parametrize(mesh, &combed_frame, &mismatch, &singularities, &seams, &opts.miq)?;
        log::info!(
            "parametrization: {} uv vertices, {} seam translations, {} folded faces",
            parametrization.num_uv_vertices(),
            parametrization.seam_translations().len(),
            parametrization.folded_faces().len()
        );

        progress.report(7, STAGES, "correspondence");
        let correspondence = CorrespondenceIndex::build(mesh, &parametrization)?;
        progress.report(STAGES, STAGES, "done");

        Ok(PipelineOutput {
            frame_field,
            bisectors,
            combed,
            mismatch,
            singularities,
            seams,
            combed_frame,
            parametrization,
            correspondence,
        })
    }
}
