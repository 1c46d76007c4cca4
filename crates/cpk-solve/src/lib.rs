// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! The cpk concretizer.
//!
//! A [`Solver`] takes abstract requests, repositories of recipes and
//! an optional pool of already-built specs, and produces a
//! [`Solution`] of fully pinned, content-addressed concrete specs —
//! or a structured account of why none exists.
//!
//! The solve itself runs behind a narrow seam: setup translates
//! everything into a typed fact [`Program`], a [`SolveBackend`]
//! chooses an [`AnswerSet`], and the decoder turns the chosen atoms
//! back into spec graphs. Backends are swappable without touching
//! setup, decoding or hashing.

mod backend;
mod decode;
mod error;
mod facts;
mod macros;
mod policy;
mod setup;
mod solution;
mod solvers;
mod state;
mod validation;

pub use backend::{BackendImpl, SolveBackend, SolveResult};
pub use decode::{decode, verify_answer_covers};
pub use error::{Error, Note, Result, UnsatReport};
pub use facts::{AnswerSet, Attr, Fact, FactIndex, Program};
pub use setup::SolverSetup;
pub use solution::{PackageSource, SolvedRequest, Solution};
pub use solvers::StepSolver;

// Re-exported for use by the fixture macros.
#[doc(hidden)]
pub use {cpk_schema, cpk_storage, tracing};

use std::sync::Arc;

use cpk_config::SolverConfig;
use cpk_spec::{Spec, SpecRequest};
use cpk_storage::RepositoryHandle;

#[cfg(test)]
#[path = "./solver_test.rs"]
mod solver_test;

/// The concretizer's front door.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
    repos: Vec<Arc<RepositoryHandle>>,
    requests: Vec<SpecRequest>,
    reusable: Vec<Arc<Spec>>,
    backend: BackendImpl,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Swap the solve backend used by this solver.
    pub fn with_backend(mut self, backend: BackendImpl) -> Self {
        self.backend = backend;
        self
    }

    /// Return the configuration the solver was built with.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Add a repository where the solver can find recipes.
    pub fn add_repository<R>(&mut self, repo: R)
    where
        R: Into<Arc<RepositoryHandle>>,
    {
        self.repos.push(repo.into());
    }

    /// Add a request to be resolved.
    pub fn add_request(&mut self, request: SpecRequest) {
        self.requests.push(request);
    }

    /// Offer an already-built spec for reuse.
    ///
    /// Reuse is advisory: the solver may still build a different
    /// version when that scores better under the configured policy.
    pub fn add_reusable(&mut self, spec: Arc<Spec>) {
        self.reusable.push(spec);
    }

    /// Forget all requests and reusable specs, keeping the
    /// repositories and configuration.
    pub fn reset(&mut self) {
        self.requests.clear();
        self.reusable.clear();
    }

    /// Run the solver as configured.
    pub fn solve(&self) -> Result<Solution> {
        let (_, _, solution) = self.solve_full()?;
        Ok(solution)
    }

    /// Run the solver, also returning the encoded program and the
    /// raw answer set for inspection and cross-checking.
    pub fn solve_full(&self) -> Result<(Program, AnswerSet, Solution)> {
        let program = SolverSetup::new(&self.config, &self.repos)
            .with_reusable(&self.reusable)
            .encode(&self.requests)?;
        tracing::debug!(facts = program.facts.len(), "program encoded");
        let answer = self.backend.solve(&program)?;
        let solution = decode(&program, &answer)?;
        // the decoder and backend derive their views independently;
        // any divergence is a bug in one of them
        #[cfg(debug_assertions)]
        if let Err(message) = verify_answer_covers(&solution, &answer) {
            panic!("solver self-check failed: {message}");
        }
        Ok((program, answer, solution))
    }
}
