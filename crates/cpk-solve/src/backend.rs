// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use enum_dispatch::enum_dispatch;

use crate::error::UnsatReport;
use crate::facts::{AnswerSet, Program};
use crate::solvers::StepSolver;

/// What a backend produces: the chosen decision atoms, or a
/// structured account of why no choice exists.
pub type SolveResult = std::result::Result<AnswerSet, Box<UnsatReport>>;

/// The narrow seam between the concretizer and the engine that
/// searches for answer sets.
///
/// Everything a backend may consider is in the [`Program`]; the
/// setup, decoding and hashing layers are shared by (and testable
/// independently of) any backend implementation.
#[enum_dispatch]
pub trait SolveBackend {
    /// Find the best answer set for the program under its policy,
    /// or report infeasibility.
    fn solve(&self, program: &Program) -> SolveResult;
}

#[enum_dispatch(SolveBackend)]
#[derive(Clone, Copy, Debug)]
pub enum BackendImpl {
    Step(StepSolver),
}

impl Default for BackendImpl {
    fn default() -> Self {
        BackendImpl::Step(StepSolver::default())
    }
}
