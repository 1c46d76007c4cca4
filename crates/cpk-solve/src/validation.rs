// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_name::PkgNameBuf;
use cpk_spec::DepFlags;
use cpk_version::Compatibility;
use enum_dispatch::enum_dispatch;

use crate::facts::FactIndex;
use crate::state::{Choice, SearchState};

#[cfg(test)]
#[path = "./validation_test.rs"]
mod validation_test;

/// The validators every candidate must clear, in order.
pub fn default_validators() -> Vec<Validators> {
    vec![
        Validators::Requests(RequestsValidator {}),
        Validators::Conflicts(ConflictsValidator {}),
        Validators::ReverseConflicts(ReverseConflictsValidator {}),
        Validators::Reuse(ReuseValidator {}),
    ]
}

#[derive(Clone, Copy)]
#[enum_dispatch(ValidatorT)]
pub enum Validators {
    Requests(RequestsValidator),
    Conflicts(ConflictsValidator),
    ReverseConflicts(ReverseConflictsValidator),
    Reuse(ReuseValidator),
}

/// For validating a candidate selection against the current state.
#[enum_dispatch]
pub trait ValidatorT {
    /// Check whether the candidate is appropriate for the state.
    fn validate_choice(
        &self,
        state: &SearchState,
        index: &FactIndex,
        requested: &PkgNameBuf,
        candidate: &Choice,
    ) -> Compatibility;
}

/// Ensures a candidate satisfies every constraint accumulated for
/// the requested name and for the concrete provider name.
#[derive(Clone, Copy)]
pub struct RequestsValidator {}

impl ValidatorT for RequestsValidator {
    fn validate_choice(
        &self,
        state: &SearchState,
        _index: &FactIndex,
        requested: &PkgNameBuf,
        candidate: &Choice,
    ) -> Compatibility {
        for constraint in state
            .constraints_for(requested.as_str(), candidate.pkg().as_str())
            .into_iter()
        {
            let check = candidate.satisfies(constraint);
            if !&check {
                return Compatibility::incompatible(format!(
                    "{check} [{}]",
                    constraint.describe(requested.as_str())
                ));
            }
        }
        Compatibility::Compatible
    }
}

/// Enforces the candidate's own conflict declarations against the
/// compiler in use and any already-resolved dependency.
#[derive(Clone, Copy)]
pub struct ConflictsValidator {}

impl ValidatorT for ConflictsValidator {
    fn validate_choice(
        &self,
        state: &SearchState,
        index: &FactIndex,
        _requested: &PkgNameBuf,
        candidate: &Choice,
    ) -> Compatibility {
        for conflict in index
            .conflicts_for(candidate.pkg().as_str(), candidate.version())
            .into_iter()
        {
            if let Some(compiler) = &conflict.compiler {
                if compiler.is_satisfied_by(candidate.compiler()).is_ok() {
                    return Compatibility::incompatible(conflict_message(
                        conflict.msg.as_deref(),
                        format!("conflicts with compiler {compiler}"),
                    ));
                }
            }
            if let Some(dependency) = &conflict.dependency {
                if let Some(resolved) = state.choice_for(&dependency.pkg) {
                    if resolved.satisfies_request(dependency).is_ok() {
                        return Compatibility::incompatible(conflict_message(
                            conflict.msg.as_deref(),
                            format!("conflicts with {dependency}"),
                        ));
                    }
                }
            }
        }
        Compatibility::Compatible
    }
}

/// Enforces conflict declarations of already-resolved packages
/// that name the candidate as the conflicting dependency.
#[derive(Clone, Copy)]
pub struct ReverseConflictsValidator {}

impl ValidatorT for ReverseConflictsValidator {
    fn validate_choice(
        &self,
        state: &SearchState,
        index: &FactIndex,
        _requested: &PkgNameBuf,
        candidate: &Choice,
    ) -> Compatibility {
        for (name, resolved) in state.resolved.iter() {
            for conflict in index
                .conflicts_for(resolved.pkg().as_str(), resolved.version())
                .into_iter()
            {
                let Some(dependency) = &conflict.dependency else {
                    continue;
                };
                if dependency.pkg != *candidate.pkg() {
                    continue;
                }
                if candidate.satisfies_request(dependency).is_ok() {
                    return Compatibility::incompatible(conflict_message(
                        conflict.msg.as_deref(),
                        format!("{name} conflicts with {dependency}"),
                    ));
                }
            }
        }
        Compatibility::Compatible
    }
}

/// Checks that a reused spec's runtime closure can join the state:
/// reuse is enabled, no closure node contradicts a resolved one,
/// and every closure node satisfies the constraints on its name.
#[derive(Clone, Copy)]
pub struct ReuseValidator {}

impl ValidatorT for ReuseValidator {
    fn validate_choice(
        &self,
        state: &SearchState,
        _index: &FactIndex,
        _requested: &PkgNameBuf,
        candidate: &Choice,
    ) -> Compatibility {
        let Choice::Reuse(reuse) = candidate else {
            return Compatibility::Compatible;
        };
        // only the link/run closure of a reused spec is asserted;
        // its build- and test-time dependencies do not affect the
        // installed artifact
        for spec in reuse
            .spec
            .traverse()
            .skip_root()
            .with_depflag(DepFlags::LINK | DepFlags::RUN)
        {
            if let Some(existing) = state.resolved.get(spec.name().as_str()) {
                let same = match existing {
                    Choice::Reuse(existing) => existing.spec.as_ref() == spec,
                    Choice::Build(_) => false,
                };
                if !same {
                    return Compatibility::incompatible(format!(
                        "reused {} needs {}@{}, but {} is already resolved",
                        reuse.spec.name(),
                        spec.name(),
                        spec.version(),
                        existing.describe(),
                    ));
                }
            }
            for constraint in state.constraints_for(spec.name().as_str(), spec.name().as_str()) {
                let check = spec.satisfies(&constraint.to_request(spec.name()));
                if !&check {
                    return Compatibility::incompatible(format!(
                        "reused {} carries {}@{}: {check}",
                        reuse.spec.name(),
                        spec.name(),
                        spec.version(),
                    ));
                }
            }
        }
        Compatibility::Compatible
    }
}

fn conflict_message(msg: Option<&str>, fallback: String) -> String {
    match msg {
        Some(msg) => format!("{fallback}: {msg}"),
        None => fallback,
    }
}
