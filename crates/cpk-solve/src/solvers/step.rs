// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use cpk_name::PkgNameBuf;
use cpk_spec::{Compiler, DepFlags, Spec, VariantMap};
use cpk_version::Version;
use cpk_version_range::{Ranged, VersionRange};

#[cfg(test)]
#[path = "./step_test.rs"]
mod step_test;

use crate::backend::{SolveBackend, SolveResult};
use crate::error::{Note, UnsatReport};
use crate::facts::{AnswerSet, Attr, Fact, FactIndex, Program, VersionEntry};
use crate::policy::{sort_candidates, Score, ScoredCandidate};
use crate::state::{
    BuildChoice, Choice, Constraint, RequestedBy, ReuseChoice, SearchState,
};
use crate::validation::{default_validators, ValidatorT, Validators};

/// A depth-first, backtracking answer-set search.
///
/// Each unresolved name is assigned the best candidate admitted by
/// the validators, in the order given by the policy comparator;
/// exhausting a name's candidates steps back to the previous
/// decision. The first complete assignment wins, which realizes the
/// policy as a node-local lexicographic preference (parents are
/// decided before the dependencies they introduce).
#[derive(Clone, Copy, Debug, Default)]
pub struct StepSolver {}

impl SolveBackend for StepSolver {
    fn solve(&self, program: &Program) -> SolveResult {
        let index = FactIndex::build(program);
        let mut search = Search {
            program,
            index: &index,
            validators: default_validators(),
            steps: 0,
        };

        let mut state = SearchState::default();
        for request in index.roots.iter() {
            state.requested_names.insert(request.pkg.clone());
            for dep in request.dependencies.iter() {
                state.requested_names.insert(dep.pkg.clone());
            }
        }
        for request in index.roots.iter() {
            state.push_request(
                request.pkg.clone(),
                Constraint::from_request(request, RequestedBy::CommandLine),
            );
            for dep in request.dependencies.iter() {
                state.push_request(
                    dep.pkg.clone(),
                    Constraint::from_request(dep, RequestedBy::CommandLine),
                );
            }
        }

        match search.solve_from(state) {
            Ok(done) => Ok(emit_answer(&done)),
            Err(DeadEnd::OutOfOptions(report)) | Err(DeadEnd::Halted(report)) => {
                Err(Box::new(report))
            }
        }
    }
}

enum DeadEnd {
    /// Every candidate for some name was tried and rejected.
    OutOfOptions(UnsatReport),
    /// The step bound was reached; infeasibility is unproven.
    Halted(UnsatReport),
}

struct Search<'a> {
    program: &'a Program,
    index: &'a FactIndex<'a>,
    validators: Vec<Validators>,
    steps: u64,
}

impl Search<'_> {
    fn solve_from(&mut self, mut state: SearchState) -> Result<SearchState, DeadEnd> {
        let Some(name) = state.next_unresolved() else {
            return Ok(state);
        };
        tracing::debug!(pkg = %name, "resolving");

        let (candidates, mut notes) = self.enumerate(&state, &name);
        for candidate in candidates {
            self.steps += 1;
            if self.program.max_steps > 0 && self.steps > self.program.max_steps {
                return Err(DeadEnd::Halted(self.report(&state, &name, notes, true)));
            }

            let compat = self
                .validators
                .iter()
                .map(|validator| validator.validate_choice(&state, self.index, &name, &candidate))
                .find(|check| !check.is_ok());
            if let Some(failed) = compat {
                tracing::trace!(candidate = %candidate.describe(), reason = %failed, "rejected");
                notes.push(Note {
                    candidate: candidate.describe(),
                    reason: failed.message().to_string(),
                });
                continue;
            }

            let mut next = state.clone();
            if let Err(reason) = self.apply(&mut next, &name, &candidate) {
                notes.push(Note {
                    candidate: candidate.describe(),
                    reason,
                });
                continue;
            }
            tracing::debug!(pkg = %name, candidate = %candidate.describe(), "selected");

            match self.solve_from(next) {
                Ok(done) => return Ok(done),
                Err(DeadEnd::Halted(report)) => return Err(DeadEnd::Halted(report)),
                Err(DeadEnd::OutOfOptions(dead_end)) => {
                    tracing::debug!(pkg = %name, candidate = %candidate.describe(), "stepping back");
                    notes.push(Note {
                        candidate: candidate.describe(),
                        reason: format!("leads to a dead end: out of options for {}", dead_end.pkg),
                    });
                    continue;
                }
            }
        }

        Err(DeadEnd::OutOfOptions(self.report(&state, &name, notes, false)))
    }

    fn report(
        &self,
        state: &SearchState,
        name: &PkgNameBuf,
        notes: Vec<Note>,
        inconclusive: bool,
    ) -> UnsatReport {
        let requested = state
            .constraints_for(name.as_str(), name.as_str())
            .into_iter()
            .map(|constraint| constraint.describe(name.as_str()))
            .collect();
        UnsatReport {
            pkg: name.clone(),
            requested,
            notes,
            inconclusive,
        }
    }

    /// All viable candidates for a name, best first, plus notes
    /// for anything dropped during enumeration.
    fn enumerate(&self, state: &SearchState, name: &PkgNameBuf) -> (Vec<Choice>, Vec<Note>) {
        let mut notes = Vec::new();
        let mut scored: Vec<ScoredCandidate> = Vec::new();

        let is_virtual = self.index.is_virtual(name.as_str());
        let mut providers: Vec<PkgNameBuf> = if is_virtual {
            self.index
                .providers
                .get(name.as_str())
                .map(|providers| providers.iter().map(|p| (*p).clone()).collect())
                .unwrap_or_default()
        } else {
            vec![name.clone()]
        };
        if is_virtual {
            // an explicitly requested provider, eg `^mpich` against a
            // dependency on `mpi`, preempts all other providers
            let explicit: Vec<_> = providers
                .iter()
                .filter(|p| state.requested_names.contains(p.as_str()))
                .cloned()
                .collect();
            if !explicit.is_empty() {
                providers = explicit;
            }
        }

        for provider in providers {
            let preferred = !is_virtual
                || self.index.preferred_providers.get(name.as_str())
                    == Some(&&provider);

            if let Some(existing) = state.resolved.get(provider.as_str()) {
                // the provider is already part of the solution (eg
                // through a reused subtree); the only way to answer
                // this request with it is to accept it as-is
                scored.push(ScoredCandidate {
                    choice: existing.clone(),
                    score: Score {
                        version_rank: 0,
                        is_reuse: existing.is_reuse(),
                        has_default_variants: true,
                        is_preferred_provider: preferred,
                        is_default_compiler: true,
                    },
                });
                continue;
            }

            let Some(entries) = self.index.versions.get(provider.as_str()) else {
                notes.push(Note {
                    candidate: provider.to_string(),
                    reason: "no versions declared".to_string(),
                });
                continue;
            };
            let constraints = state.constraints_for(name.as_str(), provider.as_str());

            let compilers = match self.eligible_compilers(&constraints) {
                Ok(compilers) => compilers,
                Err(reason) => {
                    notes.push(Note {
                        candidate: provider.to_string(),
                        reason,
                    });
                    continue;
                }
            };
            let arch = constraints
                .iter()
                .find_map(|constraint| constraint.arch.clone())
                .or_else(|| self.index.arch.cloned());
            let Some(arch) = arch else {
                notes.push(Note {
                    candidate: provider.to_string(),
                    reason: "no target architecture fact".to_string(),
                });
                continue;
            };

            let mut entries: Vec<&VersionEntry> = entries.iter().collect();
            entries.sort_by(|a, b| b.version.cmp(a.version).then(a.index.cmp(&b.index)));

            for (rank, entry) in entries.iter().enumerate() {
                if entry.deprecated && !pinned_exactly(&constraints, entry.version) {
                    notes.push(Note {
                        candidate: format!("{provider}@{}", entry.version),
                        reason: "version is deprecated (and not requested exactly)".to_string(),
                    });
                    continue;
                }
                let (variants, has_default_variants) =
                    match self.assign_variants(&provider, entry.version, &constraints) {
                        Ok(assigned) => assigned,
                        Err(reason) => {
                            notes.push(Note {
                                candidate: format!("{provider}@{}", entry.version),
                                reason,
                            });
                            continue;
                        }
                    };
                let Some(recipe_digest) =
                    self.index.recipe_digests.get(provider.as_str()).copied()
                else {
                    notes.push(Note {
                        candidate: provider.to_string(),
                        reason: "no recipe digest fact".to_string(),
                    });
                    break;
                };
                for compiler in compilers.iter() {
                    let default_compiler = self
                        .index
                        .compilers
                        .first()
                        .is_some_and(|first| *first == compiler);
                    scored.push(ScoredCandidate {
                        choice: Choice::Build(BuildChoice {
                            pkg: provider.clone(),
                            version: entry.version.clone(),
                            compiler: compiler.clone(),
                            arch: arch.clone(),
                            variants: variants.clone(),
                            recipe_digest,
                            deps: Vec::new(),
                        }),
                        score: Score {
                            version_rank: rank as u64,
                            is_reuse: false,
                            has_default_variants,
                            is_preferred_provider: preferred,
                            is_default_compiler: default_compiler,
                        },
                    });
                }
            }

            if self.program.reuse {
                for spec in self
                    .index
                    .reusable
                    .get(provider.as_str())
                    .into_iter()
                    .flatten()
                {
                    let version_rank = entries
                        .iter()
                        .position(|entry| entry.version == spec.version())
                        .unwrap_or(entries.len()) as u64;
                    let has_default_variants = self
                        .assign_variants(&provider, spec.version(), &[])
                        .map(|(defaults, _)| defaults == *spec.variants())
                        .unwrap_or(false);
                    scored.push(ScoredCandidate {
                        choice: Choice::Reuse(ReuseChoice {
                            spec: Arc::clone(spec),
                            subtree_of: None,
                        }),
                        score: Score {
                            version_rank,
                            is_reuse: true,
                            has_default_variants,
                            is_preferred_provider: preferred,
                            is_default_compiler: self
                                .index
                                .compilers
                                .first()
                                .is_some_and(|first| *first == spec.compiler()),
                        },
                    });
                }
            }
        }

        sort_candidates(&self.program.policy, &mut scored);
        (scored.into_iter().map(|c| c.choice).collect(), notes)
    }

    /// The configured toolchains admitted by every compiler
    /// constraint, in configuration (preference) order.
    fn eligible_compilers(&self, constraints: &[&Constraint]) -> Result<Vec<Compiler>, String> {
        if self.index.compilers.is_empty() {
            return Err("no compiler toolchains configured".to_string());
        }
        let eligible: Vec<Compiler> = self
            .index
            .compilers
            .iter()
            .filter(|compiler| {
                constraints.iter().all(|constraint| match &constraint.compiler {
                    Some(request) => request.is_satisfied_by(compiler).is_ok(),
                    None => true,
                })
            })
            .map(|compiler| (*compiler).clone())
            .collect();
        if eligible.is_empty() {
            let wanted: Vec<_> = constraints
                .iter()
                .filter_map(|constraint| constraint.compiler.as_ref())
                .map(|request| format!("%{request}"))
                .collect();
            return Err(format!(
                "no configured compiler satisfies {}",
                wanted.join(" and ")
            ));
        }
        Ok(eligible)
    }

    /// Pin every variant that exists at this version: constrained
    /// values are validated against the variant domain, everything
    /// else takes its declared default.
    fn assign_variants(
        &self,
        pkg: &PkgNameBuf,
        version: &Version,
        constraints: &[&Constraint],
    ) -> Result<(VariantMap, bool), String> {
        let decls = self.index.variants_for(pkg.as_str(), version);

        let mut merged = VariantMap::default();
        for constraint in constraints.iter() {
            let check = merged.merge(&constraint.variants);
            if !&check {
                return Err(check.message().to_string());
            }
        }
        for (requested, _) in merged.iter() {
            if !decls.iter().any(|decl| decl.name == *requested) {
                return Err(format!(
                    "{pkg}@{version} has no variant {requested}"
                ));
            }
        }

        let mut assigned = VariantMap::default();
        let mut all_default = true;
        for decl in decls.iter() {
            match merged.get(decl.name.as_str()) {
                None => {
                    assigned.insert(decl.name.clone(), decl.default_value());
                }
                Some(value) => {
                    let check = decl.allows(value);
                    if !&check {
                        return Err(check.message().to_string());
                    }
                    if *value != decl.default_value() {
                        all_default = false;
                    }
                    assigned.insert(decl.name.clone(), value.clone());
                }
            }
        }
        Ok((assigned, all_default))
    }

    /// Commit a candidate to the state: bind the provider, record
    /// the selection, and queue its dependencies.
    fn apply(
        &self,
        state: &mut SearchState,
        requested: &PkgNameBuf,
        candidate: &Choice,
    ) -> Result<(), String> {
        let provider = candidate.pkg().clone();
        if provider != *requested {
            state.bindings.insert(requested.clone(), provider.clone());
        }
        match candidate {
            Choice::Build(build) => {
                let mut build = build.clone();
                for fact in self
                    .index
                    .depends_for(provider.as_str(), &build.version)
                {
                    let Fact::DependsOn {
                        dep,
                        range,
                        depflag,
                        variants,
                        ..
                    } = fact
                    else {
                        continue;
                    };
                    build.deps.push((dep.clone(), *depflag));
                    let constraint = Constraint {
                        range: range.clone(),
                        variants: variants.clone(),
                        compiler: None,
                        arch: None,
                        requested_by: RequestedBy::DependencyOf(provider.clone()),
                    };
                    if let Some(existing) = state.choice_for(dep) {
                        let check = existing.satisfies(&constraint);
                        if !&check {
                            return Err(format!(
                                "needs {dep}, but the resolved {} does not satisfy it: {check}",
                                existing.describe(),
                            ));
                        }
                        state
                            .constraints
                            .entry(dep.clone())
                            .or_default()
                            .push(constraint);
                    } else {
                        state.push_request(dep.clone(), constraint);
                    }
                }
                state.resolved.insert(provider, Choice::Build(build));
            }
            Choice::Reuse(reuse) => {
                // assert the runtime closure of the reused spec;
                // consistency was checked by the reuse validator
                for spec in runtime_closure(&reuse.spec) {
                    let name = spec.name().clone();
                    if state.resolved.contains_key(name.as_str()) {
                        continue;
                    }
                    let subtree_of =
                        (name != provider).then(|| provider.clone());
                    state.resolved.insert(
                        name,
                        Choice::Reuse(ReuseChoice { spec, subtree_of }),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Whether any constraint pins this exact version with `=`.
///
/// Deprecated versions stay resolvable, but only when named
/// exactly rather than matched by a range.
fn pinned_exactly(constraints: &[&Constraint], version: &Version) -> bool {
    constraints.iter().any(|constraint| {
        constraint.range.rules().iter().any(|rule| match rule {
            VersionRange::Equals(eq) => &eq.version == version,
            _ => false,
        })
    })
}

/// The spec and its link/run closure, as shared handles.
fn runtime_closure(spec: &Arc<Spec>) -> Vec<Arc<Spec>> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([Arc::clone(spec)]);
    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.name().clone()) {
            continue;
        }
        for edge in node.dependencies() {
            if edge.depflag.intersects(DepFlags::LINK | DepFlags::RUN) {
                queue.push_back(Arc::clone(&edge.spec));
            }
        }
        out.push(node);
    }
    out
}

/// Render a completed assignment as decision atoms.
fn emit_answer(state: &SearchState) -> AnswerSet {
    let mut attrs = Vec::new();
    for (name, choice) in state.resolved.iter() {
        attrs.push(Attr::Node { pkg: name.clone() });
        attrs.push(Attr::Version {
            pkg: name.clone(),
            version: choice.version().clone(),
        });
        attrs.push(Attr::CompilerChoice {
            pkg: name.clone(),
            compiler: choice.compiler().clone(),
        });
        attrs.push(Attr::ArchChoice {
            pkg: name.clone(),
            arch: choice.arch().clone(),
        });
        for (variant, value) in choice.variants().iter() {
            attrs.push(Attr::VariantChoice {
                pkg: name.clone(),
                variant: variant.clone(),
                value: value.clone(),
            });
        }
        match choice {
            Choice::Build(build) => {
                attrs.push(Attr::RecipeDigest {
                    pkg: name.clone(),
                    digest: build.recipe_digest,
                });
                // several declarations of the same dependency merge
                // into one edge, as they do on the concrete spec
                let mut edges: std::collections::BTreeMap<&PkgNameBuf, DepFlags> =
                    Default::default();
                for (dep, depflag) in build.deps.iter() {
                    *edges.entry(state.actual_name(dep)).or_default() |= *depflag;
                }
                for (dep, depflag) in edges {
                    attrs.push(Attr::DependsOn {
                        pkg: name.clone(),
                        dep: dep.clone(),
                        depflag,
                    });
                }
            }
            Choice::Reuse(reuse) => {
                attrs.push(Attr::RecipeDigest {
                    pkg: name.clone(),
                    digest: reuse.spec.recipe_digest(),
                });
                attrs.push(Attr::Reused {
                    pkg: name.clone(),
                    dag_hash: reuse.spec.dag_hash(),
                });
                for edge in reuse.spec.dependencies() {
                    if !edge
                        .depflag
                        .intersects(DepFlags::LINK | DepFlags::RUN)
                    {
                        continue;
                    }
                    attrs.push(Attr::DependsOn {
                        pkg: name.clone(),
                        dep: edge.spec.name().clone(),
                        depflag: edge
                            .depflag
                            .intersection(DepFlags::LINK | DepFlags::RUN),
                    });
                }
            }
        }
    }
    for (virtual_name, provider) in state.bindings.iter() {
        attrs.push(Attr::ProviderChosen {
            virtual_name: virtual_name.clone(),
            pkg: provider.clone(),
        });
    }
    AnswerSet::new(attrs)
}
