// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use cpk_config::SolverConfig;
use cpk_name::PkgNameBuf;
use cpk_schema::Recipe;
use cpk_spec::{DepFlags, Spec, SpecRequest};
use cpk_storage::RepositoryHandle;
use cpk_version_range::Ranged;

use crate::facts::{Fact, Program};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./setup_test.rs"]
mod setup_test;

/// Translates a request plus repository metadata into the solver's
/// fact base.
///
/// The setup gathers every package reachable from the roots through
/// declared dependencies (expanding virtuals through the provider
/// index), rejects malformed or contradictory explicit constraints
/// before any solving happens, and flattens the reuse pool into
/// reusable facts carrying only link/run edges.
pub struct SolverSetup<'a> {
    config: &'a SolverConfig,
    repos: &'a [Arc<RepositoryHandle>],
    reusable: &'a [Arc<Spec>],
}

impl<'a> SolverSetup<'a> {
    pub fn new(config: &'a SolverConfig, repos: &'a [Arc<RepositoryHandle>]) -> Self {
        Self {
            config,
            repos,
            reusable: &[],
        }
    }

    pub fn with_reusable(mut self, reusable: &'a [Arc<Spec>]) -> Self {
        self.reusable = reusable;
        self
    }

    /// Build the complete program for the given root requests.
    pub fn encode(&self, requests: &[SpecRequest]) -> Result<Program> {
        if self.config.compilers.is_empty() {
            return Err(Error::NoCompilers);
        }
        check_explicit_agreement(requests)?;

        let mut facts = Vec::new();
        for request in requests.iter() {
            facts.push(Fact::Root {
                request: request.clone(),
            });
        }
        for (index, compiler) in self.config.compilers.iter().enumerate() {
            facts.push(Fact::CompilerAvailable {
                index,
                compiler: compiler.clone(),
            });
        }
        facts.push(Fact::TargetArch {
            arch: self.config.target_arch(),
        });

        self.encode_reachable(requests, &mut facts)?;
        self.encode_reusable(&mut facts);

        Ok(Program {
            facts,
            policy: self.config.criteria.clone(),
            reuse: self.config.reuse,
            max_steps: self.config.max_steps,
        })
    }

    /// Emit metadata facts for everything reachable from the roots.
    fn encode_reachable(
        &self,
        requests: &[SpecRequest],
        facts: &mut Vec<Fact>,
    ) -> Result<()> {
        let mut queue: VecDeque<PkgNameBuf> = VecDeque::new();
        let mut seen: BTreeSet<PkgNameBuf> = BTreeSet::new();
        for request in requests.iter() {
            queue.push_back(request.pkg.clone());
            for dep in request.dependencies.iter() {
                queue.push_back(dep.pkg.clone());
            }
        }

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.read_recipe(&name) {
                Some(recipe) => {
                    self.encode_recipe(&recipe, facts);
                    for decl in recipe.depends.iter() {
                        queue.push_back(decl.pkg.clone());
                    }
                }
                None => {
                    // not a package; usable only as a virtual
                    let providers = self.providers_of(&name);
                    if providers.is_empty() {
                        return Err(if self.is_known_virtual(&name) {
                            Error::NoProviders(name.to_string())
                        } else {
                            Error::PackageNotFound(name.to_string())
                        });
                    }
                    if let Some(preferred) =
                        self.config.preferred_providers.get(name.as_str())
                    {
                        facts.push(Fact::PreferredProvider {
                            virtual_name: name.clone(),
                            pkg: preferred.clone(),
                        });
                    }
                    for provider in providers {
                        queue.push_back(provider);
                    }
                }
            }
        }
        Ok(())
    }

    /// Emit the facts for one package recipe.
    fn encode_recipe(&self, recipe: &Recipe, facts: &mut Vec<Fact>) {
        let pkg = recipe.pkg.clone();
        for (index, decl) in recipe.versions.iter().enumerate() {
            facts.push(Fact::VersionDeclared {
                pkg: pkg.clone(),
                version: decl.version.clone(),
                deprecated: decl.deprecated,
                index,
            });
        }
        for decl in recipe.variants.iter() {
            facts.push(Fact::Variant {
                pkg: pkg.clone(),
                decl: decl.clone(),
            });
        }
        for decl in recipe.depends.iter() {
            facts.push(Fact::DependsOn {
                pkg: pkg.clone(),
                when: decl.when.clone(),
                dep: decl.pkg.clone(),
                range: decl.range.clone(),
                depflag: decl.depflag,
                variants: decl.variants.clone(),
            });
        }
        for decl in recipe.conflicts.iter() {
            facts.push(Fact::Conflict {
                pkg: pkg.clone(),
                decl: decl.clone(),
            });
        }
        for decl in recipe.provides.iter() {
            facts.push(Fact::Provides {
                pkg: pkg.clone(),
                virtual_name: decl.virtual_name.clone(),
                when: decl.when.clone(),
            });
        }
        facts.push(Fact::RecipeDigest {
            pkg: pkg.clone(),
            digest: recipe.content_digest(),
        });

        if self.config.reuse {
            self.warn_patch_reuse_gap(recipe);
        }
    }

    /// Flatten the reuse pool: every node of every pool spec's
    /// runtime closure is independently offerable.
    fn encode_reusable(&self, facts: &mut Vec<Fact>) {
        if !self.config.reuse {
            return;
        }
        let mut seen = BTreeSet::new();
        for spec in self.reusable.iter() {
            let mut queue = VecDeque::from([Arc::clone(spec)]);
            while let Some(node) = queue.pop_front() {
                if !seen.insert((node.name().clone(), node.dag_hash())) {
                    continue;
                }
                for edge in node.dependencies() {
                    // build- and test-only dependencies of an already
                    // built package do not affect the installed
                    // artifact and are not asserted
                    if edge.depflag.intersects(DepFlags::LINK | DepFlags::RUN) {
                        queue.push_back(Arc::clone(&edge.spec));
                    }
                }
                facts.push(Fact::Reusable { spec: node });
            }
        }
    }

    /// Surface the known limitation around reuse and conditionally
    /// patched recipes that constrain their dependencies' variants.
    ///
    /// Patch-conditioned variant requirements on dependencies are
    /// not tracked through reused subtrees, so such combinations may
    /// concretize against stale assumptions. This is reported, never
    /// silently miscomputed.
    fn warn_patch_reuse_gap(&self, recipe: &Recipe) {
        let conditional_patches = recipe
            .patches
            .iter()
            .any(|patch| !patch.when.is_any());
        let dependency_variant_constraints = recipe
            .depends
            .iter()
            .any(|decl| !decl.variants.is_empty());
        if conditional_patches && dependency_variant_constraints {
            tracing::warn!(
                pkg = %recipe.pkg,
                "reuse with version-conditional patches may miss \
                 patch-dependent variant constraints on dependencies",
            );
        }
    }

    fn read_recipe(&self, name: &PkgNameBuf) -> Option<Arc<Recipe>> {
        self.repos
            .iter()
            .find_map(|repo| repo.read_recipe(name.as_str()).ok())
    }

    fn providers_of(&self, name: &PkgNameBuf) -> Vec<PkgNameBuf> {
        let mut providers: Vec<PkgNameBuf> = self
            .repos
            .iter()
            .flat_map(|repo| repo.providers_of(name.as_str()))
            .collect();
        providers.sort();
        providers.dedup();
        providers
    }

    fn is_known_virtual(&self, name: &PkgNameBuf) -> bool {
        self.repos.iter().any(|repo| repo.is_virtual(name.as_str()))
    }
}

/// Reject explicitly contradictory constraints before solving.
///
/// Two explicit requests for the same package whose version ranges
/// cannot intersect can never be satisfied together; this is a
/// constraint error on the input, reported with both offenders,
/// rather than an unsatisfiable solve.
fn check_explicit_agreement(requests: &[SpecRequest]) -> Result<()> {
    let mut by_name: BTreeMap<&PkgNameBuf, Vec<&SpecRequest>> = BTreeMap::new();
    for request in requests.iter() {
        by_name.entry(&request.pkg).or_default().push(request);
        for dep in request.dependencies.iter() {
            by_name.entry(&dep.pkg).or_default().push(dep);
        }
    }
    for (pkg, requests) in by_name.iter() {
        for (position, lhs) in requests.iter().enumerate() {
            for rhs in requests[position + 1..].iter() {
                let check = lhs.version.intersects(&rhs.version);
                if !&check {
                    return Err(Error::ConflictingRequests {
                        pkg: (*pkg).clone(),
                        lhs: lhs.to_string(),
                        rhs: rhs.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
