// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use cpk_hash::Digest;
use cpk_name::PkgNameBuf;
use cpk_spec::{Arch, Compiler, CompilerRequest, DepFlags, Spec, SpecRequest, VariantMap};
use cpk_version::{Compatibility, Version};
use cpk_version_range::{Ranged, VersionRange};

/// Who asked for a package to be part of the solve.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequestedBy {
    /// An explicit root request.
    CommandLine,
    /// A dependency declaration of the named package.
    DependencyOf(PkgNameBuf),
}

impl std::fmt::Display for RequestedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RequestedBy::CommandLine => f.write_str("command line"),
            RequestedBy::DependencyOf(pkg) => f.write_str(pkg.as_str()),
        }
    }
}

/// One accumulated constraint on a (possibly virtual) package name.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub range: VersionRange,
    pub variants: VariantMap,
    pub compiler: Option<CompilerRequest>,
    pub arch: Option<Arch>,
    pub requested_by: RequestedBy,
}

impl Constraint {
    pub fn from_request(request: &SpecRequest, requested_by: RequestedBy) -> Self {
        Self {
            range: request.version.clone(),
            variants: request.variants.clone(),
            compiler: request.compiler.clone(),
            arch: request.arch.clone(),
            requested_by,
        }
    }

    /// Rebuild the request form of this constraint for checks
    /// that operate on whole requests (eg spec satisfaction).
    pub fn to_request(&self, pkg: &PkgNameBuf) -> SpecRequest {
        let mut request = SpecRequest::any(pkg.clone());
        request.version = self.range.clone();
        request.variants = self.variants.clone();
        request.compiler = self.compiler.clone();
        request.arch = self.arch.clone();
        request
    }

    /// This constraint with its origin, for reporting.
    pub fn describe(&self, name: &str) -> String {
        format!(
            "{} (requested by {})",
            self.to_request(&PkgNameBuf::new(name).expect("a resolved name is always valid")),
            self.requested_by,
        )
    }
}

/// A package selection to be built from its recipe.
#[derive(Clone, Debug)]
pub struct BuildChoice {
    /// The concrete (provider) package name.
    pub pkg: PkgNameBuf,
    pub version: Version,
    pub compiler: Compiler,
    pub arch: Arch,
    pub variants: VariantMap,
    pub recipe_digest: Digest,
    /// Requested dependency names with edge flags, filled in
    /// when the choice is applied to a state.
    pub deps: Vec<(PkgNameBuf, DepFlags)>,
}

/// A package selection taken verbatim from the reuse pool.
#[derive(Clone, Debug)]
pub struct ReuseChoice {
    pub spec: Arc<Spec>,
    /// Set when this entry was asserted as part of another
    /// reused spec's subtree rather than chosen directly.
    pub subtree_of: Option<PkgNameBuf>,
}

/// The resolved selection for one package name.
#[derive(Clone, Debug)]
pub enum Choice {
    Build(BuildChoice),
    Reuse(ReuseChoice),
}

impl Choice {
    pub fn pkg(&self) -> &PkgNameBuf {
        match self {
            Choice::Build(build) => &build.pkg,
            Choice::Reuse(reuse) => reuse.spec.name(),
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            Choice::Build(build) => &build.version,
            Choice::Reuse(reuse) => reuse.spec.version(),
        }
    }

    pub fn compiler(&self) -> &Compiler {
        match self {
            Choice::Build(build) => &build.compiler,
            Choice::Reuse(reuse) => reuse.spec.compiler(),
        }
    }

    pub fn arch(&self) -> &Arch {
        match self {
            Choice::Build(build) => &build.arch,
            Choice::Reuse(reuse) => reuse.spec.arch(),
        }
    }

    pub fn variants(&self) -> &VariantMap {
        match self {
            Choice::Build(build) => &build.variants,
            Choice::Reuse(reuse) => reuse.spec.variants(),
        }
    }

    pub fn is_reuse(&self) -> bool {
        matches!(self, Choice::Reuse(_))
    }

    /// A short human form for notes and logs.
    pub fn describe(&self) -> String {
        match self {
            Choice::Build(build) => format!("{}@{}", build.pkg, build.version),
            Choice::Reuse(reuse) => format!(
                "{}@{} (reused {})",
                reuse.spec.name(),
                reuse.spec.version(),
                reuse.spec.dag_hash().short()
            ),
        }
    }

    /// Check this selection against one accumulated constraint.
    pub fn satisfies(&self, constraint: &Constraint) -> Compatibility {
        if let Choice::Reuse(reuse) = self {
            // a reused spec can answer the full request, including
            // constraints on its own (runtime) closure
            return reuse.spec.satisfies(&constraint.to_request(self.pkg()));
        }
        let version_check = constraint.range.is_applicable(self.version());
        if !&version_check {
            return version_check;
        }
        let variant_check = self.variants().satisfies(&constraint.variants);
        if !&variant_check {
            return variant_check;
        }
        if let Some(compiler) = &constraint.compiler {
            let compiler_check = compiler.is_satisfied_by(self.compiler());
            if !&compiler_check {
                return compiler_check;
            }
        }
        if let Some(arch) = &constraint.arch {
            if arch != self.arch() {
                return Compatibility::incompatible(format!(
                    "wrong arch: wanted {arch}, got {}",
                    self.arch()
                ));
            }
        }
        Compatibility::Compatible
    }

    /// Check this selection against a request fragment, as used
    /// by conflict declarations.
    pub fn satisfies_request(&self, request: &SpecRequest) -> Compatibility {
        if let Choice::Reuse(reuse) = self {
            return reuse.spec.satisfies(request);
        }
        if self.pkg() != &request.pkg {
            return Compatibility::incompatible(format!(
                "wrong package: wanted {}, got {}",
                request.pkg,
                self.pkg()
            ));
        }
        let constraint = Constraint::from_request(request, RequestedBy::CommandLine);
        self.satisfies(&constraint)
    }
}

/// The in-progress assignment of the step solver.
///
/// States are cloned at every branch point so that stepping back
/// from a dead end is a drop rather than an unwind.
#[derive(Clone, Debug, Default)]
pub struct SearchState {
    /// Resolved selections keyed by concrete package name.
    pub resolved: BTreeMap<PkgNameBuf, Choice>,
    /// The chosen provider for each resolved virtual name.
    pub bindings: BTreeMap<PkgNameBuf, PkgNameBuf>,
    /// Accumulated constraints keyed by the requested name.
    pub constraints: BTreeMap<PkgNameBuf, Vec<Constraint>>,
    /// Names awaiting resolution, in discovery order.
    pub frontier: VecDeque<PkgNameBuf>,
    /// Names that appear in explicit requests. When a virtual is
    /// resolved and one of its providers was explicitly requested,
    /// only explicitly requested providers are considered.
    pub requested_names: BTreeSet<PkgNameBuf>,
}

impl SearchState {
    /// The concrete name a requested name resolves to, following
    /// any virtual binding.
    pub fn actual_name<'a>(&'a self, name: &'a PkgNameBuf) -> &'a PkgNameBuf {
        self.bindings.get(name.as_str()).unwrap_or(name)
    }

    /// The resolved selection for a requested name, if any.
    pub fn choice_for(&self, name: &PkgNameBuf) -> Option<&Choice> {
        self.resolved.get(self.actual_name(name).as_str())
    }

    /// All constraints that apply when resolving `requested`
    /// with the concrete package `provider`.
    pub fn constraints_for<'a>(
        &'a self,
        requested: &str,
        provider: &str,
    ) -> Vec<&'a Constraint> {
        let mut all = Vec::new();
        if let Some(constraints) = self.constraints.get(requested) {
            all.extend(constraints.iter());
        }
        if provider != requested {
            if let Some(constraints) = self.constraints.get(provider) {
                all.extend(constraints.iter());
            }
        }
        all
    }

    /// Record a new constraint, scheduling the name for resolution
    /// if it has no selection yet.
    pub fn push_request(&mut self, name: PkgNameBuf, constraint: Constraint) {
        let unresolved = self.choice_for(&name).is_none();
        self.constraints
            .entry(name.clone())
            .or_default()
            .push(constraint);
        if unresolved && !self.frontier.contains(&name) {
            self.frontier.push_back(name);
        }
    }

    /// The next name needing resolution, skipping any that were
    /// resolved while queued (eg through a reused subtree).
    pub fn next_unresolved(&mut self) -> Option<PkgNameBuf> {
        while let Some(name) = self.frontier.pop_front() {
            if self.choice_for(&name).is_none() {
                return Some(name);
            }
        }
        None
    }
}
