// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_hash::Digest;
use cpk_name::PkgNameBuf;
use cpk_version::{Compatibility, Version};
use cpk_version_range::Ranged;

use crate::{Arch, Compiler, DepFlags, SpecRequest, Traversal, VariantMap};

#[cfg(test)]
#[path = "./spec_test.rs"]
mod spec_test;

/// One typed edge of a concrete dependency graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepEdge {
    pub spec: Arc<Spec>,
    pub depflag: DepFlags,
}

/// Spec is one fully pinned node of a dependency graph.
///
/// Specs are only created by concretization and are immutable
/// afterwards; every field holds a single resolved value and every
/// dependency edge points at another concrete spec. The graph below
/// a spec is acyclic and contains at most one node per package name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Spec {
    pub(crate) pkg: PkgNameBuf,
    pub(crate) version: Version,
    pub(crate) compiler: Compiler,
    pub(crate) arch: Arch,
    pub(crate) variants: VariantMap,
    pub(crate) recipe_digest: Digest,
    pub(crate) dependencies: Vec<DepEdge>,
}

impl Spec {
    pub fn new(
        pkg: PkgNameBuf,
        version: Version,
        compiler: Compiler,
        arch: Arch,
        variants: VariantMap,
        recipe_digest: Digest,
    ) -> Self {
        Self {
            pkg,
            version,
            compiler,
            arch,
            variants,
            recipe_digest,
            dependencies: Vec::new(),
        }
    }

    pub fn name(&self) -> &PkgNameBuf {
        &self.pkg
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    pub fn variants(&self) -> &VariantMap {
        &self.variants
    }

    pub fn recipe_digest(&self) -> Digest {
        self.recipe_digest
    }

    pub fn dependencies(&self) -> &[DepEdge] {
        &self.dependencies
    }

    /// Find the direct dependency edge for the named package.
    pub fn get_dependency(&self, name: &str) -> Option<&DepEdge> {
        self.dependencies.iter().find(|edge| edge.spec.pkg == *name)
    }

    /// Attach a dependency edge to this spec.
    ///
    /// The same package may be added more than once only with an
    /// identical spec; the edge flags are then combined. A different
    /// spec under an existing name violates the one-node-per-name
    /// invariant and is rejected.
    pub fn add_dependency(&mut self, spec: Arc<Spec>, depflag: DepFlags) -> crate::Result<()> {
        for edge in self.dependencies.iter_mut() {
            if edge.spec.pkg != spec.pkg {
                continue;
            }
            if edge.spec == spec {
                edge.depflag |= depflag;
                return Ok(());
            }
            return Err(crate::Error::ConflictingDependency {
                pkg: spec.pkg.clone(),
                existing: edge.spec.ident(),
                given: spec.ident(),
            });
        }
        self.dependencies.push(DepEdge { spec, depflag });
        Ok(())
    }

    /// A human-oriented identifier for this node: name, version
    /// and the short form of its canonical hash.
    pub fn ident(&self) -> String {
        format!(
            "{}@{}/{}",
            self.pkg,
            self.version,
            self.dag_hash().short()
        )
    }

    /// Walk this spec and its dependency closure depth-first.
    ///
    /// The walk is deterministic for a given graph: edges are visited
    /// in package-name order regardless of insertion order, and each
    /// package appears at most once.
    pub fn traverse(&self) -> Traversal<'_> {
        Traversal::new(self)
    }

    /// Check whether this spec satisfies the given request.
    ///
    /// Unset request fields match anything. Dependency constraints
    /// are checked against this node's link/run closure.
    pub fn satisfies(&self, request: &SpecRequest) -> Compatibility {
        if self.pkg != request.pkg {
            return Compatibility::incompatible(format!(
                "wrong package: wanted {}, got {}",
                request.pkg, self.pkg
            ));
        }
        let version_check = request.version.is_applicable(&self.version);
        if !&version_check {
            return version_check;
        }
        if let Some(compiler) = &request.compiler {
            let compiler_check = compiler.is_satisfied_by(&self.compiler);
            if !&compiler_check {
                return compiler_check;
            }
        }
        if let Some(arch) = &request.arch {
            if arch != &self.arch {
                return Compatibility::incompatible(format!(
                    "wrong arch: wanted {arch}, got {}",
                    self.arch
                ));
            }
        }
        let variant_check = self.variants.satisfies(&request.variants);
        if !&variant_check {
            return variant_check;
        }
        for dep_request in request.dependencies.iter() {
            let found = self
                .traverse()
                .skip_root()
                .with_depflag(DepFlags::LINK | DepFlags::RUN)
                .find(|spec| spec.pkg == dep_request.pkg);
            match found {
                None => {
                    return Compatibility::incompatible(format!(
                        "does not depend on {}",
                        dep_request.pkg
                    ));
                }
                Some(spec) => {
                    let check = spec.satisfies(dep_request);
                    if !&check {
                        return Compatibility::incompatible(format!(
                            "dependency {} is incompatible: {check}",
                            dep_request.pkg
                        ));
                    }
                }
            }
        }
        Compatibility::Compatible
    }
}

impl std::fmt::Display for Spec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}%{}", self.pkg, self.version, self.compiler)?;
        if !self.variants.is_empty() {
            let rendered = self.variants.to_string();
            if !rendered.starts_with(['+', '~']) {
                write!(f, " {rendered}")?;
            } else {
                f.write_str(&rendered)?;
            }
        }
        write!(f, " arch={}", self.arch)
    }
}
