// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::BTreeMap;
use std::sync::Arc;

use cpk_config::OptimizationCriterion;
use cpk_hash::Digest;
use cpk_name::PkgNameBuf;
use cpk_schema::{ConflictDecl, VariantDecl};
use cpk_spec::{Arch, Compiler, DepFlags, Spec, SpecRequest, VariantMap, VariantValue};
use cpk_version::Version;
use cpk_version_range::VersionRange;

#[cfg(test)]
#[path = "./facts_test.rs"]
mod facts_test;

/// One atom of the solver's input fact base.
///
/// Facts are the complete translation of a request plus repository
/// metadata; a backend reasons over these and nothing else.
#[derive(Clone, Debug)]
pub enum Fact {
    /// A root request to be resolved.
    Root { request: SpecRequest },
    /// `pkg` declares the given installable version.
    VersionDeclared {
        pkg: PkgNameBuf,
        version: Version,
        deprecated: bool,
        /// position in the recipe's declaration order
        index: usize,
    },
    /// `pkg` (at versions in `when`) depends on `dep`.
    DependsOn {
        pkg: PkgNameBuf,
        when: VersionRange,
        /// the depended-upon name, possibly virtual
        dep: PkgNameBuf,
        range: VersionRange,
        depflag: DepFlags,
        variants: VariantMap,
    },
    /// `pkg` declares a variant (for versions in the decl's `when`).
    Variant { pkg: PkgNameBuf, decl: VariantDecl },
    /// `pkg` excludes some combination outright.
    Conflict { pkg: PkgNameBuf, decl: ConflictDecl },
    /// `pkg` (at versions in `when`) provides a virtual capability.
    Provides {
        pkg: PkgNameBuf,
        virtual_name: PkgNameBuf,
        when: VersionRange,
    },
    /// A compiler toolchain available on the target host,
    /// in preference order.
    CompilerAvailable { index: usize, compiler: Compiler },
    /// The architecture nodes are concretized for.
    TargetArch { arch: Arch },
    /// The configured provider for a virtual, if any.
    PreferredProvider {
        virtual_name: PkgNameBuf,
        pkg: PkgNameBuf,
    },
    /// The content digest of the recipe for `pkg`.
    RecipeDigest { pkg: PkgNameBuf, digest: Digest },
    /// An already-built spec the solver may reuse verbatim.
    Reusable { spec: Arc<Spec> },
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Fact::Root { request } => write!(f, "root({:?}).", request.to_string()),
            Fact::VersionDeclared {
                pkg,
                version,
                deprecated,
                index,
            } => {
                write!(
                    f,
                    "version_declared({:?}, {:?}, {index})",
                    pkg.as_str(),
                    version.to_string()
                )?;
                if *deprecated {
                    write!(f, " % deprecated")?;
                }
                f.write_str(".")
            }
            Fact::DependsOn {
                pkg,
                when,
                dep,
                range,
                depflag,
                ..
            } => write!(
                f,
                "depends_on({:?}, {:?}, {:?}, {:?}, {:?}).",
                pkg.as_str(),
                dep.as_str(),
                when.to_string(),
                range.to_string(),
                depflag.to_string(),
            ),
            Fact::Variant { pkg, decl } => write!(
                f,
                "variant({:?}, {:?}, {:?}).",
                pkg.as_str(),
                decl.name.as_str(),
                decl.when.to_string()
            ),
            Fact::Conflict { pkg, .. } => write!(f, "conflict({:?}, ...).", pkg.as_str()),
            Fact::Provides {
                pkg,
                virtual_name,
                when,
            } => write!(
                f,
                "provides({:?}, {:?}, {:?}).",
                pkg.as_str(),
                virtual_name.as_str(),
                when.to_string()
            ),
            Fact::CompilerAvailable { index, compiler } => write!(
                f,
                "compiler_available({index}, {:?}).",
                compiler.to_string()
            ),
            Fact::TargetArch { arch } => write!(f, "target_arch({:?}).", arch.to_string()),
            Fact::PreferredProvider { virtual_name, pkg } => write!(
                f,
                "preferred_provider({:?}, {:?}).",
                virtual_name.as_str(),
                pkg.as_str()
            ),
            Fact::RecipeDigest { pkg, digest } => write!(
                f,
                "recipe_digest({:?}, {:?}).",
                pkg.as_str(),
                digest.to_string()
            ),
            Fact::Reusable { spec } => write!(
                f,
                "reusable({:?}, {:?}).",
                spec.name().as_str(),
                spec.dag_hash().to_string()
            ),
        }
    }
}

/// A complete solver input: the fact base plus the policy knobs
/// that stand in for the fixed rule program.
#[derive(Clone, Debug)]
pub struct Program {
    pub facts: Vec<Fact>,
    /// Optimization criteria, most important first.
    pub policy: Vec<OptimizationCriterion>,
    /// Whether reusable facts may actually be chosen.
    pub reuse: bool,
    /// Abort the search after this many steps (0 = unbounded).
    pub max_steps: u64,
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for fact in self.facts.iter() {
            writeln!(f, "{fact}")?;
        }
        for (index, criterion) in self.policy.iter().enumerate() {
            writeln!(f, "#criterion({index}, {criterion}).")?;
        }
        Ok(())
    }
}

/// One decision atom of a solver answer.
///
/// The full answer set is everything the decoder needs to rebuild
/// the concrete graph, one attr per decision.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Attr {
    /// The named package is part of the solution.
    Node { pkg: PkgNameBuf },
    Version { pkg: PkgNameBuf, version: Version },
    CompilerChoice { pkg: PkgNameBuf, compiler: Compiler },
    ArchChoice { pkg: PkgNameBuf, arch: Arch },
    VariantChoice {
        pkg: PkgNameBuf,
        variant: cpk_name::VariantName,
        value: VariantValue,
    },
    /// An edge between two resolved (concrete) package names.
    DependsOn {
        pkg: PkgNameBuf,
        dep: PkgNameBuf,
        depflag: DepFlags,
    },
    RecipeDigest { pkg: PkgNameBuf, digest: Digest },
    /// The node was taken from the reuse pool; the hash pins
    /// exactly which reusable spec.
    Reused { pkg: PkgNameBuf, dag_hash: Digest },
    /// The virtual was bound to the given provider package.
    ProviderChosen {
        virtual_name: PkgNameBuf,
        pkg: PkgNameBuf,
    },
}

impl std::fmt::Display for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Attr::Node { pkg } => write!(f, "attr(\"node\", {:?})", pkg.as_str()),
            Attr::Version { pkg, version } => write!(
                f,
                "attr(\"version\", {:?}, {:?})",
                pkg.as_str(),
                version.to_string()
            ),
            Attr::CompilerChoice { pkg, compiler } => write!(
                f,
                "attr(\"compiler\", {:?}, {:?})",
                pkg.as_str(),
                compiler.to_string()
            ),
            Attr::ArchChoice { pkg, arch } => write!(
                f,
                "attr(\"arch\", {:?}, {:?})",
                pkg.as_str(),
                arch.to_string()
            ),
            Attr::VariantChoice {
                pkg,
                variant,
                value,
            } => write!(
                f,
                "attr(\"variant_value\", {:?}, {:?}, {value:?})",
                pkg.as_str(),
                variant.as_str()
            ),
            Attr::DependsOn { pkg, dep, depflag } => write!(
                f,
                "attr(\"depends_on\", {:?}, {:?}, {:?})",
                pkg.as_str(),
                dep.as_str(),
                depflag.to_string()
            ),
            Attr::RecipeDigest { pkg, digest } => write!(
                f,
                "attr(\"recipe_digest\", {:?}, {:?})",
                pkg.as_str(),
                digest.to_string()
            ),
            Attr::Reused { pkg, dag_hash } => write!(
                f,
                "attr(\"reused\", {:?}, {:?})",
                pkg.as_str(),
                dag_hash.to_string()
            ),
            Attr::ProviderChosen { virtual_name, pkg } => write!(
                f,
                "attr(\"provider\", {:?}, {:?})",
                virtual_name.as_str(),
                pkg.as_str()
            ),
        }
    }
}

/// The set of decision atoms a backend chose.
#[derive(Clone, Debug, Default)]
pub struct AnswerSet {
    attrs: Vec<Attr>,
}

impl AnswerSet {
    pub fn new(mut attrs: Vec<Attr>) -> Self {
        attrs.sort();
        Self { attrs }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.attrs.iter()
    }

    pub fn contains(&self, attr: &Attr) -> bool {
        self.attrs.binary_search(attr).is_ok()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// All attrs concerning the named package.
    pub fn for_package<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attr> + 'a {
        self.attrs.iter().filter(move |attr| match attr {
            Attr::Node { pkg }
            | Attr::Version { pkg, .. }
            | Attr::CompilerChoice { pkg, .. }
            | Attr::ArchChoice { pkg, .. }
            | Attr::VariantChoice { pkg, .. }
            | Attr::DependsOn { pkg, .. }
            | Attr::RecipeDigest { pkg, .. }
            | Attr::Reused { pkg, .. }
            | Attr::ProviderChosen { pkg, .. } => pkg.as_str() == name,
        })
    }
}

impl std::fmt::Display for AnswerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for attr in self.attrs.iter() {
            writeln!(f, "{attr}.")?;
        }
        Ok(())
    }
}

/// An indexed, read-only view over a program's facts.
///
/// Backends use this instead of scanning the fact list; building it
/// is the first step of any solve.
pub struct FactIndex<'a> {
    pub roots: Vec<&'a SpecRequest>,
    pub versions: BTreeMap<&'a str, Vec<VersionEntry<'a>>>,
    pub depends: BTreeMap<&'a str, Vec<&'a Fact>>,
    pub variants: BTreeMap<&'a str, Vec<&'a VariantDecl>>,
    pub conflicts: BTreeMap<&'a str, Vec<&'a ConflictDecl>>,
    pub providers: BTreeMap<&'a str, Vec<&'a PkgNameBuf>>,
    pub preferred_providers: BTreeMap<&'a str, &'a PkgNameBuf>,
    pub compilers: Vec<&'a Compiler>,
    pub arch: Option<&'a Arch>,
    pub recipe_digests: BTreeMap<&'a str, Digest>,
    pub reusable: BTreeMap<&'a str, Vec<&'a Arc<Spec>>>,
}

#[derive(Clone, Copy)]
pub struct VersionEntry<'a> {
    pub version: &'a Version,
    pub deprecated: bool,
    pub index: usize,
}

impl<'a> FactIndex<'a> {
    pub fn build(program: &'a Program) -> Self {
        let mut index = FactIndex {
            roots: Vec::new(),
            versions: BTreeMap::new(),
            depends: BTreeMap::new(),
            variants: BTreeMap::new(),
            conflicts: BTreeMap::new(),
            providers: BTreeMap::new(),
            preferred_providers: BTreeMap::new(),
            compilers: Vec::new(),
            arch: None,
            recipe_digests: BTreeMap::new(),
            reusable: BTreeMap::new(),
        };
        for fact in program.facts.iter() {
            match fact {
                Fact::Root { request } => index.roots.push(request),
                Fact::VersionDeclared {
                    pkg,
                    version,
                    deprecated,
                    index: declared,
                } => index.versions.entry(pkg.as_str()).or_default().push(
                    VersionEntry {
                        version,
                        deprecated: *deprecated,
                        index: *declared,
                    },
                ),
                Fact::DependsOn { pkg, .. } => {
                    index.depends.entry(pkg.as_str()).or_default().push(fact)
                }
                Fact::Variant { pkg, decl } => {
                    index.variants.entry(pkg.as_str()).or_default().push(decl)
                }
                Fact::Conflict { pkg, decl } => {
                    index.conflicts.entry(pkg.as_str()).or_default().push(decl)
                }
                Fact::Provides {
                    pkg, virtual_name, ..
                } => index
                    .providers
                    .entry(virtual_name.as_str())
                    .or_default()
                    .push(pkg),
                Fact::CompilerAvailable { compiler, .. } => index.compilers.push(compiler),
                Fact::TargetArch { arch } => index.arch = Some(arch),
                Fact::PreferredProvider { virtual_name, pkg } => {
                    index
                        .preferred_providers
                        .insert(virtual_name.as_str(), pkg);
                }
                Fact::RecipeDigest { pkg, digest } => {
                    index.recipe_digests.insert(pkg.as_str(), *digest);
                }
                Fact::Reusable { spec } => index
                    .reusable
                    .entry(spec.name().as_str())
                    .or_default()
                    .push(spec),
            }
        }
        for providers in index.providers.values_mut() {
            providers.sort();
            providers.dedup();
        }
        index
    }

    /// Whether the name refers to a virtual capability.
    pub fn is_virtual(&self, name: &str) -> bool {
        !self.versions.contains_key(name) && self.providers.contains_key(name)
    }

    /// The condition-filtered dependency declarations of a package
    /// at a specific version.
    pub fn depends_for(&self, pkg: &str, version: &Version) -> Vec<&'a Fact> {
        use cpk_version_range::Ranged;
        self.depends
            .get(pkg)
            .map(|facts| {
                facts
                    .iter()
                    .filter(|fact| match fact {
                        Fact::DependsOn { when, .. } => when.is_applicable(version).is_ok(),
                        _ => false,
                    })
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The condition-filtered variant declarations of a package
    /// at a specific version.
    pub fn variants_for(&self, pkg: &str, version: &Version) -> Vec<&'a VariantDecl> {
        use cpk_version_range::Ranged;
        self.variants
            .get(pkg)
            .map(|decls| {
                decls
                    .iter()
                    .filter(|decl| decl.when.is_applicable(version).is_ok())
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The condition-filtered conflicts of a package at a version.
    pub fn conflicts_for(&self, pkg: &str, version: &Version) -> Vec<&'a ConflictDecl> {
        use cpk_version_range::Ranged;
        self.conflicts
            .get(pkg)
            .map(|decls| {
                decls
                    .iter()
                    .filter(|decl| decl.when.is_applicable(version).is_ok())
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}
