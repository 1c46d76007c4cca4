// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::BTreeMap;
use std::sync::Arc;

use cpk_hash::Digest;
use cpk_name::PkgNameBuf;
use cpk_spec::{Arch, Compiler, DepFlags, Spec, SpecRequest, VariantMap};
use cpk_version::Version;

use crate::facts::{AnswerSet, Attr, FactIndex, Program};
use crate::solution::{PackageSource, SolvedRequest, Solution};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./decode_test.rs"]
mod decode_test;

#[derive(Default)]
struct NodeInfo {
    version: Option<Version>,
    compiler: Option<Compiler>,
    arch: Option<Arch>,
    variants: VariantMap,
    recipe_digest: Option<Digest>,
    deps: Vec<(PkgNameBuf, DepFlags)>,
    reused: Option<Digest>,
}

/// Turn a backend's answer set back into concrete specs.
///
/// Nodes are built dependencies-first so that every edge points at
/// an existing concrete spec and every node's `dag_hash` can be
/// taken immediately. Reused nodes are looked up verbatim in the
/// program's reusable facts by their pinned hash.
pub fn decode(program: &Program, answer: &AnswerSet) -> Result<Solution> {
    let index = FactIndex::build(program);

    let mut nodes: BTreeMap<PkgNameBuf, NodeInfo> = BTreeMap::new();
    let mut bindings: BTreeMap<&PkgNameBuf, &PkgNameBuf> = BTreeMap::new();
    for attr in answer.iter() {
        match attr {
            Attr::Node { pkg } => {
                nodes.entry(pkg.clone()).or_default();
            }
            Attr::Version { pkg, version } => {
                nodes.entry(pkg.clone()).or_default().version = Some(version.clone());
            }
            Attr::CompilerChoice { pkg, compiler } => {
                nodes.entry(pkg.clone()).or_default().compiler = Some(compiler.clone());
            }
            Attr::ArchChoice { pkg, arch } => {
                nodes.entry(pkg.clone()).or_default().arch = Some(arch.clone());
            }
            Attr::VariantChoice {
                pkg,
                variant,
                value,
            } => {
                nodes
                    .entry(pkg.clone())
                    .or_default()
                    .variants
                    .insert(variant.clone(), value.clone());
            }
            Attr::DependsOn { pkg, dep, depflag } => {
                nodes
                    .entry(pkg.clone())
                    .or_default()
                    .deps
                    .push((dep.clone(), *depflag));
            }
            Attr::RecipeDigest { pkg, digest } => {
                nodes.entry(pkg.clone()).or_default().recipe_digest = Some(*digest);
            }
            Attr::Reused { pkg, dag_hash } => {
                nodes.entry(pkg.clone()).or_default().reused = Some(*dag_hash);
            }
            Attr::ProviderChosen { virtual_name, pkg } => {
                bindings.insert(virtual_name, pkg);
            }
        }
    }

    let order = topological_names(&nodes)?;
    let mut built: BTreeMap<&PkgNameBuf, Arc<Spec>> = BTreeMap::new();
    let mut solution = Solution::default();
    for name in order.iter() {
        let info = nodes.get(name).expect("ordered names come from the map");
        let spec = match info.reused {
            Some(dag_hash) => index
                .reusable
                .get(name.as_str())
                .into_iter()
                .flatten()
                .find(|spec| spec.dag_hash() == dag_hash)
                .map(|spec| Arc::clone(spec))
                .ok_or_else(|| {
                    Error::String(format!(
                        "answer reuses {name}/{} but no such reusable fact exists",
                        dag_hash.short()
                    ))
                })?,
            None => {
                let mut spec = Spec::new(
                    name.clone(),
                    require(info.version.clone(), name, "version")?,
                    require(info.compiler.clone(), name, "compiler")?,
                    require(info.arch.clone(), name, "arch")?,
                    info.variants.clone(),
                    require(info.recipe_digest, name, "recipe_digest")?,
                );
                for (dep, depflag) in info.deps.iter() {
                    let child = built.get(dep).ok_or_else(|| {
                        Error::String(format!(
                            "answer edge {name} -> {dep} points outside the solution"
                        ))
                    })?;
                    spec.add_dependency(Arc::clone(child), *depflag)?;
                }
                Arc::new(spec)
            }
        };
        built.insert(name, Arc::clone(&spec));

        let request = index
            .roots
            .iter()
            .find(|root| {
                root.pkg == *name || bindings.get(&root.pkg) == Some(&name)
            })
            .map(|root| (*root).clone())
            .unwrap_or_else(|| SpecRequest::any(name.clone()));
        let source = if info.reused.is_some() {
            PackageSource::Reused
        } else {
            PackageSource::Repository
        };
        let digest = spec.dag_hash();
        solution.add(SolvedRequest {
            request,
            spec,
            source,
            digest,
        });
    }
    Ok(solution)
}

fn require<T>(value: Option<T>, pkg: &PkgNameBuf, what: &str) -> Result<T> {
    value.ok_or_else(|| Error::String(format!("answer has no {what} decision for {pkg}")))
}

/// Dependency-first ordering of the answer's nodes.
fn topological_names(nodes: &BTreeMap<PkgNameBuf, NodeInfo>) -> Result<Vec<PkgNameBuf>> {
    let mut order = Vec::new();
    let mut marks: BTreeMap<&PkgNameBuf, Mark> = BTreeMap::new();
    for name in nodes.keys() {
        visit(name, nodes, &mut marks, &mut order)?;
    }
    Ok(order)
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

fn visit<'a>(
    name: &'a PkgNameBuf,
    nodes: &'a BTreeMap<PkgNameBuf, NodeInfo>,
    marks: &mut BTreeMap<&'a PkgNameBuf, Mark>,
    order: &mut Vec<PkgNameBuf>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            return Err(Error::String(format!(
                "answer contains a dependency cycle through {name}"
            )));
        }
        None => (),
    }
    marks.insert(name, Mark::InProgress);
    if let Some(info) = nodes.get(name) {
        if info.reused.is_none() {
            for (dep, _) in info.deps.iter() {
                if nodes.contains_key(dep.as_str()) {
                    visit(dep, nodes, marks, order)?;
                }
            }
        }
    }
    marks.insert(name, Mark::Done);
    order.push(name.clone());
    Ok(())
}

/// Check that every attr implied by the decoded solution appears in
/// the raw answer set the backend returned.
///
/// The decoder and the backend derive their views independently;
/// this cross-check catches either side drifting. It runs on every
/// debug-build solve and is exercised directly by tests.
pub fn verify_answer_covers(solution: &Solution, answer: &AnswerSet) -> std::result::Result<(), String> {
    for solved in solution.items() {
        for attr in spec_attrs(&solved.spec, solved.is_reused()) {
            if !answer.contains(&attr) {
                return Err(format!(
                    "{} implies {attr}, which the answer set does not contain",
                    solved.spec.name()
                ));
            }
        }
    }
    Ok(())
}

/// Every decision atom implied by one concrete spec node.
fn spec_attrs(spec: &Spec, reused: bool) -> Vec<Attr> {
    let pkg = spec.name().clone();
    let mut attrs = vec![
        Attr::Node { pkg: pkg.clone() },
        Attr::Version {
            pkg: pkg.clone(),
            version: spec.version().clone(),
        },
        Attr::CompilerChoice {
            pkg: pkg.clone(),
            compiler: spec.compiler().clone(),
        },
        Attr::ArchChoice {
            pkg: pkg.clone(),
            arch: spec.arch().clone(),
        },
        Attr::RecipeDigest {
            pkg: pkg.clone(),
            digest: spec.recipe_digest(),
        },
    ];
    for (variant, value) in spec.variants().iter() {
        attrs.push(Attr::VariantChoice {
            pkg: pkg.clone(),
            variant: variant.clone(),
            value: value.clone(),
        });
    }
    if reused {
        attrs.push(Attr::Reused {
            pkg: pkg.clone(),
            dag_hash: spec.dag_hash(),
        });
    }
    for edge in spec.dependencies() {
        // only the runtime closure of a reused node is asserted
        let depflag = if reused {
            edge.depflag.intersection(DepFlags::LINK | DepFlags::RUN)
        } else {
            edge.depflag
        };
        if depflag.is_empty() {
            continue;
        }
        attrs.push(Attr::DependsOn {
            pkg: pkg.clone(),
            dep: edge.spec.name().clone(),
            depflag,
        });
    }
    attrs
}
