// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::BTreeSet;

use crate::{DepFlags, Spec};

#[cfg(test)]
#[path = "./traversal_test.rs"]
mod traversal_test;

/// A deterministic, deduplicated walk of a concrete spec graph.
///
/// Nodes are visited depth-first in package-name order, independent
/// of the order edges were attached in, so that two equal graphs
/// always produce the same sequence. Each package name is yielded
/// at most once (concrete graphs hold one node per name).
pub struct Traversal<'a> {
    stack: Vec<&'a Spec>,
    visited: BTreeSet<&'a str>,
    depflag: DepFlags,
    include_root: bool,
    at_root: bool,
}

impl<'a> Traversal<'a> {
    pub(crate) fn new(root: &'a Spec) -> Self {
        Self {
            stack: vec![root],
            visited: BTreeSet::new(),
            depflag: DepFlags::ALL,
            include_root: true,
            at_root: true,
        }
    }

    /// Do not yield the root spec itself, only its closure.
    pub fn skip_root(mut self) -> Self {
        self.include_root = false;
        self
    }

    /// Only follow edges whose flags intersect the given mask.
    pub fn with_depflag(mut self, depflag: DepFlags) -> Self {
        self.depflag = depflag;
        self
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = &'a Spec;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let spec = self.stack.pop()?;
            if !self.visited.insert(spec.name().as_str()) {
                continue;
            }
            // children are pushed in reverse name order so that the
            // smallest name is popped (and so visited) first
            let mut edges: Vec<_> = spec
                .dependencies()
                .iter()
                .filter(|edge| edge.depflag.intersects(self.depflag))
                .collect();
            edges.sort_by(|a, b| b.spec.name().cmp(a.spec.name()));
            for edge in edges {
                self.stack.push(&edge.spec);
            }
            let is_root = std::mem::take(&mut self.at_root);
            if is_root && !self.include_root {
                continue;
            }
            return Some(spec);
        }
    }
}

/// Visit the graph below `root` children-before-parents.
///
/// Useful for computations that must complete for all dependencies
/// of a node before the node itself, like hash assignment.
pub fn topological(root: &Spec) -> Vec<&Spec> {
    let mut ordered = Vec::new();
    let mut visited = BTreeSet::new();
    post_order(root, &mut visited, &mut ordered);
    ordered
}

fn post_order<'a>(
    spec: &'a Spec,
    visited: &mut BTreeSet<&'a str>,
    ordered: &mut Vec<&'a Spec>,
) {
    if !visited.insert(spec.name().as_str()) {
        return;
    }
    let mut edges: Vec<_> = spec.dependencies().iter().collect();
    edges.sort_by(|a, b| a.spec.name().cmp(b.spec.name()));
    for edge in edges {
        post_order(&edge.spec, visited, ordered);
    }
    ordered.push(spec);
}
