// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_hash::Digest;
use cpk_spec::{Spec, SpecRequest};

/// Where a resolved package comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PackageSource {
    /// The package will be built from its recipe.
    Repository,
    /// An already-built spec from the reuse pool, taken verbatim.
    Reused,
}

/// Represents a package request that has been resolved.
#[derive(Clone, Debug)]
pub struct SolvedRequest {
    pub request: SpecRequest,
    pub spec: Arc<Spec>,
    pub source: PackageSource,
    /// The canonical deployment hash of the resolved spec.
    pub digest: Digest,
}

impl SolvedRequest {
    pub fn is_reused(&self) -> bool {
        matches!(self.source, PackageSource::Reused)
    }
}

/// Represents a set of resolved packages.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    resolved: Vec<SolvedRequest>,
}

impl Solution {
    pub fn items(&self) -> std::slice::Iter<'_, SolvedRequest> {
        self.resolved.iter()
    }

    pub fn get<S: AsRef<str>>(&self, name: S) -> Option<&SolvedRequest> {
        self.resolved
            .iter()
            .find(|r| r.spec.name().as_str() == name.as_ref())
    }

    /// The number of packages in this solution
    #[inline]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Add a resolved request to this solution.
    ///
    /// Entries are kept in the order added; the decoder adds
    /// dependencies before their dependents.
    pub(crate) fn add(&mut self, solved: SolvedRequest) {
        self.resolved.push(solved);
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("Nothing Resolved");
        }
        f.write_str("Resolved Packages:")?;
        for solved in self.resolved.iter() {
            write!(
                f,
                "\n  {}/{}",
                solved.spec,
                solved.digest.short()
            )?;
            if solved.is_reused() {
                f.write_str(" (reused)")?;
            }
        }
        write!(f, "\n Number of Packages: {}", self.len())
    }
}
