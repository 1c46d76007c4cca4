// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::BTreeMap;

use cpk_hash::{Digest, Hasher};
use serde_json::json;

use crate::{DepFlags, Spec};

#[cfg(test)]
#[path = "./hash_test.rs"]
mod hash_test;

/// Selects which parts of a spec graph contribute to one hash kind.
///
/// The inputs of a hash kind are frozen: changing what an existing
/// kind hashes would silently re-address every stored package, so
/// any change of inputs must be introduced as a new named kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HashDescriptor {
    /// The name of this hash kind, also folded into the digest
    /// so that distinct kinds can never collide.
    pub name: &'static str,
    /// Dependency edges must intersect this mask to contribute.
    pub depflag: DepFlags,
    /// Whether the package recipe content contributes.
    pub package_hash: bool,
}

/// The canonical deployment hash: build, link and run edges plus
/// recipe content. Names install directories and binary-cache keys.
pub const DAG: HashDescriptor = HashDescriptor {
    name: "dag_hash",
    depflag: DepFlags::DEFAULT,
    package_hash: true,
};

/// Like [`DAG`] but also covering test-only dependencies.
pub const PROCESS: HashDescriptor = HashDescriptor {
    name: "process_hash",
    depflag: DepFlags::ALL,
    package_hash: true,
};

const FULL: HashDescriptor = HashDescriptor {
    name: "full_hash",
    depflag: DepFlags::DEFAULT,
    package_hash: true,
};

const BUILD: HashDescriptor = HashDescriptor {
    name: "build_hash",
    depflag: DepFlags::DEFAULT,
    package_hash: false,
};

impl HashDescriptor {
    /// The deprecated `full_hash` kind, kept distinct for
    /// compatibility with already-addressed content.
    pub fn full() -> &'static HashDescriptor {
        tracing::warn!("full_hash is deprecated, use dag_hash");
        &FULL
    }

    /// The deprecated `build_hash` kind, kept distinct for
    /// compatibility with already-addressed content.
    pub fn build() -> &'static HashDescriptor {
        tracing::warn!("build_hash is deprecated, use dag_hash");
        &BUILD
    }
}

impl Spec {
    /// Compute this spec's digest under the given descriptor.
    ///
    /// The digest covers the node's own pinned fields plus, for every
    /// dependency edge intersecting the descriptor's mask, the
    /// dependency's own digest under the same descriptor. The result
    /// is stable across processes and independent of the order in
    /// which edges were attached.
    pub fn spec_hash(&self, descriptor: &HashDescriptor) -> Digest {
        let mut memo = BTreeMap::new();
        self.spec_hash_memo(descriptor, &mut memo)
    }

    /// The canonical deployment hash of this spec.
    pub fn dag_hash(&self) -> Digest {
        self.spec_hash(&DAG)
    }

    /// The full-closure hash of this spec, including test deps.
    pub fn process_hash(&self) -> Digest {
        self.spec_hash(&PROCESS)
    }

    fn spec_hash_memo(
        &self,
        descriptor: &HashDescriptor,
        memo: &mut BTreeMap<String, Digest>,
    ) -> Digest {
        if let Some(known) = memo.get(self.name().as_str()) {
            return *known;
        }

        let mut dependencies: Vec<_> = self
            .dependencies()
            .iter()
            .filter(|edge| edge.depflag.intersects(descriptor.depflag))
            .map(|edge| {
                json!({
                    "pkg": edge.spec.name().as_str(),
                    "hash": edge.spec.spec_hash_memo(descriptor, memo).to_string(),
                    "depflag": edge.depflag.intersection(descriptor.depflag).to_string(),
                })
            })
            .collect();
        dependencies.sort_by(|a, b| a["pkg"].as_str().cmp(&b["pkg"].as_str()));

        let node = json!({
            "pkg": self.name().as_str(),
            "version": self.version().to_string(),
            "compiler": self.compiler().to_string(),
            "arch": self.arch().to_string(),
            "variants": self.variants(),
            "recipe": descriptor
                .package_hash
                .then(|| self.recipe_digest().to_string()),
            "dependencies": dependencies,
        });

        let mut hasher = Hasher::new();
        // the kind name participates so that no two kinds can collide
        hasher.update(descriptor.name.as_bytes());
        hasher.update(b"\0");
        hasher.update(
            serde_json::to_string(&node)
                .expect("a canonical spec node always serializes")
                .as_bytes(),
        );
        let digest = hasher.digest();
        memo.insert(self.name().to_string(), digest);
        digest
    }
}
