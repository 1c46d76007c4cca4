// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_hash::Digest;
use cpk_name::pkg_name;
use cpk_version::parse_version;
use rstest::rstest;

use super::HashDescriptor;
use crate::{Arch, Compiler, DepFlags, Spec, VariantMap};

fn make_spec(name: &str, version: &str) -> Spec {
    Spec::new(
        cpk_name::PkgNameBuf::new(name).unwrap(),
        parse_version(version).unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    )
}

#[rstest]
fn test_hash_ignores_edge_insertion_order() {
    let zlib = Arc::new(make_spec("zlib", "1.2.13"));
    let mpich = Arc::new(make_spec("mpich", "3.2"));

    let mut forward = make_spec("mpileaks", "2.3");
    forward
        .add_dependency(Arc::clone(&zlib), DepFlags::DEFAULT)
        .unwrap();
    forward
        .add_dependency(Arc::clone(&mpich), DepFlags::DEFAULT)
        .unwrap();

    let mut reverse = make_spec("mpileaks", "2.3");
    reverse
        .add_dependency(Arc::clone(&mpich), DepFlags::DEFAULT)
        .unwrap();
    reverse
        .add_dependency(Arc::clone(&zlib), DepFlags::DEFAULT)
        .unwrap();

    assert_eq!(forward.dag_hash(), reverse.dag_hash());
    assert_eq!(forward.process_hash(), reverse.process_hash());
}

#[rstest]
fn test_hash_tracks_dependency_changes() {
    let mut with_old = make_spec("mpileaks", "2.3");
    with_old
        .add_dependency(Arc::new(make_spec("zlib", "1.2.13")), DepFlags::DEFAULT)
        .unwrap();

    let mut with_new = make_spec("mpileaks", "2.3");
    with_new
        .add_dependency(Arc::new(make_spec("zlib", "1.3")), DepFlags::DEFAULT)
        .unwrap();

    assert_ne!(with_old.dag_hash(), with_new.dag_hash());
}

#[rstest]
fn test_hash_respects_depflag_mask() {
    // two graphs differing only in a test-only dependency's version
    let mut a = make_spec("mpileaks", "2.3");
    a.add_dependency(Arc::new(make_spec("check", "1.0")), DepFlags::TEST)
        .unwrap();

    let mut b = make_spec("mpileaks", "2.3");
    b.add_dependency(Arc::new(make_spec("check", "2.0")), DepFlags::TEST)
        .unwrap();

    // the canonical hash excludes test edges, the process hash does not
    assert_eq!(a.dag_hash(), b.dag_hash());
    assert_ne!(a.process_hash(), b.process_hash());
}

#[rstest]
fn test_hash_kinds_are_domain_separated() {
    let spec = make_spec("zlib", "1.2.13");
    assert_ne!(spec.dag_hash(), spec.process_hash());
    // full_hash selects the same inputs as dag_hash but remains
    // a distinct kind with distinct values
    assert_ne!(spec.dag_hash(), spec.spec_hash(HashDescriptor::full()));
}

#[rstest]
fn test_recipe_content_feeds_package_hash_kinds_only() {
    let mut changed = make_spec("zlib", "1.2.13");
    changed.recipe_digest = {
        let mut hasher = cpk_hash::Hasher::new();
        hasher.update(b"patched recipe");
        hasher.digest()
    };
    let original = make_spec("zlib", "1.2.13");

    assert_ne!(original.dag_hash(), changed.dag_hash());
    // build_hash predates recipe content hashing and must not move
    assert_eq!(
        original.spec_hash(HashDescriptor::build()),
        changed.spec_hash(HashDescriptor::build()),
    );
}

#[rstest]
fn test_hash_is_stable_across_calls() {
    let spec = make_spec("zlib", "1.2.13");
    assert_eq!(spec.dag_hash(), spec.dag_hash());
    assert_eq!(spec.dag_hash().to_string().len(), 52);
}
