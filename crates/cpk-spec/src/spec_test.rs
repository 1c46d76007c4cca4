// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_hash::Digest;
use cpk_name::pkg_name;
use cpk_version::parse_version;
use rstest::rstest;

use super::Spec;
use crate::{parse_spec_request, Arch, Compiler, DepFlags, VariantMap, VariantValue};

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
fn test_one_node_per_name() {
    let mut root = make_spec("mpileaks", "2.3");
    let zlib_a = Arc::new(make_spec("zlib", "1.2.13"));
    let zlib_b = Arc::new(make_spec("zlib", "1.3"));
    root.add_dependency(Arc::clone(&zlib_a), DepFlags::DEFAULT)
        .unwrap();
    // the same spec again only extends the edge flags
    root.add_dependency(Arc::clone(&zlib_a), DepFlags::TEST)
        .unwrap();
    assert_eq!(root.dependencies().len(), 1);
    assert_eq!(
        root.dependencies()[0].depflag,
        DepFlags::DEFAULT | DepFlags::TEST
    );
    // a different spec under the same name is rejected
    assert!(root.add_dependency(zlib_b, DepFlags::DEFAULT).is_err());
}

#[rstest]
fn test_satisfies_fields() {
    let mut spec = make_spec("mpileaks", "2.3");
    spec.variants
        .insert(cpk_name::variant_name!("debug"), VariantValue::Bool(true));

    assert!(spec.satisfies(&parse_spec_request("mpileaks").unwrap()).is_ok());
    assert!(spec
        .satisfies(&parse_spec_request("mpileaks@2:").unwrap())
        .is_ok());
    assert!(spec
        .satisfies(&parse_spec_request("mpileaks@2.3%gcc@9+debug").unwrap())
        .is_ok());
    assert!(spec
        .satisfies(&parse_spec_request("mpileaks arch=linux-centos7-x86_64").unwrap())
        .is_ok());

    assert!(!&spec.satisfies(&parse_spec_request("callpath").unwrap()));
    assert!(!&spec.satisfies(&parse_spec_request("mpileaks@2.4:").unwrap()));
    assert!(!&spec.satisfies(&parse_spec_request("mpileaks%clang").unwrap()));
    assert!(!&spec.satisfies(&parse_spec_request("mpileaks~debug").unwrap()));
    assert!(!&spec.satisfies(&parse_spec_request("mpileaks arch=darwin-bigsur-aarch64").unwrap()));
}

#[rstest]
fn test_satisfies_dependency_constraints() {
    let mut root = make_spec("mpileaks", "2.3");
    root.add_dependency(
        Arc::new(make_spec("mpich", "3.2.1")),
        DepFlags::LINK | DepFlags::RUN,
    )
    .unwrap();
    root.add_dependency(Arc::new(make_spec("cmake", "3.27")), DepFlags::BUILD)
        .unwrap();

    assert!(root
        .satisfies(&parse_spec_request("mpileaks ^mpich@3:").unwrap())
        .is_ok());
    assert!(!&root.satisfies(&parse_spec_request("mpileaks ^mpich@4:").unwrap()));
    // a build-only dependency is not part of the runtime closure
    // that dependency constraints are checked against
    assert!(!&root.satisfies(&parse_spec_request("mpileaks ^cmake").unwrap()));
}

#[rstest]
fn test_display_form() {
    let spec = make_spec("zlib", "1.2.13");
    assert_eq!(
        spec.to_string(),
        "zlib@1.2.13%gcc@9.4.0 arch=linux-centos7-x86_64"
    );
}
