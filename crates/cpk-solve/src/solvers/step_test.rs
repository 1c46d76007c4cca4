// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_hash::Digest;
use cpk_name::pkg_name;
use cpk_spec::{Arch, Compiler, DepFlags, Spec, VariantMap};
use cpk_version::parse_version;
use cpk_version_range::parse_version_range;
use rstest::rstest;

use super::{pinned_exactly, runtime_closure};
use crate::state::{Constraint, RequestedBy};

fn make_spec(name: &str) -> Spec {
    Spec::new(
        cpk_name::PkgNameBuf::new(name).unwrap(),
        parse_version("1.0").unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    )
}

#[rstest]
fn test_runtime_closure_excludes_build_only_edges() {
    let mut root = make_spec("app");
    root.add_dependency(Arc::new(make_spec("cmake")), DepFlags::BUILD)
        .unwrap();
    root.add_dependency(
        Arc::new(make_spec("zlib")),
        DepFlags::LINK | DepFlags::RUN,
    )
    .unwrap();

    let names: Vec<_> = runtime_closure(&Arc::new(root))
        .iter()
        .map(|spec| spec.name().to_string())
        .collect();
    assert!(names.contains(&"app".to_string()));
    assert!(names.contains(&"zlib".to_string()));
    assert!(!names.contains(&"cmake".to_string()));
}

#[rstest]
#[case("=1.0", "1.0", true)]
#[case("=1.0,2.0:", "1.0", true)]
#[case("1.0", "1.0", false)]
#[case("1:", "1.0", false)]
fn test_pinned_exactly(#[case] range: &str, #[case] version: &str, #[case] expected: bool) {
    let constraint = Constraint {
        range: parse_version_range(range).unwrap(),
        variants: VariantMap::default(),
        compiler: None,
        arch: None,
        requested_by: RequestedBy::CommandLine,
    };
    let version = parse_version(version).unwrap();
    assert_eq!(pinned_exactly(&[&constraint], &version), expected);
}
