// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_config::SolverConfig;
use cpk_hash::Digest;
use cpk_name::pkg_name;
use cpk_spec::{parse_spec_request, Arch, Compiler, DepFlags, Spec, VariantMap};
use cpk_storage::RepositoryHandle;
use cpk_version::parse_version;
use rstest::rstest;

use super::SolverSetup;
use crate::facts::Fact;
use crate::{make_repo, Error};

fn test_config() -> SolverConfig {
    SolverConfig {
        reuse: false,
        compilers: vec![Compiler::new(
            pkg_name!("gcc"),
            parse_version("9.4.0").unwrap(),
        )],
        arch: Some(Arch::new("linux", "centos7", "x86_64")),
        ..Default::default()
    }
}

fn chain_repo() -> RepositoryHandle {
    make_repo!([
        {
            "pkg": "app",
            "versions": [{"version": "1.0"}],
            "depends": [{"pkg": "mpi"}]
        },
        {
            "pkg": "mpich",
            "versions": [{"version": "3.2"}],
            "provides": [{"virtual": "mpi"}],
            "depends": [{"pkg": "hwloc"}]
        },
        {"pkg": "hwloc", "versions": [{"version": "2.9"}]},
        {"pkg": "unrelated", "versions": [{"version": "1.0"}]},
    ])
}

#[rstest]
fn test_closure_covers_virtual_providers() {
    let config = test_config();
    let repos = vec![Arc::new(chain_repo())];
    let program = SolverSetup::new(&config, &repos)
        .encode(&[parse_spec_request("app").unwrap()])
        .unwrap();

    let versioned: Vec<_> = program
        .facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::VersionDeclared { pkg, .. } => Some(pkg.as_str()),
            _ => None,
        })
        .collect();
    // providers and their own dependencies are reachable
    assert!(versioned.contains(&"app"));
    assert!(versioned.contains(&"mpich"));
    assert!(versioned.contains(&"hwloc"));
    // packages nothing reaches are not encoded
    assert!(!versioned.contains(&"unrelated"));

    // every encoded package carries its recipe digest
    let digests = program
        .facts
        .iter()
        .filter(|fact| matches!(fact, Fact::RecipeDigest { .. }))
        .count();
    assert_eq!(digests, 3);
}

#[rstest]
fn test_unknown_package_and_unprovided_virtual() {
    let config = test_config();
    let repos = vec![Arc::new(chain_repo())];

    let missing = SolverSetup::new(&config, &repos)
        .encode(&[parse_spec_request("nosuch").unwrap()]);
    assert!(matches!(missing, Err(Error::PackageNotFound(_))));

    let repos = vec![Arc::new(make_repo!([
        {
            "pkg": "app",
            "versions": [{"version": "1.0"}],
            "depends": [{"pkg": "mpi"}]
        },
    ]))];
    let unprovided = SolverSetup::new(&config, &repos)
        .encode(&[parse_spec_request("app").unwrap()]);
    // nothing in the repo provides mpi, and mpi is not a package
    assert!(matches!(unprovided, Err(Error::PackageNotFound(name)) if name == "mpi"));
}

#[rstest]
fn test_no_compilers_rejected() {
    let mut config = test_config();
    config.compilers.clear();
    let repos = vec![Arc::new(chain_repo())];
    let result =
        SolverSetup::new(&config, &repos).encode(&[parse_spec_request("app").unwrap()]);
    assert!(matches!(result, Err(Error::NoCompilers)));
}

#[rstest]
fn test_contradictory_explicit_requests() {
    let config = test_config();
    let repos = vec![Arc::new(chain_repo())];
    let result = SolverSetup::new(&config, &repos).encode(&[
        parse_spec_request("app@2:").unwrap(),
        parse_spec_request("app@:1").unwrap(),
    ]);
    // the two ranges share no version, so this must fail
    // before any solving happens
    assert!(matches!(result, Err(Error::ConflictingRequests { pkg, .. }) if pkg == "app"));
}

#[rstest]
fn test_reusable_flattening_keeps_runtime_closure_only() {
    let mut config = test_config();
    config.reuse = true;

    let mut zlib = Spec::new(
        pkg_name!("zlib"),
        parse_version("1.2.13").unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    );
    let cmake = Arc::new(Spec::new(
        pkg_name!("cmake"),
        parse_version("3.27").unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    ));
    let libc = Arc::new(Spec::new(
        pkg_name!("musl"),
        parse_version("1.2").unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    ));
    zlib.add_dependency(cmake, DepFlags::BUILD).unwrap();
    zlib.add_dependency(libc, DepFlags::LINK).unwrap();
    let pool = vec![Arc::new(zlib)];

    let repos = vec![Arc::new(make_repo!([
        {"pkg": "zlib", "versions": [{"version": "1.2.13"}]},
    ]))];
    let program = SolverSetup::new(&config, &repos)
        .with_reusable(&pool)
        .encode(&[parse_spec_request("zlib").unwrap()])
        .unwrap();

    let reusable: Vec<_> = program
        .facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::Reusable { spec } => Some(spec.name().as_str()),
            _ => None,
        })
        .collect();
    // the link dependency is asserted, the build-only one is not
    assert!(reusable.contains(&"zlib"));
    assert!(reusable.contains(&"musl"));
    assert!(!reusable.contains(&"cmake"));
}

#[rstest]
fn test_reuse_disabled_emits_no_reusable_facts() {
    let config = test_config();
    let pool = vec![Arc::new(Spec::new(
        pkg_name!("zlib"),
        parse_version("1.2.13").unwrap(),
        Compiler::new(pkg_name!("gcc"), parse_version("9.4.0").unwrap()),
        Arch::new("linux", "centos7", "x86_64"),
        VariantMap::default(),
        Digest::default(),
    ))];
    let repos = vec![Arc::new(make_repo!([
        {"pkg": "zlib", "versions": [{"version": "1.2.13"}]},
    ]))];
    let program = SolverSetup::new(&config, &repos)
        .with_reusable(&pool)
        .encode(&[parse_spec_request("zlib").unwrap()])
        .unwrap();
    assert!(!program
        .facts
        .iter()
        .any(|fact| matches!(fact, Fact::Reusable { .. })));
}
