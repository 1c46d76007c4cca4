// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_version::{parse_version, version};
use rstest::rstest;

use super::Recipe;
use crate::recipe;

const MPILEAKS_YAML: &str = r#"
pkg: mpileaks
description: Tool to detect and report MPI objects like MPI_Requests and MPI_Datatypes
versions:
  - version: "2.3"
  - version: "2.2"
  - version: "1.0"
    deprecated: true
variants:
  - name: debug
    default: false
  - name: stackstart
    values: ["1", "4"]
    default: "1"
    when: "2.2:"
depends:
  - pkg: mpi
    range: "2:"
  - pkg: callpath
    depflag: [build, link]
  - pkg: dyninst
    when: ":2.2"
conflicts:
  - when: ":1.0"
    compiler: "gcc@:4"
    msg: gcc 4 miscompiles the tracing hooks
patches:
  - name: fix-mpich-backtrace.patch
    sha256: 5dbe15b58c39ebfd1d4ca59b3799d183b44707a15571902070c9f27e5ca4968a
    when: ":2.2"
build:
  autotools:
    configure_args: ["--with-tracing"]
"#;

#[rstest]
fn test_recipe_from_yaml() {
    let recipe = Recipe::from_yaml(MPILEAKS_YAML).unwrap();
    assert_eq!(recipe.pkg, "mpileaks");
    assert_eq!(recipe.versions.len(), 3);
    assert!(recipe.declares_version(&version!("2.3")));
    assert!(!recipe.declares_version(&version!("2.4")));

    let newest: Vec<_> = recipe
        .versions_newest_first()
        .into_iter()
        .map(|decl| decl.version.to_string())
        .collect();
    assert_eq!(newest, vec!["2.3", "2.2", "1.0"]);
}

#[rstest]
fn test_conditional_declarations() {
    let recipe = Recipe::from_yaml(MPILEAKS_YAML).unwrap();

    // the stackstart variant only exists from 2.2 onward
    let old = parse_version("1.0").unwrap();
    let new = parse_version("2.3").unwrap();
    assert_eq!(recipe.variants_for(&old).count(), 1);
    assert_eq!(recipe.variants_for(&new).count(), 2);

    // dyninst is only needed up to 2.2
    let old_deps: Vec<_> = recipe.depends_for(&old).map(|d| d.pkg.as_str()).collect();
    let new_deps: Vec<_> = recipe.depends_for(&new).map(|d| d.pkg.as_str()).collect();
    assert!(old_deps.contains(&"dyninst"));
    assert!(!new_deps.contains(&"dyninst"));

    // the conflict only applies to the old release
    assert_eq!(recipe.conflicts_for(&old).count(), 1);
    assert_eq!(recipe.conflicts_for(&new).count(), 0);

    // the patch only applies up to 2.2
    assert_eq!(recipe.patches_for(&old).count(), 1);
    assert_eq!(recipe.patches_for(&new).count(), 0);
}

#[rstest]
fn test_default_variants() {
    let recipe = Recipe::from_yaml(MPILEAKS_YAML).unwrap();
    let defaults = recipe.default_variants(&parse_version("2.3").unwrap());
    assert_eq!(defaults.to_string(), "~debug stackstart=1");
}

#[rstest]
fn test_provides_virtual() {
    let recipe = recipe!({
        "pkg": "mpich",
        "versions": [{"version": "3.2"}, {"version": "1.0"}],
        "provides": [{"virtual": "mpi", "when": "2:"}]
    });
    assert!(recipe.provides_virtual("mpi", &version!("3.2")));
    assert!(!recipe.provides_virtual("mpi", &version!("1.0")));
    assert!(!recipe.provides_virtual("lapack", &version!("3.2")));
}

#[rstest]
fn test_content_digest_tracks_patches() {
    let base = Recipe::from_yaml(MPILEAKS_YAML).unwrap();
    let mut patched = base.clone();
    patched.patches[0].sha256 =
        "0000000000000000000000000000000000000000000000000000000000000000".into();
    assert_ne!(base.content_digest(), patched.content_digest());
    assert_eq!(base.content_digest(), base.clone().content_digest());
}

#[rstest]
fn test_recipe_validation() {
    // no versions
    assert!(Recipe::from_yaml("pkg: zlib\nversions: []").is_err());

    // duplicate version
    assert!(Recipe::from_yaml(
        "pkg: zlib\nversions: [{version: '1.2'}, {version: '1.2'}]"
    )
    .is_err());

    // enum default outside the declared values
    assert!(Recipe::from_yaml(
        r#"
pkg: zlib
versions: [{version: "1.2"}]
variants: [{name: opt, values: [fast, small], default: huge}]
"#
    )
    .is_err());

    // a conflict must constrain something
    assert!(Recipe::from_yaml(
        r#"
pkg: zlib
versions: [{version: "1.2"}]
conflicts: [{when: "1:"}]
"#
    )
    .is_err());
}

#[rstest]
fn test_recipe_yaml_round_trip() {
    let recipe = Recipe::from_yaml(MPILEAKS_YAML).unwrap();
    let rendered = serde_yaml::to_string(&recipe).unwrap();
    let reparsed = Recipe::from_yaml(&rendered).unwrap();
    assert_eq!(reparsed, recipe);
}
