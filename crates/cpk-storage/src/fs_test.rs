// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use rstest::rstest;

use super::FsRepository;

#[rstest]
fn test_open_directory_of_recipes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("zlib.yaml"),
        "pkg: zlib\nversions: [{version: '1.2.13'}, {version: '1.2.11'}]\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("mpich.yaml"),
        "pkg: mpich\nversions: [{version: '3.2'}]\nprovides: [{virtual: mpi}]\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("README.md"), "not a recipe\n").unwrap();

    let repo = FsRepository::open(dir.path()).unwrap();
    assert_eq!(repo.list_packages().len(), 2);
    assert_eq!(
        repo.highest_version("zlib"),
        Some(cpk_version::version!("1.2.13"))
    );
    assert_eq!(
        repo.providers_of("mpi")
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>(),
        vec!["mpich"]
    );
}

#[rstest]
fn test_open_missing_directory() {
    assert!(FsRepository::open("/does/not/exist").is_err());
}

#[rstest]
fn test_invalid_recipe_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "pkg: zlib\nversions: []\n").unwrap();
    assert!(FsRepository::open(dir.path()).is_err());
}
