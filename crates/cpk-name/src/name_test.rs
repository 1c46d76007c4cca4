// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use rstest::rstest;

use super::{validate_pkg_name, validate_variant_name, PkgNameBuf, VariantName};

#[rstest]
#[case("zlib")]
#[case("py-numpy")]
#[case("gcc")]
#[case("openmpi")]
#[case("libxml2")]
fn test_pkg_name_valid(#[case] name: &str) {
    assert!(validate_pkg_name(name).is_ok());
}

#[rstest]
#[case("")]
#[case("a")]
#[case("-zlib")]
#[case("2zlib")]
#[case("Zlib")]
#[case("my_pkg")]
#[case("my pkg")]
#[case("my.pkg")]
fn test_pkg_name_invalid(#[case] name: &str) {
    assert!(validate_pkg_name(name).is_err());
}

#[rstest]
#[case("shared")]
#[case("build_type")]
#[case("cuda-arch")]
fn test_variant_name_valid(#[case] name: &str) {
    assert!(validate_variant_name(name).is_ok());
}

#[rstest]
#[case("_shared")]
#[case("Shared")]
#[case("shared!")]
fn test_variant_name_invalid(#[case] name: &str) {
    assert!(validate_variant_name(name).is_err());
}

#[rstest]
fn test_pkg_name_lookup_by_str() {
    // names are used as map keys and must be
    // addressable by plain string slices
    let mut map = std::collections::BTreeMap::new();
    map.insert(PkgNameBuf::new("zlib").unwrap(), 1);
    assert_eq!(map.get("zlib"), Some(&1));
}

#[rstest]
fn test_pkg_name_is_valid_variant_name() {
    let pkg = PkgNameBuf::new("my-pkg").unwrap();
    let variant = VariantName::from(pkg);
    assert_eq!(variant, *"my-pkg");
}

#[rstest]
fn test_name_error_position() {
    let err = validate_pkg_name("my!pkg").expect_err("name should not validate");
    assert!(err.to_string().contains("pos 2"), "got: {err}");
}

#[rstest]
fn test_name_serde_round_trip() {
    let name = PkgNameBuf::new("py-numpy").unwrap();
    let json = serde_json::to_string(&name).unwrap();
    assert_eq!(json, "\"py-numpy\"");
    let back: PkgNameBuf = serde_json::from_str(&json).unwrap();
    assert_eq!(back, name);
}
