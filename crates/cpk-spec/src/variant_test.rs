// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_name::variant_name;
use rstest::rstest;

use super::{VariantMap, VariantValue};

fn map(entries: &[(&str, VariantValue)]) -> VariantMap {
    entries
        .iter()
        .map(|(name, value)| (cpk_name::VariantName::new(*name).unwrap(), value.clone()))
        .collect()
}

#[rstest]
fn test_display_form() {
    let variants = map(&[
        ("shared", true.into()),
        ("static", false.into()),
        ("fftw", VariantValue::single("esmtp")),
    ]);
    assert_eq!(variants.to_string(), "fftw=esmtp+shared~static");
}

#[rstest]
fn test_satisfies_subset() {
    let concrete = map(&[
        ("shared", true.into()),
        ("languages", VariantValue::multi(["c", "cxx", "fortran"])),
    ]);
    let constraint = map(&[("languages", VariantValue::multi(["c", "cxx"]))]);
    assert!(concrete.satisfies(&constraint).is_ok());

    let constraint = map(&[("languages", VariantValue::multi(["rust"]))]);
    assert!(!&concrete.satisfies(&constraint));

    let constraint = map(&[("shared", false.into())]);
    assert!(!&concrete.satisfies(&constraint));

    let constraint = map(&[("unknown", true.into())]);
    assert!(!&concrete.satisfies(&constraint));
}

#[rstest]
fn test_merge_accumulates_values() {
    let mut merged = map(&[("languages", VariantValue::multi(["c"]))]);
    let more = map(&[("languages", VariantValue::multi(["cxx"])), ("shared", true.into())]);
    assert!(merged.merge(&more).is_ok());
    assert_eq!(
        merged.get(variant_name!("languages").as_str()),
        Some(&VariantValue::multi(["c", "cxx"]))
    );

    // boolean disagreement is a conflict
    let conflicting = map(&[("shared", false.into())]);
    assert!(!&merged.merge(&conflicting));
}

#[rstest]
fn test_serde_forms() {
    let yaml = "{shared: true, static: false, fftw: esmtp, languages: [c, cxx]}";
    let variants: VariantMap = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(variants.get("shared"), Some(&VariantValue::Bool(true)));
    assert_eq!(variants.get("fftw"), Some(&VariantValue::single("esmtp")));
    assert_eq!(
        variants.get("languages"),
        Some(&VariantValue::multi(["c", "cxx"]))
    );
}
