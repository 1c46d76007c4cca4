// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::cmp::Ordering;

use rstest::rstest;

use super::{parse_version, Version};

#[rstest]
#[case("1.0.0", "1.0.0", Ordering::Equal)]
#[case("1.0.0", "1.0.0.0.0", Ordering::Equal)]
#[case("2.0.0", "1.0.0", Ordering::Greater)]
#[case("1.2", "1.1.9", Ordering::Greater)]
#[case("1.2", "1.2.0.1", Ordering::Less)]
#[case("1.73.0", "1.73.0+r.1", Ordering::Less)]
#[case("1.0.0-alpha.1", "1.0.0", Ordering::Less)]
#[case("1.0.0-alpha.1", "1.0.0-alpha.2", Ordering::Less)]
#[case("1.0.0-alpha.2", "1.0.0-beta.1", Ordering::Less)]
fn test_version_ordering(#[case] lhs: &str, #[case] rhs: &str, #[case] expected: Ordering) {
    let lhs = parse_version(lhs).unwrap();
    let rhs = parse_version(rhs).unwrap();
    assert_eq!(lhs.cmp(&rhs), expected);
}

#[rstest]
fn test_version_epsilon_ordering() {
    // 1.73.0 < 1.73.0+r.1 < 1.73.0+ε
    let plain = parse_version("1.73.0").unwrap();
    let post = parse_version("1.73.0+r.1").unwrap();
    let epsilon = parse_version("1.73.0").unwrap().plus_epsilon();
    assert!(plain < post);
    assert!(post < epsilon);
}

#[rstest]
#[case("1.0.0")]
#[case("0.0.0")]
#[case("1.2.3.4.5")]
#[case("1.0.0-alpha.1")]
#[case("1.0.0-alpha.1,beta.9")]
#[case("1.0.0+r.1")]
#[case("1.0.0-pre.1+post.9")]
fn test_version_round_trip(#[case] source: &str) {
    let version = parse_version(source).unwrap();
    assert_eq!(version.to_string(), source);
}

#[rstest]
#[case("1.a.0")]
#[case("my-version")]
#[case("1.0.0-pre.1.2")]
#[case("1.0.0-pre")]
#[case("1.0.0-pre.1,pre.2")]
fn test_parse_version_invalid(#[case] source: &str) {
    assert!(parse_version(source).is_err());
}

#[rstest]
fn test_trailing_zeros_insignificant() {
    let a = parse_version("1.2").unwrap();
    let b = parse_version("1.2.0.0").unwrap();
    assert_eq!(a, b);

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut ha = DefaultHasher::new();
    let mut hb = DefaultHasher::new();
    a.hash(&mut ha);
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

#[rstest]
#[case("1.2", "1.2.3", true)]
#[case("1.2", "1.2", true)]
#[case("1.2.0", "1.2", true)]
#[case("1.2", "1.20", false)]
#[case("1.2.3", "1.2", false)]
fn test_is_prefix_of(#[case] prefix: &str, #[case] version: &str, #[case] expected: bool) {
    let prefix = parse_version(prefix).unwrap();
    let version = parse_version(version).unwrap();
    assert_eq!(prefix.is_prefix_of(&version), expected);
}

#[rstest]
fn test_version_accessors() {
    let v = Version::new(4, 1, 9);
    assert_eq!(v.major(), 4);
    assert_eq!(v.minor(), 1);
    assert_eq!(v.patch(), 9);
    assert!(!v.is_zero());
    assert!(Version::default().is_zero());
}
