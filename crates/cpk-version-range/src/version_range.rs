// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::fmt::{Display, Write};
use std::str::FromStr;

use cpk_version::{Compatibility, Version};
use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(test)]
#[path = "./version_range_test.rs"]
mod version_range_test;

pub const VERSION_RANGE_SEP: &str = ",";

/// The generic trait for all range implementations.
///
/// This is not public API as the VersionRange enum is used
/// as the public interface, which can be used to identify
/// which range type is actually being used.
#[enum_dispatch]
pub trait Ranged: Display + Clone + Into<VersionRange> {
    /// The lower, inclusive bound for this range, if any.
    fn greater_or_equal_to(&self) -> Option<Version>;

    /// The upper, exclusive bound for this range, if any.
    fn less_than(&self) -> Option<Version>;

    /// Return true if the given version seems applicable to this range.
    fn is_applicable(&self, other: &Version) -> Compatibility {
        if let Some(gt) = self.greater_or_equal_to() {
            if other < &gt {
                return Compatibility::incompatible(format!("version too low for >= {gt}"));
            }
        }
        if let Some(lt) = self.less_than() {
            if other >= &lt {
                return Compatibility::incompatible(format!("version too high for < {lt}"));
            }
        }
        Compatibility::Compatible
    }

    /// Test that some version exists which satisfies both this range and other.
    ///
    /// This check is conservative for union and exclusion ranges: it may
    /// report compatibility for ranges whose actual intersection is empty,
    /// in which case the emptiness surfaces later as an unsatisfiable solve.
    fn intersects(&self, other: &VersionRange) -> Compatibility {
        let self_lower = self.greater_or_equal_to();
        let self_upper = self.less_than();
        let other_lower = other.greater_or_equal_to();
        let other_upper = other.less_than();

        if let (Some(self_upper), Some(other_lower)) = (&self_upper, &other_lower) {
            if other_lower >= self_upper {
                return Compatibility::incompatible(format!(
                    "[{self}] does not intersect with [{other}], all versions too high"
                ));
            }
        }
        if let (Some(self_lower), Some(other_upper)) = (&self_lower, &other_upper) {
            if self_lower >= other_upper {
                return Compatibility::incompatible(format!(
                    "[{self}] does not intersect with [{other}], all versions too low"
                ));
            }
        }
        Compatibility::Compatible
    }

    /// The simple ranges that make up this one.
    ///
    /// All simple ranges return themselves, filters return their members.
    fn rules(&self) -> Vec<VersionRange> {
        vec![self.clone().into()]
    }
}

impl<T: Ranged> Ranged for &T {
    fn greater_or_equal_to(&self) -> Option<Version> {
        Ranged::greater_or_equal_to(*self)
    }
    fn less_than(&self) -> Option<Version> {
        Ranged::less_than(*self)
    }
    fn is_applicable(&self, other: &Version) -> Compatibility {
        Ranged::is_applicable(*self, other)
    }
    fn intersects(&self, other: &VersionRange) -> Compatibility {
        Ranged::intersects(*self, other)
    }
    fn rules(&self) -> Vec<VersionRange> {
        Ranged::rules(*self)
    }
}

/// Specifies a range of version numbers by inclusion or exclusion.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[enum_dispatch(Ranged)]
pub enum VersionRange {
    Equals(EqualsVersion),
    Filter(VersionFilter),
    Interval(IntervalRange),
    NotEquals(NotEqualsVersion),
    Prefix(PrefixRange),
}

impl VersionRange {
    /// A range that admits any version at all.
    pub fn any() -> Self {
        VersionRange::Interval(IntervalRange {
            minimum: None,
            maximum: None,
        })
    }

    /// True if this range places no restriction on the version.
    pub fn is_any(&self) -> bool {
        matches!(
            self,
            VersionRange::Interval(IntervalRange {
                minimum: None,
                maximum: None,
            })
        )
    }

}

impl Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            VersionRange::Equals(vr) => vr.fmt(f),
            VersionRange::Filter(vr) => vr.fmt(f),
            VersionRange::Interval(vr) => vr.fmt(f),
            VersionRange::NotEquals(vr) => vr.fmt(f),
            VersionRange::Prefix(vr) => vr.fmt(f),
        }
    }
}

impl FromStr for VersionRange {
    type Err = crate::Error;

    fn from_str(range_str: &str) -> crate::Result<Self> {
        use nom::combinator::all_consuming;

        if range_str.is_empty() {
            // an empty range is allowed to mean "any version"
            return Ok(VersionRange::any());
        }
        all_consuming(crate::parsing::version_range::<nom_supreme::error::ErrorTree<_>>)(range_str)
            .map(|(_, vr)| vr)
            .map_err(|err| match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => {
                    crate::Error::InvalidVersionRange(e.to_string())
                }
                nom::Err::Incomplete(_) => unreachable!(),
            })
    }
}

/// Parse a version range from a string.
pub fn parse_version_range<S: AsRef<str>>(source: S) -> crate::Result<VersionRange> {
    VersionRange::from_str(source.as_ref())
}

impl<T: Ranged> From<&T> for VersionRange {
    fn from(other: &T) -> Self {
        other.to_owned().into()
    }
}

impl Serialize for VersionRange {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Matches an exact version number, eg: `=1.2.3`.
///
/// Trailing zeros are insignificant as in version
/// equality: `=1.2` matches `1.2.0` but not `1.2.1`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EqualsVersion {
    pub version: Version,
}

impl EqualsVersion {
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl From<Version> for EqualsVersion {
    fn from(version: Version) -> Self {
        Self { version }
    }
}

impl Ranged for EqualsVersion {
    fn greater_or_equal_to(&self) -> Option<Version> {
        Some(self.version.clone())
    }

    fn less_than(&self) -> Option<Version> {
        Some(self.version.clone().plus_epsilon())
    }

    fn is_applicable(&self, other: &Version) -> Compatibility {
        if &self.version == other {
            Compatibility::Compatible
        } else {
            Compatibility::incompatible(format!("{other} !! {self} [not equal]"))
        }
    }
}

impl Display for EqualsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_char('=')?;
        f.write_str(&self.version.to_string())
    }
}

/// Excludes a single version number, eg: `!=1.2.3`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NotEqualsVersion {
    pub version: Version,
}

impl NotEqualsVersion {
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl Ranged for NotEqualsVersion {
    fn greater_or_equal_to(&self) -> Option<Version> {
        None
    }

    fn less_than(&self) -> Option<Version> {
        None
    }

    fn is_applicable(&self, other: &Version) -> Compatibility {
        if &self.version == other {
            Compatibility::incompatible(format!("{other} !! {self} [excluded]"))
        } else {
            Compatibility::Compatible
        }
    }

    fn intersects(&self, other: &VersionRange) -> Compatibility {
        // an exclusion only empties out a matching equality
        match other {
            VersionRange::Equals(eq) if eq.version == self.version => {
                Compatibility::incompatible(format!("[{self}] does not intersect with [{other}]"))
            }
            _ => Compatibility::Compatible,
        }
    }
}

impl Display for NotEqualsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("!=")?;
        f.write_str(&self.version.to_string())
    }
}

/// Matches a version and any of its deeper point releases.
///
/// `1.2` admits `1.2`, `1.2.3` and `1.2.3.4`, but not `1.20`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PrefixRange {
    pub base: Version,
}

impl PrefixRange {
    pub fn new(base: Version) -> Self {
        Self { base }
    }
}

impl Ranged for PrefixRange {
    fn greater_or_equal_to(&self) -> Option<Version> {
        Some(self.base.clone())
    }

    fn less_than(&self) -> Option<Version> {
        Some(increment_last_part(&self.base))
    }

    fn is_applicable(&self, other: &Version) -> Compatibility {
        if self.base.is_prefix_of(other) {
            Compatibility::Compatible
        } else {
            Compatibility::incompatible(format!("{other} !! {self} [not a point release]"))
        }
    }
}

impl Display for PrefixRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.base.to_string())
    }
}

/// Matches versions between two optional, inclusive bounds.
///
/// The upper bound is inclusive of its own point releases:
/// `:1.9` admits `1.9.4`. Either side may be omitted:
/// `1.2:`, `:1.9`, `1.2:1.9`, and the unbounded `:`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IntervalRange {
    pub minimum: Option<Version>,
    pub maximum: Option<Version>,
}

impl IntervalRange {
    pub fn new(minimum: Option<Version>, maximum: Option<Version>) -> Self {
        Self { minimum, maximum }
    }
}

impl Ranged for IntervalRange {
    fn greater_or_equal_to(&self) -> Option<Version> {
        self.minimum.clone()
    }

    fn less_than(&self) -> Option<Version> {
        self.maximum.as_ref().map(|max| {
            if max.pre.is_empty() && max.post.is_empty() {
                // inclusive of the bound's own point releases:
                // :1.9 admits 1.9.4 but not 1.10
                increment_last_part(max)
            } else {
                // a tagged bound is an exact version, include only it
                max.clone().plus_epsilon()
            }
        })
    }
}

impl Display for IntervalRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(minimum) = &self.minimum {
            f.write_str(&minimum.to_string())?;
        }
        f.write_char(':')?;
        if let Some(maximum) = &self.maximum {
            f.write_str(&maximum.to_string())?;
        }
        Ok(())
    }
}

/// A comma-separated union of ranges, eg `1.2:1.9,2.1`.
///
/// A version is applicable if any member admits it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VersionFilter {
    rules: Vec<VersionRange>,
}

impl VersionFilter {
    pub fn new<I: IntoIterator<Item = VersionRange>>(rules: I) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }
}

impl Ranged for VersionFilter {
    fn greater_or_equal_to(&self) -> Option<Version> {
        // the union is bounded below only if every member is
        self.rules
            .iter()
            .map(Ranged::greater_or_equal_to)
            .collect::<Option<Vec<_>>>()
            .and_then(|bounds| bounds.into_iter().min())
    }

    fn less_than(&self) -> Option<Version> {
        self.rules
            .iter()
            .map(Ranged::less_than)
            .collect::<Option<Vec<_>>>()
            .and_then(|bounds| bounds.into_iter().max())
    }

    fn is_applicable(&self, version: &Version) -> Compatibility {
        for rule in self.rules.iter() {
            if rule.is_applicable(version).is_ok() {
                return Compatibility::Compatible;
            }
        }
        Compatibility::incompatible(format!("{version} !! {self} [no member matches]"))
    }

    fn intersects(&self, other: &VersionRange) -> Compatibility {
        for rule in self.rules.iter() {
            if rule.intersects(other).is_ok() {
                return Compatibility::Compatible;
            }
        }
        Compatibility::incompatible(format!("[{self}] does not intersect with [{other}]"))
    }

    fn rules(&self) -> Vec<VersionRange> {
        self.rules.clone()
    }
}

impl Display for VersionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = self
            .rules
            .iter()
            .map(ToString::to_string)
            .collect_vec()
            .join(VERSION_RANGE_SEP);
        f.write_str(&s)
    }
}

/// The smallest version that is greater than every point
/// release of the given version, eg 1.9 -> 1.10, 1 -> 2.
fn increment_last_part(version: &Version) -> Version {
    let mut parts = version.parts.parts.clone();
    match parts.last_mut() {
        Some(last) => *last += 1,
        None => parts.push(1),
    }
    Version::from_parts(parts)
}
