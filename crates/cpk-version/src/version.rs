// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[cfg(test)]
#[path = "./version_test.rs"]
mod version_test;

pub const VERSION_SEP: &str = ".";
const TAG_SET_SEP: &str = ",";
const TAG_SEP: &str = ".";

/// Denotes that an invalid version number was given.
#[derive(Debug, Error)]
#[error("Invalid version: {message}")]
pub struct InvalidVersionError {
    pub message: String,
}

impl InvalidVersionError {
    pub fn new_error(msg: String) -> crate::Error {
        crate::Error::InvalidVersion(Self { message: msg })
    }
}

/// TagSet contains a set of pre or post release version tags.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct TagSet {
    tags: BTreeMap<String, u32>,
}

impl TagSet {
    pub fn single<S: Into<String>>(name: S, value: u32) -> TagSet {
        let mut tag_set = TagSet::default();
        tag_set.tags.insert(name.into(), value);
        tag_set
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&u32> {
        self.tags.get(name)
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let parts: Vec<_> = self
            .tags
            .iter()
            .map(|(name, num)| format!("{name}{TAG_SEP}{num}"))
            .collect();
        f.write_str(&parts.join(TAG_SET_SEP))
    }
}

impl PartialOrd for TagSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TagSet {
    fn cmp(&self, other: &Self) -> Ordering {
        for (lhs, rhs) in self.tags.iter().zip(other.tags.iter()) {
            match lhs.cmp(&rhs) {
                Ordering::Equal => continue,
                res => return res,
            }
        }
        self.tags.len().cmp(&other.tags.len())
    }
}

impl FromStr for TagSet {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_tag_set(s)
    }
}

/// Parse the given string as a set of version tags.
///
/// ```
/// let tag_set = cpk_version::parse_tag_set("dev.4,alpha.1").unwrap();
/// assert_eq!(tag_set.get("alpha"), Some(&1));
/// ```
pub fn parse_tag_set<S: AsRef<str>>(tags: S) -> crate::Result<TagSet> {
    let tags = tags.as_ref();
    let mut tag_set = TagSet::default();
    if tags.is_empty() {
        return Ok(tag_set);
    }

    for tag in tags.split(TAG_SET_SEP) {
        let (name, num) = tag.split_once(TAG_SEP).unwrap_or((tag, ""));
        if name.is_empty() || num.is_empty() {
            return Err(InvalidVersionError::new_error(format!(
                "Version tag segment must be of the form <name>.<int>, got [{tag}]"
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidVersionError::new_error(format!(
                "Invalid tag name: [{name}]"
            )));
        }
        let num = num.parse().map_err(|_| {
            InvalidVersionError::new_error(format!(
                "Version tag segment must be of the form <name>.<int>, got [{tag}]"
            ))
        })?;
        if tag_set.tags.insert(name.to_string(), num).is_some() {
            return Err(InvalidVersionError::new_error(format!(
                "duplicate tag: {name}"
            )));
        }
    }

    Ok(tag_set)
}

/// The numeric portion of a version.
#[derive(Clone, Debug, Default)]
pub struct VersionParts {
    pub parts: Vec<u32>,
    /// For purposes of comparing versions, a version with this bit
    /// enabled is considered infinitesimally bigger than the stated
    /// version. An expression like "everything before 2.0" is then
    /// representable as an upper bound of `[2, 0]` without epsilon,
    /// and "up to and including 2.0's point releases" with it.
    pub plus_epsilon: bool,
}

impl std::ops::Deref for VersionParts {
    type Target = Vec<u32>;

    fn deref(&self) -> &Self::Target {
        &self.parts
    }
}

impl std::ops::DerefMut for VersionParts {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parts
    }
}

impl From<Vec<u32>> for VersionParts {
    fn from(parts: Vec<u32>) -> Self {
        Self {
            parts,
            plus_epsilon: false,
        }
    }
}

impl std::cmp::PartialEq for VersionParts {
    fn eq(&self, other: &Self) -> bool {
        if self.plus_epsilon != other.plus_epsilon {
            return false;
        }

        // trailing zeros do not distinguish versions: 1.2 == 1.2.0
        let self_last = self.parts.iter().rposition(|d| d != &0);
        let other_last = other.parts.iter().rposition(|d| d != &0);
        match (self_last, other_last) {
            (Some(a), Some(b)) => self.parts[..=a] == other.parts[..=b],
            (None, None) => true,
            _ => false,
        }
    }
}

impl std::cmp::Eq for VersionParts {}

impl std::hash::Hash for VersionParts {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // trailing zeros do not alter the hash/cmp for a version
        if let Some(last_nonzero) = self.parts.iter().rposition(|d| d != &0) {
            self.parts[..=last_nonzero].hash(state)
        };
        self.plus_epsilon.hash(state);
    }
}

/// Version specifies a package version number.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Version {
    pub parts: VersionParts,
    pub pre: TagSet,
    pub post: TagSet,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            parts: vec![major, minor, patch].into(),
            ..Default::default()
        }
    }

    /// Build a new version number from any number of digits.
    pub fn from_parts<P: IntoIterator<Item = u32>>(parts: P) -> Self {
        Version {
            parts: parts.into_iter().collect::<Vec<_>>().into(),
            ..Default::default()
        }
    }

    /// The major version number (first component)
    pub fn major(&self) -> u32 {
        self.parts.first().copied().unwrap_or_default()
    }

    /// The minor version number (second component)
    pub fn minor(&self) -> u32 {
        self.parts.get(1).copied().unwrap_or_default()
    }

    /// The patch version number (third component)
    pub fn patch(&self) -> u32 {
        self.parts.get(2).copied().unwrap_or_default()
    }

    /// Enable the `plus_epsilon` bit on this version, making it
    /// infinitesimally bigger than the stated version number.
    pub fn plus_epsilon(mut self) -> Self {
        self.parts.plus_epsilon = true;
        self
    }

    /// Reports whether the other version starts with this
    /// one, eg `1.2` is a prefix of `1.2.3` and of `1.2`,
    /// but not of `1.20`.
    pub fn is_prefix_of(&self, other: &Version) -> bool {
        if self.parts.len() > other.parts.len() {
            // a longer version can only be a prefix if the
            // extra parts are all zero, eg 1.2.0 prefixes 1.2
            return self
                .parts
                .iter()
                .skip(other.parts.len())
                .all(|p| *p == 0)
                && other.parts[..] == self.parts[..other.parts.len()];
        }
        self.parts[..] == other.parts[..self.parts.len()]
    }

    /// The base integer portion of this version as a string
    pub fn base(&self) -> String {
        let mut part_strings: Vec<_> = self.parts.iter().map(ToString::to_string).collect();
        if part_strings.is_empty() {
            // the base version cannot ever be an empty string, as that
            // is not a valid version
            part_strings.push(String::from("0"));
        }
        let mut s = part_strings.join(VERSION_SEP);
        // This suffix should only show up in incompatibility messages
        // built from range bounds, never in stored versions.
        if self.parts.plus_epsilon {
            s.push_str("+ε")
        }
        s
    }

    /// Format just the pre- and post-release tags (if any).
    pub fn format_tags(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !self.pre.is_empty() {
            f.write_char('-')?;
            f.write_str(&self.pre.to_string())?;
        }
        if !self.post.is_empty() {
            f.write_char('+')?;
            f.write_str(&self.post.to_string())?;
        }
        Ok(())
    }

    /// Reports if this version is exactly 0.0.0... etc.
    pub fn is_zero(&self) -> bool {
        if !self.pre.is_empty() || !self.post.is_empty() {
            return false;
        }
        !self.parts.iter().any(|x| x > &0)
    }
}

impl TryFrom<&str> for Version {
    type Error = crate::Error;

    fn try_from(value: &str) -> crate::Result<Self> {
        parse_version(value)
    }
}

impl FromStr for Version {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_version(s)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.base())?;
        self.format_tags(f)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut other_parts = other.parts.iter();

        for self_part in self.parts.iter() {
            match other_parts.next() {
                Some(other_part) => match self_part.cmp(other_part) {
                    Ordering::Equal => continue,
                    res => return res,
                },
                None if self_part == &0 => {
                    // having more parts than the other only makes
                    // us greater if it's a non-zero value
                    // eg: 1.2.0 == 1.2.0.0.0
                    continue;
                }
                None => {
                    return Ordering::Greater;
                }
            }
        }

        match other_parts.max() {
            // same as above, having more parts only matters
            // if they are non-zero
            None | Some(0) => {}
            Some(_) => {
                return Ordering::Less;
            }
        }

        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => (),
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => match self.pre.cmp(&other.pre) {
                Ordering::Equal => (),
                cmp => return cmp,
            },
        }

        // Compare epsilon _before_ post release:
        //
        //     1.73.0 < 1.73.0+r.1 < 1.73.0+ε
        //
        match (self.parts.plus_epsilon, other.parts.plus_epsilon) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => (),
        }

        self.post.cmp(&other.post)
    }
}

/// Parse a string as a version specifier.
pub fn parse_version<S: AsRef<str>>(version: S) -> crate::Result<Version> {
    let version = version.as_ref();
    if version.is_empty() {
        return Ok(Version::default());
    }

    let (version, post) = version.split_once('+').unwrap_or((version, ""));
    let (version, pre) = version.split_once('-').unwrap_or((version, ""));

    let mut parts = Vec::new();
    for (i, p) in version.split(VERSION_SEP).enumerate() {
        match p.parse() {
            Ok(p) => parts.push(p),
            Err(_) => {
                return Err(InvalidVersionError::new_error(format!(
                    "Version must be a sequence of integers, got '{p}' in position {i} [{version}]"
                )))
            }
        }
    }

    let mut v = Version::from_parts(parts);
    v.pre = parse_tag_set(pre)?;
    v.post = parse_tag_set(post)?;
    Ok(v)
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;
        impl serde::de::Visitor<'_> for VersionVisitor {
            type Value = Version;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a version number (eg: 1.0.0, 1.0.0-pre.1, 1.2.3.4+post.0)")
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Version, E>
            where
                E: serde::de::Error,
            {
                Version::from_str(value).map_err(serde::de::Error::custom)
            }
        }
        deserializer.deserialize_str(VersionVisitor)
    }
}
