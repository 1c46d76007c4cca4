// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(test)]
#[path = "./dep_kind_test.rs"]
mod dep_kind_test;

/// When a dependency edge is needed by its parent.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum DepKind {
    Build,
    Link,
    Run,
    Test,
}

impl DepKind {
    fn mask(self) -> u8 {
        match self {
            DepKind::Build => 1 << 0,
            DepKind::Link => 1 << 1,
            DepKind::Run => 1 << 2,
            DepKind::Test => 1 << 3,
        }
    }
}

/// A set of [`DepKind`] values tagging one dependency edge.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DepFlags(u8);

impl DepFlags {
    pub const NONE: DepFlags = DepFlags(0);
    pub const BUILD: DepFlags = DepFlags(1 << 0);
    pub const LINK: DepFlags = DepFlags(1 << 1);
    pub const RUN: DepFlags = DepFlags(1 << 2);
    pub const TEST: DepFlags = DepFlags(1 << 3);
    pub const ALL: DepFlags = DepFlags(0b1111);

    /// The default deptype of a declared dependency: needed
    /// both to produce the parent and at its runtime.
    pub const DEFAULT: DepFlags = DepFlags(0b0111);

    pub fn contains(&self, kind: DepKind) -> bool {
        self.0 & kind.mask() != 0
    }

    pub fn intersects(&self, other: DepFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(&self, other: DepFlags) -> DepFlags {
        DepFlags(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = DepKind> + '_ {
        use strum::IntoEnumIterator;
        DepKind::iter().filter(|kind| self.contains(*kind))
    }
}

impl std::ops::BitOr for DepFlags {
    type Output = DepFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        DepFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for DepFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<DepKind> for DepFlags {
    fn from(kind: DepKind) -> Self {
        DepFlags(kind.mask())
    }
}

impl FromIterator<DepKind> for DepFlags {
    fn from_iter<T: IntoIterator<Item = DepKind>>(iter: T) -> Self {
        iter.into_iter()
            .fold(DepFlags::NONE, |flags, kind| flags | kind.into())
    }
}

impl std::fmt::Debug for DepFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for DepFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let names: Vec<_> = self.iter().map(|kind| kind.to_string()).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for DepFlags {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s.is_empty() {
            return Ok(DepFlags::NONE);
        }
        s.split(',')
            .map(|name| {
                DepKind::from_str(name.trim())
                    .map_err(|_| crate::Error::InvalidDepKind(name.to_string()))
            })
            .collect()
    }
}

impl Serialize for DepFlags {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for DepFlags {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let kinds = Vec::<String>::deserialize(deserializer)?;
        kinds
            .iter()
            .map(|name| {
                DepKind::from_str(name)
                    .map_err(|_| serde::de::Error::custom(format!("invalid deptype: {name}")))
            })
            .collect()
    }
}

impl Serialize for DepKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DepKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DepKind::from_str(&s)
            .map_err(|_| serde::de::Error::custom(format!("invalid deptype: {s}")))
    }
}
