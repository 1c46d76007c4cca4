// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_name::PkgNameBuf;
use cpk_version::{Compatibility, Version};
use cpk_version_range::{Ranged, VersionRange};
use serde::{Deserialize, Serialize};

/// A constraint on the compiler used to build a package,
/// eg `%gcc@9:` in a spec request.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CompilerRequest {
    pub name: PkgNameBuf,
    pub version: VersionRange,
}

impl CompilerRequest {
    pub fn new(name: PkgNameBuf) -> Self {
        Self {
            name,
            version: VersionRange::any(),
        }
    }

    /// Check a concrete compiler against this constraint.
    pub fn is_satisfied_by(&self, compiler: &Compiler) -> Compatibility {
        if self.name != compiler.name {
            return Compatibility::incompatible(format!(
                "wrong compiler: wanted {}, got {}",
                self.name, compiler.name
            ));
        }
        self.version.is_applicable(&compiler.version)
    }
}

impl std::fmt::Display for CompilerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name.as_str())?;
        if !self.version.is_any() {
            write!(f, "@{}", self.version)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for CompilerRequest {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let (name, version) = s.split_once('@').unwrap_or((s, ""));
        Ok(Self {
            name: PkgNameBuf::new(name)?,
            version: cpk_version_range::parse_version_range(version)?,
        })
    }
}

impl serde::Serialize for CompilerRequest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CompilerRequest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The concrete compiler a package is or would be built with.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Compiler {
    pub name: PkgNameBuf,
    pub version: Version,
}

impl Compiler {
    pub fn new(name: PkgNameBuf, version: Version) -> Self {
        Self { name, version }
    }
}

impl std::fmt::Display for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
