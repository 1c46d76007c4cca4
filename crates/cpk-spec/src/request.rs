// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::fmt::Write;
use std::str::FromStr;

use cpk_name::PkgNameBuf;
use cpk_version_range::VersionRange;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Arch, CompilerRequest, VariantMap};

#[cfg(test)]
#[path = "./request_test.rs"]
mod request_test;

/// SpecRequest is a partial description of a desired package build.
///
/// Any unset field places no constraint on the eventual concrete
/// spec. Dependency constraints (`^dep...`) are kept as a flat list
/// attached to the root request, one entry per package name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SpecRequest {
    pub pkg: PkgNameBuf,
    pub version: VersionRange,
    pub compiler: Option<CompilerRequest>,
    pub arch: Option<Arch>,
    pub variants: VariantMap,
    pub dependencies: Vec<SpecRequest>,
}

impl SpecRequest {
    /// A request for any build at all of the named package.
    pub fn any(pkg: PkgNameBuf) -> Self {
        Self {
            pkg,
            version: VersionRange::any(),
            compiler: None,
            arch: None,
            variants: VariantMap::default(),
            dependencies: Vec::new(),
        }
    }

    /// Find the constraint for the named dependency, if any.
    pub fn dependency(&self, name: &str) -> Option<&SpecRequest> {
        self.dependencies.iter().find(|dep| dep.pkg == *name)
    }

    /// Attach a dependency constraint to this request.
    ///
    /// At most one constraint per package name may be present.
    pub fn add_dependency(&mut self, dep: SpecRequest) -> crate::Result<()> {
        if self.dependency(&dep.pkg).is_some() {
            return Err(crate::Error::invalid_request(
                &*self.pkg,
                format!("multiple constraints for dependency {}", dep.pkg),
            ));
        }
        self.dependencies.push(dep);
        Ok(())
    }
}

impl std::fmt::Display for SpecRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.pkg.as_str())?;
        if !self.version.is_any() {
            write!(f, "@{}", self.version)?;
        }
        if let Some(compiler) = &self.compiler {
            write!(f, "%{compiler}")?;
        }
        if !self.variants.is_empty() {
            let rendered = self.variants.to_string();
            if !rendered.starts_with(['+', '~']) {
                f.write_char(' ')?;
            }
            f.write_str(&rendered)?;
        }
        if let Some(arch) = &self.arch {
            write!(f, " arch={arch}")?;
        }
        for dep in self.dependencies.iter() {
            write!(f, " ^{dep}")?;
        }
        Ok(())
    }
}

impl FromStr for SpecRequest {
    type Err = crate::Error;

    fn from_str(source: &str) -> crate::Result<Self> {
        use nom::combinator::all_consuming;

        all_consuming(crate::parsing::spec_request::<nom_supreme::error::ErrorTree<_>>)(
            source.trim(),
        )
        .map(|(_, request)| request)
        .map_err(|err| match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                crate::Error::invalid_request(source, e.to_string())
            }
            nom::Err::Incomplete(_) => unreachable!(),
        })
    }
}

/// Parse a spec request string, eg `mpileaks@2.3:%gcc+debug ^mpich@3`.
pub fn parse_spec_request<S: AsRef<str>>(source: S) -> crate::Result<SpecRequest> {
    SpecRequest::from_str(source.as_ref())
}

impl Serialize for SpecRequest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecRequest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
