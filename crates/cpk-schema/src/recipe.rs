// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_hash::{Digest, Hasher};
use cpk_name::{PkgNameBuf, VariantName};
use cpk_spec::{CompilerRequest, DepFlags, SpecRequest, VariantMap, VariantValue};
use cpk_version::{Compatibility, Version};
use cpk_version_range::{Ranged, VersionRange};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "./recipe_test.rs"]
mod recipe_test;

/// One declared, installable version of a package.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VersionDecl {
    pub version: Version,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// The domain of values a variant may take.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantDomain {
    /// A boolean switch, eg `+shared`/`~shared`.
    Bool { default: bool },
    /// One or more values chosen from an enumerated set.
    Enum {
        values: Vec<String>,
        default: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        multi: bool,
    },
}

/// A variant declared by a package, present only for the
/// versions admitted by its `when` range.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: VariantName,
    #[serde(flatten)]
    pub domain: VariantDomain,
    #[serde(default = "VersionRange::any", skip_serializing_if = "VersionRange::is_any")]
    pub when: VersionRange,
}

impl VariantDecl {
    /// The value this variant takes when the request does not pin it.
    pub fn default_value(&self) -> VariantValue {
        match &self.domain {
            VariantDomain::Bool { default } => VariantValue::Bool(*default),
            VariantDomain::Enum { default, .. } => VariantValue::single(default.clone()),
        }
    }

    /// Check a requested value against this variant's domain.
    pub fn allows(&self, value: &VariantValue) -> Compatibility {
        match (&self.domain, value) {
            (VariantDomain::Bool { .. }, VariantValue::Bool(_)) => Compatibility::Compatible,
            (VariantDomain::Enum { values, multi, .. }, VariantValue::Values(chosen)) => {
                if !multi && chosen.len() > 1 {
                    return Compatibility::incompatible(format!(
                        "variant {} takes a single value, got {}",
                        self.name,
                        chosen.len()
                    ));
                }
                match chosen.iter().find(|value| !values.contains(value)) {
                    None => Compatibility::Compatible,
                    Some(unknown) => Compatibility::incompatible(format!(
                        "variant {} has no value {unknown}, expected one of {}",
                        self.name,
                        values.join(", ")
                    )),
                }
            }
            (VariantDomain::Bool { .. }, _) => Compatibility::incompatible(format!(
                "variant {} is boolean, got a value list",
                self.name
            )),
            (VariantDomain::Enum { .. }, _) => Compatibility::incompatible(format!(
                "variant {} takes enumerated values, got a boolean",
                self.name
            )),
        }
    }
}

/// One declared dependency edge, active when the declaring
/// package's version is admitted by `when`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DependDecl {
    /// The depended-upon package, possibly a virtual name.
    pub pkg: PkgNameBuf,
    #[serde(default = "VersionRange::any", skip_serializing_if = "VersionRange::is_any")]
    pub range: VersionRange,
    #[serde(default = "default_depflag")]
    pub depflag: DepFlags,
    #[serde(default = "VersionRange::any", skip_serializing_if = "VersionRange::is_any")]
    pub when: VersionRange,
    /// Variant constraints imposed on the dependency.
    #[serde(default, skip_serializing_if = "VariantMap::is_empty")]
    pub variants: VariantMap,
}

fn default_depflag() -> DepFlags {
    DepFlags::DEFAULT
}

/// A hard exclusion attached to a package.
///
/// A build is excluded when its own version is admitted by `when`
/// and the compiler or a resolved dependency matches the stated
/// constraint.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConflictDecl {
    #[serde(default = "VersionRange::any", skip_serializing_if = "VersionRange::is_any")]
    pub when: VersionRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<SpecRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Declares that a package fulfills a virtual capability.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProvideDecl {
    #[serde(rename = "virtual")]
    pub virtual_name: PkgNameBuf,
    #[serde(default = "VersionRange::any", skip_serializing_if = "VersionRange::is_any")]
    pub when: VersionRange,
}

/// A source patch applied for the versions admitted by `when`.
///
/// Patch identity participates in the recipe content digest, so a
/// patch change re-addresses every build of the affected versions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PatchDecl {
    pub name: String,
    pub sha256: String,
    #[serde(default = "VersionRange::any", skip_serializing_if = "VersionRange::is_any")]
    pub when: VersionRange,
}

/// A package recipe: everything the concretizer and builder
/// know about one package, as plain data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub pkg: PkgNameBuf,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub versions: Vec<VersionDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<DependDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<ProvideDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<PatchDecl>,
    #[serde(default)]
    pub build: crate::BuildSystem,
}

impl Recipe {
    /// Parse a recipe from yaml source.
    pub fn from_yaml<S: AsRef<str>>(source: S) -> crate::Result<Self> {
        let recipe: Recipe = serde_yaml::from_str(source.as_ref())?;
        recipe.validated()
    }

    /// Run self-consistency checks, returning the recipe unchanged.
    pub fn validated(self) -> crate::Result<Self> {
        if self.versions.is_empty() {
            return Err(crate::Error::invalid_recipe(
                &self.pkg,
                "recipe declares no versions",
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for decl in self.versions.iter() {
            if !seen.insert(&decl.version) {
                return Err(crate::Error::invalid_recipe(
                    &self.pkg,
                    format!("version {} is declared twice", decl.version),
                ));
            }
        }
        for variant in self.variants.iter() {
            if let VariantDomain::Enum { values, default, .. } = &variant.domain {
                if !values.contains(default) {
                    return Err(crate::Error::invalid_recipe(
                        &self.pkg,
                        format!(
                            "default {default} of variant {} is not among its values",
                            variant.name
                        ),
                    ));
                }
            }
        }
        for conflict in self.conflicts.iter() {
            if conflict.compiler.is_none() && conflict.dependency.is_none() {
                return Err(crate::Error::invalid_recipe(
                    &self.pkg,
                    "conflict constrains neither compiler nor dependency",
                ));
            }
        }
        Ok(self)
    }

    /// All declared versions, newest first.
    pub fn versions_newest_first(&self) -> Vec<&VersionDecl> {
        let mut versions: Vec<_> = self.versions.iter().collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        versions
    }

    /// Whether the given version is declared by this recipe.
    pub fn declares_version(&self, version: &Version) -> bool {
        self.versions.iter().any(|decl| &decl.version == version)
    }

    /// The variants that exist for the given version.
    pub fn variants_for(&self, version: &Version) -> impl Iterator<Item = &VariantDecl> {
        self.variants
            .iter()
            .filter(move |decl| decl.when.is_applicable(version).is_ok())
    }

    /// The dependencies that are active for the given version.
    pub fn depends_for(&self, version: &Version) -> impl Iterator<Item = &DependDecl> {
        self.depends
            .iter()
            .filter(move |decl| decl.when.is_applicable(version).is_ok())
    }

    /// The conflicts that apply to the given version.
    pub fn conflicts_for(&self, version: &Version) -> impl Iterator<Item = &ConflictDecl> {
        self.conflicts
            .iter()
            .filter(move |decl| decl.when.is_applicable(version).is_ok())
    }

    /// The patches applied to the given version.
    pub fn patches_for(&self, version: &Version) -> impl Iterator<Item = &PatchDecl> {
        self.patches
            .iter()
            .filter(move |decl| decl.when.is_applicable(version).is_ok())
    }

    /// The virtual this version provides, if it provides the named one.
    pub fn provides_virtual(&self, virtual_name: &str, version: &Version) -> bool {
        self.provides.iter().any(|decl| {
            decl.virtual_name == *virtual_name && decl.when.is_applicable(version).is_ok()
        })
    }

    /// The fully-defaulted variant assignment for the given version.
    pub fn default_variants(&self, version: &Version) -> VariantMap {
        self.variants_for(version)
            .map(|decl| (decl.name.clone(), decl.default_value()))
            .collect()
    }

    /// The content digest of this recipe.
    ///
    /// Covers the canonical serialized form of the complete recipe,
    /// including conditional patches. This is the `package_hash`
    /// input of spec hashing.
    pub fn content_digest(&self) -> Digest {
        let canonical = serde_json::to_string(self).expect("a valid recipe always serializes");
        let mut hasher = Hasher::new();
        hasher.update(canonical.as_bytes());
        hasher.digest()
    }
}
