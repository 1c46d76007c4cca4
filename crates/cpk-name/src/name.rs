// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::borrow::Borrow;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::Result;

#[cfg(test)]
#[path = "./name_test.rs"]
mod name_test;

/// Denotes that an invalid package or variant name was given.
#[derive(Debug, Error)]
#[error("Invalid name: {message}")]
pub struct InvalidNameError {
    pub message: String,
}

impl InvalidNameError {
    pub fn new_error(msg: String) -> crate::Error {
        crate::Error::InvalidName(Self { message: msg })
    }
}

/// An owned, validated package name.
///
/// Package names are lowercase ascii words that may contain
/// digits and hyphens, eg: `gcc`, `openmpi`, `py-numpy`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PkgNameBuf(String);

impl PkgNameBuf {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 64;

    /// Create a package name from the given string, validating it.
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        validate_pkg_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume this name, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::ops::Deref for PkgNameBuf {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for PkgNameBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PkgNameBuf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PkgNameBuf {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PkgNameBuf {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PkgNameBuf {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl FromStr for PkgNameBuf {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for PkgNameBuf {
    type Error = crate::Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for PkgNameBuf {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for PkgNameBuf {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PkgNameBuf {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// An owned, validated variant name.
///
/// Variant names follow the same rules as package names
/// but may additionally contain underscores, eg: `build_type`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VariantName(String);

impl VariantName {
    // all valid package names must also be valid variant names,
    // so variants are constrained by the same size limits
    pub const MIN_LEN: usize = PkgNameBuf::MIN_LEN;
    pub const MAX_LEN: usize = PkgNameBuf::MAX_LEN;

    /// Create a variant name from the given string, validating it.
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        validate_variant_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for VariantName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for VariantName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VariantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VariantName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VariantName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl FromStr for VariantName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for VariantName {
    type Error = crate::Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PkgNameBuf> for VariantName {
    fn from(name: PkgNameBuf) -> Self {
        // all package names are valid variant names
        Self(name.into_inner())
    }
}

impl Serialize for VariantName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VariantName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// Ensure that the provided string is a valid package name
pub fn validate_pkg_name<S: AsRef<str>>(name: S) -> Result<()> {
    validate_name_str(name.as_ref(), "package", is_valid_pkg_name_char)
}

/// Ensure that the provided string is a valid variant name
pub fn validate_variant_name<S: AsRef<str>>(name: S) -> Result<()> {
    validate_name_str(name.as_ref(), "variant", is_valid_variant_name_char)
}

fn validate_name_str<V>(name: &str, what: &str, validator: V) -> Result<()>
where
    V: Fn(char) -> bool,
{
    if name.len() < PkgNameBuf::MIN_LEN {
        return Err(InvalidNameError::new_error(format!(
            "Invalid {} name, must be at least {} characters, got {} [{}]",
            what,
            PkgNameBuf::MIN_LEN,
            name,
            name.len(),
        )));
    }
    if name.len() > PkgNameBuf::MAX_LEN {
        return Err(InvalidNameError::new_error(format!(
            "Invalid {} name, must be no more than {} characters, got {} [{}]",
            what,
            PkgNameBuf::MAX_LEN,
            name,
            name.len(),
        )));
    }
    if !name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
    {
        return Err(InvalidNameError::new_error(format!(
            "Invalid {} name, must begin with a lowercase letter, got {}",
            what, name
        )));
    }
    match name.char_indices().find(|(_, c)| !validator(*c)) {
        None => Ok(()),
        Some((index, c)) => Err(InvalidNameError::new_error(format!(
            "Invalid {} name at pos {}: {} > {} < {}",
            what,
            index,
            &name[..index],
            c,
            &name[(index + c.len_utf8())..],
        ))),
    }
}

fn is_valid_pkg_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

fn is_valid_variant_name_char(c: char) -> bool {
    // variant names are a superset of all valid package names
    is_valid_pkg_name_char(c) || c == '_'
}
