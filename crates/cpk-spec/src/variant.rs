// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use cpk_name::VariantName;
use cpk_version::Compatibility;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(test)]
#[path = "./variant_test.rs"]
mod variant_test;

/// The value taken by one variant of one package.
///
/// Variants are either boolean switches or one or more values
/// chosen from an enumerated domain.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum VariantValue {
    Bool(bool),
    Values(BTreeSet<String>),
}

impl VariantValue {
    pub fn single<S: Into<String>>(value: S) -> Self {
        Self::Values(std::iter::once(value.into()).collect())
    }

    pub fn multi<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> Self {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    /// Check this concrete value against a constrained one.
    ///
    /// Boolean values must match exactly, value sets must include
    /// everything that the constraint names.
    pub fn satisfies(&self, constraint: &VariantValue) -> bool {
        match (self, constraint) {
            (Self::Bool(actual), Self::Bool(wanted)) => actual == wanted,
            (Self::Values(actual), Self::Values(wanted)) => wanted.is_subset(actual),
            _ => false,
        }
    }
}

impl From<bool> for VariantValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for VariantValue {
    fn from(value: &str) -> Self {
        Self::multi(value.split(','))
    }
}

impl Serialize for VariantValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Values(values) if values.len() == 1 => {
                serializer.serialize_str(values.iter().next().expect("set is not empty"))
            }
            Self::Values(values) => serializer.collect_seq(values.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for VariantValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VariantValueVisitor;
        impl<'de> serde::de::Visitor<'de> for VariantValueVisitor {
            type Value = VariantValue;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a bool, string, or list of strings")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(VariantValue::Bool(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(VariantValue::from(value))
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut values = BTreeSet::new();
                while let Some(value) = seq.next_element::<String>()? {
                    values.insert(value);
                }
                Ok(VariantValue::Values(values))
            }
        }
        deserializer.deserialize_any(VariantValueVisitor)
    }
}

/// A set of values for package variants.
///
/// In an abstract request this is a set of constraints; on a
/// concrete spec every active variant of the package is pinned.
#[derive(Clone, Default, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct VariantMap {
    variants: BTreeMap<VariantName, VariantValue>,
}

impl std::ops::Deref for VariantMap {
    type Target = BTreeMap<VariantName, VariantValue>;

    fn deref(&self) -> &Self::Target {
        &self.variants
    }
}

impl std::ops::DerefMut for VariantMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.variants
    }
}

impl FromIterator<(VariantName, VariantValue)> for VariantMap {
    fn from_iter<T: IntoIterator<Item = (VariantName, VariantValue)>>(iter: T) -> Self {
        Self {
            variants: BTreeMap::from_iter(iter),
        }
    }
}

impl IntoIterator for VariantMap {
    type IntoIter = std::collections::btree_map::IntoIter<VariantName, VariantValue>;
    type Item = (VariantName, VariantValue);

    fn into_iter(self) -> Self::IntoIter {
        self.variants.into_iter()
    }
}

impl std::fmt::Debug for VariantMap {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for VariantMap {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for (name, value) in self.variants.iter() {
            match value {
                VariantValue::Bool(true) => write!(f, "+{name}")?,
                VariantValue::Bool(false) => write!(f, "~{name}")?,
                VariantValue::Values(values) => {
                    if !first {
                        f.write_char(' ')?;
                    }
                    write!(f, "{name}={}", values.iter().join(","))?;
                }
            }
            first = false;
        }
        Ok(())
    }
}

impl VariantMap {
    /// True when no variant is constrained or pinned.
    ///
    /// Named explicitly (rather than through deref) so that it can
    /// be used in serde `skip_serializing_if` attributes.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Check every constraint in `other` against this map.
    ///
    /// Variants that `other` does not mention are unconstrained.
    pub fn satisfies(&self, other: &VariantMap) -> Compatibility {
        for (name, wanted) in other.iter() {
            match self.variants.get(name) {
                None => {
                    return Compatibility::incompatible(format!("no value for variant {name}"));
                }
                Some(actual) if !actual.satisfies(wanted) => {
                    return Compatibility::incompatible(format!(
                        "variant {name} has {}, requested {}",
                        DisplayValue(name, actual),
                        DisplayValue(name, wanted),
                    ));
                }
                Some(_) => continue,
            }
        }
        Compatibility::Compatible
    }

    /// Add all entries from other, requiring agreement on shared names.
    pub fn merge(&mut self, other: &VariantMap) -> Compatibility {
        for (name, value) in other.iter() {
            match self.variants.get_mut(name) {
                None => {
                    self.variants.insert(name.clone(), value.clone());
                }
                Some(existing) if existing == value => continue,
                Some(VariantValue::Values(existing)) => {
                    if let VariantValue::Values(more) = value {
                        // an enumerated constraint accumulates values
                        existing.extend(more.iter().cloned());
                        continue;
                    }
                    return Compatibility::incompatible(format!(
                        "conflicting constraints for variant {name}"
                    ));
                }
                Some(_) => {
                    return Compatibility::incompatible(format!(
                        "conflicting constraints for variant {name}"
                    ));
                }
            }
        }
        Compatibility::Compatible
    }
}

struct DisplayValue<'a>(&'a VariantName, &'a VariantValue);

impl std::fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.1 {
            VariantValue::Bool(true) => write!(f, "+{}", self.0),
            VariantValue::Bool(false) => write!(f, "~{}", self.0),
            VariantValue::Values(values) => write!(f, "{}={}", self.0, values.iter().join(",")),
        }
    }
}

impl Serialize for VariantMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.variants.iter())
    }
}

impl<'de> Deserialize<'de> for VariantMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let variants = BTreeMap::<VariantName, VariantValue>::deserialize(deserializer)?;
        Ok(Self { variants })
    }
}
