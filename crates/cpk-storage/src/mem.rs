// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cpk_name::PkgNameBuf;
use cpk_schema::Recipe;
use cpk_version::Version;

#[cfg(test)]
#[path = "./mem_test.rs"]
mod mem_test;

/// An in-memory repository of package recipes.
///
/// The primary backing store for tests and fixtures, and the cache
/// that the filesystem repository loads into.
#[derive(Clone, Debug, Default)]
pub struct MemRepository {
    recipes: BTreeMap<PkgNameBuf, Arc<Recipe>>,
    // virtual name -> all packages with a provides declaration for it
    providers: BTreeMap<PkgNameBuf, BTreeSet<PkgNameBuf>>,
}

impl MemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipe to this repository.
    ///
    /// Fails if a recipe is already published under the same name.
    pub fn publish_recipe(&mut self, recipe: Recipe) -> crate::Result<()> {
        if self.recipes.contains_key(recipe.pkg.as_str()) {
            return Err(crate::Error::PackageExists(recipe.pkg));
        }
        self.force_publish_recipe(recipe)
    }

    /// Add a recipe to this repository, replacing any existing one.
    pub fn force_publish_recipe(&mut self, recipe: Recipe) -> crate::Result<()> {
        let recipe = recipe.validated()?;
        for provide in recipe.provides.iter() {
            self.providers
                .entry(provide.virtual_name.clone())
                .or_default()
                .insert(recipe.pkg.clone());
        }
        self.recipes.insert(recipe.pkg.clone(), Arc::new(recipe));
        Ok(())
    }

    /// Read the recipe for the named package.
    pub fn read_recipe(&self, name: &str) -> crate::Result<Arc<Recipe>> {
        self.recipes
            .get(name)
            .cloned()
            .ok_or_else(|| crate::Error::PackageNotFound(name.to_string()))
    }

    /// The names of all packages in this repository, sorted.
    pub fn list_packages(&self) -> Vec<PkgNameBuf> {
        self.recipes.keys().cloned().collect()
    }

    /// The highest non-deprecated version declared for a package.
    pub fn highest_version(&self, name: &str) -> Option<Version> {
        let recipe = self.recipes.get(name)?;
        recipe
            .versions
            .iter()
            .filter(|decl| !decl.deprecated)
            .map(|decl| decl.version.clone())
            .max()
    }

    /// The packages declaring that they provide the named virtual.
    pub fn providers_of(&self, virtual_name: &str) -> Vec<PkgNameBuf> {
        self.providers
            .get(virtual_name)
            .map(|providers| providers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the given name refers to a virtual capability
    /// rather than a concrete package.
    pub fn is_virtual(&self, name: &str) -> bool {
        !self.recipes.contains_key(name) && self.providers.contains_key(name)
    }
}
