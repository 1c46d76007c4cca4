// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cpk_name::PkgNameBuf;
use cpk_schema::Recipe;
use cpk_version::Version;

use crate::MemRepository;

#[cfg(test)]
#[path = "./fs_test.rs"]
mod fs_test;

/// A repository of `*.yaml` recipe files in one directory.
///
/// The directory is read eagerly when the repository is opened;
/// a repository is a read-only snapshot for the lifetime of a
/// solve, so later changes on disk are not observed.
#[derive(Clone, Debug)]
pub struct FsRepository {
    root: PathBuf,
    inner: MemRepository,
}

impl FsRepository {
    pub fn open<P: AsRef<Path>>(root: P) -> crate::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut inner = MemRepository::new();
        let entries = std::fs::read_dir(&root).map_err(|source| crate::Error::FailedRead {
            path: root.clone(),
            source,
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();
        for path in paths {
            if path.extension().map(|ext| ext != "yaml").unwrap_or(true) {
                tracing::debug!(?path, "skipping non-recipe file");
                continue;
            }
            let source =
                std::fs::read_to_string(&path).map_err(|source| crate::Error::FailedRead {
                    path: path.clone(),
                    source,
                })?;
            let recipe = Recipe::from_yaml(&source)?;
            if let Err(err) = inner.publish_recipe(recipe) {
                tracing::warn!(?path, "skipping recipe: {err}");
            }
        }
        Ok(Self { root, inner })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn read_recipe(&self, name: &str) -> crate::Result<Arc<Recipe>> {
        self.inner.read_recipe(name)
    }

    pub fn list_packages(&self) -> Vec<PkgNameBuf> {
        self.inner.list_packages()
    }

    pub fn highest_version(&self, name: &str) -> Option<Version> {
        self.inner.highest_version(name)
    }

    pub fn providers_of(&self, virtual_name: &str) -> Vec<PkgNameBuf> {
        self.inner.providers_of(virtual_name)
    }

    pub fn is_virtual(&self, name: &str) -> bool {
        self.inner.is_virtual(name)
    }
}
