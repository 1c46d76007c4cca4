// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::sync::Arc;

use cpk_name::PkgNameBuf;
use cpk_schema::Recipe;
use cpk_version::Version;

use crate::{FsRepository, MemRepository};

/// One of the supported repository backends.
#[derive(Clone, Debug)]
pub enum RepositoryHandle {
    Mem(MemRepository),
    Fs(FsRepository),
}

impl RepositoryHandle {
    pub fn new_mem() -> Self {
        Self::Mem(MemRepository::new())
    }

    pub fn read_recipe(&self, name: &str) -> crate::Result<Arc<Recipe>> {
        match self {
            Self::Mem(repo) => repo.read_recipe(name),
            Self::Fs(repo) => repo.read_recipe(name),
        }
    }

    pub fn list_packages(&self) -> Vec<PkgNameBuf> {
        match self {
            Self::Mem(repo) => repo.list_packages(),
            Self::Fs(repo) => repo.list_packages(),
        }
    }

    pub fn highest_version(&self, name: &str) -> Option<Version> {
        match self {
            Self::Mem(repo) => repo.highest_version(name),
            Self::Fs(repo) => repo.highest_version(name),
        }
    }

    pub fn providers_of(&self, virtual_name: &str) -> Vec<PkgNameBuf> {
        match self {
            Self::Mem(repo) => repo.providers_of(virtual_name),
            Self::Fs(repo) => repo.providers_of(virtual_name),
        }
    }

    pub fn is_virtual(&self, name: &str) -> bool {
        match self {
            Self::Mem(repo) => repo.is_virtual(name),
            Self::Fs(repo) => repo.is_virtual(name),
        }
    }
}

impl From<MemRepository> for RepositoryHandle {
    fn from(repo: MemRepository) -> Self {
        Self::Mem(repo)
    }
}

impl From<FsRepository> for RepositoryHandle {
    fn from(repo: FsRepository) -> Self {
        Self::Fs(repo)
    }
}

impl From<MemRepository> for Arc<RepositoryHandle> {
    fn from(repo: MemRepository) -> Self {
        Arc::new(repo.into())
    }
}

impl From<FsRepository> for Arc<RepositoryHandle> {
    fn from(repo: FsRepository) -> Self {
        Arc::new(repo.into())
    }
}
