// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Package not found: {0}")]
    PackageNotFound(String),
    #[error("Package already published: {0}")]
    PackageExists(cpk_name::PkgNameBuf),
    #[error(transparent)]
    Schema(#[from] cpk_schema::Error),
    #[error("Failed to read {path}")]
    FailedRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
