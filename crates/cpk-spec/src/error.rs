// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Name(#[from] cpk_name::Error),
    #[error(transparent)]
    Version(#[from] cpk_version::Error),
    #[error(transparent)]
    VersionRange(#[from] cpk_version_range::Error),
    #[error("Invalid spec request [{request}]: {message}")]
    InvalidRequest { request: String, message: String },
    #[error("Invalid architecture [{0}]: expected <platform>-<os>-<target>")]
    InvalidArch(String),
    #[error("Invalid dependency type: {0}")]
    InvalidDepKind(String),
    #[error(
        "Dependency graph already contains a different spec for package {pkg}: {existing} != {given}"
    )]
    ConflictingDependency {
        pkg: cpk_name::PkgNameBuf,
        existing: String,
        given: String,
    },
}

impl Error {
    pub fn invalid_request<R: ToString, M: ToString>(request: R, message: M) -> Self {
        Self::InvalidRequest {
            request: request.to_string(),
            message: message.to_string(),
        }
    }
}
