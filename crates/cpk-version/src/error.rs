// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidVersion(#[from] crate::InvalidVersionError),
}
