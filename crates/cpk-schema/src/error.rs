// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to parse recipe: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("Invalid recipe for {pkg}: {message}")]
    InvalidRecipe { pkg: String, message: String },
    #[error(transparent)]
    Spec(#[from] cpk_spec::Error),
}

impl Error {
    pub fn invalid_recipe<P: ToString, M: ToString>(pkg: P, message: M) -> Self {
        Self::InvalidRecipe {
            pkg: pkg.to_string(),
            message: message.to_string(),
        }
    }
}
