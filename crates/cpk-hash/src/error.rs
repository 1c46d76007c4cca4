// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not decode digest: {0}")]
    InvalidDigestEncoding(#[source] data_encoding::DecodeError),
    #[error("Invalid number of bytes for digest: {0} != {}", super::DIGEST_SIZE)]
    InvalidDigestLength(usize),
}
