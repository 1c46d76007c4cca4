// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! Content-addressing primitives for concrete dependency graphs.

mod error;
mod hash;

pub use error::{Error, Result};
pub use hash::{Digest, Hasher, DIGEST_SIZE, ENCODED_DIGEST_SIZE, NULL_DIGEST};
