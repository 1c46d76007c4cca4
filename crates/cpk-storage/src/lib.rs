// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! Read-only repositories of package recipes.

mod error;
mod fs;
mod handle;
mod mem;

pub use error::{Error, Result};
pub use fs::FsRepository;
pub use handle::RepositoryHandle;
pub use mem::MemRepository;
