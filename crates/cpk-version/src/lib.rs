// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

mod compat;
mod error;
mod version;

pub use compat::Compatibility;
pub use error::{Error, Result};
pub use version::{
    parse_tag_set, parse_version, InvalidVersionError, TagSet, Version, VersionParts, VERSION_SEP,
};

/// Parse a version number from a string.
///
/// This will panic if the version is invalid,
/// and should only be used for testing.
///
/// ```
/// # #[macro_use] extern crate cpk_version;
/// # fn main() {
/// version!("1.2.3");
/// # }
/// ```
#[macro_export]
macro_rules! version {
    ($version:literal) => {
        $crate::parse_version($version).unwrap()
    };
}
