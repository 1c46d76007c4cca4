// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

mod error;
pub mod parsing;
mod version_range;

pub use error::{Error, Result};
pub use version_range::{
    parse_version_range, EqualsVersion, IntervalRange, NotEqualsVersion, PrefixRange, Ranged,
    VersionFilter, VersionRange, VERSION_RANGE_SEP,
};

/// Parse a version range from a string.
///
/// This will panic if the range is invalid,
/// and should only be used for testing.
///
/// ```
/// # #[macro_use] extern crate cpk_version_range;
/// # fn main() {
/// version_range!("1.2:1.9");
/// # }
/// ```
#[macro_export]
macro_rules! version_range {
    ($range:literal) => {
        $crate::parse_version_range($range).unwrap()
    };
}
