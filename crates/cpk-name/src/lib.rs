// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

mod error;
mod name;

pub use error::{Error, Result};
pub use name::{validate_pkg_name, validate_variant_name, InvalidNameError, PkgNameBuf, VariantName};

/// Parse a package name from a string.
///
/// This will panic if the name is invalid,
/// and should only be used for testing.
///
/// ```
/// # #[macro_use] extern crate cpk_name;
/// # fn main() {
/// pkg_name!("my-pkg");
/// # }
/// ```
#[macro_export]
macro_rules! pkg_name {
    ($name:literal) => {
        $crate::PkgNameBuf::new($name).unwrap()
    };
}

/// Parse a variant name from a string.
///
/// This will panic if the name is invalid,
/// and should only be used for testing.
///
/// ```
/// # #[macro_use] extern crate cpk_name;
/// # fn main() {
/// variant_name!("build_type");
/// # }
/// ```
#[macro_export]
macro_rules! variant_name {
    ($name:literal) => {
        $crate::VariantName::new($name).unwrap()
    };
}
