// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! Abstract package requests and concrete, hashable spec graphs.

mod arch;
mod compiler;
mod dep_kind;
mod error;
pub mod hash;
pub mod parsing;
mod request;
mod spec;
mod traversal;
mod variant;

pub use arch::Arch;
pub use compiler::{Compiler, CompilerRequest};
pub use dep_kind::{DepFlags, DepKind};
pub use error::{Error, Result};
pub use hash::{HashDescriptor, DAG, PROCESS};
pub use request::{parse_spec_request, SpecRequest};
pub use spec::{DepEdge, Spec};
pub use traversal::{topological, Traversal};
pub use variant::{VariantMap, VariantValue};

/// Parse a spec request from a string.
///
/// This will panic if the request is invalid,
/// and should only be used for testing.
///
/// ```
/// # #[macro_use] extern crate cpk_spec;
/// # fn main() {
/// spec_request!("mpileaks@2.3: ^mpich");
/// # }
/// ```
#[macro_export]
macro_rules! spec_request {
    ($request:literal) => {
        $crate::parse_spec_request($request).unwrap()
    };
}
