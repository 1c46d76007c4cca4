// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

#![deny(unsafe_op_in_unsafe_fn)]

//! cpk concretizes abstract package requests into fully pinned,
//! content-addressed dependency graphs.
//!
//! ```no_run
//! use cpk::solve::Solver;
//! use cpk::spec::parse_spec_request;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = cpk::config::Config::load()?;
//! let mut solver = Solver::new(config.solver);
//! solver.add_repository(cpk::storage::FsRepository::open("./recipes")?);
//! solver.add_request(parse_spec_request("mpileaks@2.3: ^mpich")?);
//! let solution = solver.solve()?;
//! println!("{solution}");
//! # Ok(())
//! # }
//! ```

pub use cpk_config as config;
pub use cpk_hash as hash;
pub use cpk_name as name;
pub use cpk_schema as schema;
pub use cpk_solve as solve;
pub use cpk_spec as spec;
pub use cpk_storage as storage;
pub use cpk_version as version;
pub use cpk_version_range as version_range;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
