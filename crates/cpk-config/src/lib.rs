// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! Explicit, passed-down configuration for cpk.
//!
//! Configuration is loaded once and handed to the components that
//! need it; there is deliberately no process-global configuration
//! state to initialize or tear down implicitly.

mod config;
mod error;

pub use config::{Config, OptimizationCriterion, SolverConfig};
pub use error::{Error, Result};
