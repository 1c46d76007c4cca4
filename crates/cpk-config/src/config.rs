// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::collections::BTreeMap;

use cpk_name::PkgNameBuf;
use cpk_spec::{Arch, Compiler};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// One solver preference, applied in list order.
///
/// The configured criteria list is the documented optimization
/// policy of the concretizer: earlier entries outrank later ones,
/// and candidates are preferred lexicographically along it. The
/// order is part of the reproducibility contract of a deployment:
/// changing it changes which graphs a request concretizes to.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OptimizationCriterion {
    /// Prefer higher versions of every package.
    NewestVersion,
    /// Prefer candidates that can be taken from the reuse pool.
    Reuse,
    /// Prefer variant values that match the recipe defaults.
    DefaultVariants,
    /// Prefer the configured provider of a virtual package.
    PreferredProvider,
    /// Prefer the first configured compiler toolchain.
    DefaultCompiler,
}

impl OptimizationCriterion {
    /// The default policy order.
    ///
    /// Reuse ranks below version recency: an available reusable
    /// build never pins a package below the best version the
    /// request admits unless this order is reconfigured.
    pub fn default_order() -> Vec<OptimizationCriterion> {
        vec![
            Self::NewestVersion,
            Self::Reuse,
            Self::DefaultVariants,
            Self::PreferredProvider,
            Self::DefaultCompiler,
        ]
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Whether already-built specs may be offered to the solver.
    pub reuse: bool,

    /// The optimization criteria, most important first.
    pub criteria: Vec<OptimizationCriterion>,

    /// Abort a solve after this many search steps (0 = unbounded).
    ///
    /// A bounded solve that runs out of steps reports an
    /// inconclusive result rather than proven unsatisfiability.
    pub max_steps: u64,

    /// The compiler toolchains available on this host,
    /// most preferred first.
    pub compilers: Vec<Compiler>,

    /// The architecture packages are concretized for when a
    /// request does not pin one. Defaults to the host.
    pub arch: Option<Arch>,

    /// The provider chosen for a virtual package when the
    /// request does not choose one, eg `mpi: openmpi`.
    pub preferred_providers: BTreeMap<PkgNameBuf, PkgNameBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            reuse: true,
            criteria: OptimizationCriterion::default_order(),
            max_steps: 0,
            compilers: Vec::new(),
            arch: None,
            preferred_providers: BTreeMap::new(),
        }
    }
}

impl SolverConfig {
    /// The architecture to concretize for, falling back to the host.
    pub fn target_arch(&self) -> Arch {
        self.arch.clone().unwrap_or_else(Arch::host)
    }
}

/// Configuration values for cpk.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub solver: SolverConfig,
}

impl Config {
    /// Load the configuration from disk and environment.
    ///
    /// Reads `/etc/cpk` and `~/.config/cpk/cpk` (in any format the
    /// config crate supports), then applies `CPK_<SECTION>_<NAME>`
    /// environment overrides. The result is an owned value: callers
    /// pass it to the components that need it.
    pub fn load() -> crate::Result<Self> {
        use config::{Config as RawConfig, File};

        let mut config_builder = RawConfig::builder()
            // the system config can be in any supported format: toml, yaml, json, ini
            .add_source(File::with_name("/etc/cpk").required(false));

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config/cpk/cpk");
            config_builder = config_builder
                .add_source(File::with_name(&user_config.to_string_lossy()).required(false));
        }

        for (var, value) in std::env::vars() {
            let Some(tail) = var.strip_prefix("CPK_") else {
                continue;
            };
            let Some((section, name)) = tail.split_once('_') else {
                // typically, a value with no section is not a configuration
                // value, and can be skipped (eg: CPK_LOG)
                continue;
            };

            let key = format!("{}.{}", section.to_lowercase(), name.to_lowercase());
            config_builder = config_builder.set_override(key, value)?;
        }

        let config = config_builder.build()?;
        Ok(Config::deserialize(config)?)
    }
}
