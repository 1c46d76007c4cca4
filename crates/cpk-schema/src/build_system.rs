// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_spec::{Spec, VariantValue};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "./build_system_test.rs"]
mod build_system_test;

/// The placeholder replaced with the install prefix in
/// generated command lines.
pub const PREFIX: &str = "{prefix}";

/// How a package is configured, built and installed.
///
/// This is a closed set: a recipe selects one of these procedures
/// and parameterizes it with data, it cannot supply code.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    Autotools(AutotoolsBuild),
    Cmake(CmakeBuild),
    Meson(MesonBuild),
    Script(ScriptBuild),
}

impl Default for BuildSystem {
    fn default() -> Self {
        BuildSystem::Script(ScriptBuild::default())
    }
}

impl BuildSystem {
    /// The configure invocation for a concrete spec.
    ///
    /// Boolean variants become enable/disable style switches and
    /// value variants become `with`-style assignments, in the idiom
    /// of the selected build system.
    pub fn configure_args(&self, spec: &Spec) -> Vec<String> {
        match self {
            BuildSystem::Autotools(build) => build.configure_args(spec),
            BuildSystem::Cmake(build) => build.configure_args(spec),
            BuildSystem::Meson(build) => build.configure_args(spec),
            BuildSystem::Script(build) => build.configure.clone(),
        }
    }

    /// The build invocation.
    pub fn build_command(&self) -> Vec<String> {
        match self {
            BuildSystem::Autotools(_) => vec!["make".into()],
            BuildSystem::Cmake(_) | BuildSystem::Meson(_) => {
                vec!["ninja".into(), "-C".into(), "build".into()]
            }
            BuildSystem::Script(build) => build.build.clone(),
        }
    }

    /// The install invocation.
    pub fn install_command(&self) -> Vec<String> {
        match self {
            BuildSystem::Autotools(_) => vec!["make".into(), "install".into()],
            BuildSystem::Cmake(_) | BuildSystem::Meson(_) => {
                vec!["ninja".into(), "-C".into(), "build".into(), "install".into()]
            }
            BuildSystem::Script(build) => build.install.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AutotoolsBuild {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configure_args: Vec<String>,
}

impl AutotoolsBuild {
    fn configure_args(&self, spec: &Spec) -> Vec<String> {
        let mut args = vec!["./configure".to_string(), format!("--prefix={PREFIX}")];
        args.extend(self.configure_args.iter().cloned());
        for (name, value) in spec.variants().iter() {
            match value {
                VariantValue::Bool(true) => args.push(format!("--enable-{name}")),
                VariantValue::Bool(false) => args.push(format!("--disable-{name}")),
                VariantValue::Values(values) => {
                    args.push(format!("--with-{name}={}", values.iter().join(",")))
                }
            }
        }
        args
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CmakeBuild {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmake_args: Vec<String>,
}

impl CmakeBuild {
    fn configure_args(&self, spec: &Spec) -> Vec<String> {
        let mut args = vec![
            "cmake".to_string(),
            "-B".to_string(),
            "build".to_string(),
            "-G".to_string(),
            "Ninja".to_string(),
            format!("-DCMAKE_INSTALL_PREFIX={PREFIX}"),
        ];
        args.extend(self.cmake_args.iter().cloned());
        for (name, value) in spec.variants().iter() {
            let upper = name.replace('-', "_").to_uppercase();
            match value {
                VariantValue::Bool(enabled) => {
                    let state = if *enabled { "ON" } else { "OFF" };
                    args.push(format!("-D{upper}:BOOL={state}"));
                }
                VariantValue::Values(values) => {
                    args.push(format!("-D{upper}:STRING={}", values.iter().join(";")))
                }
            }
        }
        args
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MesonBuild {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meson_args: Vec<String>,
}

impl MesonBuild {
    fn configure_args(&self, spec: &Spec) -> Vec<String> {
        let mut args = vec![
            "meson".to_string(),
            "setup".to_string(),
            "build".to_string(),
            format!("--prefix={PREFIX}"),
        ];
        args.extend(self.meson_args.iter().cloned());
        for (name, value) in spec.variants().iter() {
            match value {
                VariantValue::Bool(enabled) => {
                    args.push(format!("-D{name}={}", if *enabled { "true" } else { "false" }))
                }
                VariantValue::Values(values) => {
                    args.push(format!("-D{name}={}", values.iter().join(",")))
                }
            }
        }
        args
    }
}

/// Raw command lists for packages with hand-rolled builds.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScriptBuild {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configure: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<String>,
}
