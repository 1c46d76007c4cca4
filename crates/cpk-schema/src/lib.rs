// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

//! Package recipes as plain, declarative data.
//!
//! A recipe carries everything the concretizer needs to reason about
//! one package: its declared versions, variants, dependencies,
//! conflicts, virtual capabilities, patches, and how it is built.
//! Recipes contain no executable code.

mod build_system;
mod error;
mod recipe;

pub use build_system::{AutotoolsBuild, BuildSystem, CmakeBuild, MesonBuild, ScriptBuild};
pub use error::{Error, Result};
pub use recipe::{
    ConflictDecl, DependDecl, PatchDecl, ProvideDecl, Recipe, VariantDecl, VariantDomain,
    VersionDecl,
};

/// Build a recipe from a yaml literal.
///
/// This will panic on invalid yaml or recipe data,
/// and should only be used for testing.
#[macro_export]
macro_rules! recipe {
    ($yaml:tt) => {{
        let value = $crate::serde_json::json!($yaml);
        let recipe: $crate::Recipe =
            $crate::serde_json::from_value(value).expect("invalid recipe data");
        recipe.validated().expect("invalid recipe data")
    }};
}

// Re-exported for use by the `recipe!` macro.
#[doc(hidden)]
pub use serde_json;
