// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

/// Creates an in-memory repository containing the given recipes.
///
/// ```
/// # #[macro_use] extern crate cpk_solve;
/// # fn main() {
/// make_repo!([
///     {"pkg": "zlib", "versions": [{"version": "1.2.13"}]},
/// ]);
/// # }
/// ```
#[macro_export]
macro_rules! make_repo {
    ( [ $( $recipe:tt ),* $(,)? ] ) => {{
        let mut repo = $crate::cpk_storage::MemRepository::new();
        $(
            let recipe = $crate::cpk_schema::recipe!($recipe);
            $crate::tracing::trace!(pkg = %recipe.pkg, "adding recipe to repo");
            repo.publish_recipe(recipe).unwrap();
        )*
        $crate::cpk_storage::RepositoryHandle::from(repo)
    }};
}
