// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_config::OptimizationCriterion;

use crate::state::Choice;

#[cfg(test)]
#[path = "./policy_test.rs"]
mod policy_test;

/// How one candidate scores against each optimization criterion.
///
/// All components are "smaller is better"; the policy order turns
/// them into one lexicographic key.
#[derive(Clone, Debug)]
pub struct Score {
    /// Rank of the candidate's version among all candidate
    /// versions for this name, newest first (0 = newest).
    pub version_rank: u64,
    pub is_reuse: bool,
    pub has_default_variants: bool,
    pub is_preferred_provider: bool,
    pub is_default_compiler: bool,
}

/// A candidate plus its policy score.
pub struct ScoredCandidate {
    pub choice: Choice,
    pub score: Score,
}

/// Order candidates by the configured criteria, best first.
///
/// The comparison is lexicographic along the policy order, so a
/// criterion can only break ties among candidates equal on every
/// criterion ranked above it. Ordering is made total with a final
/// deterministic tie-break on provider name and version.
pub fn sort_candidates(policy: &[OptimizationCriterion], candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        let key_a = policy_key(policy, &a.score);
        let key_b = policy_key(policy, &b.score);
        key_a
            .cmp(&key_b)
            .then_with(|| a.choice.pkg().cmp(b.choice.pkg()))
            .then_with(|| b.choice.version().cmp(a.choice.version()))
            .then_with(|| a.choice.is_reuse().cmp(&b.choice.is_reuse()))
    });
}

fn policy_key(policy: &[OptimizationCriterion], score: &Score) -> Vec<u64> {
    policy
        .iter()
        .map(|criterion| match criterion {
            OptimizationCriterion::NewestVersion => score.version_rank,
            OptimizationCriterion::Reuse => u64::from(!score.is_reuse),
            OptimizationCriterion::DefaultVariants => u64::from(!score.has_default_variants),
            OptimizationCriterion::PreferredProvider => u64::from(!score.is_preferred_provider),
            OptimizationCriterion::DefaultCompiler => u64::from(!score.is_default_compiler),
        })
        .collect()
}
