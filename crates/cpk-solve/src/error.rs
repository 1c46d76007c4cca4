// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use cpk_name::PkgNameBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request is infeasible: no graph satisfies every hard
    /// constraint. This is a structured result, distinct from a
    /// malformed request and from internal failures, and it never
    /// comes with a partial solution.
    #[error(transparent)]
    FailedToResolve(#[from] Box<UnsatReport>),
    #[error(transparent)]
    InvalidRequest(#[from] cpk_spec::Error),
    #[error("Requests for {pkg} can never agree: {lhs} does not intersect {rhs}")]
    ConflictingRequests {
        pkg: PkgNameBuf,
        lhs: String,
        rhs: String,
    },
    #[error("Package not found in any repository: {0}")]
    PackageNotFound(String),
    #[error("No package provides virtual {0}")]
    NoProviders(String),
    #[error("No compiler toolchains are configured")]
    NoCompilers,
    #[error(transparent)]
    Storage(#[from] cpk_storage::Error),
    #[error(transparent)]
    Schema(#[from] cpk_schema::Error),
    #[error("Error: {0}")]
    String(String),
}

/// A note about one candidate the solver tried and rejected.
#[derive(Clone, Debug)]
pub struct Note {
    pub candidate: String,
    pub reason: String,
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.candidate, self.reason)
    }
}

/// Why a solve produced no solution.
///
/// Carries the package that ran out of options, the constraints in
/// play (with who requested each), and one note per candidate tried.
/// When `inconclusive` is set the search was halted by the step
/// bound and infeasibility was not proven.
#[derive(Clone, Debug)]
pub struct UnsatReport {
    pub pkg: PkgNameBuf,
    /// The constraints that applied, rendered with their origins.
    pub requested: Vec<String>,
    pub notes: Vec<Note>,
    pub inconclusive: bool,
}

impl std::error::Error for UnsatReport {}

impl std::fmt::Display for UnsatReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.inconclusive {
            write!(f, "Solve halted by step limit while resolving {}", self.pkg)?;
        } else {
            write!(f, "Out of options for {}", self.pkg)?;
        }
        if !self.requested.is_empty() {
            write!(f, "\n  requested:")?;
            for request in self.requested.iter() {
                write!(f, "\n    {request}")?;
            }
        }
        if !self.notes.is_empty() {
            write!(f, "\n  tried:")?;
            for note in self.notes.iter() {
                write!(f, "\n    {note}")?;
            }
        }
        Ok(())
    }
}
