// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::store::StoreError;
use pep_report_domain::{DomainError, ReportCode};

/// Errors that can occur while allocating or validating report codes.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The store rejected a commit because the code is already taken.
    StoreConflict {
        /// The code the store rejected.
        code: ReportCode,
    },
    /// Every allocation attempt hit a store conflict.
    AllocationFailed {
        /// Number of attempts made.
        attempts: u8,
    },
    /// The report does not exist.
    ReportNotFound(i64),
    /// The store failed for a reason unrelated to uniqueness.
    Store(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::StoreConflict { code } => {
                write!(f, "Code {code} was taken by a concurrent commit")
            }
            Self::AllocationFailed { attempts } => write!(
                f,
                "Could not allocate code after {attempts} attempts, please retry"
            ),
            Self::ReportNotFound(id) => write!(f, "Report {id} not found"),
            Self::Store(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { code } => Self::StoreConflict { code },
            StoreError::NotFound(id) => Self::ReportNotFound(id),
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}
