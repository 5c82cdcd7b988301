// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod allocator;
mod error;
mod field;
mod store;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use allocator::{
    Allocation, AllocationPolicy, CodeRequest, DEFAULT_MAX_ATTEMPTS, check_candidate,
    check_full_code, create_with_allocation, snapshot, suggest_code, try_commit,
    update_with_validation,
};
pub use error::CoreError;
pub use field::{CodeFieldContext, CodeFieldState, CodeFieldValidator, DEFAULT_DEBOUNCE};
pub use store::{ReportStore, StoreError};
