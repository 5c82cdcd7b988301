// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Interactive validation of a code-entry field.
//!
//! The field moves `Empty -> Checking -> {Valid | Invalid}` and re-enters
//! `Checking` on every edit. Format errors are reported immediately. The
//! store is only consulted once the input has been quiet for the debounce
//! window, and an edit arriving while a check is in flight abandons that
//! check. The newest input always wins.

use crate::allocator::check_candidate;
use crate::store::ReportStore;
use pep_report_domain::{
    CodeRegistry, CodeScope, CodeYear, InvalidReason, ReportCode, Sequence, ValidationResult,
    validate,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Default quiet period before a candidate is checked against the store.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Validation state of a code-entry field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeFieldState {
    /// Nothing typed.
    Empty,
    /// Waiting for the debounce window or for the store.
    Checking,
    /// The code is well-formed and free.
    Valid {
        /// The full code the sequence resolves to.
        code: ReportCode,
    },
    /// The code was rejected.
    Invalid {
        /// Why.
        reason: InvalidReason,
    },
    /// The store could not be consulted.
    Unavailable {
        /// The store error.
        message: String,
    },
}

impl CodeFieldState {
    /// Returns true once a check has finished.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Checking)
    }
}

/// What the field is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFieldContext {
    /// Code year of the report being created or edited.
    pub year: CodeYear,
    /// The edited report's current code, for self-exclusion.
    pub excluding: Option<ReportCode>,
    /// Uniqueness scope.
    pub scope: CodeScope,
}

/// A running validator for one code-entry field.
///
/// Dropping the validator stops its task.
#[derive(Debug)]
pub struct CodeFieldValidator {
    input: watch::Sender<String>,
    state: watch::Receiver<CodeFieldState>,
    task: JoinHandle<()>,
}

impl CodeFieldValidator {
    /// Starts a validator task on the current tokio runtime.
    pub fn spawn<S>(store: Arc<S>, context: CodeFieldContext, debounce: Duration) -> Self
    where
        S: ReportStore + ?Sized + 'static,
    {
        let (input_tx, input_rx) = watch::channel(String::new());
        let (state_tx, state_rx) = watch::channel(CodeFieldState::Empty);
        let task: JoinHandle<()> = tokio::spawn(run(store, context, debounce, input_rx, state_tx));
        Self {
            input: input_tx,
            state: state_rx,
            task,
        }
    }

    /// Replaces the field's content.
    pub fn set_input(&self, text: impl Into<String>) {
        self.input.send_replace(text.into());
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> CodeFieldState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CodeFieldState> {
        self.state.clone()
    }
}

impl Drop for CodeFieldValidator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<S>(
    store: Arc<S>,
    context: CodeFieldContext,
    debounce: Duration,
    mut input: watch::Receiver<String>,
    state: watch::Sender<CodeFieldState>,
) where
    S: ReportStore + ?Sized,
{
    loop {
        if input.changed().await.is_err() {
            return;
        }

        // Each pass handles the newest input; a newer edit restarts the pass.
        'pass: loop {
            let text: String = input.borrow_and_update().trim().to_string();
            if text.is_empty() {
                state.send_replace(CodeFieldState::Empty);
                break 'pass;
            }
            let format_only: ValidationResult = validate(&text, &CodeRegistry::empty(None), None);
            if let ValidationResult::Invalid(reason) = format_only {
                state.send_replace(CodeFieldState::Invalid { reason });
                break 'pass;
            }

            state.send_replace(CodeFieldState::Checking);
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue 'pass;
                }
                () = tokio::time::sleep(debounce) => {}
            }

            debug!(candidate = %text, year = %context.year, "Checking code against store");
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    debug!(candidate = %text, "Abandoned code check for newer input");
                    continue 'pass;
                }
                outcome = check_candidate(
                    store.as_ref(),
                    &text,
                    context.year,
                    context.excluding,
                    context.scope,
                ) => {
                    state.send_replace(settle(&text, context.year, outcome));
                    break 'pass;
                }
            }
        }
    }
}

fn settle(
    text: &str,
    year: CodeYear,
    outcome: Result<ValidationResult, crate::CoreError>,
) -> CodeFieldState {
    match outcome {
        Ok(ValidationResult::Valid) => match Sequence::from_str(text) {
            Ok(sequence) => CodeFieldState::Valid {
                code: ReportCode::new(sequence, year),
            },
            Err(e) => CodeFieldState::Invalid {
                reason: InvalidReason::Malformed {
                    reason: e.to_string(),
                },
            },
        },
        Ok(ValidationResult::Invalid(reason)) => CodeFieldState::Invalid { reason },
        Err(e) => {
            error!(error = %e, "Code check failed");
            CodeFieldState::Unavailable {
                message: e.to_string(),
            }
        }
    }
}
