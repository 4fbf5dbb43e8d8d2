//! The result shape of a synthesis run: either every goal converged, or a
//! global timeout cut the run short and the best solution found so far for
//! each goal is returned instead.

use crate::Diagnostic;
use serde::{Deserialize, Serialize};

/// Wraps a synthesis result with whatever non-fatal diagnostics accumulated
/// along the way, and whether the run hit its global timeout.
///
/// A timed-out run is not an error: `value` is still a valid, semantically
/// correct implementation, just not necessarily the best one the improvers
/// would have found given more time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub value: T,
    pub complete: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn complete(value: T) -> Self {
        Self { value, complete: true, diagnostics: Vec::new() }
    }

    pub fn incomplete(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, complete: false, diagnostics }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome { value: f(self.value), complete: self.complete, diagnostics: self.diagnostics }
    }
}
