//! The driver's error taxonomy.

use crate::{ErrorCode, MethodLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A non-fatal diagnostic surfaced alongside a (possibly incomplete) result,
/// e.g. a dropped stale solution during garbage collection, or an
/// unspecified tie-break among equally-good candidate implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub location: Option<MethodLocation>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, code, message: message.into(), location: None, help: None }
    }

    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { severity: Severity::Info, code, message: message.into(), location: None, help: None }
    }

    pub fn with_location(mut self, location: MethodLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}

/// Errors the driver can raise while synthesizing an implementation.
///
/// `DeadlockedTask` is fatal, unlike a global timeout: a task that fails to
/// acknowledge cancellation within the join ceiling leaves a thread the
/// driver can no longer account for, so it propagates out of
/// [`crate::Outcome`]'s best-effort path rather than being folded into an
/// incomplete result the way an elapsed budget is.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// An expression's inferred type did not match what its context
    /// required (e.g. a non-`Bool` expression used as an assumption, or an
    /// argument passed a value of the wrong declared type).
    #[error("{code}: {message} in {location}")]
    TypeMismatch { code: ErrorCode, message: String, location: MethodLocation },

    /// A collaborator (solver, cost model, improver, or representation
    /// helper) returned an error instead of an answer.
    #[error("{code}: collaborator '{collaborator}' failed: {message}")]
    CollaboratorFailure { code: ErrorCode, collaborator: String, message: String },

    /// An improver task did not acknowledge a cancellation request before
    /// the orchestrator's join ceiling elapsed.
    #[error("{code}: task for goal '{goal}' deadlocked after {elapsed_secs}s")]
    DeadlockedTask { code: ErrorCode, goal: String, elapsed_secs: u64 },

    /// A simplification step returned an expression larger than its input,
    /// violating the monotonicity guard. Unlike the other variants this one
    /// is always fatal: it indicates a bug in a simplification rule, not a
    /// property of the input specification.
    #[error("{code}: simplification of '{query}' grew {before_size} -> {after_size} nodes")]
    BadSimplification { code: ErrorCode, query: String, before_size: usize, after_size: usize },

    /// Several errors were collected before giving up, e.g. by the context
    /// builder checking every method before reporting.
    #[error("{} errors", .0.len())]
    Multiple(Vec<DriverError>),
}

impl DriverError {
    pub fn type_mismatch(message: impl Into<String>, location: MethodLocation) -> Self {
        Self::TypeMismatch { code: crate::error_code::INC0001, message: message.into(), location }
    }

    pub fn collaborator_failure(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CollaboratorFailure { code: crate::error_code::INC0100, collaborator: collaborator.into(), message: message.into() }
    }

    pub fn deadlocked_task(goal: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::DeadlockedTask { code: crate::error_code::INC0200, goal: goal.into(), elapsed_secs }
    }

    pub fn bad_simplification(query: impl Into<String>, before_size: usize, after_size: usize) -> Self {
        Self::BadSimplification { code: crate::error_code::INC0300, query: query.into(), before_size, after_size }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::TypeMismatch { code, .. } => Some(*code),
            Self::CollaboratorFailure { code, .. } => Some(*code),
            Self::DeadlockedTask { code, .. } => Some(*code),
            Self::BadSimplification { code, .. } => Some(*code),
            Self::Multiple(errors) => errors.first().and_then(DriverError::code),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::TypeMismatch { code, message, location } => Diagnostic::warning(*code, message.clone()).with_location(location.clone()),
            Self::CollaboratorFailure { code, message, .. } => Diagnostic::warning(*code, message.clone()),
            Self::DeadlockedTask { code, goal, .. } => Diagnostic::warning(*code, format!("goal '{goal}' deadlocked")),
            Self::BadSimplification { code, query, before_size, after_size } => {
                Diagnostic::warning(*code, format!("simplification of '{query}' grew {before_size} -> {after_size} nodes"))
            }
            Self::Multiple(errors) => errors.first().map(DriverError::to_diagnostic).unwrap_or_else(|| Diagnostic::warning(crate::error_code::INC0400, "unknown error")),
        }
    }
}

/// Result type used throughout the driver.
pub type Result<T> = std::result::Result<T, DriverError>;
