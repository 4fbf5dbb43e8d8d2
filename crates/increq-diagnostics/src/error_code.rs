//! Error codes following a structured numbering system.
//!
//! - INC0001-INC0099: type errors
//! - INC0100-INC0199: collaborator failures
//! - INC0200-INC0299: deadlocked / timed-out tasks
//! - INC0300-INC0399: bad simplifications (fatal, indicates a collaborator
//!   bug rather than an unsynthesizable specification)
//! - INC0400-INC0499: system errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.iter().find(|(c, _)| *c == self.0).map(|(_, info)| info).unwrap_or(&UNKNOWN_ERROR)
    }

    pub const fn is_type_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_collaborator_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_deadlock_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_bad_simplification_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INC{:04}", self.0)
    }
}

/// Static information about an error code.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub description: &'static str,
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self { description, help: None }
    }

    const fn with_help(description: &'static str, help: &'static str) -> Self {
        Self { description, help: Some(help) }
    }
}

pub const INC0001: ErrorCode = ErrorCode::new(1);
pub const INC0100: ErrorCode = ErrorCode::new(100);
pub const INC0200: ErrorCode = ErrorCode::new(200);
pub const INC0300: ErrorCode = ErrorCode::new(300);
pub const INC0400: ErrorCode = ErrorCode::new(400);

static ERROR_INFO: &[(u16, ErrorInfo)] = &[
    (1, ErrorInfo::with_help("type mismatch", "check the argument and return types of the method involved")),
    (100, ErrorInfo::with_help("collaborator failure", "a solver, cost model, improver or representation collaborator returned an error")),
    (200, ErrorInfo::with_help("deadlocked task", "an improver task did not respond to a cancellation request within the join ceiling")),
    (300, ErrorInfo::with_help("bad simplification", "a simplification step produced a strictly larger expression, violating the monotonicity guard")),
    (400, ErrorInfo::new("system error")),
];

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("unknown error");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_range() {
        assert!(INC0001.is_type_error());
        assert!(INC0100.is_collaborator_error());
        assert!(INC0200.is_deadlock_error());
        assert!(INC0300.is_bad_simplification_error());
        assert!(INC0400.is_system_error());
    }

    #[test]
    fn display_is_inc_prefixed() {
        assert_eq!(INC0001.to_string(), "INC0001");
    }
}
