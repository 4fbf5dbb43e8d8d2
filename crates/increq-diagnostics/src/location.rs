//! Where in a specification an error or diagnostic occurred.
//!
//! There is no source text in this pipeline (parsing is out of scope), so a
//! "location" is a position in the AST: which method, and optionally which
//! sub-part of it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Points at a method (query or operation) in a specification, and
/// optionally a finer-grained part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodLocation {
    /// Name of the method this location is within.
    pub method: String,
    /// A human-readable path within the method, e.g. `"assumption[1]"` or
    /// `"body/ForEach/0"`.
    pub path: Option<String>,
}

impl MethodLocation {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), path: None }
    }

    pub fn at(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method: method.into(), path: Some(path.into()) }
    }
}

impl fmt::Display for MethodLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method)?;
        if let Some(path) = &self.path {
            write!(f, " ({path})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path_when_present() {
        let loc = MethodLocation::at("contains", "assumption[0]");
        assert_eq!(loc.to_string(), "contains (assumption[0])");
        assert_eq!(MethodLocation::new("contains").to_string(), "contains");
    }
}
