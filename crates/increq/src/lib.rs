//! Aggregator crate for the incremental-implementation synthesis driver.
//!
//! Re-exports the workspace's component crates under one name and hosts the
//! `cli` module the `increq` binary is built on.

pub use increq_ast as ast;
pub use increq_collab as collab;
pub use increq_context as context;
pub use increq_diagnostics as diagnostics;
pub use increq_driver as driver;

pub use increq_ast::{Method, Operation, Query, Specification, Visibility};
pub use increq_context::Context;
pub use increq_diagnostics::{DriverError, Outcome};
pub use increq_driver::{Driver, SynthesisConfig};

pub mod cli;
