//! Collaborator interfaces for incremental-implementation synthesis.
//!
//! The driver delegates every decision that needs domain judgment —
//! validity checking, cost comparison, candidate proposal, in-place
//! mutation — to one of the four traits in [`traits`]. This crate also
//! ships one concrete, non-stubbed implementation of each, enough to drive
//! the system end to end without any external solver.

mod default_cost_model;
mod default_derivative;
mod default_improver;
mod default_solver;
mod registry;
mod traits;

pub use default_cost_model::DefaultCostModel;
pub use default_derivative::DefaultDerivative;
pub use default_improver::DefaultImprover;
pub use default_solver::DefaultSolver;
pub use registry::CollaboratorRegistry;
pub use traits::{Candidate, CostModel, Derivative, Improver, Solver};
