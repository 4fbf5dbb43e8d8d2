//! Wires concrete collaborator implementations to the driver.
//!
//! Mirrors the teacher's `ModelRegistry`: a small `Arc`-based handle that is
//! cheap to clone and share across the driver thread and every improver
//! task, each collaborator held behind its trait object so the driver never
//! has to know which concrete implementation it was handed.

use crate::traits::{CostModel, Derivative, Improver, Solver};
use std::sync::Arc;

#[derive(Clone)]
pub struct CollaboratorRegistry {
    solver: Arc<dyn Solver>,
    cost_model: Arc<dyn CostModel>,
    improver: Arc<dyn Improver>,
    derivative: Arc<dyn Derivative>,
}

impl CollaboratorRegistry {
    pub fn new(solver: Arc<dyn Solver>, cost_model: Arc<dyn CostModel>, improver: Arc<dyn Improver>, derivative: Arc<dyn Derivative>) -> Self {
        Self { solver, cost_model, improver, derivative }
    }

    /// The registry wired with this crate's default collaborators, enough
    /// to drive the end-to-end scenarios without any external solver.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(crate::default_solver::DefaultSolver::new()),
            Arc::new(crate::default_cost_model::DefaultCostModel),
            Arc::new(crate::default_improver::DefaultImprover),
            Arc::new(crate::default_derivative::DefaultDerivative),
        )
    }

    pub fn solver(&self) -> &Arc<dyn Solver> {
        &self.solver
    }

    pub fn cost_model(&self) -> &Arc<dyn CostModel> {
        &self.cost_model
    }

    pub fn improver(&self) -> &Arc<dyn Improver> {
        &self.improver
    }

    pub fn derivative(&self) -> &Arc<dyn Derivative> {
        &self.derivative
    }
}
