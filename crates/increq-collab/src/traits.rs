//! Trait boundaries for the four collaborators the driver delegates to:
//! the solver, the cost model, the improver, and the derivative
//! (incrementalization) transformer. Each is a narrow synchronous
//! interface — the driver never shares these across threads except
//! through `Arc`, since improver tasks own their own collaborator handles.

use increq_ast::{Exp, Query, Stm, Var};
use increq_context::Context;
use increq_diagnostics::DriverError;
use std::sync::atomic::AtomicBool;

/// Decides validity of logical goals under a set of assumptions.
///
/// A real implementation would hand off to an SMT backend; the contract
/// only requires soundness (never return `true` for an invalid goal) and
/// allows incompleteness (returning `false` for a valid goal that the
/// implementation couldn't prove is always safe, just wasteful).
pub trait Solver: Send + Sync {
    /// Is `goal` entailed by `assumptions` in `ctx`?
    fn valid(&self, ctx: &Context, assumptions: &[Exp], goal: &Exp) -> Result<bool, DriverError>;

    /// Are `a` and `b` equivalent under `assumptions` (`a => b` and `b => a`)?
    fn equivalent(&self, ctx: &Context, assumptions: &[Exp], a: &Exp, b: &Exp) -> Result<bool, DriverError> {
        Ok(self.valid(ctx, assumptions, &Exp::eq(a.clone(), b.clone()))?)
    }
}

/// A candidate representation: a set of concrete variables with their
/// meanings, and the return expression computed from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rep: Vec<(Var, Exp)>,
    pub ret: Exp,
}

impl Candidate {
    pub fn new(rep: Vec<(Var, Exp)>, ret: Exp) -> Self {
        Self { rep, ret }
    }
}

/// Orders candidate representations from cheapest to most expensive.
pub trait CostModel: Send + Sync {
    /// Lower is better.
    fn cost(&self, candidate: &Candidate) -> u64;

    fn is_better(&self, a: &Candidate, b: &Candidate) -> bool {
        self.cost(a) < self.cost(b)
    }
}

/// Lazily proposes improving `(rep, ret)` candidates for a query's return
/// expression, until it proves local optimality or `stop` is set.
///
/// Real improvers run an enumerative search in a background thread and
/// stream results; this trait only fixes the shape callers see.
pub trait Improver: Send + Sync {
    /// Returns every candidate this improver will ever propose, best last.
    /// A real streaming improver would instead expose an iterator/channel;
    /// collaborators are free to do heavier work up front since `propose`
    /// is called once per query at task start, not polled.
    fn propose(&self, ctx: &Context, query: &Query, assumptions: &[Exp], stop: &AtomicBool) -> Result<Vec<Candidate>, DriverError>;
}

/// Produces the maintenance statement for a single concrete variable under
/// a single operation, emitting any helper queries it needed along the way.
pub trait Derivative: Send + Sync {
    /// `lhs` is the concrete variable being maintained (or, for handle
    /// mutation, the handle field being updated); `rhs_expr` is its
    /// defining expression in terms of abstract state; `op_body` is the
    /// abstract operation whose effect must be mirrored.
    fn mutate_in_place(
        &self,
        ctx: &Context,
        lhs: &Exp,
        rhs_expr: &Exp,
        op_body: &Stm,
        op_assumptions: &[Exp],
        invariants: &[Exp],
        subgoals_out: &mut Vec<Query>,
    ) -> Result<Stm, DriverError>;
}
