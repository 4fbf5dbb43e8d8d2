//! The equivalence oracle (component 3 / §4.1): wraps the solver collaborator
//! with a cache and the query-equivalence decision procedure used by
//! subquery deduplication.

use increq_ast::{subst_exp, BinOp, Exp, Query, UnOp, Var};
use increq_collab::Solver;
use increq_context::{infer_exp, infer_query_ret_type, Context, TypeEnv};
use increq_diagnostics::DriverError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Caching wrapper around a [`Solver`]. The cache is process-local and
/// owned by the driver thread; improver tasks never see it (§9 "Solver
/// caching").
pub struct Oracle {
    solver: Arc<dyn Solver>,
    cache: Mutex<HashMap<(Vec<Exp>, Exp), bool>>,
}

impl Oracle {
    pub fn new(solver: Arc<dyn Solver>) -> Self {
        Self { solver, cache: Mutex::new(HashMap::new()) }
    }

    pub fn valid(&self, ctx: &Context, assumptions: &[Exp], goal: &Exp) -> Result<bool, DriverError> {
        let key = (assumptions.to_vec(), goal.clone());
        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(*hit);
        }
        let result = self.solver.valid(ctx, assumptions, goal)?;
        self.cache.lock().insert(key, result);
        Ok(result)
    }

    /// Decides whether `q1` and `q2` are observationally equivalent (§4.1):
    /// same return type, arg lists matching positionally by type, assumptions
    /// equivalent under `ctx`'s invariants, and `assumptions(q1)` entailing
    /// `ret(q1) = ret(q2)`.
    ///
    /// On success, returns the positional argument mapping from `q2` to
    /// `q1` used to rewrite call sites. Args are only ever compared by
    /// position, never reordered by type, so the mapping is always the
    /// identity — kept as a `Vec<usize>` for callers that want to express
    /// call-site rewriting uniformly regardless of how the match was found.
    pub fn equivalent(&self, ctx: &Context, invariants: &[Exp], q1: &Query, q2: &Query) -> Result<Option<Vec<usize>>, DriverError> {
        if q1.args.len() != q2.args.len() {
            return Ok(None);
        }
        if !q1.args.iter().zip(&q2.args).all(|((_, t1), (_, t2))| t1 == t2) {
            return Ok(None);
        }

        let mut env1 = TypeEnv::new();
        for (n, t) in &q1.args {
            env1.define(n.clone(), t.clone());
        }
        let mut env2 = TypeEnv::new();
        for (n, t) in &q2.args {
            env2.define(n.clone(), t.clone());
        }
        let ret1_ty = infer_exp(ctx, &mut env1, &q1.name, &q1.ret)?;
        let ret2_ty = infer_exp(ctx, &mut env2, &q2.name, &q2.ret)?;
        if ret1_ty != ret2_ty {
            return Ok(None);
        }

        // Align q2's variables onto q1's argument names so the two trees
        // can be compared as expressions over the same environment.
        let rename: HashMap<String, Exp> = q2
            .args
            .iter()
            .zip(&q1.args)
            .map(|((n2, _), (n1, t1))| (n2.clone(), Exp::var(Var::new(n1.clone(), t1.clone()))))
            .collect();
        let q2_assumptions: Vec<Exp> = q2.assumptions.iter().map(|a| subst_exp(a, &rename)).collect();
        let q2_ret = subst_exp(&q2.ret, &rename);

        let a1 = Exp::and(q1.assumptions.clone());
        let a2 = Exp::and(q2_assumptions);
        let assumptions_iff = Exp::and(vec![implies(a1.clone(), a2.clone()), implies(a2, a1.clone())]);
        if !self.valid(ctx, invariants, &assumptions_iff)? {
            return Ok(None);
        }

        let ret_equal_under_a1 = implies(a1, Exp::eq(q1.ret.clone(), q2_ret));
        if !self.valid(ctx, invariants, &ret_equal_under_a1)? {
            return Ok(None);
        }

        Ok(Some((0..q1.args.len()).collect()))
    }
}

fn implies(a: Exp, b: Exp) -> Exp {
    Exp::BinOp(BinOp::Or, Box::new(Exp::UnOp(UnOp::Not, Box::new(a))), Box::new(b))
}

/// Also verifies `q`'s return type against its declared args in isolation,
/// used by the installer before accepting a concrete `ret` (§7 type
/// mismatch check).
pub fn expected_ret_type(ctx: &Context, q: &Query) -> Result<increq_ast::Type, DriverError> {
    infer_query_ret_type(ctx, q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Specification, Type, Visibility};
    use increq_collab::DefaultSolver;

    fn ctx() -> Context {
        Context::build(&Specification {
            name: "s".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![],
            assumptions: vec![],
            methods: vec![],
            header: None,
            footer: None,
            docstring: None,
        })
        .unwrap()
    }

    #[test]
    fn identical_queries_are_equivalent() {
        let oracle = Oracle::new(Arc::new(DefaultSolver::new()));
        let x = Exp::var(Var::new("x", Type::Int));
        let q1 = Query::new("f", Visibility::Public, vec![("x".into(), Type::Int)], x.clone());
        let y = Exp::var(Var::new("y", Type::Int));
        let q2 = Query::new("g", Visibility::Internal, vec![("y".into(), Type::Int)], y);
        let perm = oracle.equivalent(&ctx(), &[], &q1, &q2).unwrap();
        assert_eq!(perm, Some(vec![0]));
    }

    #[test]
    fn different_return_types_are_not_equivalent() {
        let oracle = Oracle::new(Arc::new(DefaultSolver::new()));
        let q1 = Query::new("f", Visibility::Public, vec![], Exp::int_lit(1));
        let q2 = Query::new("g", Visibility::Public, vec![], Exp::bool_lit(true));
        let perm = oracle.equivalent(&ctx(), &[], &q1, &q2).unwrap();
        assert_eq!(perm, None);
    }
}
