//! A pattern-matching improver: recognizes a handful of common query shapes
//! and proposes the one concrete representation that makes each of them
//! O(1) to answer, skipping any enumerative search. Queries that don't
//! match one of these shapes get no candidates from here; the improver
//! orchestrator already installed a baseline that computes the query
//! directly from abstract state before any improver runs, so returning
//! nothing is a legitimate (if unhelpful) answer, not a dropped query.

use crate::traits::{Candidate, Improver};
use increq_ast::{fresh_name, Exp, Query, UnOp, Var};
use increq_context::{infer_exp, Context, TypeEnv};
use increq_diagnostics::DriverError;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct DefaultImprover;

impl DefaultImprover {
    fn env_for(query: &Query) -> TypeEnv {
        let mut env = TypeEnv::new();
        for (name, ty) in &query.args {
            env.define(name.clone(), ty.clone());
        }
        env
    }

    /// Builds a single-variable candidate: the rep var holds `rep_expr`'s
    /// value, and `ret` is built from it via `make_ret`.
    fn single_var_candidate(
        ctx: &Context,
        env: &mut TypeEnv,
        rep_expr: Exp,
        make_ret: impl FnOnce(&Var) -> Exp,
    ) -> Result<Candidate, DriverError> {
        let ty = infer_exp(ctx, env, "improver", &rep_expr)?;
        let var = Var::new(fresh_name("rep"), ty);
        let ret = make_ret(&var);
        Ok(Candidate::new(vec![(var, rep_expr)], ret))
    }
}

impl Improver for DefaultImprover {
    fn propose(&self, ctx: &Context, query: &Query, _assumptions: &[Exp], stop: &AtomicBool) -> Result<Vec<Candidate>, DriverError> {
        if stop.load(Ordering::Relaxed) {
            return Ok(vec![]);
        }
        let mut env = Self::env_for(query);

        let candidate = match &query.ret {
            // `elem in bag` — maintain `distinct(bag)` as a set and test
            // membership against it instead of scanning `bag`.
            Exp::In(elem, bag) => {
                let elem = (**elem).clone();
                Some(Self::single_var_candidate(ctx, &mut env, Exp::distinct((**bag).clone()), |v| Exp::in_bag(elem, Exp::var(v.clone())))?)
            }
            // `min(bag)` — maintain the minimum directly.
            Exp::Min(bag) => Some(Self::single_var_candidate(ctx, &mut env, Exp::min((**bag).clone()), |v| Exp::var(v.clone()))?),
            // `sum(map(bag, f))` — maintain the running sum.
            Exp::Sum(mapped) if matches!(mapped.as_ref(), Exp::MapColl(..)) => {
                Some(Self::single_var_candidate(ctx, &mut env, Exp::sum((**mapped).clone()), |v| Exp::var(v.clone()))?)
            }
            // `len(filter(bag, pred))` — maintain the count directly.
            Exp::UnOp(UnOp::Len, inner) if matches!(inner.as_ref(), Exp::Filter(..)) => {
                Some(Self::single_var_candidate(ctx, &mut env, Exp::len((**inner).clone()), |v| Exp::var(v.clone()))?)
            }
            // `filter(bag, pred)` returned bare — maintain the filtered bag
            // itself so later queries over the same predicate can share it.
            Exp::Filter(bag, lambda) => {
                let rep_expr = Exp::filter((**bag).clone(), (**lambda).clone());
                Some(Self::single_var_candidate(ctx, &mut env, rep_expr, |v| Exp::var(v.clone()))?)
            }
            _ => None,
        };

        Ok(candidate.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Specification, Type, Visibility};

    fn empty_ctx() -> Context {
        Context::build(&Specification {
            name: "s".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![("xs".into(), Type::bag(Type::Int))],
            assumptions: vec![],
            methods: vec![],
            header: None,
            footer: None,
            docstring: None,
        })
        .unwrap()
    }

    #[test]
    fn proposes_set_representation_for_membership_query() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let x = Exp::var(Var::new("x", Type::Int));
        let query = Query::new("contains", Visibility::Public, vec![("x".into(), Type::Int)], Exp::in_bag(x, xs));
        let improver = DefaultImprover;
        let stop = AtomicBool::new(false);
        let candidates = improver.propose(&ctx, &query, &[], &stop).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rep.len(), 1);
    }

    #[test]
    fn proposes_running_min_for_minimum_query() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let query = Query::new("smallest", Visibility::Public, vec![], Exp::min(xs));
        let improver = DefaultImprover;
        let stop = AtomicBool::new(false);
        let candidates = improver.propose(&ctx, &query, &[], &stop).unwrap();
        assert_eq!(candidates.len(), 1);
        match &candidates[0].ret {
            Exp::Var(v) => assert_eq!(&v.name, &candidates[0].rep[0].0.name),
            other => panic!("expected bare var return, got {other:?}"),
        }
    }

    #[test]
    fn no_candidate_for_unrecognized_shape() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let query = Query::new("count", Visibility::Public, vec![], Exp::len(xs));
        let improver = DefaultImprover;
        let stop = AtomicBool::new(false);
        let candidates = improver.propose(&ctx, &query, &[], &stop).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn stop_flag_short_circuits() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let query = Query::new("smallest", Visibility::Public, vec![], Exp::min(xs));
        let improver = DefaultImprover;
        let stop = AtomicBool::new(true);
        let candidates = improver.propose(&ctx, &query, &[], &stop).unwrap();
        assert!(candidates.is_empty());
    }
}
