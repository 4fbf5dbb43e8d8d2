//! Turns a concrete variable's defining expression into maintenance code for
//! a single abstract operation, by pattern-matching both the expression
//! shape (what [`crate::default_improver::DefaultImprover`] proposes) and
//! the operation's effect on the bag that expression reads.
//!
//! Every case here recognizes a single `add`/`remove`-style mutating call on
//! the underlying bag; anything else (a mutation this derivative doesn't
//! recognize, or a representation whose defining bag isn't a bare state
//! variable) falls back to a helper query that recomputes the concrete
//! value from abstract state after the operation runs. That fallback is
//! always correct, just not incremental — it exists so `mutate_in_place`
//! never fails outright on unfamiliar shapes.

use crate::traits::Derivative;
use increq_ast::{fresh_name, subst1, BinOp, Exp, Query, Stm, UnOp, Var, Visibility};
use increq_context::Context;
use increq_diagnostics::DriverError;

pub struct DefaultDerivative;

impl Derivative for DefaultDerivative {
    fn mutate_in_place(
        &self,
        _ctx: &Context,
        lhs: &Exp,
        rhs_expr: &Exp,
        op_body: &Stm,
        op_assumptions: &[Exp],
        _invariants: &[Exp],
        subgoals_out: &mut Vec<Query>,
    ) -> Result<Stm, DriverError> {
        let stm = match rhs_expr {
            Exp::Distinct(bag) => match bag.as_ref() {
                Exp::Var(v) => maintain_distinct(lhs, &v.name, op_body),
                _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
            },
            Exp::Min(bag) => match bag.as_ref() {
                Exp::Var(v) => maintain_min(lhs, &v.name, op_body, rhs_expr, op_assumptions, subgoals_out),
                _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
            },
            Exp::Sum(mapped) => match mapped.as_ref() {
                Exp::MapColl(bag, lambda) => match bag.as_ref() {
                    Exp::Var(v) => maintain_sum(lhs, &v.name, lambda, op_body),
                    _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
                },
                _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
            },
            Exp::UnOp(UnOp::Len, inner) => match inner.as_ref() {
                Exp::Filter(bag, lambda) => match bag.as_ref() {
                    Exp::Var(v) => maintain_filtered_count(lhs, &v.name, lambda, op_body),
                    _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
                },
                _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
            },
            Exp::Filter(bag, lambda) => match bag.as_ref() {
                Exp::Var(v) => maintain_filtered_bag(lhs, &v.name, lambda, op_body),
                _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
            },
            _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
        };
        Ok(stm)
    }
}

/// Finds a single mutating call on the state variable named `bag_name`
/// anywhere in `s`, ignoring conditional branches other than the one it's
/// found in. Only the first match is used — operations this derivative
/// handles mutate at most one relevant bag once.
fn find_bag_call<'a>(s: &'a Stm, bag_name: &str) -> Option<(&'a str, &'a [Exp])> {
    match s {
        Stm::Call(target, method, args) => match target {
            Exp::Var(v) if v.name == bag_name => Some((method.as_str(), args.as_slice())),
            _ => None,
        },
        Stm::Seq(a, b) => find_bag_call(a, bag_name).or_else(|| find_bag_call(b, bag_name)),
        Stm::If(_, a, b) => find_bag_call(a, bag_name).or_else(|| find_bag_call(b, bag_name)),
        Stm::ForEach(_, _, body) => find_bag_call(body, bag_name),
        Stm::MapUpdate(_, _, _, change) => find_bag_call(change, bag_name),
        _ => None,
    }
}

fn is_insert(method: &str) -> bool {
    method == "add" || method == "insert"
}

fn is_remove(method: &str) -> bool {
    method == "remove" || method == "delete"
}

fn maintain_distinct(lhs: &Exp, bag_name: &str, op_body: &Stm) -> Stm {
    match find_bag_call(op_body, bag_name) {
        Some((method, args)) if is_insert(method) || is_remove(method) => Stm::Call(lhs.clone(), method.to_string(), args.to_vec()),
        _ => Stm::NoOp,
    }
}

fn maintain_min(lhs: &Exp, bag_name: &str, op_body: &Stm, rhs_expr: &Exp, op_assumptions: &[Exp], subgoals_out: &mut Vec<Query>) -> Stm {
    match find_bag_call(op_body, bag_name) {
        Some((method, args)) if is_insert(method) && args.len() == 1 => {
            let elem = args[0].clone();
            Stm::Assign(
                lhs.clone(),
                Exp::if_then_else(Exp::BinOp(BinOp::Lt, Box::new(elem.clone()), Box::new(lhs.clone())), elem, lhs.clone()),
            )
        }
        // Removing the current minimum needs the rest of the bag to know
        // the new minimum; no incremental rule covers that without a
        // secondary index, so fall back to recomputing from abstract state.
        _ => fallback_recompute(rhs_expr, op_assumptions, subgoals_out, lhs),
    }
}

fn maintain_sum(lhs: &Exp, bag_name: &str, lambda: &increq_ast::Lambda, op_body: &Stm) -> Stm {
    match find_bag_call(op_body, bag_name) {
        Some((method, args)) if is_insert(method) && args.len() == 1 => {
            let contribution = subst1(&lambda.body, &lambda.var.name, args[0].clone());
            Stm::Assign(lhs.clone(), Exp::BinOp(BinOp::Add, Box::new(lhs.clone()), Box::new(contribution)))
        }
        Some((method, args)) if is_remove(method) && args.len() == 1 => {
            let contribution = subst1(&lambda.body, &lambda.var.name, args[0].clone());
            Stm::Assign(lhs.clone(), Exp::BinOp(BinOp::Sub, Box::new(lhs.clone()), Box::new(contribution)))
        }
        _ => Stm::NoOp,
    }
}

fn maintain_filtered_count(lhs: &Exp, bag_name: &str, lambda: &increq_ast::Lambda, op_body: &Stm) -> Stm {
    match find_bag_call(op_body, bag_name) {
        Some((method, args)) if is_insert(method) && args.len() == 1 => {
            let holds = subst1(&lambda.body, &lambda.var.name, args[0].clone());
            let delta = Exp::if_then_else(holds, Exp::int_lit(1), Exp::int_lit(0));
            Stm::Assign(lhs.clone(), Exp::BinOp(BinOp::Add, Box::new(lhs.clone()), Box::new(delta)))
        }
        Some((method, args)) if is_remove(method) && args.len() == 1 => {
            let holds = subst1(&lambda.body, &lambda.var.name, args[0].clone());
            let delta = Exp::if_then_else(holds, Exp::int_lit(1), Exp::int_lit(0));
            Stm::Assign(lhs.clone(), Exp::BinOp(BinOp::Sub, Box::new(lhs.clone()), Box::new(delta)))
        }
        _ => Stm::NoOp,
    }
}

fn maintain_filtered_bag(lhs: &Exp, bag_name: &str, lambda: &increq_ast::Lambda, op_body: &Stm) -> Stm {
    match find_bag_call(op_body, bag_name) {
        Some((method, args)) if (is_insert(method) || is_remove(method)) && args.len() == 1 => {
            let holds = subst1(&lambda.body, &lambda.var.name, args[0].clone());
            Stm::If(holds, Box::new(Stm::Call(lhs.clone(), method.to_string(), args.to_vec())), Box::new(Stm::NoOp))
        }
        _ => Stm::NoOp,
    }
}

/// Registers a helper query that evaluates `rhs_expr` straight from abstract
/// state, and assigns its result to `lhs`. Sound under any operation, at
/// the cost of giving up incrementality for this particular maintenance
/// statement; the reachability GC pass (component 4.6) will drop the helper
/// again if nothing ends up calling it.
fn fallback_recompute(rhs_expr: &Exp, op_assumptions: &[Exp], subgoals_out: &mut Vec<Query>, lhs: &Exp) -> Stm {
    let name = fresh_name("recompute");
    log::debug!("no incremental rule for {rhs_expr:?}, falling back to recompute helper {name}");
    let helper = Query::new(name.clone(), Visibility::Internal, vec![], rhs_expr.clone()).with_assumptions(op_assumptions.to_vec());
    subgoals_out.push(helper);
    Stm::Assign(lhs.clone(), Exp::call(name, vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Specification, Type};

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
    fn distinct_maintenance_mirrors_insert() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let lhs = Exp::var(Var::new("rep", Type::set(Type::Int)));
        let rhs = Exp::distinct(xs.clone());
        let op_body = Stm::Call(xs, "add".into(), vec![Exp::int_lit(5)]);
        let mut subgoals = vec![];
        let derivative = DefaultDerivative;
        let stm = derivative.mutate_in_place(&ctx, &lhs, &rhs, &op_body, &[], &[], &mut subgoals).unwrap();
        assert_eq!(stm, Stm::Call(lhs, "add".into(), vec![Exp::int_lit(5)]));
        assert!(subgoals.is_empty());
    }

    #[test]
    fn min_maintenance_falls_back_on_remove() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let lhs = Exp::var(Var::new("rep", Type::Int));
        let rhs = Exp::min(xs.clone());
        let op_body = Stm::Call(xs, "remove".into(), vec![Exp::int_lit(5)]);
        let mut subgoals = vec![];
        let derivative = DefaultDerivative;
        let stm = derivative.mutate_in_place(&ctx, &lhs, &rhs, &op_body, &[], &[], &mut subgoals).unwrap();
        assert_eq!(subgoals.len(), 1);
        match stm {
            Stm::Assign(target, value) => {
                assert_eq!(target, lhs);
                assert!(matches!(value, Exp::Call(..)));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_bag_shape_falls_back() {
        let ctx = empty_ctx();
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let lhs = Exp::var(Var::new("rep", Type::Int));
        let rhs = Exp::min(Exp::distinct(xs.clone()));
        let op_body = Stm::Call(xs, "add".into(), vec![Exp::int_lit(1)]);
        let mut subgoals = vec![];
        let derivative = DefaultDerivative;
        let _ = derivative.mutate_in_place(&ctx, &lhs, &rhs, &op_body, &[], &[], &mut subgoals).unwrap();
        assert_eq!(subgoals.len(), 1);
    }
}
