//! Subquery introduction (component 4.2): turns a candidate helper query
//! discovered while incrementalizing an operation into either a reference
//! to an existing, equivalent query or a brand-new entry in
//! `query_specs`.

use crate::implementation::Implementation;
use crate::installer::install_representation;
use crate::oracle::Oracle;
use crate::rewrite::{rewrite_calls_stm, unpack_representation};
use crate::simplify::simplify_exp;
use increq_ast::visit::free_vars_query;
use increq_ast::{Query, Stm, Visibility};
use increq_collab::CollaboratorRegistry;
use increq_context::{Context, TypeEnv};
use increq_diagnostics::DriverError;

/// Introduces `sub_q` into `impl_`, rewriting every call to its name inside
/// `used_by` to whatever name the query ends up registered under (its own,
/// if it's new, or an existing equivalent query's).
///
/// Runs the four steps of §4.2 in order:
/// 1. Strengthen `sub_q`'s assumptions with implicit handle membership facts
///    the oracle can't derive on its own, dropping any that don't actually
///    add information.
/// 2. Repair well-formedness of its return expression against the concrete
///    state installed so far.
/// 3. Simplify the return expression and each assumption, aborting if the
///    simplified form is no smaller in aggregate than the original (the
///    monotonicity guard — growth means a simplification rule is buggy,
///    not that this particular input is hard).
/// 4. Deduplicate against every existing query spec; install as new only if
///    no equivalent one exists.
pub fn introduce_subquery(
    impl_: &mut Implementation,
    ctx: &Context,
    oracle: &Oracle,
    registry: &CollaboratorRegistry,
    deduplicate: bool,
    mut sub_q: Query,
    used_by: Stm,
) -> Result<Stm, DriverError> {
    strengthen_handle_assumptions(&impl_.spec, oracle, ctx, &mut sub_q)?;

    let available: Vec<_> = impl_.concretization.iter().map(|(_, e)| e.clone()).collect();
    sub_q.ret = increq_context::repair_well_formedness(&sub_q.ret, &available);

    simplify_in_place(&mut sub_q)?;

    if deduplicate {
        for existing in &impl_.query_specs {
            if existing.name == sub_q.name {
                continue;
            }
            if let Some(perm) = oracle.equivalent(ctx, &impl_.spec.assumptions, existing, &sub_q)? {
                return Ok(rewrite_calls_stm(&used_by, &sub_q.name, &existing.name, &perm));
            }
        }
    }

    let mut env = TypeEnv::new();
    for (n, t) in &sub_q.args {
        env.define(n.clone(), t.clone());
    }
    let (rep, unpacked_ret) = unpack_representation(ctx, &mut env, &sub_q.ret)?;
    sub_q.ret = unpacked_ret;

    add_query(impl_, ctx, oracle, registry, deduplicate, sub_q.clone(), rep)?;
    Ok(used_by)
}

/// Registers `q` verbatim as a new internal query spec and installs it the
/// same way any other candidate representation is installed — mirroring
/// cozy's `Implementation.add_query`, which always runs the result through
/// `set_impl` rather than just recording its spec. Without this, a helper
/// query is referenced by its call sites but never gets a `query_impls`
/// entry or per-operation maintenance code. Public entry point for callers
/// (the handle-update planner) that already have a final, deduplicated
/// query in hand.
pub fn add_query(
    impl_: &mut Implementation,
    ctx: &Context,
    oracle: &Oracle,
    registry: &CollaboratorRegistry,
    deduplicate: bool,
    q: Query,
    rep: Vec<(increq_ast::Var, increq_ast::Exp)>,
) -> Result<(), DriverError> {
    let name = q.name.clone();
    let ret = q.ret.clone();
    impl_.query_specs.push(q);
    install_representation(impl_, ctx, oracle, registry, deduplicate, &name, rep, ret)
}

/// Adds `h in reachable_bag(h)` for every handle-typed free variable of
/// `sub_q`, skipping any fact the oracle already derives from the query's
/// existing assumptions.
fn strengthen_handle_assumptions(spec: &increq_ast::Specification, oracle: &Oracle, ctx: &Context, sub_q: &mut Query) -> Result<(), DriverError> {
    let free: Vec<increq_ast::Var> = free_vars_query(sub_q).into_iter().collect();
    for fact in increq_context::implicit_handle_assumptions(spec, &free) {
        if !oracle.valid(ctx, &sub_q.assumptions, &fact)? {
            sub_q.assumptions.push(fact);
        }
    }
    Ok(())
}

fn simplify_in_place(sub_q: &mut Query) -> Result<(), DriverError> {
    let before: usize = sub_q.ret.size() + sub_q.assumptions.iter().map(|a| a.size()).sum::<usize>();

    let simplified_ret = simplify_exp(&sub_q.ret);
    let simplified_assumptions: Vec<_> = sub_q.assumptions.iter().map(simplify_exp).collect();

    let after: usize = simplified_ret.size() + simplified_assumptions.iter().map(|a| a.size()).sum::<usize>();
    if after > before {
        return Err(DriverError::bad_simplification(&sub_q.name, before, after));
    }

    sub_q.ret = simplified_ret;
    sub_q.assumptions = simplified_assumptions;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Specification, Type};
    use increq_collab::DefaultSolver;
    use std::sync::Arc;

    fn empty_ctx() -> Context {
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

    fn empty_impl() -> Implementation {
        Implementation::new(Specification {
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
    }

    #[test]
    fn new_query_is_installed_when_no_equivalent_exists() {
        let mut impl_ = empty_impl();
        let ctx = empty_ctx();
        let oracle = Oracle::new(Arc::new(DefaultSolver::new()));
        let registry = increq_collab::CollaboratorRegistry::with_defaults();
        let q = Query::new("helper", Visibility::Internal, vec![], increq_ast::Exp::int_lit(1));
        let v = increq_ast::Var::new("tmp", Type::Int);
        let used_by = Stm::Decl(v, increq_ast::Exp::call("helper", vec![]));
        let rewritten = introduce_subquery(&mut impl_, &ctx, &oracle, &registry, true, q, used_by.clone()).unwrap();
        assert!(impl_.query_specs.iter().any(|q| q.name == "helper"));
        assert!(impl_.query_impls.contains_key("helper"));
        assert_eq!(rewritten, used_by);
    }

    #[test]
    fn equivalent_existing_query_is_reused() {
        let mut impl_ = empty_impl();
        impl_.query_specs.push(Query::new("existing", Visibility::Internal, vec![], increq_ast::Exp::int_lit(1)));
        let ctx = empty_ctx();
        let oracle = Oracle::new(Arc::new(DefaultSolver::new()));
        let registry = increq_collab::CollaboratorRegistry::with_defaults();
        let q = Query::new("fresh_dup", Visibility::Internal, vec![], increq_ast::Exp::int_lit(1));
        let v = increq_ast::Var::new("tmp", Type::Int);
        let used_by = Stm::Decl(v, increq_ast::Exp::call("fresh_dup", vec![]));
        let rewritten = introduce_subquery(&mut impl_, &ctx, &oracle, &registry, true, q, used_by).unwrap();
        assert!(!impl_.query_specs.iter().any(|q| q.name == "fresh_dup"));
        match rewritten {
            Stm::Decl(_, increq_ast::Exp::Call(name, _)) => assert_eq!(name, "existing"),
            other => panic!("unexpected statement {other:?}"),
        }
    }
}
