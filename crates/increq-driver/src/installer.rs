//! Representation installer (component 4.3): folds a candidate
//! representation into `concretization`, installs the concrete query
//! implementation, and derives the per-operation maintenance code for
//! every concrete variable the candidate actually added.

use crate::implementation::{CVar, Implementation};
use crate::oracle::{expected_ret_type, Oracle};
use crate::subquery::introduce_subquery;
use increq_ast::{subst_exp, Exp};
use increq_collab::CollaboratorRegistry;
use increq_context::Context;
use increq_diagnostics::DriverError;
use std::collections::HashMap;

/// Installs a candidate `(rep, ret)` pair for `query_name`.
///
/// 1. Coalesce: any `(v, e)` in `rep` whose definition is provably equal to
///    an already-installed concrete var's definition is dropped in favor of
///    that existing var.
/// 2. Register: the coalesced substitution is applied to `ret`, the result
///    is type-checked against the query's declared return type, surviving
///    representation pairs are appended to `concretization`, and the
///    concrete query implementation is installed.
/// 3. Incrementalize: for every operation and every *newly surviving*
///    concrete var, ask the derivative collaborator for its maintenance
///    statement, routing any helper queries it needs through subquery
///    introduction.
pub fn install_representation(
    impl_: &mut Implementation,
    ctx: &Context,
    oracle: &Oracle,
    registry: &CollaboratorRegistry,
    deduplicate: bool,
    query_name: &str,
    rep: Vec<(CVar, Exp)>,
    ret: Exp,
) -> Result<(), DriverError> {
    let mut rename: HashMap<String, Exp> = HashMap::new();
    let mut surviving: Vec<(CVar, Exp)> = Vec::new();

    for (v, e) in rep {
        let mut reused = None;
        for (existing_var, existing_def) in &impl_.concretization {
            if existing_var.ty != v.ty {
                continue;
            }
            if oracle.valid(ctx, &impl_.spec.assumptions, &Exp::eq(e.clone(), existing_def.clone()))? {
                reused = Some(existing_var.clone());
                break;
            }
        }
        match reused {
            Some(existing_var) => {
                rename.insert(v.name.clone(), Exp::var(existing_var));
            }
            None => surviving.push((v, e)),
        }
    }

    let final_ret = subst_exp(&ret, &rename);

    let query_spec = impl_
        .query_spec(query_name)
        .cloned()
        .ok_or_else(|| DriverError::type_mismatch(format!("no query spec named '{query_name}'"), increq_diagnostics::MethodLocation::new(query_name)))?;
    let expected = expected_ret_type(ctx, &query_spec)?;

    let mut env = increq_context::TypeEnv::new();
    for (n, t) in &query_spec.args {
        env.define(n.clone(), t.clone());
    }
    let actual = increq_context::infer_exp(ctx, &mut env, query_name, &final_ret)?;
    if actual != expected {
        return Err(DriverError::type_mismatch(
            format!("installed representation for '{query_name}' has type {actual}, expected {expected}"),
            increq_diagnostics::MethodLocation::new(query_name),
        ));
    }

    impl_.concretization.extend(surviving.iter().cloned());
    impl_.query_impls.insert(query_name.to_string(), query_spec.rewrite_ret_drop_assumptions(final_ret));

    for op in impl_.spec.operations().cloned().collect::<Vec<_>>() {
        for (v, e) in &surviving {
            let mut subgoals = Vec::new();
            let lhs = Exp::var(v.clone());
            let stm = registry.derivative().mutate_in_place(ctx, &lhs, e, &op.body, &op.assumptions, &impl_.spec.assumptions, &mut subgoals)?;

            let mut stm = stm;
            for subgoal in subgoals {
                stm = introduce_subquery(impl_, ctx, oracle, registry, deduplicate, subgoal, stm)?;
            }
            impl_.updates.insert((v.name.clone(), op.name.clone()), stm);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Operation, Query, Specification, Stm, Type, Var, Visibility};
    use increq_collab::DefaultSolver;
    use std::sync::Arc;

    fn membership_spec() -> Specification {
        let xs = ("xs".to_string(), Type::bag(Type::Int));
        let x = Var::new("x", Type::Int);
        let contains = Query::new(
            "contains",
            Visibility::Public,
            vec![("x".into(), Type::Int)],
            Exp::in_bag(Exp::var(x), Exp::var(Var::new("xs", Type::bag(Type::Int)))),
        );
        let add = Operation::new(
            "add",
            vec![("x".into(), Type::Int)],
            Stm::Call(Exp::var(Var::new("xs", Type::bag(Type::Int))), "add".into(), vec![Exp::var(Var::new("x", Type::Int))]),
        );
        Specification {
            name: "set".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![xs],
            assumptions: vec![],
            methods: vec![increq_ast::Method::Query(contains), increq_ast::Method::Operation(add)],
            header: None,
            footer: None,
            docstring: None,
        }
    }

    #[test]
    fn installs_representation_and_maintenance() {
        let spec = membership_spec();
        let ctx = Context::build(&spec).unwrap();
        let mut impl_ = Implementation::new(spec);
        let oracle = Oracle::new(Arc::new(DefaultSolver::new()));
        let registry = CollaboratorRegistry::with_defaults();

        let xs_bag = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let rep_var = Var::new("rep_set", Type::set(Type::Int));
        let rep = vec![(rep_var.clone(), Exp::distinct(xs_bag))];
        let x = Var::new("x", Type::Int);
        let ret = Exp::in_bag(Exp::var(x), Exp::var(rep_var.clone()));

        install_representation(&mut impl_, &ctx, &oracle, &registry, true, "contains", rep, ret).unwrap();

        assert!(impl_.query_impls.contains_key("contains"));
        assert_eq!(impl_.concretization.len(), 1);
        assert!(impl_.updates.contains_key(&(rep_var.name.clone(), "add".to_string())));
    }
}
