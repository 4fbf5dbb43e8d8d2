//! Handle-update planner (component 4.4): recognizes the one shape of
//! in-place handle mutation this system supports — a loop over every
//! reachable handle of a type, guarded by at most one `if`, assigning a new
//! value to a single field — and builds the statement that applies it to
//! exactly the handles an operation actually changes.
//!
//! General symbolic interpretation of "the mutation an arbitrary operation
//! body applies to a handle's value" is out of reach for a pattern-based
//! driver; this planner is deliberately narrow rather than silently wrong,
//! matching the one handle-mutation scenario this system is built against
//! (`for h in hs: if h.k = k0 then h.v := h.v + 1`).

use crate::implementation::Implementation;
use crate::oracle::Oracle;
use crate::subquery::introduce_subquery;
use increq_ast::visit::free_vars_exp;
use increq_ast::{alpha_equivalent, fresh_name, Exp, Query, Stm, Var, Visibility};
use increq_collab::CollaboratorRegistry;
use increq_context::{reachable_handles, Context};
use increq_diagnostics::DriverError;

pub fn plan_handle_updates(impl_: &mut Implementation, ctx: &Context, oracle: &Oracle, registry: &CollaboratorRegistry, deduplicate: bool) -> Result<(), DriverError> {
    let reachable = reachable_handles(&impl_.spec);
    let ops: Vec<_> = impl_.spec.operations().cloned().collect();

    for (handle_name, (handle_ty, bag_expr)) in &reachable {
        for op in &ops {
            let Some(mutation) = find_handle_mutation(&op.body, bag_expr) else {
                continue;
            };

            let h = mutation.loop_var.clone();
            let field_val = Exp::get_field(Exp::var(h.clone()), mutation.field.clone());
            let new_val = match &mutation.guard {
                Some(cond) => Exp::if_then_else(cond.clone(), mutation.new_field_val.clone(), field_val.clone()),
                None => mutation.new_field_val.clone(),
            };

            let changed_pred = Exp::UnOp(increq_ast::UnOp::Not, Box::new(Exp::eq(field_val.clone(), new_val.clone())));
            let pred_free: Vec<Var> = free_vars_exp(&changed_pred)
                .into_iter()
                .filter(|v| v.name != h.name)
                .collect();
            let modified_args: Vec<(String, increq_ast::Type)> = pred_free.iter().map(|v| (v.name.clone(), v.ty.clone())).collect();
            let call_args: Vec<Exp> = pred_free.iter().map(|v| Exp::var(v.clone())).collect();

            let modified_name = fresh_name(&format!("{}_modified_by_{}", handle_name.to_lowercase(), op.name));
            let lambda = increq_ast::Lambda { var: h.clone(), body: changed_pred };
            let modified_query = Query::new(modified_name.clone(), Visibility::Internal, modified_args, Exp::filter(Exp::distinct(bag_expr.clone()), lambda))
                .with_docstring(format!("[{}] modified handles of {}", op.name, handle_ty.name));

            let new_field_assign = Stm::Assign(Exp::get_field(Exp::var(h.clone()), mutation.field.clone()), new_val);
            let per_handle = Stm::ForEach(h.clone(), Exp::call(modified_name.clone(), call_args), Box::new(new_field_assign));

            let rewritten = introduce_subquery(impl_, ctx, oracle, registry, deduplicate, modified_query, per_handle)?;
            impl_.handle_updates.insert((handle_ty.name.clone(), op.name.clone()), rewritten);
        }
    }
    Ok(())
}

struct HandleMutation {
    loop_var: Var,
    field: String,
    new_field_val: Exp,
    guard: Option<Exp>,
}

/// Looks for `ForEach(h, bag, body)` where `bag` is alpha-equivalent to
/// `reachable_bag`, and `body` is either a direct field assignment on `h` or
/// a single `if cond then <field assignment> else noop`.
fn find_handle_mutation(s: &Stm, reachable_bag: &Exp) -> Option<HandleMutation> {
    match s {
        Stm::ForEach(h, bag, body) if alpha_equivalent(bag, reachable_bag) => mutation_in_body(h, body),
        Stm::Seq(a, b) => find_handle_mutation(a, reachable_bag).or_else(|| find_handle_mutation(b, reachable_bag)),
        Stm::If(_, a, b) => find_handle_mutation(a, reachable_bag).or_else(|| find_handle_mutation(b, reachable_bag)),
        _ => None,
    }
}

fn mutation_in_body(h: &Var, body: &Stm) -> Option<HandleMutation> {
    match body {
        Stm::Assign(lhs, rhs) => field_assignment(h, lhs).map(|field| HandleMutation { loop_var: h.clone(), field, new_field_val: rhs.clone(), guard: None }),
        Stm::If(cond, then_branch, else_branch) if else_branch.is_noop() => match then_branch.as_ref() {
            Stm::Assign(lhs, rhs) => field_assignment(h, lhs).map(|field| HandleMutation {
                loop_var: h.clone(),
                field,
                new_field_val: rhs.clone(),
                guard: Some(cond.clone()),
            }),
            _ => None,
        },
        _ => None,
    }
}

fn field_assignment(h: &Var, lhs: &Exp) -> Option<String> {
    match lhs {
        Exp::GetField(target, field) => match target.as_ref() {
            Exp::Var(v) if v.name == h.name => Some(field.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{HandleType, Operation, Specification, Type};
    use increq_collab::DefaultSolver;
    use std::sync::Arc;

    fn bump_spec() -> Specification {
        let node_ty = HandleType::new("Node", Type::Record(vec![("k".into(), Type::Int), ("v".into(), Type::Int)]));
        let hs_ty = Type::bag(Type::Handle(node_ty));
        let h = Var::new("h", Type::Handle(HandleType::new("Node", Type::Record(vec![("k".into(), Type::Int), ("v".into(), Type::Int)]))));
        let k0 = Var::new("k0", Type::Int);

        let h_k = Exp::get_field(Exp::var(h.clone()), "k".into());
        let h_v = Exp::get_field(Exp::var(h.clone()), "v".into());
        let cond = Exp::eq(h_k, Exp::var(k0.clone()));
        let new_v = Exp::BinOp(increq_ast::BinOp::Add, Box::new(h_v), Box::new(Exp::int_lit(1)));
        let assign = Stm::Assign(Exp::get_field(Exp::var(h.clone()), "v".into()), new_v);
        let body = Stm::If(cond, Box::new(assign), Box::new(Stm::NoOp));
        let loop_stm = Stm::ForEach(h, Exp::var(Var::new("hs", hs_ty.clone())), Box::new(body));

        let bump = Operation::new("bump", vec![("k0".into(), Type::Int)], loop_stm);
        Specification {
            name: "counters".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![("hs".into(), hs_ty)],
            assumptions: vec![],
            methods: vec![increq_ast::Method::Operation(bump)],
            header: None,
            footer: None,
            docstring: None,
        }
    }

    #[test]
    fn plans_guarded_field_mutation() {
        let spec = bump_spec();
        let ctx = Context::build(&spec).unwrap();
        let mut impl_ = Implementation::new(spec);
        let oracle = Oracle::new(Arc::new(DefaultSolver::new()));
        let registry = increq_collab::CollaboratorRegistry::with_defaults();
        plan_handle_updates(&mut impl_, &ctx, &oracle, &registry, true).unwrap();
        assert!(impl_.handle_updates.contains_key(&("Node".to_string(), "bump".to_string())));
        assert!(impl_.query_specs.iter().any(|q| q.name.contains("modified_by_bump")));
        assert!(impl_.query_impls.keys().any(|name| name.contains("modified_by_bump")));
    }
}
