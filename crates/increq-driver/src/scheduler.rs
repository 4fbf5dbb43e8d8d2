//! Update scheduler & code assembler (component 4.7): orders each
//! operation's per-variable maintenance statements to avoid read-after-write
//! hazards, lifts offending reads into temporaries, and emits the final
//! output specification.

use crate::implementation::Implementation;
use increq_ast::visit::{called_query_names_stm, free_vars_exp, free_vars_stm, rewrite_exp};
use increq_ast::{fresh_name, Exp, Lambda, Method, Operation, Specification, Stm, Type, Var};
use increq_context::Context;
use increq_diagnostics::DriverError;
use std::collections::{HashMap, HashSet};

/// Assembles the synthesized output: `concretization` becomes the state,
/// concrete query implementations come first, then every operation
/// rewritten with ordered, read-after-write-safe maintenance code.
pub fn assemble(impl_: &Implementation, ctx: &Context) -> Result<Specification, DriverError> {
    let mut methods: Vec<Method> = impl_.query_impls.values().cloned().map(Method::Query).collect();
    for op in impl_.spec.operations() {
        methods.push(Method::Operation(schedule_operation(impl_, ctx, op)?));
    }
    Ok(Specification {
        name: impl_.spec.name.clone(),
        types: impl_.spec.types.clone(),
        extern_funcs: impl_.spec.extern_funcs.clone(),
        state_vars: impl_.concretization.iter().map(|(v, _)| (v.name.clone(), v.ty.clone())).collect(),
        assumptions: Vec::new(),
        methods,
        header: impl_.spec.header.clone(),
        footer: impl_.spec.footer.clone(),
        docstring: impl_.spec.docstring.clone(),
    })
}

fn schedule_operation(impl_: &Implementation, ctx: &Context, op: &increq_ast::Operation) -> Result<Operation, DriverError> {
    let cvar_names: HashSet<String> = impl_.concretization.iter().map(|(v, _)| v.name.clone()).collect();
    let ret_types = query_ret_types(impl_, ctx)?;

    let mut var_stmts: Vec<(String, Stm)> = Vec::new();
    for (v, _) in &impl_.concretization {
        if let Some(stm) = impl_.updates.get(&(v.name.clone(), op.name.clone())) {
            var_stmts.push((v.name.clone(), stm.clone()));
        }
    }

    let mut edges: HashMap<String, HashSet<String>> = HashMap::new();
    for (v, stm) in &var_stmts {
        let mut reads = reads_of(impl_, stm, &cvar_names);
        reads.remove(v);
        edges.insert(v.clone(), reads);
    }

    let nodes: Vec<String> = var_stmts.iter().map(|(v, _)| v.clone()).collect();
    let (order, _broken) = dependency_order(&nodes, &edges);

    let ordered_stmts: Vec<(String, Stm)> = order.iter().filter_map(|name| var_stmts.iter().find(|(v, _)| v == name).cloned()).collect();

    let mut lifted: Vec<Stm> = Vec::new();
    let mut written: HashSet<String> = HashSet::new();
    let mut final_stmts: Vec<Stm> = Vec::new();

    for (var, stm) in ordered_stmts {
        let problematic: HashSet<String> = edges.get(&var).cloned().unwrap_or_default().intersection(&written).cloned().collect();
        let rewritten = if problematic.is_empty() { stm } else { lift_problematic_reads(impl_, &ret_types, &stm, &problematic, &mut lifted) };
        final_stmts.push(rewritten);
        written.insert(var);
    }

    for ((_, op_name), stm) in &impl_.handle_updates {
        if op_name == &op.name {
            final_stmts.push(stm.clone());
        }
    }

    let body = Stm::seq_all(lifted.into_iter().chain(final_stmts));
    Ok(Operation { name: op.name.clone(), args: op.args.clone(), assumptions: Vec::new(), body, docstring: op.docstring.clone() })
}

fn query_ret_types(impl_: &Implementation, ctx: &Context) -> Result<HashMap<String, Type>, DriverError> {
    impl_.query_impls.iter().map(|(name, q)| Ok((name.clone(), increq_context::infer_query_ret_type(ctx, q)?))).collect()
}

fn call_reads(impl_: &Implementation, name: &str) -> HashSet<String> {
    impl_.query_impls.get(name).map(|q| free_vars_exp(&q.ret).into_iter().map(|v| v.name).collect()).unwrap_or_default()
}

fn reads_of(impl_: &Implementation, stm: &Stm, cvar_names: &HashSet<String>) -> HashSet<String> {
    let mut called = HashSet::new();
    called_query_names_stm(stm, &mut called);
    let mut out: HashSet<String> = called.iter().flat_map(|name| call_reads(impl_, name)).filter(|n| cvar_names.contains(n)).collect();
    out.extend(free_vars_stm(stm).into_iter().map(|v| v.name).filter(|n| cvar_names.contains(n)));
    out
}

/// Greedy DFS-based cycle breaking (§9's "minimum feedback arc set, any
/// correct heuristic"): a back edge hit during DFS is reported broken and
/// not followed further; post-order gives a dependencies-first order over
/// what remains, which is exactly the order an edge `v1 -> v2` ("v1 reads
/// v2") needs: v2 emitted before v1. Node order ties (and which edge of a
/// cycle gets broken) are resolved by sorting names, an arbitrary but
/// deterministic choice — §9 leaves the tie-break unspecified.
fn dependency_order(nodes: &[String], edges: &HashMap<String, HashSet<String>>) -> (Vec<String>, HashSet<(String, String)>) {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        InProgress,
        Done,
    }

    fn visit(node: &str, edges: &HashMap<String, HashSet<String>>, state: &mut HashMap<String, State>, order: &mut Vec<String>, broken: &mut HashSet<(String, String)>) {
        state.insert(node.to_string(), State::InProgress);
        if let Some(deps) = edges.get(node) {
            let mut deps: Vec<&String> = deps.iter().collect();
            deps.sort();
            for dep in deps {
                match state.get(dep.as_str()) {
                    Some(State::InProgress) => {
                        broken.insert((node.to_string(), dep.clone()));
                    }
                    Some(State::Done) => {}
                    None => visit(dep, edges, state, order, broken),
                }
            }
        }
        state.insert(node.to_string(), State::Done);
        order.push(node.to_string());
    }

    let mut state: HashMap<String, State> = HashMap::new();
    let mut order = Vec::new();
    let mut broken = HashSet::new();
    let mut sorted_nodes = nodes.to_vec();
    sorted_nodes.sort();
    for n in &sorted_nodes {
        if state.get(n).is_none() {
            visit(n, edges, &mut state, &mut order, &mut broken);
        }
    }
    (order, broken)
}

fn lift_problematic_reads(impl_: &Implementation, ret_types: &HashMap<String, Type>, stm: &Stm, problematic: &HashSet<String>, lifted: &mut Vec<Stm>) -> Stm {
    match stm {
        Stm::NoOp => Stm::NoOp,
        Stm::Seq(a, b) => Stm::Seq(
            Box::new(lift_problematic_reads(impl_, ret_types, a, problematic, lifted)),
            Box::new(lift_problematic_reads(impl_, ret_types, b, problematic, lifted)),
        ),
        Stm::Decl(v, e) => Stm::Decl(v.clone(), lift_exp(impl_, ret_types, e, problematic, lifted)),
        Stm::Assign(lhs, rhs) => Stm::Assign(lhs.clone(), lift_exp(impl_, ret_types, rhs, problematic, lifted)),
        Stm::If(c, t, e) => Stm::If(
            lift_exp(impl_, ret_types, c, problematic, lifted),
            Box::new(lift_problematic_reads(impl_, ret_types, t, problematic, lifted)),
            Box::new(lift_problematic_reads(impl_, ret_types, e, problematic, lifted)),
        ),
        Stm::ForEach(loop_var, bag, body) => lift_foreach(impl_, ret_types, loop_var, bag, body, problematic, lifted),
        Stm::Call(target, name, args) => {
            let target = lift_exp(impl_, ret_types, target, problematic, lifted);
            let args = args.iter().map(|a| lift_exp(impl_, ret_types, a, problematic, lifted)).collect();
            Stm::Call(target, name.clone(), args)
        }
        Stm::MapPut(m, k, v) => Stm::MapPut(m.clone(), lift_exp(impl_, ret_types, k, problematic, lifted), lift_exp(impl_, ret_types, v, problematic, lifted)),
        Stm::MapDel(m, k) => Stm::MapDel(m.clone(), lift_exp(impl_, ret_types, k, problematic, lifted)),
        Stm::MapUpdate(m, k, val_var, change) => Stm::MapUpdate(
            m.clone(),
            lift_exp(impl_, ret_types, k, problematic, lifted),
            val_var.clone(),
            Box::new(lift_problematic_reads(impl_, ret_types, change, problematic, lifted)),
        ),
    }
}

fn lift_exp(impl_: &Implementation, ret_types: &HashMap<String, Type>, e: &Exp, problematic: &HashSet<String>, lifted: &mut Vec<Stm>) -> Exp {
    rewrite_exp(e.clone(), &mut |node| match &node {
        Exp::Call(name, _) if call_reads(impl_, name).iter().any(|r| problematic.contains(r)) => {
            let ty = ret_types.get(name).cloned().unwrap_or(Type::Int);
            let temp = Var::new(fresh_name(&format!("{name}_before")), ty);
            lifted.push(Stm::Decl(temp.clone(), node.clone()));
            Exp::var(temp)
        }
        _ => node,
    })
}

/// A loop body may reference a problematic call whose value depends on the
/// loop variable; a scalar temp can't capture that, so the call is instead
/// precomputed as a map keyed by the loop variable and looked up inside the
/// loop (§4.7: "package the temp as a precomputed map keyed by the loop
/// variable"). Applied to the first problematic call found in the body,
/// conservatively, even when that particular call turns out not to depend
/// on the loop variable — still correct, just not the tightest lift.
fn lift_foreach(impl_: &Implementation, ret_types: &HashMap<String, Type>, loop_var: &Var, bag: &Exp, body: &Stm, problematic: &HashSet<String>, lifted: &mut Vec<Stm>) -> Stm {
    match first_problematic_call(impl_, body, problematic) {
        None => Stm::ForEach(loop_var.clone(), bag.clone(), Box::new(lift_problematic_reads(impl_, ret_types, body, problematic, lifted))),
        Some((name, call_expr)) => {
            let ret_ty = ret_types.get(&name).cloned().unwrap_or(Type::Int);
            let map_ty = Type::map(loop_var.ty.clone(), ret_ty);
            let temp_map = Var::new(fresh_name(&format!("{name}_map")), map_ty);
            let lambda = Lambda { var: loop_var.clone(), body: call_expr.clone() };
            lifted.push(Stm::Decl(temp_map.clone(), Exp::map_coll(bag.clone(), lambda)));
            let replaced = replace_call(body, &call_expr, &Exp::map_get(Exp::var(temp_map), Exp::var(loop_var.clone())));
            Stm::ForEach(loop_var.clone(), bag.clone(), Box::new(lift_problematic_reads(impl_, ret_types, &replaced, problematic, lifted)))
        }
    }
}

fn first_problematic_call(impl_: &Implementation, stm: &Stm, problematic: &HashSet<String>) -> Option<(String, Exp)> {
    for e in stm.direct_exprs() {
        if let Some(found) = find_problematic_call_exp(impl_, e, problematic) {
            return Some(found);
        }
    }
    for child in stm.child_stms() {
        if let Some(found) = first_problematic_call(impl_, child, problematic) {
            return Some(found);
        }
    }
    None
}

fn find_problematic_call_exp(impl_: &Implementation, e: &Exp, problematic: &HashSet<String>) -> Option<(String, Exp)> {
    if let Exp::Call(name, _) = e {
        if call_reads(impl_, name).iter().any(|r| problematic.contains(r)) {
            return Some((name.clone(), e.clone()));
        }
    }
    for c in e.children() {
        if let Some(found) = find_problematic_call_exp(impl_, c, problematic) {
            return Some(found);
        }
    }
    None
}

fn replace_call(stm: &Stm, target: &Exp, replacement: &Exp) -> Stm {
    let rewrite_e = |e: &Exp| rewrite_exp(e.clone(), &mut |node| if &node == target { replacement.clone() } else { node });
    match stm {
        Stm::NoOp => Stm::NoOp,
        Stm::Seq(a, b) => Stm::Seq(Box::new(replace_call(a, target, replacement)), Box::new(replace_call(b, target, replacement))),
        Stm::Decl(v, e) => Stm::Decl(v.clone(), rewrite_e(e)),
        Stm::Assign(lhs, rhs) => Stm::Assign(rewrite_e(lhs), rewrite_e(rhs)),
        Stm::If(c, t, e) => Stm::If(rewrite_e(c), Box::new(replace_call(t, target, replacement)), Box::new(replace_call(e, target, replacement))),
        Stm::ForEach(v, bag, body) => Stm::ForEach(v.clone(), rewrite_e(bag), Box::new(replace_call(body, target, replacement))),
        Stm::Call(t, name, args) => Stm::Call(rewrite_e(t), name.clone(), args.iter().map(rewrite_e).collect()),
        Stm::MapPut(m, k, v) => Stm::MapPut(rewrite_e(m), rewrite_e(k), rewrite_e(v)),
        Stm::MapDel(m, k) => Stm::MapDel(rewrite_e(m), rewrite_e(k)),
        Stm::MapUpdate(m, k, v, change) => Stm::MapUpdate(rewrite_e(m), rewrite_e(k), v.clone(), Box::new(replace_call(change, target, replacement))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Query, Specification, Visibility};

    fn spec_with_two_queries() -> Specification {
        Specification {
            name: "s".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![],
            assumptions: vec![],
            methods: vec![increq_ast::Method::Operation(increq_ast::Operation::new("op", vec![], Stm::NoOp))],
            header: None,
            footer: None,
            docstring: None,
        }
    }

    #[test]
    fn breaks_a_two_node_cycle_deterministically() {
        let mut edges = HashMap::new();
        edges.insert("a".to_string(), HashSet::from(["b".to_string()]));
        edges.insert("b".to_string(), HashSet::from(["a".to_string()]));
        let (order, broken) = dependency_order(&["a".to_string(), "b".to_string()], &edges);
        assert_eq!(order.len(), 2);
        assert_eq!(broken.len(), 1);
    }

    #[test]
    fn assembles_state_vars_from_concretization() {
        let spec = spec_with_two_queries();
        let ctx = Context::build(&spec).unwrap();
        let mut impl_ = Implementation::new(spec);
        let rep_var = Var::new("rep", Type::Int);
        impl_.concretization.push((rep_var.clone(), Exp::int_lit(0)));
        impl_.query_impls.insert("noop_q".into(), Query::new("noop_q", Visibility::Internal, vec![], Exp::int_lit(1)));
        let out = assemble(&impl_, &ctx).unwrap();
        assert_eq!(out.state_vars, vec![("rep".to_string(), Type::Int)]);
        assert!(out.assumptions.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const NODE_POOL: [&str; 5] = ["a", "b", "c", "d", "e"];

    fn edges_strategy() -> impl Strategy<Value = HashMap<String, HashSet<String>>> {
        prop::collection::vec(prop::collection::vec(any::<bool>(), NODE_POOL.len()), NODE_POOL.len()).prop_map(|rows| {
            let mut edges = HashMap::new();
            for (i, row) in rows.into_iter().enumerate() {
                let deps: HashSet<String> = row.into_iter().enumerate().filter(|(j, present)| *present && *j != i).map(|(j, _)| NODE_POOL[j].to_string()).collect();
                edges.insert(NODE_POOL[i].to_string(), deps);
            }
            edges
        })
    }

    proptest! {
        /// Property 4 (no read-after-write), at the graph level: whatever
        /// edges are broken to resolve a cycle, every surviving edge
        /// `v1 -> v2` ("v1 reads v2") still has v2 ordered before v1 — the
        /// invariant `schedule_operation` leans on to decide what needs a
        /// lifted temporary.
        #[test]
        fn surviving_edges_respect_emission_order(edges in edges_strategy()) {
            let nodes: Vec<String> = NODE_POOL.iter().map(|n| n.to_string()).collect();
            let (order, broken) = dependency_order(&nodes, &edges);

            prop_assert_eq!(order.len(), nodes.len());
            for n in &nodes {
                prop_assert!(order.contains(n));
            }

            let position: HashMap<&String, usize> = order.iter().enumerate().map(|(i, n)| (n, i)).collect();
            for (from, deps) in &edges {
                for to in deps {
                    if broken.contains(&(from.clone(), to.clone())) {
                        continue;
                    }
                    prop_assert!(position[to] < position[from], "edge {from} -> {to} should have {to} emitted first");
                }
            }
        }
    }
}
