//! Reachability garbage collection (component 4.6): drops every query spec,
//! concrete var and update statement that nothing reachable from the
//! specification's public surface still uses.
//!
//! A stale solution dropped here is not reported as an error — it was
//! superseded by something better, or never finished installing before a
//! timeout, and silently disappearing is the expected behavior of garbage
//! collection, not a failure of synthesis.

use crate::implementation::Implementation;
use increq_ast::visit::{called_query_names_exp, free_vars_exp};
use increq_ast::Visibility;
use std::collections::{HashSet, VecDeque};

#[derive(Clone, PartialEq, Eq, Hash)]
enum Node {
    Query(String),
    Var(String),
}

/// Walks the call graph from every public query and every call a handle
/// update makes (handle updates always run, so whatever they call is always
/// live), then deletes every query spec/impl, concrete var and update
/// statement not in the reached set.
pub fn collect_garbage(impl_: &mut Implementation) {
    let mut seen: HashSet<Node> = HashSet::new();
    let mut queue: VecDeque<Node> = VecDeque::new();

    for q in &impl_.query_specs {
        if q.visibility == Visibility::Public {
            queue.push_back(Node::Query(q.name.clone()));
        }
    }
    for stm in impl_.handle_updates.values() {
        for name in called_in_stm(stm) {
            queue.push_back(Node::Query(name));
        }
    }

    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.clone()) {
            continue;
        }
        match &node {
            Node::Query(name) => {
                if let Some(q) = impl_.query_impls.get(name).or_else(|| impl_.query_specs.iter().find(|q| &q.name == name)) {
                    for called in called_in_query(q) {
                        queue.push_back(Node::Query(called));
                    }
                    for v in free_vars_exp(&q.ret) {
                        if impl_.concrete_var(&v.name).is_some() {
                            queue.push_back(Node::Var(v.name));
                        }
                    }
                }
            }
            Node::Var(name) => {
                for op in impl_.spec.operations() {
                    if let Some(stm) = impl_.updates.get(&(name.clone(), op.name.clone())) {
                        for called in called_in_stm(stm) {
                            queue.push_back(Node::Query(called));
                        }
                    }
                }
            }
        }
    }

    let live_queries: HashSet<&str> = seen
        .iter()
        .filter_map(|n| match n {
            Node::Query(name) => Some(name.as_str()),
            Node::Var(_) => None,
        })
        .collect();
    let live_vars: HashSet<&str> = seen
        .iter()
        .filter_map(|n| match n {
            Node::Var(name) => Some(name.as_str()),
            Node::Query(_) => None,
        })
        .collect();

    impl_.query_specs.retain(|q| live_queries.contains(q.name.as_str()));
    impl_.query_impls.retain(|name, _| live_queries.contains(name.as_str()));
    impl_.concretization.retain(|(v, _)| live_vars.contains(v.name.as_str()));
    impl_.updates.retain(|(var, _), _| live_vars.contains(var.as_str()));
}

fn called_in_query(q: &increq_ast::Query) -> HashSet<String> {
    let mut out = HashSet::new();
    called_query_names_exp(&q.ret, &mut out);
    for a in &q.assumptions {
        called_query_names_exp(a, &mut out);
    }
    out
}

fn called_in_stm(s: &increq_ast::Stm) -> HashSet<String> {
    let mut out = HashSet::new();
    increq_ast::visit::called_query_names_stm(s, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Exp, Query, Specification};

    fn spec() -> Specification {
        Specification {
            name: "s".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![],
            assumptions: vec![],
            methods: vec![],
            header: None,
            footer: None,
            docstring: None,
        }
    }

    #[test]
    fn drops_query_spec_nothing_reaches() {
        let mut impl_ = Implementation::new(spec());
        impl_.query_specs.push(Query::new("public_q", Visibility::Public, vec![], Exp::int_lit(1)));
        impl_.query_specs.push(Query::new("orphan_helper", Visibility::Internal, vec![], Exp::int_lit(2)));
        collect_garbage(&mut impl_);
        assert!(impl_.query_specs.iter().any(|q| q.name == "public_q"));
        assert!(!impl_.query_specs.iter().any(|q| q.name == "orphan_helper"));
    }

    #[test]
    fn keeps_helper_called_from_public_query() {
        let mut impl_ = Implementation::new(spec());
        impl_.query_specs.push(Query::new("public_q", Visibility::Public, vec![], Exp::call("helper", vec![])));
        impl_.query_specs.push(Query::new("helper", Visibility::Internal, vec![], Exp::int_lit(2)));
        collect_garbage(&mut impl_);
        assert!(impl_.query_specs.iter().any(|q| q.name == "helper"));
    }

    #[test]
    fn drops_concrete_var_no_live_query_references() {
        use increq_ast::{Type, Var};
        let mut impl_ = Implementation::new(spec());
        impl_.query_specs.push(Query::new("public_q", Visibility::Public, vec![], Exp::int_lit(1)));
        impl_.concretization.push((Var::new("orphan_rep", Type::Int), Exp::int_lit(0)));
        impl_.updates.insert(("orphan_rep".into(), "op".into()), increq_ast::Stm::NoOp);
        collect_garbage(&mut impl_);
        assert!(impl_.concretization.is_empty());
        assert!(impl_.updates.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use increq_ast::{Exp, Query};
    use proptest::prelude::*;

    fn spec() -> increq_ast::Specification {
        increq_ast::Specification {
            name: "s".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![],
            assumptions: vec![],
            methods: vec![],
            header: None,
            footer: None,
            docstring: None,
        }
    }

    proptest! {
        /// Property 3 (reachability closure): a chain `public -> helper_0 ->
        /// ... -> helper_{n-1}` survives garbage collection in full, and any
        /// number of orphan helpers nothing calls are all dropped.
        #[test]
        fn chain_survives_and_orphans_are_dropped(chain_len in 0usize..6, orphan_count in 0usize..6) {
            let mut impl_ = Implementation::new(spec());

            let mut ret = Exp::int_lit(0);
            let mut chain_names = Vec::new();
            for i in (0..chain_len).rev() {
                let name = format!("helper_{i}");
                impl_.query_specs.push(Query::new(name.clone(), Visibility::Internal, vec![], ret));
                ret = Exp::call(name.clone(), vec![]);
                chain_names.push(name);
            }
            impl_.query_specs.push(Query::new("public_q", Visibility::Public, vec![], ret));

            let mut orphan_names = Vec::new();
            for i in 0..orphan_count {
                let name = format!("orphan_{i}");
                impl_.query_specs.push(Query::new(name.clone(), Visibility::Internal, vec![], Exp::int_lit(0)));
                orphan_names.push(name);
            }

            collect_garbage(&mut impl_);

            prop_assert!(impl_.query_specs.iter().any(|q| q.name == "public_q"));
            for name in &chain_names {
                prop_assert!(impl_.query_specs.iter().any(|q| &q.name == name), "chain helper '{name}' should survive");
            }
            for name in &orphan_names {
                prop_assert!(!impl_.query_specs.iter().any(|q| &q.name == name), "orphan helper '{name}' should be dropped");
            }
        }
    }
}
