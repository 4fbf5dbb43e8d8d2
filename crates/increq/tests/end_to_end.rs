//! End-to-end synthesis scenarios run through the full [`Driver`], one per
//! representative shape the default collaborators recognize.

use increq::{Driver, Method, Operation, Query, Specification, SynthesisConfig, Visibility};
use increq_ast::{Exp, HandleType, Lambda, Stm, Type, Var};
use increq_collab::CollaboratorRegistry;
use std::time::Duration;

fn run(spec: Specification) -> increq_diagnostics::Outcome<Specification> {
    let registry = CollaboratorRegistry::with_defaults();
    let mut driver = Driver::new(spec, registry, SynthesisConfig::default()).expect("driver construction");
    driver.run(Duration::from_secs(10)).expect("synthesis run")
}

#[test]
fn membership_set_becomes_a_set_lookup() {
    let xs_ty = Type::bag(Type::Int);
    let x = Var::new("x", Type::Int);
    let contains = Query::new("contains", Visibility::Public, vec![("x".into(), Type::Int)], Exp::in_bag(Exp::var(x), Exp::var(Var::new("xs", xs_ty.clone()))));
    let add = Operation::new("add", vec![("x".into(), Type::Int)], Stm::Call(Exp::var(Var::new("xs", xs_ty.clone())), "add".into(), vec![Exp::var(Var::new("x", Type::Int))]));

    let spec = Specification {
        name: "membership_set".into(),
        types: vec![],
        extern_funcs: vec![],
        state_vars: vec![("xs".into(), xs_ty)],
        assumptions: vec![],
        methods: vec![Method::Query(contains), Method::Operation(add)],
        header: None,
        footer: None,
        docstring: None,
    };

    let outcome = run(spec);
    assert!(outcome.complete);
    let out = outcome.value;
    assert!(out.state_vars.iter().any(|(_, ty)| matches!(ty, Type::Set(_))));
    assert!(out.find_query("contains").is_some());
    assert_eq!(out.operations().count(), 1);
}

#[test]
fn min_under_insert_is_maintained_in_place() {
    let xs_ty = Type::bag(Type::Int);
    let xs = Exp::var(Var::new("xs", xs_ty.clone()));
    let min_query = Query::new("min", Visibility::Public, vec![], Exp::min(xs.clone()));
    let add = Operation::new("add", vec![("x".into(), Type::Int)], Stm::Call(xs.clone(), "add".into(), vec![Exp::var(Var::new("x", Type::Int))]));

    let invariant = Exp::BinOp(increq_ast::BinOp::Gt, Box::new(Exp::len(xs)), Box::new(Exp::int_lit(0)));

    let spec = Specification {
        name: "min_under_insert".into(),
        types: vec![],
        extern_funcs: vec![],
        state_vars: vec![("xs".into(), xs_ty)],
        assumptions: vec![invariant],
        methods: vec![Method::Query(min_query), Method::Operation(add)],
        header: None,
        footer: None,
        docstring: None,
    };

    let outcome = run(spec);
    assert!(outcome.complete);
    let out = outcome.value;
    assert_eq!(out.state_vars.len(), 1);
    let op = out.operations().find(|o| o.name == "add").unwrap();
    assert_ne!(op.body, Stm::NoOp);
}

#[test]
fn filtered_count_tracks_a_counter() {
    let rec_ty = Type::Record(vec![("a".into(), Type::Int), ("b".into(), Type::Int)]);
    let xs_ty = Type::bag(rec_ty.clone());
    let xs = Exp::var(Var::new("xs", xs_ty.clone()));
    let r = Var::new("r", rec_ty.clone());
    let pred = Lambda { var: r.clone(), body: Exp::BinOp(increq_ast::BinOp::Gt, Box::new(Exp::get_field(Exp::var(r.clone()), "a")), Box::new(Exp::int_lit(0))) };
    let count_positive = Query::new("count_positive", Visibility::Public, vec![], Exp::len(Exp::filter(xs.clone(), pred)));
    let add = Operation::new("add", vec![("r".into(), rec_ty.clone())], Stm::Call(xs, "add".into(), vec![Exp::var(r)]));

    let spec = Specification {
        name: "filtered_count".into(),
        types: vec![],
        extern_funcs: vec![],
        state_vars: vec![("xs".into(), xs_ty)],
        assumptions: vec![],
        methods: vec![Method::Query(count_positive), Method::Operation(add)],
        header: None,
        footer: None,
        docstring: None,
    };

    let outcome = run(spec);
    assert!(outcome.complete);
    let out = outcome.value;
    assert!(out.state_vars.iter().any(|(_, ty)| *ty == Type::Int));
    let op = out.operations().find(|o| o.name == "add").unwrap();
    assert_ne!(op.body, Stm::NoOp);
}

#[test]
fn handle_mutation_plans_a_modified_handles_helper() {
    let rec_ty = Type::Record(vec![("k".into(), Type::Int), ("v".into(), Type::Int)]);
    let node_ty = HandleType::new("Node", rec_ty.clone());
    let hs_ty = Type::bag(Type::Handle(node_ty.clone()));
    let h = Var::new("h", Type::Handle(node_ty));
    let k0 = Var::new("k0", Type::Int);

    let h_k = Exp::get_field(Exp::var(h.clone()), "k");
    let h_v = Exp::get_field(Exp::var(h.clone()), "v");
    let cond = Exp::eq(h_k, Exp::var(k0.clone()));
    let new_v = Exp::BinOp(increq_ast::BinOp::Add, Box::new(h_v.clone()), Box::new(Exp::int_lit(1)));
    let assign = Stm::Assign(Exp::get_field(Exp::var(h.clone()), "v"), new_v);
    let body = Stm::If(cond, Box::new(assign), Box::new(Stm::NoOp));
    let loop_stm = Stm::ForEach(h.clone(), Exp::var(Var::new("hs", hs_ty.clone())), Box::new(body));
    let bump = Operation::new("bump", vec![("k0".into(), Type::Int)], loop_stm);

    let sumv = Query::new("sumv", Visibility::Public, vec![], Exp::sum(Exp::map_coll(Exp::var(Var::new("hs", hs_ty.clone())), Lambda { var: h.clone(), body: h_v })));

    let spec = Specification {
        name: "handle_mutation".into(),
        types: vec![],
        extern_funcs: vec![],
        state_vars: vec![("hs".into(), hs_ty)],
        assumptions: vec![],
        methods: vec![Method::Query(sumv), Method::Operation(bump)],
        header: None,
        footer: None,
        docstring: None,
    };

    let outcome = run(spec);
    assert!(outcome.complete);
    let out = outcome.value;
    let op = out.operations().find(|o| o.name == "bump").unwrap();
    assert_ne!(op.body, Stm::NoOp);
}

#[test]
fn shared_filter_predicate_uses_one_concrete_var() {
    let xs_ty = Type::bag(Type::Int);
    let x = Var::new("x", Type::Int);
    let positive = Lambda { var: x.clone(), body: Exp::BinOp(increq_ast::BinOp::Gt, Box::new(Exp::var(x.clone())), Box::new(Exp::int_lit(0))) };

    let positives = Query::new("positives", Visibility::Public, vec![], Exp::filter(Exp::var(Var::new("xs", xs_ty.clone())), positive.clone()));
    let count_positives = Query::new("count_positives", Visibility::Public, vec![], Exp::len(Exp::filter(Exp::var(Var::new("xs", xs_ty.clone())), positive)));

    let spec = Specification {
        name: "shared_representation".into(),
        types: vec![],
        extern_funcs: vec![],
        state_vars: vec![("xs".into(), xs_ty)],
        assumptions: vec![],
        methods: vec![Method::Query(positives), Method::Query(count_positives)],
        header: None,
        footer: None,
        docstring: None,
    };

    let outcome = run(spec);
    assert!(outcome.complete);
    let out = outcome.value;
    assert_eq!(out.state_vars.len(), 1, "both queries should share one filtered-bag concrete var");
}
