//! Free-variable computation and generic bottom-up traversal over `Exp`/`Stm`.

use crate::expr::{Exp, Lambda, Var};
use crate::query::Query;
use crate::stmt::Stm;
use std::collections::HashSet;

/// Variables free in `e`, i.e. not bound by an enclosing `Lambda`.
pub fn free_vars_exp(e: &Exp) -> HashSet<Var> {
    let mut out = HashSet::new();
    collect_free_vars_exp(e, &mut out);
    out
}

fn collect_free_vars_exp(e: &Exp, out: &mut HashSet<Var>) {
    match e {
        Exp::Var(v) => {
            out.insert(v.clone());
        }
        Exp::Filter(bag, lambda) | Exp::MapColl(bag, lambda) => {
            collect_free_vars_exp(bag, out);
            collect_free_vars_lambda(lambda, out);
        }
        Exp::Lambda(lambda) => collect_free_vars_lambda(lambda, out),
        _ => {
            for c in e.children() {
                collect_free_vars_exp(c, out);
            }
        }
    }
}

fn collect_free_vars_lambda(lambda: &Lambda, out: &mut HashSet<Var>) {
    let mut body_vars = HashSet::new();
    collect_free_vars_exp(&lambda.body, &mut body_vars);
    body_vars.remove(&lambda.var);
    out.extend(body_vars);
}

/// Variables free in a statement: everything read or written, minus anything
/// bound by a `ForEach`/`Decl`/`MapUpdate` within its own scope.
pub fn free_vars_stm(s: &Stm) -> HashSet<Var> {
    let mut out = HashSet::new();
    collect_free_vars_stm(s, &mut out);
    out
}

fn collect_free_vars_stm(s: &Stm, out: &mut HashSet<Var>) {
    for e in s.direct_exprs() {
        collect_free_vars_exp(e, out);
    }
    match s {
        Stm::Decl(v, _) => {
            // The declared var is only in scope for statements *after* this
            // one in a Seq; callers walk siblings separately, so nothing
            // extra to remove here.
            let _ = v;
        }
        Stm::ForEach(loop_var, _, body) => {
            let mut body_vars = HashSet::new();
            collect_free_vars_stm(body, &mut body_vars);
            body_vars.remove(loop_var);
            out.extend(body_vars);
        }
        Stm::MapUpdate(_, _, val_var, change) => {
            let mut change_vars = HashSet::new();
            collect_free_vars_stm(change, &mut change_vars);
            change_vars.remove(val_var);
            out.extend(change_vars);
        }
        _ => {
            for child in s.child_stms() {
                collect_free_vars_stm(child, out);
            }
        }
    }
}

/// Variables free in a query: everything free in its assumptions and return
/// expression, minus its own argument list.
pub fn free_vars_query(q: &Query) -> HashSet<Var> {
    let mut out = HashSet::new();
    for a in &q.assumptions {
        collect_free_vars_exp(a, &mut out);
    }
    collect_free_vars_exp(&q.ret, &mut out);
    let args: HashSet<&str> = q.args.iter().map(|(n, _)| n.as_str()).collect();
    out.retain(|v| !args.contains(v.name.as_str()));
    out
}

/// Bottom-up rewrite: recurse into children first, rebuild the node, then
/// apply `f` to the rebuilt node. `f` never needs to recurse itself.
pub fn rewrite_exp<F: FnMut(Exp) -> Exp>(e: Exp, f: &mut F) -> Exp {
    let rebuilt = match e {
        Exp::Var(_) | Exp::Lit(_) => e,
        Exp::Call(name, args) => Exp::Call(name, args.into_iter().map(|a| rewrite_exp(a, f)).collect()),
        Exp::Eq(a, b) => Exp::Eq(Box::new(rewrite_exp(*a, f)), Box::new(rewrite_exp(*b, f))),
        Exp::And(xs) => Exp::And(xs.into_iter().map(|x| rewrite_exp(x, f)).collect()),
        Exp::BinOp(op, a, b) => Exp::BinOp(op, Box::new(rewrite_exp(*a, f)), Box::new(rewrite_exp(*b, f))),
        Exp::UnOp(op, a) => Exp::UnOp(op, Box::new(rewrite_exp(*a, f))),
        Exp::In(a, b) => Exp::In(Box::new(rewrite_exp(*a, f)), Box::new(rewrite_exp(*b, f))),
        Exp::Filter(bag, lambda) => Exp::Filter(
            Box::new(rewrite_exp(*bag, f)),
            Box::new(Lambda { var: lambda.var, body: rewrite_exp(lambda.body, f) }),
        ),
        Exp::MapColl(bag, lambda) => Exp::MapColl(
            Box::new(rewrite_exp(*bag, f)),
            Box::new(Lambda { var: lambda.var, body: rewrite_exp(lambda.body, f) }),
        ),
        Exp::Distinct(a) => Exp::Distinct(Box::new(rewrite_exp(*a, f))),
        Exp::Sum(a) => Exp::Sum(Box::new(rewrite_exp(*a, f))),
        Exp::Min(a) => Exp::Min(Box::new(rewrite_exp(*a, f))),
        Exp::GetField(a, field) => Exp::GetField(Box::new(rewrite_exp(*a, f)), field),
        Exp::MapGet(a, b) => Exp::MapGet(Box::new(rewrite_exp(*a, f)), Box::new(rewrite_exp(*b, f))),
        Exp::MapHas(a, b) => Exp::MapHas(Box::new(rewrite_exp(*a, f)), Box::new(rewrite_exp(*b, f))),
        Exp::If(a, b, c) => Exp::If(Box::new(rewrite_exp(*a, f)), Box::new(rewrite_exp(*b, f)), Box::new(rewrite_exp(*c, f))),
        Exp::Record(fields) => Exp::Record(fields.into_iter().map(|(n, e)| (n, rewrite_exp(e, f))).collect()),
        Exp::Lambda(lambda) => Exp::Lambda(Box::new(Lambda { var: lambda.var, body: rewrite_exp(lambda.body, f) })),
        Exp::StateVar(a) => Exp::StateVar(Box::new(rewrite_exp(*a, f))),
    };
    f(rebuilt)
}

/// Collect the names of every query called (via `Exp::Call`) anywhere inside
/// an expression.
pub fn called_query_names_exp(e: &Exp, out: &mut HashSet<String>) {
    if let Exp::Call(name, args) = e {
        out.insert(name.clone());
        for a in args {
            called_query_names_exp(a, out);
        }
        return;
    }
    for c in e.children() {
        called_query_names_exp(c, out);
    }
    match e {
        Exp::Filter(_, l) | Exp::MapColl(_, l) => called_query_names_exp(&l.body, out),
        Exp::Lambda(l) => called_query_names_exp(&l.body, out),
        _ => {}
    }
}

/// Collect the names of every query called anywhere inside a statement.
pub fn called_query_names_stm(s: &Stm, out: &mut HashSet<String>) {
    for e in s.direct_exprs() {
        called_query_names_exp(e, out);
    }
    if let Stm::Call(_, name, _) = s {
        out.insert(name.clone());
    }
    for child in s.child_stms() {
        called_query_names_stm(child, out);
    }
}
