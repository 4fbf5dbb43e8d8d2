//! Capture-avoiding substitution.

use crate::expr::{Exp, Lambda, Var};
use crate::fresh::fresh_name;
use crate::stmt::Stm;
use crate::visit::free_vars_exp;
use std::collections::HashMap;

/// Substitute `mapping` (variable name -> replacement expression) throughout
/// `e`, renaming bound lambda variables when necessary to avoid capturing a
/// free variable introduced by a replacement.
pub fn subst_exp(e: &Exp, mapping: &HashMap<String, Exp>) -> Exp {
    if mapping.is_empty() {
        return e.clone();
    }
    match e {
        Exp::Var(v) => mapping.get(&v.name).cloned().unwrap_or_else(|| e.clone()),
        Exp::Lit(_) => e.clone(),
        Exp::Call(name, args) => Exp::Call(name.clone(), args.iter().map(|a| subst_exp(a, mapping)).collect()),
        Exp::Eq(a, b) => Exp::Eq(Box::new(subst_exp(a, mapping)), Box::new(subst_exp(b, mapping))),
        Exp::And(xs) => Exp::And(xs.iter().map(|x| subst_exp(x, mapping)).collect()),
        Exp::BinOp(op, a, b) => Exp::BinOp(*op, Box::new(subst_exp(a, mapping)), Box::new(subst_exp(b, mapping))),
        Exp::UnOp(op, a) => Exp::UnOp(*op, Box::new(subst_exp(a, mapping))),
        Exp::In(a, b) => Exp::In(Box::new(subst_exp(a, mapping)), Box::new(subst_exp(b, mapping))),
        Exp::Filter(bag, lambda) => Exp::Filter(Box::new(subst_exp(bag, mapping)), Box::new(subst_lambda(lambda, mapping))),
        Exp::MapColl(bag, lambda) => Exp::MapColl(Box::new(subst_exp(bag, mapping)), Box::new(subst_lambda(lambda, mapping))),
        Exp::Distinct(a) => Exp::Distinct(Box::new(subst_exp(a, mapping))),
        Exp::Sum(a) => Exp::Sum(Box::new(subst_exp(a, mapping))),
        Exp::Min(a) => Exp::Min(Box::new(subst_exp(a, mapping))),
        Exp::GetField(a, field) => Exp::GetField(Box::new(subst_exp(a, mapping)), field.clone()),
        Exp::MapGet(a, b) => Exp::MapGet(Box::new(subst_exp(a, mapping)), Box::new(subst_exp(b, mapping))),
        Exp::MapHas(a, b) => Exp::MapHas(Box::new(subst_exp(a, mapping)), Box::new(subst_exp(b, mapping))),
        Exp::If(a, b, c) => Exp::If(Box::new(subst_exp(a, mapping)), Box::new(subst_exp(b, mapping)), Box::new(subst_exp(c, mapping))),
        Exp::Record(fields) => Exp::Record(fields.iter().map(|(n, e)| (n.clone(), subst_exp(e, mapping))).collect()),
        Exp::Lambda(lambda) => Exp::Lambda(Box::new(subst_lambda(lambda, mapping))),
        Exp::StateVar(a) => Exp::StateVar(Box::new(subst_exp(a, mapping))),
    }
}

fn subst_lambda(lambda: &Lambda, mapping: &HashMap<String, Exp>) -> Lambda {
    // If the bound variable is itself being replaced, the substitution
    // cannot reach into the body under that name.
    let mut inner_mapping = mapping.clone();
    inner_mapping.remove(&lambda.var.name);

    // If any replacement expression has the bound variable free, rename the
    // binder before descending to avoid capture.
    let captures = inner_mapping
        .values()
        .any(|repl| free_vars_exp(repl).iter().any(|fv| fv.name == lambda.var.name));

    if captures {
        let fresh = Var::new(fresh_name(&lambda.var.name), lambda.var.ty.clone());
        let mut rename = HashMap::new();
        rename.insert(lambda.var.name.clone(), Exp::Var(fresh.clone()));
        let renamed_body = subst_exp(&lambda.body, &rename);
        Lambda { var: fresh, body: subst_exp(&renamed_body, &inner_mapping) }
    } else {
        Lambda { var: lambda.var.clone(), body: subst_exp(&lambda.body, &inner_mapping) }
    }
}

/// Substitute throughout a statement. Bound statement variables (`Decl`'s
/// target, a `ForEach` loop variable, a `MapUpdate`'s value variable) shadow
/// the substitution within their scope, mirroring [`subst_lambda`].
pub fn subst_stm(s: &Stm, mapping: &HashMap<String, Exp>) -> Stm {
    if mapping.is_empty() {
        return s.clone();
    }
    match s {
        Stm::NoOp => Stm::NoOp,
        Stm::Seq(a, b) => Stm::Seq(Box::new(subst_stm(a, mapping)), Box::new(subst_stm(b, mapping))),
        Stm::Decl(v, e) => Stm::Decl(v.clone(), subst_exp(e, mapping)),
        Stm::Assign(lhs, rhs) => Stm::Assign(subst_exp(lhs, mapping), subst_exp(rhs, mapping)),
        Stm::If(c, a, b) => Stm::If(subst_exp(c, mapping), Box::new(subst_stm(a, mapping)), Box::new(subst_stm(b, mapping))),
        Stm::ForEach(loop_var, bag, body) => {
            let mut inner = mapping.clone();
            inner.remove(&loop_var.name);
            Stm::ForEach(loop_var.clone(), subst_exp(bag, mapping), Box::new(subst_stm(body, &inner)))
        }
        Stm::Call(target, name, args) => Stm::Call(
            subst_exp(target, mapping),
            name.clone(),
            args.iter().map(|a| subst_exp(a, mapping)).collect(),
        ),
        Stm::MapPut(m, k, v) => Stm::MapPut(subst_exp(m, mapping), subst_exp(k, mapping), subst_exp(v, mapping)),
        Stm::MapDel(m, k) => Stm::MapDel(subst_exp(m, mapping), subst_exp(k, mapping)),
        Stm::MapUpdate(m, k, val_var, change) => {
            let mut inner = mapping.clone();
            inner.remove(&val_var.name);
            Stm::MapUpdate(subst_exp(m, mapping), subst_exp(k, mapping), val_var.clone(), Box::new(subst_stm(change, &inner)))
        }
    }
}

/// Convenience: substitute a single variable.
pub fn subst1(e: &Exp, name: &str, replacement: Exp) -> Exp {
    let mut m = HashMap::new();
    m.insert(name.to_string(), replacement);
    subst_exp(e, &m)
}
