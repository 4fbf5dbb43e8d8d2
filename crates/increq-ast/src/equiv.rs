//! Syntactic alpha-equivalence: the fallback equivalence check used when
//! `deduplicate-subqueries` is disabled or the solver collaborator is not
//! consulted (component 4.1).

use crate::expr::{Exp, Lambda};
use std::collections::HashMap;

/// True if `a` and `b` are identical up to consistent renaming of
/// lambda-bound variables.
pub fn alpha_equivalent(a: &Exp, b: &Exp) -> bool {
    let mut renaming = HashMap::new();
    alpha_eq_inner(a, b, &mut renaming)
}

fn alpha_eq_inner<'a>(a: &'a Exp, b: &'a Exp, renaming: &mut HashMap<&'a str, &'a str>) -> bool {
    match (a, b) {
        (Exp::Var(va), Exp::Var(vb)) => {
            if va.ty != vb.ty {
                return false;
            }
            match renaming.get(va.name.as_str()) {
                Some(mapped) => *mapped == vb.name.as_str(),
                None => va.name == vb.name,
            }
        }
        (Exp::Lit(la), Exp::Lit(lb)) => la == lb,
        (Exp::Call(na, aa), Exp::Call(nb, ab)) => {
            na == nb && aa.len() == ab.len() && aa.iter().zip(ab).all(|(x, y)| alpha_eq_inner(x, y, renaming))
        }
        (Exp::Eq(a1, a2), Exp::Eq(b1, b2)) => alpha_eq_inner(a1, b1, renaming) && alpha_eq_inner(a2, b2, renaming),
        (Exp::And(xs), Exp::And(ys)) => xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| alpha_eq_inner(x, y, renaming)),
        (Exp::BinOp(opa, a1, a2), Exp::BinOp(opb, b1, b2)) => {
            opa == opb && alpha_eq_inner(a1, b1, renaming) && alpha_eq_inner(a2, b2, renaming)
        }
        (Exp::UnOp(opa, a1), Exp::UnOp(opb, b1)) => opa == opb && alpha_eq_inner(a1, b1, renaming),
        (Exp::In(a1, a2), Exp::In(b1, b2)) => alpha_eq_inner(a1, b1, renaming) && alpha_eq_inner(a2, b2, renaming),
        (Exp::Filter(ba, la), Exp::Filter(bb, lb)) => alpha_eq_inner(ba, bb, renaming) && alpha_eq_lambda(la, lb, renaming),
        (Exp::MapColl(ba, la), Exp::MapColl(bb, lb)) => alpha_eq_inner(ba, bb, renaming) && alpha_eq_lambda(la, lb, renaming),
        (Exp::Distinct(a1), Exp::Distinct(b1)) => alpha_eq_inner(a1, b1, renaming),
        (Exp::Sum(a1), Exp::Sum(b1)) => alpha_eq_inner(a1, b1, renaming),
        (Exp::Min(a1), Exp::Min(b1)) => alpha_eq_inner(a1, b1, renaming),
        (Exp::GetField(a1, fa), Exp::GetField(b1, fb)) => fa == fb && alpha_eq_inner(a1, b1, renaming),
        (Exp::MapGet(a1, a2), Exp::MapGet(b1, b2)) => alpha_eq_inner(a1, b1, renaming) && alpha_eq_inner(a2, b2, renaming),
        (Exp::MapHas(a1, a2), Exp::MapHas(b1, b2)) => alpha_eq_inner(a1, b1, renaming) && alpha_eq_inner(a2, b2, renaming),
        (Exp::If(a1, a2, a3), Exp::If(b1, b2, b3)) => {
            alpha_eq_inner(a1, b1, renaming) && alpha_eq_inner(a2, b2, renaming) && alpha_eq_inner(a3, b3, renaming)
        }
        (Exp::Record(fa), Exp::Record(fb)) => {
            fa.len() == fb.len()
                && fa
                    .iter()
                    .zip(fb)
                    .all(|((na, ea), (nb, eb))| na == nb && alpha_eq_inner(ea, eb, renaming))
        }
        (Exp::Lambda(la), Exp::Lambda(lb)) => alpha_eq_lambda(la, lb, renaming),
        (Exp::StateVar(a1), Exp::StateVar(b1)) => alpha_eq_inner(a1, b1, renaming),
        _ => false,
    }
}

fn alpha_eq_lambda<'a>(a: &'a Lambda, b: &'a Lambda, renaming: &mut HashMap<&'a str, &'a str>) -> bool {
    if a.var.ty != b.var.ty {
        return false;
    }
    let shadowed = renaming.insert(a.var.name.as_str(), b.var.name.as_str());
    let eq = alpha_eq_inner(&a.body, &b.body, renaming);
    match shadowed {
        Some(prev) => {
            renaming.insert(a.var.name.as_str(), prev);
        }
        None => {
            renaming.remove(a.var.name.as_str());
        }
    }
    eq
}
