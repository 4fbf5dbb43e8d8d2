//! A small bottom-up AST simplifier used by subquery introduction (§4.2
//! step 3). Not a collaborator — the driver owns this directly since the
//! spec lists no simplifier interface in §6, only the monotonicity guard
//! that governs how its output is used.

use increq_ast::visit::rewrite_exp;
use increq_ast::{BinOp, Exp, Literal, UnOp};

pub fn simplify_exp(e: &Exp) -> Exp {
    rewrite_exp(e.clone(), &mut simplify_node)
}

fn simplify_node(node: Exp) -> Exp {
    match node {
        Exp::And(xs) => simplify_and(xs),
        Exp::UnOp(UnOp::Not, a) => match *a {
            Exp::Lit(Literal::Bool(b)) => Exp::bool_lit(!b),
            Exp::UnOp(UnOp::Not, inner) => *inner,
            other => Exp::UnOp(UnOp::Not, Box::new(other)),
        },
        Exp::Eq(a, b) => {
            if *a == *b {
                Exp::bool_lit(true)
            } else {
                Exp::Eq(a, b)
            }
        }
        Exp::BinOp(op, a, b) => simplify_binop(op, *a, *b),
        Exp::If(_, t, e) if *t == *e => *t,
        Exp::If(c, t, e) => match *c {
            Exp::Lit(Literal::Bool(true)) => *t,
            Exp::Lit(Literal::Bool(false)) => *e,
            cond => Exp::If(Box::new(cond), t, e),
        },
        Exp::Distinct(a) => match *a {
            Exp::Distinct(inner) => Exp::Distinct(inner),
            other => Exp::Distinct(Box::new(other)),
        },
        Exp::StateVar(a) => match *a {
            Exp::StateVar(inner) => Exp::StateVar(inner),
            other => Exp::StateVar(Box::new(other)),
        },
        other => other,
    }
}

fn simplify_and(xs: Vec<Exp>) -> Exp {
    let mut flat = Vec::with_capacity(xs.len());
    for x in xs {
        match x {
            Exp::And(inner) => flat.extend(inner),
            Exp::Lit(Literal::Bool(true)) => {}
            other => flat.push(other),
        }
    }
    if flat.iter().any(|x| matches!(x, Exp::Lit(Literal::Bool(false)))) {
        return Exp::bool_lit(false);
    }
    match flat.len() {
        0 => Exp::bool_lit(true),
        1 => flat.into_iter().next().unwrap(),
        _ => Exp::And(flat),
    }
}

fn simplify_binop(op: BinOp, a: Exp, b: Exp) -> Exp {
    use Literal::{Bool, Int};
    match (op, &a, &b) {
        (BinOp::Add, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::int_lit(x + y),
        (BinOp::Sub, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::int_lit(x - y),
        (BinOp::Mul, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::int_lit(x * y),
        (BinOp::Lt, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::bool_lit(x < y),
        (BinOp::Le, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::bool_lit(x <= y),
        (BinOp::Gt, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::bool_lit(x > y),
        (BinOp::Ge, Exp::Lit(Int(x)), Exp::Lit(Int(y))) => Exp::bool_lit(x >= y),
        (BinOp::Or, Exp::Lit(Bool(true)), _) | (BinOp::Or, _, Exp::Lit(Bool(true))) => Exp::bool_lit(true),
        (BinOp::Or, Exp::Lit(Bool(false)), _) => b,
        (BinOp::Or, _, Exp::Lit(Bool(false))) => a,
        (BinOp::Or, Exp::Lit(Bool(x)), Exp::Lit(Bool(y))) => Exp::bool_lit(*x || *y),
        _ => Exp::BinOp(op, Box::new(a), Box::new(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Type, Var};

    #[test]
    fn drops_redundant_true_conjuncts() {
        let p = Exp::var(Var::new("p", Type::Bool));
        let and = Exp::and(vec![Exp::bool_lit(true), p.clone()]);
        assert_eq!(simplify_exp(&and), p);
    }

    #[test]
    fn folds_constant_arithmetic() {
        let e = Exp::BinOp(BinOp::Add, Box::new(Exp::int_lit(2)), Box::new(Exp::int_lit(3)));
        assert_eq!(simplify_exp(&e), Exp::int_lit(5));
    }

    #[test]
    fn collapses_double_negation() {
        let p = Exp::var(Var::new("p", Type::Bool));
        let e = Exp::UnOp(UnOp::Not, Box::new(Exp::UnOp(UnOp::Not, Box::new(p.clone()))));
        assert_eq!(simplify_exp(&e), p);
    }

    #[test]
    fn reflexive_equality_becomes_true() {
        let x = Exp::var(Var::new("x", Type::Int));
        assert_eq!(simplify_exp(&Exp::eq(x.clone(), x)), Exp::bool_lit(true));
    }
}
