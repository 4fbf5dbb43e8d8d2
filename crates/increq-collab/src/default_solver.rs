//! A syntactic/algebraic solver: proves validity by pattern-matching rather
//! than by calling out to an SMT backend. Sound (it never claims a goal is
//! valid unless one of its rules applies) but incomplete — it will return
//! `false` for plenty of goals a real solver could prove.

use crate::traits::Solver;
use increq_ast::{alpha_equivalent, BinOp, Exp, UnOp};
use increq_context::Context;
use increq_diagnostics::DriverError;
use parking_lot::Mutex;
use std::collections::HashMap;

pub struct DefaultSolver {
    cache: Mutex<HashMap<(Vec<Exp>, Exp), bool>>,
}

impl DefaultSolver {
    pub fn new() -> Self {
        Self { cache: Mutex::new(HashMap::new()) }
    }

    fn prove(&self, assumptions: &[Exp], goal: &Exp) -> bool {
        if let Exp::Lit(increq_ast::Literal::Bool(true)) = goal {
            return true;
        }
        if assumptions.iter().any(|a| alpha_equivalent(a, goal)) {
            return true;
        }
        match goal {
            Exp::Eq(a, b) => alpha_equivalent(a, b) || self.prove_eq_via_assumptions(assumptions, a, b),
            Exp::And(xs) => xs.iter().all(|x| self.prove(assumptions, x)),
            // `Or(Not(a), b)` is how the oracle encodes "a implies b" (no
            // native implication node). Apply the deduction theorem: proving
            // it reduces to proving b with a assumed, which subsumes the
            // case where a is unconditionally false.
            Exp::BinOp(BinOp::Or, a, b) => match (a.as_ref(), b.as_ref()) {
                (Exp::UnOp(UnOp::Not, hyp), _) => self.prove_under(assumptions, hyp, b),
                (_, Exp::UnOp(UnOp::Not, hyp)) => self.prove_under(assumptions, hyp, a),
                _ => self.prove(assumptions, a) || self.prove(assumptions, b),
            },
            _ => false,
        }
    }

    fn prove_under(&self, assumptions: &[Exp], extra: &Exp, goal: &Exp) -> bool {
        let mut extended = assumptions.to_vec();
        extended.push(extra.clone());
        self.prove(&extended, goal)
    }

    fn prove_eq_via_assumptions(&self, assumptions: &[Exp], a: &Exp, b: &Exp) -> bool {
        let target = Exp::eq(a.clone(), b.clone());
        assumptions.iter().any(|asm| alpha_equivalent(asm, &target))
    }
}

impl Default for DefaultSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for DefaultSolver {
    fn valid(&self, _ctx: &Context, assumptions: &[Exp], goal: &Exp) -> Result<bool, DriverError> {
        let key = (assumptions.to_vec(), goal.clone());
        if let Some(cached) = self.cache.lock().get(&key) {
            return Ok(*cached);
        }
        let result = self.prove(assumptions, goal);
        self.cache.lock().insert(key, result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Specification, Type, Var};

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

    #[test]
    fn reflexive_equality_is_valid() {
        let solver = DefaultSolver::new();
        let x = Exp::var(Var::new("x", Type::Int));
        assert!(solver.valid(&empty_ctx(), &[], &Exp::eq(x.clone(), x)).unwrap());
    }

    #[test]
    fn unrelated_goal_is_not_proved() {
        let solver = DefaultSolver::new();
        let x = Exp::var(Var::new("x", Type::Int));
        let y = Exp::var(Var::new("y", Type::Int));
        assert!(!solver.valid(&empty_ctx(), &[], &Exp::eq(x, y)).unwrap());
    }

    #[test]
    fn assumption_directly_entails_goal() {
        let solver = DefaultSolver::new();
        let p = Exp::var(Var::new("p", Type::Bool));
        assert!(solver.valid(&empty_ctx(), std::slice::from_ref(&p), &p).unwrap());
    }

    #[test]
    fn implication_shaped_goal_proves_via_deduction() {
        let solver = DefaultSolver::new();
        let p = Exp::var(Var::new("p", Type::Bool));
        // Or(Not(p), p) is how the oracle spells "p implies p" — always valid.
        let goal = Exp::BinOp(BinOp::Or, Box::new(Exp::UnOp(UnOp::Not, Box::new(p.clone()))), Box::new(p));
        assert!(solver.valid(&empty_ctx(), &[], &goal).unwrap());
    }
}
