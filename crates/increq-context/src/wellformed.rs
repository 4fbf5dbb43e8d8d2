//! Well-formedness repair: marks subexpressions that are already available
//! as concrete state so later passes don't re-derive them from the
//! abstract state.

use increq_ast::visit::rewrite_exp;
use increq_ast::{alpha_equivalent, Exp};

/// Bottom-up rewrite of `e`: any subexpression alpha-equivalent to one of
/// `available` (typically the right-hand sides already installed in
/// `concretization`) is wrapped in a [`Exp::StateVar`] marker, provided it
/// isn't already one.
pub fn repair_well_formedness(e: &Exp, available: &[Exp]) -> Exp {
    rewrite_exp(e.clone(), &mut |node| {
        if matches!(node, Exp::StateVar(_)) {
            return node;
        }
        if available.iter().any(|avail| alpha_equivalent(&node, avail)) {
            Exp::state_var(node)
        } else {
            node
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Type, Var};

    #[test]
    fn marks_matching_subexpression() {
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let distinct_xs = Exp::distinct(xs.clone());
        let len_of_distinct = Exp::len(distinct_xs.clone());

        let repaired = repair_well_formedness(&len_of_distinct, std::slice::from_ref(&distinct_xs));
        match repaired {
            Exp::UnOp(_, inner) => assert!(matches!(*inner, Exp::StateVar(_))),
            _ => panic!("expected UnOp(Len, ..)"),
        }
    }

    #[test]
    fn leaves_unrelated_expressions_alone() {
        let x = Exp::var(Var::new("x", Type::Int));
        let repaired = repair_well_formedness(&x, &[]);
        assert_eq!(repaired, x);
    }
}
