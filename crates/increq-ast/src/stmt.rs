//! Statement trees (`Stm`): the imperative language maintenance code is
//! expressed in.

use crate::expr::{Exp, Var};
use serde::{Deserialize, Serialize};

/// An imperative statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stm {
    /// Does nothing.
    NoOp,
    /// Sequential composition.
    Seq(Box<Stm>, Box<Stm>),
    /// Declares a fresh local bound to the value of an expression.
    Decl(Var, Exp),
    /// Assigns a value to an lvalue expression (a `Var` or `GetField` chain).
    Assign(Exp, Exp),
    /// Conditional.
    If(Exp, Box<Stm>, Box<Stm>),
    /// Iterates a loop variable over a bag, running the body once per
    /// element.
    ForEach(Var, Exp, Box<Stm>),
    /// Invokes a mutating method on a target with the given arguments, e.g.
    /// `target.insert(x)`.
    Call(Exp, String, Vec<Exp>),
    /// Inserts or overwrites a key in a concrete map.
    MapPut(Exp, Exp, Exp),
    /// Removes a key from a concrete map.
    MapDel(Exp, Exp),
    /// Reads the current value at `key` (bound to `val_var`), runs `change`,
    /// and writes back whatever `change` assigned to `val_var`.
    MapUpdate(Exp, Exp, Var, Box<Stm>),
}

impl Stm {
    pub fn seq(s1: Stm, s2: Stm) -> Stm {
        match (s1, s2) {
            (Stm::NoOp, s) | (s, Stm::NoOp) => s,
            (s1, s2) => Stm::Seq(Box::new(s1), Box::new(s2)),
        }
    }

    /// Concatenate a list of statements, dropping no-ops.
    pub fn seq_all(stms: impl IntoIterator<Item = Stm>) -> Stm {
        stms.into_iter().fold(Stm::NoOp, Stm::seq)
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Stm::NoOp)
    }

    /// Direct child statements.
    pub fn child_stms(&self) -> Vec<&Stm> {
        match self {
            Stm::NoOp | Stm::Decl(..) | Stm::Assign(..) | Stm::Call(..) | Stm::MapPut(..) | Stm::MapDel(..) => vec![],
            Stm::Seq(a, b) => vec![a, b],
            Stm::If(_, a, b) => vec![a, b],
            Stm::ForEach(_, _, body) => vec![body],
            Stm::MapUpdate(_, _, _, change) => vec![change],
        }
    }

    /// Direct child expressions (not including nested statement bodies).
    pub fn direct_exprs(&self) -> Vec<&Exp> {
        match self {
            Stm::NoOp => vec![],
            Stm::Seq(_, _) => vec![],
            Stm::Decl(_, e) => vec![e],
            Stm::Assign(lhs, rhs) => vec![lhs, rhs],
            Stm::If(c, _, _) => vec![c],
            Stm::ForEach(_, bag, _) => vec![bag],
            Stm::Call(target, _, args) => {
                let mut v = vec![target];
                v.extend(args.iter());
                v
            }
            Stm::MapPut(m, k, v) => vec![m, k, v],
            Stm::MapDel(m, k) => vec![m, k],
            Stm::MapUpdate(m, k, _, _) => vec![m, k],
        }
    }
}
