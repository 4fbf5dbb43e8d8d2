//! Abstract syntax for incremental-implementation synthesis.
//!
//! This crate defines the expression/statement language that abstract-state
//! specifications, queries and operations are written in, along with the
//! structural utilities (free variables, capture-avoiding substitution,
//! bottom-up rewriting, alpha-equivalence) that every other crate in the
//! workspace builds on.

mod equiv;
mod expr;
mod fresh;
mod query;
mod rename;
mod stmt;
mod subst;
mod types;
pub mod visit;

pub use equiv::alpha_equivalent;
pub use expr::{BinOp, Exp, Lambda, Literal, UnOp, Var};
pub use fresh::fresh_name;
pub use query::{Method, Operation, Query, Specification, Visibility};
pub use rename::rename_args;
pub use stmt::Stm;
pub use subst::{subst1, subst_exp, subst_stm};
pub use types::{ExternFunc, HandleType, Type};
