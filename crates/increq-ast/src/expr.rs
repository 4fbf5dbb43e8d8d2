//! Expression trees (`Exp`).
//!
//! Expressions are immutable values with structural identity: substitution
//! and rewriting always build fresh trees rather than mutating in place.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
}

/// A typed variable reference: a binder occurrence or a free reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub ty: Type,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Binary operators over `Bool`/`Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Lt,
    Le,
    Gt,
    Ge,
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    /// Cardinality of a bag or set.
    Len,
}

/// An expression node. Every node is implicitly typed; callers that need a
/// node's type call [`crate::visit::type_of`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exp {
    /// Reference to a free or bound variable.
    Var(Var),
    /// A literal constant.
    Lit(Literal),
    /// Call to a named query, either a user query or a synthesizer-introduced
    /// helper. Also used for calls into extern functions.
    Call(String, Vec<Exp>),
    /// Structural equality between two expressions of the same type.
    Eq(Box<Exp>, Box<Exp>),
    /// N-ary conjunction. `And(vec![])` is `true`.
    And(Vec<Exp>),
    /// A binary arithmetic/relational/logical operator.
    BinOp(BinOp, Box<Exp>, Box<Exp>),
    /// A unary operator.
    UnOp(UnOp, Box<Exp>),
    /// Membership test: `elem ∈ bag`.
    In(Box<Exp>, Box<Exp>),
    /// `filter(bag, pred)`: keep elements for which the lambda is true.
    Filter(Box<Exp>, Box<Lambda>),
    /// `map(bag, f)`: apply `f` to every element of a bag.
    MapColl(Box<Exp>, Box<Lambda>),
    /// `distinct(bag)`: deduplicate a bag into a set.
    Distinct(Box<Exp>),
    /// `sum(bag)`: sum of an integer bag.
    Sum(Box<Exp>),
    /// `minimum(bag)`: minimum of a non-empty integer bag.
    Min(Box<Exp>),
    /// Field projection on a record or handle value.
    GetField(Box<Exp>, String),
    /// Lookup in a concrete map: `map[key]`.
    MapGet(Box<Exp>, Box<Exp>),
    /// Key membership in a concrete map.
    MapHas(Box<Exp>, Box<Exp>),
    /// Conditional expression.
    If(Box<Exp>, Box<Exp>, Box<Exp>),
    /// Record construction.
    Record(Vec<(String, Exp)>),
    /// A lambda abstraction used only inside `Filter`/`MapColl`.
    Lambda(Box<Lambda>),
    /// Asserts that the wrapped expression is evaluable from concrete state
    /// alone; inserted by well-formedness repair (component 4.2 step 2).
    StateVar(Box<Exp>),
}

/// A lambda-bound expression: `λvar. body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lambda {
    pub var: Var,
    pub body: Exp,
}

impl Exp {
    pub fn var(v: Var) -> Self {
        Exp::Var(v)
    }

    pub fn bool_lit(b: bool) -> Self {
        Exp::Lit(Literal::Bool(b))
    }

    pub fn int_lit(i: i64) -> Self {
        Exp::Lit(Literal::Int(i))
    }

    pub fn call(name: impl Into<String>, args: Vec<Exp>) -> Self {
        Exp::Call(name.into(), args)
    }

    pub fn eq(a: Exp, b: Exp) -> Self {
        Exp::Eq(Box::new(a), Box::new(b))
    }

    pub fn and(mut conjuncts: Vec<Exp>) -> Self {
        // Flatten nested conjunctions so equivalence/size checks see a
        // canonical shape.
        let mut flat = Vec::with_capacity(conjuncts.len());
        for c in conjuncts.drain(..) {
            match c {
                Exp::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Exp::And(flat)
    }

    pub fn in_bag(elem: Exp, bag: Exp) -> Self {
        Exp::In(Box::new(elem), Box::new(bag))
    }

    pub fn filter(bag: Exp, lambda: Lambda) -> Self {
        Exp::Filter(Box::new(bag), Box::new(lambda))
    }

    pub fn map_coll(bag: Exp, lambda: Lambda) -> Self {
        Exp::MapColl(Box::new(bag), Box::new(lambda))
    }

    pub fn distinct(bag: Exp) -> Self {
        Exp::Distinct(Box::new(bag))
    }

    pub fn sum(bag: Exp) -> Self {
        Exp::Sum(Box::new(bag))
    }

    pub fn min(bag: Exp) -> Self {
        Exp::Min(Box::new(bag))
    }

    pub fn len(bag: Exp) -> Self {
        Exp::UnOp(UnOp::Len, Box::new(bag))
    }

    pub fn get_field(source: Exp, field: impl Into<String>) -> Self {
        Exp::GetField(Box::new(source), field.into())
    }

    pub fn map_get(map: Exp, key: Exp) -> Self {
        Exp::MapGet(Box::new(map), Box::new(key))
    }

    pub fn map_has(map: Exp, key: Exp) -> Self {
        Exp::MapHas(Box::new(map), Box::new(key))
    }

    pub fn if_then_else(cond: Exp, then_branch: Exp, else_branch: Exp) -> Self {
        Exp::If(Box::new(cond), Box::new(then_branch), Box::new(else_branch))
    }

    pub fn state_var(e: Exp) -> Self {
        Exp::StateVar(Box::new(e))
    }

    /// Strip a top-level `StateVar` marker, if present.
    pub fn strip_state_var(&self) -> &Exp {
        match self {
            Exp::StateVar(inner) => inner,
            other => other,
        }
    }

    /// Number of AST nodes, used by the monotonicity guard in subquery
    /// introduction (component 4.2 step 3).
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
            + match self {
                Exp::Lambda(l) => l.body.size(),
                Exp::Filter(_, l) | Exp::MapColl(_, l) => l.body.size(),
                _ => 0,
            }
    }

    /// Direct child expressions, for generic traversal. Lambda bodies are
    /// returned by callers that special-case binder scope (see
    /// [`crate::visit`]), so they are not included here.
    pub fn children(&self) -> Vec<&Exp> {
        match self {
            Exp::Var(_) | Exp::Lit(_) => vec![],
            Exp::Call(_, args) => args.iter().collect(),
            Exp::Eq(a, b) => vec![a, b],
            Exp::And(xs) => xs.iter().collect(),
            Exp::BinOp(_, a, b) => vec![a, b],
            Exp::UnOp(_, a) => vec![a],
            Exp::In(a, b) => vec![a, b],
            Exp::Filter(bag, _) => vec![bag],
            Exp::MapColl(bag, _) => vec![bag],
            Exp::Distinct(a) => vec![a],
            Exp::Sum(a) => vec![a],
            Exp::Min(a) => vec![a],
            Exp::GetField(a, _) => vec![a],
            Exp::MapGet(a, b) => vec![a, b],
            Exp::MapHas(a, b) => vec![a, b],
            Exp::If(a, b, c) => vec![a, b, c],
            Exp::Record(fields) => fields.iter().map(|(_, e)| e).collect(),
            Exp::Lambda(_) => vec![],
            Exp::StateVar(a) => vec![a],
        }
    }
}
