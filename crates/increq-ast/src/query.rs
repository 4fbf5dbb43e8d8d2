//! Queries, operations and whole specifications.

use crate::expr::Exp;
use crate::stmt::Stm;
use crate::types::{ExternFunc, Type};
use serde::{Deserialize, Serialize};

/// Whether a query is part of the public API of a specification or an
/// internal helper introduced during synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Internal,
}

/// A read-only query: an expression over the state and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    pub visibility: Visibility,
    /// Argument names are unique within a single query; uniqueness *across*
    /// queries is a workspace-wide invariant enforced by [`crate::rename::rename_args`].
    pub args: Vec<(String, Type)>,
    pub assumptions: Vec<Exp>,
    pub ret: Exp,
    pub docstring: Option<String>,
}

impl Query {
    pub fn new(name: impl Into<String>, visibility: Visibility, args: Vec<(String, Type)>, ret: Exp) -> Self {
        Self {
            name: name.into(),
            visibility,
            args,
            assumptions: Vec::new(),
            ret,
            docstring: None,
        }
    }

    pub fn with_assumptions(mut self, assumptions: Vec<Exp>) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn with_docstring(mut self, doc: impl Into<String>) -> Self {
        self.docstring = Some(doc.into());
        self
    }

    /// A shallow copy with a new return expression and no assumptions,
    /// used when installing a query's concrete implementation (the concrete
    /// impl is expected to hold unconditionally).
    pub fn rewrite_ret_drop_assumptions(&self, ret: Exp) -> Query {
        Query {
            name: self.name.clone(),
            visibility: self.visibility,
            args: self.args.clone(),
            assumptions: Vec::new(),
            ret,
            docstring: self.docstring.clone(),
        }
    }
}

/// A mutating operation: a statement that updates the abstract state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub args: Vec<(String, Type)>,
    pub assumptions: Vec<Exp>,
    pub body: Stm,
    pub docstring: Option<String>,
}

impl Operation {
    pub fn new(name: impl Into<String>, args: Vec<(String, Type)>, body: Stm) -> Self {
        Self {
            name: name.into(),
            args,
            assumptions: Vec::new(),
            body,
            docstring: None,
        }
    }

    pub fn with_assumptions(mut self, assumptions: Vec<Exp>) -> Self {
        self.assumptions = assumptions;
        self
    }
}

/// Either a query or an operation; specifications list both as `methods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Query(Query),
    Operation(Operation),
}

impl Method {
    pub fn name(&self) -> &str {
        match self {
            Method::Query(q) => &q.name,
            Method::Operation(op) => &op.name,
        }
    }

    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Method::Query(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Method::Operation(op) => Some(op),
            _ => None,
        }
    }
}

/// A full abstract-data-structure specification, or the synthesized output
/// specification — both share this shape (see §6 of the design).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub types: Vec<Type>,
    pub extern_funcs: Vec<ExternFunc>,
    pub state_vars: Vec<(String, Type)>,
    pub assumptions: Vec<Exp>,
    pub methods: Vec<Method>,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub docstring: Option<String>,
}

impl Specification {
    pub fn queries(&self) -> impl Iterator<Item = &Query> {
        self.methods.iter().filter_map(Method::as_query)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.methods.iter().filter_map(Method::as_operation)
    }

    pub fn find_query(&self, name: &str) -> Option<&Query> {
        self.queries().find(|q| q.name == name)
    }
}
