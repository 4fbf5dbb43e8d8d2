//! The small type algebra that abstract-state specifications are built from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A handle type: a value-cell whose identity is distinct from its content.
///
/// Two handles of the same `name` denote the same kind of pointer; handles
/// are compared by identity, never by the value they currently hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleType {
    /// Name of the handle type (e.g. the record kind it points to).
    pub name: String,
    /// Type of the value reachable through `.val` on an instance.
    pub value_type: Box<Type>,
}

impl HandleType {
    pub fn new(name: impl Into<String>, value_type: Type) -> Self {
        Self {
            name: name.into(),
            value_type: Box::new(value_type),
        }
    }
}

/// A type in the state-variable / query algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Bool,
    Int,
    Handle(HandleType),
    Bag(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Record(Vec<(String, Type)>),
}

impl Type {
    pub fn bag(elem: Type) -> Self {
        Type::Bag(Box::new(elem))
    }

    pub fn set(elem: Type) -> Self {
        Type::Set(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(Box::new(key), Box::new(value))
    }

    /// The element type of a bag or set, if this is a collection type.
    pub fn elem_type(&self) -> Option<&Type> {
        match self {
            Type::Bag(t) | Type::Set(t) => Some(t),
            _ => None,
        }
    }

    /// True for `Bag` and `Set`, the two collection types handles are
    /// reachable through.
    pub fn is_collection(&self) -> bool {
        matches!(self, Type::Bag(_) | Type::Set(_))
    }

    /// Look up a field in a record type.
    pub fn field_type(&self, field: &str) -> Option<&Type> {
        match self {
            Type::Record(fields) => fields.iter().find(|(n, _)| n == field).map(|(_, t)| t),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Handle(h) => write!(f, "handle<{}>", h.name),
            Type::Bag(t) => write!(f, "bag<{t}>"),
            Type::Set(t) => write!(f, "set<{t}>"),
            Type::Map(k, v) => write!(f, "map<{k}, {v}>"),
            Type::Record(fields) => {
                write!(f, "record{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Signature of a user-declared external function, opaque to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternFunc {
    pub name: String,
    pub args: Vec<(String, Type)>,
    pub out_type: Type,
}
