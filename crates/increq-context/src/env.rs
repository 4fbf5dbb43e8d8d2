//! A lexical scope stack mapping variable names to their types, used while
//! type-checking expression/statement trees. State vars, query args and
//! extern funcs live in the outermost scope; lambda and loop binders push a
//! child scope for the duration of their body.

use increq_ast::Type;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    scopes: Vec<IndexMap<String, Type>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self { scopes: vec![IndexMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(IndexMap::new());
        }
    }

    pub fn define(&mut self, name: impl Into<String>, ty: Type) {
        self.scopes.last_mut().expect("at least one scope").insert(name.into(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    /// Run `f` with a fresh child scope containing `name: ty`, then pop it.
    pub fn with_binding<R>(&mut self, name: &str, ty: Type, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_scope();
        self.define(name, ty);
        let r = f(self);
        self.pop_scope();
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut env = TypeEnv::new();
        env.define("x", Type::Int);
        env.with_binding("x", Type::Bool, |env| {
            assert_eq!(env.lookup("x"), Some(&Type::Bool));
        });
        assert_eq!(env.lookup("x"), Some(&Type::Int));
    }
}
