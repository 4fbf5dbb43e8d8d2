//! `Implementation`: the central mutable record the driver evolves one step
//! at a time. Every other module in this crate is a set of operations over
//! this struct; nothing here mutates the abstract [`Specification`] itself.

use increq_ast::{Exp, Query, Specification, Stm, Var};
use indexmap::IndexMap;

/// A derived concrete state variable. Plain [`Var`] carries everything a
/// CVar needs (a name and a type); the distinction from an abstract
/// variable is purely positional — it lives in `concretization`, not in
/// `spec.state_vars`.
pub type CVar = Var;

/// The synthesis driver's working state: an abstract specification plus
/// everything derived from it so far.
pub struct Implementation {
    /// The abstract input. Never mutated after construction.
    pub spec: Specification,
    /// For each concrete variable, the expression over abstract state it
    /// tracks. Ordered: later entries may reference earlier ones only
    /// indirectly (through queries), never as a literal subexpression.
    pub concretization: Vec<(CVar, Exp)>,
    /// Abstract specs for every query, public and internally introduced.
    pub query_specs: Vec<Query>,
    /// The current concrete implementation for each query spec, keyed by
    /// name. A query with no entry yet is specified but not installed.
    pub query_impls: IndexMap<String, Query>,
    /// Maintenance statement for a concrete var under an operation.
    pub updates: IndexMap<(String, String), Stm>,
    /// Mutation applied to reachable handles of a type under an operation,
    /// keyed by (handle type name, operation name).
    pub handle_updates: IndexMap<(String, String), Stm>,
}

impl Implementation {
    /// Starts synthesis from an abstract specification with nothing derived
    /// yet: no concrete vars, no query implementations, no updates.
    pub fn new(spec: Specification) -> Self {
        Self {
            query_specs: spec.queries().cloned().collect(),
            spec,
            concretization: Vec::new(),
            query_impls: IndexMap::new(),
            updates: IndexMap::new(),
            handle_updates: IndexMap::new(),
        }
    }

    pub fn query_spec(&self, name: &str) -> Option<&Query> {
        self.query_specs.iter().find(|q| q.name == name)
    }

    pub fn query_spec_mut(&mut self, name: &str) -> Option<&mut Query> {
        self.query_specs.iter_mut().find(|q| q.name == name)
    }

    pub fn concrete_var(&self, name: &str) -> Option<&CVar> {
        self.concretization.iter().map(|(v, _)| v).find(|v| v.name == name)
    }

    /// Driver-level inspection: the concrete vars whose maintenance code
    /// under any operation calls `query_name`. Supplements the components
    /// named in spec.md §2 with the `states_maintained_by` introspection
    /// query cozy exposes on its `Implementation`.
    pub fn states_maintained_by(&self, query_name: &str) -> Vec<&CVar> {
        let mut out = Vec::new();
        for ((cvar_name, _op), stm) in &self.updates {
            let mut called = std::collections::HashSet::new();
            increq_ast::visit::called_query_names_stm(stm, &mut called);
            if called.contains(query_name) {
                if let Some(v) = self.concrete_var(cvar_name) {
                    if !out.iter().any(|o: &&CVar| o.name == v.name) {
                        out.push(v);
                    }
                }
            }
        }
        out
    }
}
