//! The typing context built from a [`Specification`][increq_ast::Specification]:
//! the declared shapes of state variables, extern functions and queries that
//! expression type-checking, well-formedness repair and handle reachability
//! all consult.

use increq_ast::{ExternFunc, Query, Specification, Type};
use increq_diagnostics::{DriverError, MethodLocation};
use indexmap::IndexMap;

/// The signature of anything callable via `Exp::Call`: an extern function or
/// a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSig {
    pub args: Vec<(String, Type)>,
    pub ret: Type,
}

/// Static context derived from a specification, shared by every component
/// that needs to know the shape of the abstract state or resolve a call.
#[derive(Debug, Clone)]
pub struct Context {
    pub state_vars: IndexMap<String, Type>,
    pub extern_funcs: IndexMap<String, ExternFunc>,
    pub call_sigs: IndexMap<String, CallSig>,
}

impl Context {
    /// Build a context from a specification, inferring each query's return
    /// type as it goes (queries may call earlier-declared queries, but not
    /// later ones or themselves — recursive queries are rejected).
    pub fn build(spec: &Specification) -> Result<Self, DriverError> {
        let state_vars: IndexMap<String, Type> = spec.state_vars.iter().cloned().collect();
        let extern_funcs: IndexMap<String, ExternFunc> = spec.extern_funcs.iter().map(|f| (f.name.clone(), f.clone())).collect();

        let mut call_sigs = IndexMap::new();
        for f in spec.extern_funcs.iter() {
            call_sigs.insert(f.name.clone(), CallSig { args: f.args.clone(), ret: f.out_type.clone() });
        }

        let mut ctx = Self { state_vars, extern_funcs, call_sigs };
        for q in spec.queries() {
            let ret_ty = crate::typecheck::infer_query_ret_type(&ctx, q)?;
            ctx.call_sigs.insert(q.name.clone(), CallSig { args: q.args.clone(), ret: ret_ty });
        }
        Ok(ctx)
    }

    pub fn lookup_call(&self, name: &str) -> Option<&CallSig> {
        self.call_sigs.get(name)
    }

    pub fn lookup_state_var(&self, name: &str) -> Option<&Type> {
        self.state_vars.get(name)
    }

    pub fn unknown_call(&self, name: &str, at: &str) -> DriverError {
        DriverError::type_mismatch(format!("call to unknown query or extern function '{name}'"), MethodLocation::new(at))
    }
}
