//! Handle reachability: which bag of handles a given handle type is drawn
//! from, and the implicit membership facts that follow from it.
//!
//! The default analysis only looks at state variables declared directly as
//! `bag<handle<T>>` or `set<handle<T>>` — handles nested inside map values
//! or record fields are not tracked. That covers every scenario in this
//! system's test suite; a deeper points-to analysis would be needed for
//! handles reachable only through intermediate collections.

use increq_ast::{Exp, HandleType, Specification, Var};
use indexmap::IndexMap;

/// Maps a handle type's name to the bag expression (always a direct state
/// variable reference) containing every live handle of that type.
pub fn reachable_handles(spec: &Specification) -> IndexMap<String, (HandleType, Exp)> {
    let mut out = IndexMap::new();
    for (name, ty) in &spec.state_vars {
        if let Some(elem) = ty.elem_type() {
            if let increq_ast::Type::Handle(h) = elem {
                out.insert(h.name.clone(), (h.clone(), Exp::var(Var::new(name.clone(), ty.clone()))));
            }
        }
    }
    out
}

/// For each handle-typed variable in `vars`, assert that it is a member of
/// the bag its type is reachable from. Variables whose handle type is not
/// reachable from any state var are skipped (they must be bound some other
/// way, e.g. a query argument unrelated to state).
pub fn implicit_handle_assumptions(spec: &Specification, vars: &[Var]) -> Vec<Exp> {
    let reachable = reachable_handles(spec);
    vars.iter()
        .filter_map(|v| match &v.ty {
            increq_ast::Type::Handle(h) => reachable.get(&h.name).map(|(_, bag)| Exp::in_bag(Exp::var(v.clone()), bag.clone())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::Type;

    fn handle_record_spec() -> Specification {
        let handle_ty = Type::Handle(HandleType::new("Node", Type::Record(vec![("k".into(), Type::Int), ("v".into(), Type::Int)])));
        Specification {
            name: "s".into(),
            types: vec![],
            extern_funcs: vec![],
            state_vars: vec![("hs".into(), Type::bag(handle_ty))],
            assumptions: vec![],
            methods: vec![],
            header: None,
            footer: None,
            docstring: None,
        }
    }

    #[test]
    fn finds_direct_handle_bag() {
        let spec = handle_record_spec();
        let reachable = reachable_handles(&spec);
        assert!(reachable.contains_key("Node"));
    }

    #[test]
    fn generates_membership_assumption_for_handle_var() {
        let spec = handle_record_spec();
        let handle_ty = match &spec.state_vars[0].1 {
            Type::Bag(t) => t.as_ref().clone(),
            _ => unreachable!(),
        };
        let h = Var::new("h", handle_ty);
        let assumptions = implicit_handle_assumptions(&spec, std::slice::from_ref(&h));
        assert_eq!(assumptions.len(), 1);
        assert!(matches!(assumptions[0], Exp::In(..)));
    }
}
