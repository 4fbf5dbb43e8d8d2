//! Up-front argument-name collision resolution (§6 "Input").
//!
//! All arg-name collisions across queries are resolved before synthesis
//! begins: any argument name used by more than one query is freshened, and
//! the query's assumptions and return expression are updated to match.

use crate::expr::{Exp, Var};
use crate::fresh::fresh_name;
use crate::query::Query;
use crate::subst::subst_exp;
use std::collections::HashMap;

/// Freshen duplicated argument names across `queries`, substituting the
/// rename into each affected query's assumptions and return expression.
pub fn rename_args(queries: Vec<Query>) -> Vec<Query> {
    let mut histogram: HashMap<&str, usize> = HashMap::new();
    for q in &queries {
        for (name, _) in &q.args {
            *histogram.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    queries
        .into_iter()
        .map(|q| {
            let mut mapping = HashMap::new();
            let mut new_args = Vec::with_capacity(q.args.len());
            for (name, ty) in &q.args {
                if histogram.get(name.as_str()).copied().unwrap_or(0) > 1 {
                    let fresh = fresh_name(name);
                    mapping.insert(name.clone(), Exp::Var(Var::new(fresh.clone(), ty.clone())));
                    new_args.push((fresh, ty.clone()));
                } else {
                    new_args.push((name.clone(), ty.clone()));
                }
            }
            if mapping.is_empty() {
                return q;
            }
            Query {
                name: q.name,
                visibility: q.visibility,
                args: new_args,
                assumptions: q.assumptions.iter().map(|a| subst_exp(a, &mapping)).collect(),
                ret: subst_exp(&q.ret, &mapping),
                docstring: q.docstring,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Visibility;
    use crate::types::Type;

    #[test]
    fn renames_only_colliding_args() {
        let q1 = Query::new("q1", Visibility::Public, vec![("x".into(), Type::Int)], Exp::Var(Var::new("x", Type::Int)));
        let q2 = Query::new("q2", Visibility::Public, vec![("x".into(), Type::Int)], Exp::Var(Var::new("x", Type::Int)));
        let q3 = Query::new("q3", Visibility::Public, vec![("y".into(), Type::Int)], Exp::Var(Var::new("y", Type::Int)));

        let renamed = rename_args(vec![q1, q2, q3]);
        assert_ne!(renamed[0].args[0].0, renamed[1].args[0].0);
        assert_eq!(renamed[2].args[0].0, "y");
    }
}
