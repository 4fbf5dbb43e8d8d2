//! The top-level synthesis driver: wires every component in §4 together
//! into the single entry point a caller uses to go from an abstract
//! specification to a synthesized, incrementally-maintained one.

use crate::gc::collect_garbage;
use crate::handle_updates::plan_handle_updates;
use crate::implementation::{CVar, Implementation};
use crate::improver_orchestrator::run_improvers;
use crate::oracle::Oracle;
use crate::scheduler::assemble;
use increq_ast::{rename_args, Method, Specification};
use increq_collab::CollaboratorRegistry;
use increq_context::Context;
use increq_diagnostics::{error_code, Diagnostic, DriverError, Outcome};
use std::time::Duration;

/// Configuration surface exposed to callers (§6 "Configuration").
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Whether a newly-installed representation's concrete vars are
    /// coalesced against already-installed ones with a provably equal
    /// definition, rather than always introducing a fresh one.
    pub deduplicate_subqueries: bool,
    /// Wall-clock budget for the whole improver run (§5, §7). Exceeding it
    /// does not fail the run: the best representation found so far for
    /// each query is kept and the result is reported incomplete.
    pub per_query_timeout: Duration,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { deduplicate_subqueries: true, per_query_timeout: Duration::from_secs(60) }
    }
}

/// Drives the synthesis of an incremental implementation for one abstract
/// specification, start to finish.
pub struct Driver {
    impl_: Implementation,
    ctx: Context,
    oracle: Oracle,
    registry: CollaboratorRegistry,
    config: SynthesisConfig,
}

impl Driver {
    /// Builds a driver for `spec`, using `registry` for every collaborator
    /// decision. Freshens argument names that collide across queries before
    /// anything else runs, since every later component assumes they're
    /// already unique (§6 "Input").
    pub fn new(mut spec: Specification, registry: CollaboratorRegistry, config: SynthesisConfig) -> Result<Self, DriverError> {
        let queries: Vec<_> = spec.queries().cloned().collect();
        let renamed = rename_args(queries);
        let mut renamed = renamed.into_iter();
        for method in spec.methods.iter_mut() {
            if let Method::Query(q) = method {
                *q = renamed.next().expect("rename_args preserves query count and order");
            }
        }

        let ctx = Context::build(&spec)?;
        let solver = registry.solver().clone();
        let oracle = Oracle::new(solver);
        let impl_ = Implementation::new(spec);

        Ok(Self { impl_, ctx, oracle, registry, config })
    }

    pub fn implementation(&self) -> &Implementation {
        &self.impl_
    }

    /// The concrete vars whose maintenance code under any operation calls
    /// `query_name` — introspection used by tests and callers inspecting
    /// why a given representation was chosen.
    pub fn states_maintained_by(&self, query_name: &str) -> Vec<&CVar> {
        self.impl_.states_maintained_by(query_name)
    }

    /// Runs synthesis to completion or until `budget` elapses: plans handle
    /// updates once (§4.4, exactly once, before the first garbage
    /// collection), runs every public query's improver task to convergence
    /// or timeout (§4.5), collects garbage after installation settles
    /// (§4.6), then assembles the final specification (§4.7).
    pub fn run(&mut self, budget: Duration) -> Result<Outcome<Specification>, DriverError> {
        plan_handle_updates(&mut self.impl_, &self.ctx, &self.oracle, &self.registry, self.config.deduplicate_subqueries)?;
        collect_garbage(&mut self.impl_);

        let complete = run_improvers(
            &mut self.impl_,
            &self.ctx,
            &self.oracle,
            &self.registry,
            self.config.deduplicate_subqueries,
            budget,
        )?;
        collect_garbage(&mut self.impl_);

        let assembled = assemble(&self.impl_, &self.ctx)?;

        if complete {
            Ok(Outcome::complete(assembled))
        } else {
            let diagnostic = Diagnostic::warning(error_code::INC0400, "synthesis did not converge within the configured budget; returning the best implementation found so far");
            Ok(Outcome::incomplete(assembled, vec![diagnostic]))
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use increq_ast::{Exp, Query, Type, Var, Visibility};
    use proptest::prelude::*;

    /// Property 5 (arg uniqueness): for any set of public queries each
    /// declared with the single arg name `x`, the driver's input-renaming
    /// step leaves no two queries sharing an arg name, across any number of
    /// colliding queries.
    proptest! {
        #[test]
        fn no_two_queries_share_an_arg_name_after_construction(query_count in 2usize..6) {
            let queries: Vec<Query> = (0..query_count)
                .map(|i| Query::new(format!("q{i}"), Visibility::Public, vec![("x".into(), Type::Int)], Exp::var(Var::new("x", Type::Int))))
                .collect();
            let spec = Specification {
                name: "dup".into(),
                types: vec![],
                extern_funcs: vec![],
                state_vars: vec![],
                assumptions: vec![],
                methods: queries.into_iter().map(Method::Query).collect(),
                header: None,
                footer: None,
                docstring: None,
            };

            let registry = CollaboratorRegistry::with_defaults();
            let driver = Driver::new(spec, registry, SynthesisConfig::default()).unwrap();

            let mut seen = std::collections::HashSet::new();
            for q in driver.impl_.query_specs.iter() {
                for (name, _) in &q.args {
                    prop_assert!(seen.insert(name.clone()), "arg name '{name}' reused across queries");
                }
            }
        }
    }
}
