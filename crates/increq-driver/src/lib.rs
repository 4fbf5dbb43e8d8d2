//! Synthesis driver.
//!
//! Turns an abstract specification of queries and operations over abstract
//! state into a concrete, incrementally-maintained implementation: for each
//! public query, a collaborator proposes candidate concrete representations
//! with per-operation maintenance code; the driver installs the
//! cost-improving ones, derives maintenance statements, collects garbage
//! left behind by superseded representations, and assembles the result.
//!
//! - [`implementation::Implementation`]: the mutable working state every
//!   other module operates on.
//! - `oracle`: caching wrapper around the [`increq_collab::Solver`]
//!   collaborator, plus the query-equivalence decision procedure.
//! - `rewrite` / `simplify`: bottom-up collection-expression rewriting and
//!   the monotonic expression simplifier.
//! - `subquery`: introduces a helper query for a synthesized subgoal,
//!   deduplicating against an equivalent existing one when possible.
//! - `installer`: folds a proposed representation into the implementation
//!   and derives its per-operation maintenance code.
//! - `handle_updates`: recognizes and plans in-place handle field mutation.
//! - `improver_orchestrator`: runs one improver task per public query and
//!   installs candidates as they arrive.
//! - `gc`: reachability garbage collection over queries and concrete vars.
//! - `scheduler`: orders and assembles each operation's maintenance code
//!   into the final output specification.
//! - [`driver::Driver`]: the entry point tying every component together.

pub mod driver;
pub mod gc;
pub mod handle_updates;
pub mod implementation;
pub mod improver_orchestrator;
pub mod installer;
pub mod oracle;
pub mod rewrite;
pub mod scheduler;
pub mod simplify;
pub mod subquery;

pub use driver::{Driver, SynthesisConfig};
pub use gc::collect_garbage;
pub use handle_updates::plan_handle_updates;
pub use implementation::{CVar, Implementation};
pub use improver_orchestrator::run_improvers;
pub use installer::install_representation;
pub use oracle::Oracle;
pub use scheduler::assemble;
pub use subquery::introduce_subquery;
