//! The typing context built from a specification, plus the static analyses
//! over it that the driver needs before synthesis starts: type-checking,
//! handle reachability, and well-formedness repair of candidate return
//! expressions.

mod context;
mod env;
mod handles;
mod typecheck;
mod wellformed;

pub use context::{CallSig, Context};
pub use env::TypeEnv;
pub use handles::{implicit_handle_assumptions, reachable_handles};
pub use typecheck::{check_operation, check_specification, check_stm, infer_exp, infer_query_ret_type};
pub use wellformed::repair_well_formedness;
