//! Fresh name generation, used whenever synthesis needs a new binder or
//! helper query name that cannot collide with anything already in scope.

use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produce a name derived from `base` that has not been returned before by
/// this process.
pub fn fresh_name(base: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{base}${n}")
}
