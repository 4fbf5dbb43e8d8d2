//! `check` command: type-checks a specification without running synthesis.

use super::output;
use anyhow::{Context, Result};
use increq_ast::Specification;
use increq_context::{check_specification, Context as TypeContext};
use std::path::PathBuf;

pub struct CheckConfig {
    pub spec_file: PathBuf,
    pub verbose: bool,
}

pub fn check(config: CheckConfig) -> Result<()> {
    let content = std::fs::read_to_string(&config.spec_file).with_context(|| format!("failed to read specification file: {}", config.spec_file.display()))?;
    let spec: Specification = serde_json::from_str(&content).with_context(|| format!("failed to parse specification: {}", config.spec_file.display()))?;

    let ctx = TypeContext::build(&spec).context("type error while building context")?;
    check_specification(&ctx, &spec).context("type error in specification")?;

    if config.verbose {
        eprintln!("{} queries, {} operations", spec.queries().count(), spec.operations().count());
    }
    eprintln!("{}", output::format_success(&format!("{} type-checks", spec.name)));
    Ok(())
}
