//! `synthesize` command: reads a specification, runs the driver, writes the
//! synthesized specification back out.

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use increq_collab::CollaboratorRegistry;
use increq_driver::{Driver, SynthesisConfig};
use std::path::PathBuf;
use std::time::Duration;

pub struct SynthesizeConfig {
    pub spec_file: PathBuf,
    pub output_file: Option<PathBuf>,
    pub output_format: Option<String>,
    pub no_dedup: bool,
    pub timeout_secs: u64,
    pub explain: Vec<String>,
    pub verbose: bool,
}

pub fn synthesize(config: SynthesizeConfig) -> Result<()> {
    let content = std::fs::read_to_string(&config.spec_file).with_context(|| format!("failed to read specification file: {}", config.spec_file.display()))?;
    let spec = serde_json::from_str(&content).with_context(|| format!("failed to parse specification: {}", config.spec_file.display()))?;

    if config.verbose {
        eprintln!("loaded specification from {}", config.spec_file.display());
    }

    let registry = CollaboratorRegistry::with_defaults();
    let synth_config = SynthesisConfig { deduplicate_subqueries: !config.no_dedup, per_query_timeout: Duration::from_secs(config.timeout_secs) };
    let mut driver = Driver::new(spec, registry, synth_config).context("failed to build synthesis driver")?;

    let budget = Duration::from_secs(config.timeout_secs);
    let outcome = driver.run(budget).context("synthesis failed")?;

    for diagnostic in &outcome.diagnostics {
        eprintln!("{}", output::format_diagnostic(diagnostic));
    }

    for query_name in &config.explain {
        let states = driver.states_maintained_by(query_name);
        let names: Vec<&str> = states.iter().map(|v| v.name.as_str()).collect();
        eprintln!("states maintained by '{query_name}': {}", names.join(", "));
    }

    let format = OutputFormat::from_str(config.output_format.as_deref().unwrap_or("pretty"));
    output::print_value(&outcome.value, format, config.output_file.as_deref())?;

    if outcome.complete {
        eprintln!("{}", output::format_success("synthesis converged"));
    } else {
        eprintln!("{}", "synthesis hit its budget; result is best-effort".yellow());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_missing_spec_file() {
        let config = SynthesizeConfig {
            spec_file: PathBuf::from("/nonexistent/spec.json"),
            output_file: None,
            output_format: None,
            no_dedup: false,
            timeout_secs: 5,
            explain: vec![],
            verbose: false,
        };
        assert!(synthesize(config).is_err());
    }
}
