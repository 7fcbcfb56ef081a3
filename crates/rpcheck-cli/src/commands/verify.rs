use std::path::{Path, PathBuf};

use miette::IntoDiagnostic;
use rpcheck_engine::{verify_all, VerificationReport, VerifyOptions};
use tracing::info;

use super::helpers::{parse_checker, parse_output_format, select_properties, OutputFormat};
use crate::config::RunConfig;

/// Flags of `rpcheck verify`. `None` leaves the config file (or default)
/// value in place.
#[derive(Debug, Clone, Default)]
pub(crate) struct VerifyArgs {
    pub(crate) properties: Vec<String>,
    pub(crate) checker: Option<String>,
    pub(crate) samples: Option<usize>,
    pub(crate) seed: Option<u64>,
    pub(crate) max_amount: Option<u64>,
    pub(crate) max_lifetime_den: Option<u64>,
    pub(crate) timeout: Option<u64>,
    pub(crate) dump_smt: Option<PathBuf>,
    pub(crate) cvc5_command: Option<String>,
    pub(crate) no_fallback: bool,
    pub(crate) format: String,
}

pub(crate) fn resolve_options(config: &RunConfig, args: &VerifyArgs) -> miette::Result<VerifyOptions> {
    let mut options = config.verify.to_options();
    if let Some(raw) = &args.checker {
        options.checker = parse_checker(raw)?;
    }
    if let Some(samples) = args.samples {
        options.samples = samples;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }
    if let Some(max_amount) = args.max_amount {
        options.max_amount = max_amount;
    }
    if let Some(den) = args.max_lifetime_den {
        options.max_lifetime_den = den;
    }
    if let Some(timeout) = args.timeout {
        options.timeout_secs = timeout;
    }
    if let Some(dir) = &args.dump_smt {
        options.dump_smt = Some(dir.clone());
    }
    if let Some(cmd) = &args.cvc5_command {
        options.cvc5_command = cmd.clone();
    }
    if args.no_fallback {
        options.sampling_fallback = false;
    }
    Ok(options)
}

fn render_text(report: &VerificationReport) {
    for verdict in &report.verdicts {
        println!("{verdict}");
    }
    println!();
    println!("Overall: {}", report.overall_verdict().to_uppercase());
}

/// Runs the verifier and returns whether every property holds.
pub(crate) fn run_verify_command(config_path: Option<&Path>, args: VerifyArgs) -> miette::Result<bool> {
    let output_format = parse_output_format(&args.format)?;
    let config = RunConfig::load(config_path).into_diagnostic()?;
    let options = resolve_options(&config, &args)?;
    let ids = if args.properties.is_empty() {
        &config.verify.properties
    } else {
        &args.properties
    };
    let properties = select_properties(ids)?;
    info!(
        properties = properties.len(),
        checker = %options.checker,
        timeout_secs = options.timeout_secs,
        "Verifying..."
    );

    let report = verify_all(&properties, &options).into_diagnostic()?;

    match output_format {
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => println!("{}", report.to_json().into_diagnostic()?),
    }
    Ok(report.all_hold())
}
