mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::verify::VerifyArgs;

/// Exit status of `rpcheck verify` when some property is falsified or
/// inconclusive.
const EXIT_NOT_ALL_HOLD: i32 = 2;

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Outcomes { format } => {
            commands::outcomes::run_outcomes_command(&format)?;
        }
        Commands::Properties { format } => {
            commands::properties::run_properties_command(&format)?;
        }
        Commands::Payoffs {
            scenario,
            outcome,
            check,
            format,
        } => {
            commands::payoffs::run_payoffs_command(
                config,
                &scenario,
                outcome.as_deref(),
                check,
                &format,
            )?;
        }
        Commands::Verify {
            properties,
            checker,
            samples,
            seed,
            max_amount,
            max_lifetime_den,
            timeout,
            dump_smt,
            cvc5_command,
            no_fallback,
            format,
        } => {
            let all_hold = commands::verify::run_verify_command(
                config,
                VerifyArgs {
                    properties,
                    checker,
                    samples,
                    seed,
                    max_amount,
                    max_lifetime_den,
                    timeout,
                    dump_smt,
                    cvc5_command,
                    no_fallback,
                    format,
                },
            )?;
            if !all_hold {
                std::process::exit(EXIT_NOT_ALL_HOLD);
            }
        }
        Commands::Smt { properties, out } => {
            commands::smt::run_smt_command(&properties, out.as_deref())?;
        }
    }

    Ok(())
}
