//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Payoff model and property verifier for a CA accountability reward protocol.\n\n\
    Typical session:\n  \
    1. rpcheck payoffs --config scenario.toml\n  \
    2. rpcheck verify --checker sampling\n  \
    3. rpcheck smt --out obligations/\n\n\
    Scenario and verification settings can be read from a TOML file with\n\
    [reward], [protocol] and [verify] tables; command-line flags override it.";

#[derive(Parser)]
#[command(name = "rpcheck")]
#[command(about = "Payoff model and property verifier for a CA accountability reward protocol")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    /// TOML file with [reward], [protocol] and [verify] tables
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Scenario values given on the command line. Signed so that negative input
/// is reported by the parameter validation rather than by the argument parser.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ScenarioArgs {
    /// Price paid by the CA to participate
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) price: Option<i64>,

    /// Payout to the affected domain when a registered CA is caught
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) aff_dom_payout: Option<i64>,

    /// Payout allocable on certificate termination
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) term_payout: Option<i64>,

    /// Payout to a successful detector
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) det_payout: Option<i64>,

    /// Fee charged for filing a report
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) reporting_fee: Option<i64>,

    /// Floor of the termination split
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) min_term_payout: Option<i64>,

    /// Remaining certificate lifetime in [0, 1], as `n/d` or a decimal
    #[arg(long)]
    pub(crate) remaining_lifetime: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the eight plays of the one-shot game
    Outcomes {
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the standard properties and their closed forms
    Properties {
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print every participant's payoff for each outcome of a scenario
    Payoffs {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Restrict the table to one outcome, e.g. `register,non-compliant,report`
        #[arg(long)]
        outcome: Option<String>,

        /// Also evaluate the standard properties at this scenario
        #[arg(long)]
        check: bool,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Verify properties over all feasible parameterizations
    Verify {
        /// Property to check (repeatable); defaults to every standard property
        #[arg(long = "property")]
        properties: Vec<String>,

        /// Checker: sampling | z3 | cvc5
        #[arg(long)]
        checker: Option<String>,

        /// Number of pseudo-random sample points per property
        #[arg(long)]
        samples: Option<usize>,

        /// Seed for the sampling checker
        #[arg(long)]
        seed: Option<u64>,

        /// Largest monetary amount drawn by the sampling checker
        #[arg(long)]
        max_amount: Option<u64>,

        /// Largest lifetime denominator drawn by the sampling checker
        #[arg(long)]
        max_lifetime_den: Option<u64>,

        /// Wall-clock budget per property in seconds (0 = unlimited)
        #[arg(long)]
        timeout: Option<u64>,

        /// Directory receiving one SMT-LIB2 script per query
        #[arg(long)]
        dump_smt: Option<PathBuf>,

        /// Command used to launch cvc5
        #[arg(long)]
        cvc5_command: Option<String>,

        /// Report an inconclusive symbolic check instead of falling back to sampling
        #[arg(long)]
        no_fallback: bool,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Emit the SMT-LIB2 proof obligations without solving them
    Smt {
        /// Property to emit (repeatable); defaults to every standard property
        #[arg(long = "property")]
        properties: Vec<String>,

        /// Directory to write `<query>.smt2` files to; prints to stdout when absent
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
