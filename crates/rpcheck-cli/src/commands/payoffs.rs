use std::path::Path;

use miette::IntoDiagnostic;
use rpcheck_engine::property::Violation;
use rpcheck_engine::{standard_properties, ParameterPoint};
use rpcheck_model::{Outcome, Payoffs, Player, Scenario};
use serde::Serialize;
use tracing::info;

use super::helpers::{parse_output_format, print_json, OutputFormat};
use crate::cli::ScenarioArgs;
use crate::config::RunConfig;

// Payoffs are i128; serialize straight to text, never through `serde_json::Value`.
#[derive(Serialize)]
struct PayoffReport<'a> {
    scenario: &'a Scenario,
    feasible: Feasibility,
    termination_split: i128,
    outcomes: Vec<OutcomeRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checks: Vec<CheckRow<'a>>,
}

#[derive(Serialize)]
struct Feasibility {
    reporting_fee: bool,
    min_term_payout: bool,
    price: bool,
}

#[derive(Serialize)]
struct OutcomeRow {
    outcome: String,
    payoffs: Payoffs,
}

#[derive(Serialize)]
struct CheckRow<'a> {
    property: String,
    applicable: bool,
    violation: Option<&'a Violation>,
}

fn selected_outcomes(filter: Option<&str>) -> miette::Result<Vec<Outcome>> {
    match filter {
        Some(raw) => {
            let outcome: Outcome = raw.parse().map_err(|e| miette::miette!("{e}"))?;
            Ok(vec![outcome])
        }
        None => Ok(Outcome::all().to_vec()),
    }
}

fn render_text(scenario: &Scenario, outcomes: &[Outcome]) {
    let rp = &scenario.reward;
    let protocol = &scenario.protocol;
    println!(
        "reward: price={} aff_dom_payout={} term_payout={} det_payout={}",
        rp.price, rp.aff_dom_payout, rp.term_payout, rp.det_payout
    );
    println!(
        "protocol: reporting_fee={} min_term_payout={} remaining_lifetime={}",
        protocol.reporting_fee, protocol.min_term_payout, protocol.remaining_lifetime
    );
    println!(
        "feasible: reporting_fee={} min_term_payout={} price={}",
        scenario.reporting_fee_feasible(),
        scenario.min_term_payout_feasible(),
        scenario.price_feasible()
    );
    println!("termination split: {}", scenario.termination_split());
    println!();
    println!(
        "{:<36} {:>12} {:>12} {:>12}",
        "outcome",
        Player::Ca,
        Player::Domain,
        Player::Detector
    );
    for &outcome in outcomes {
        let p = scenario.payoffs(outcome);
        println!(
            "{:<36} {:>12} {:>12} {:>12}",
            outcome.to_string(),
            p.ca,
            p.domain,
            p.detector
        );
    }
}

pub(crate) fn run_payoffs_command(
    config_path: Option<&Path>,
    overrides: &ScenarioArgs,
    outcome: Option<&str>,
    check: bool,
    format: &str,
) -> miette::Result<()> {
    let output_format = parse_output_format(format)?;
    let config = RunConfig::load(config_path).into_diagnostic()?;
    let scenario = config.scenario(overrides).into_diagnostic()?;
    let outcomes = selected_outcomes(outcome)?;
    info!(outcomes = outcomes.len(), "Evaluating payoffs...");

    // Concrete check at this single point; both lifetimes coincide.
    let point = ParameterPoint::single(scenario.clone());
    let mut checks = Vec::new();
    if check {
        for property in standard_properties() {
            let applicable = property.preconditions_hold(&scenario);
            let violation = property.check_point(&point).into_diagnostic()?;
            checks.push((property, applicable, violation));
        }
    }

    match output_format {
        OutputFormat::Text => {
            render_text(&scenario, &outcomes);
            if check {
                println!();
                for (property, applicable, violation) in &checks {
                    let status = match (applicable, violation) {
                        (false, _) => "not applicable (preconditions fail)".to_string(),
                        (true, None) => "holds".to_string(),
                        (true, Some(v)) => {
                            let at = v
                                .outcome
                                .map(|o| format!(" at {o}"))
                                .unwrap_or_default();
                            format!(
                                "VIOLATED{at}: {} (lhs = {}, rhs = {})",
                                v.obligation, v.lhs, v.rhs
                            )
                        }
                    };
                    println!("{}: {status}", property.id);
                }
            }
        }
        OutputFormat::Json => {
            let rows: Vec<OutcomeRow> = outcomes
                .iter()
                .map(|&outcome| OutcomeRow {
                    outcome: outcome.to_string(),
                    payoffs: scenario.payoffs(outcome),
                })
                .collect();
            let checks: Vec<CheckRow<'_>> = checks
                .iter()
                .map(|(property, applicable, violation)| CheckRow {
                    property: property.id.as_str().to_string(),
                    applicable: *applicable,
                    violation: violation.as_ref(),
                })
                .collect();
            print_json(&PayoffReport {
                scenario: &scenario,
                feasible: Feasibility {
                    reporting_fee: scenario.reporting_fee_feasible(),
                    min_term_payout: scenario.min_term_payout_feasible(),
                    price: scenario.price_feasible(),
                },
                termination_split: scenario.termination_split(),
                outcomes: rows,
                checks,
            })?;
        }
    }
    Ok(())
}
