use rpcheck_model::Outcome;
use serde_json::json;

use super::helpers::{parse_output_format, print_json, OutputFormat};

pub(crate) fn run_outcomes_command(format: &str) -> miette::Result<()> {
    let outcomes = Outcome::all();
    match parse_output_format(format)? {
        OutputFormat::Text => {
            println!("{:<12} {:<14} {:<10}", "registration", "issuance", "detection");
            for o in outcomes {
                println!(
                    "{:<12} {:<14} {:<10}",
                    o.registration.as_str(),
                    o.issuance.as_str(),
                    o.detection.as_str()
                );
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = outcomes
                .iter()
                .map(|o| {
                    json!({
                        "outcome": o.to_string(),
                        "registration": o.registration,
                        "issuance": o.issuance,
                        "detection": o.detection,
                    })
                })
                .collect();
            print_json(&rows)?;
        }
    }
    Ok(())
}
