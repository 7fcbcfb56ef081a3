use rpcheck_engine::standard_properties;
use serde_json::json;

use super::helpers::{parse_output_format, print_json, OutputFormat};

pub(crate) fn run_properties_command(format: &str) -> miette::Result<()> {
    let properties = standard_properties();
    match parse_output_format(format)? {
        OutputFormat::Text => {
            for property in &properties {
                println!("{}", property.id);
                println!("  {}", property.description);
                println!("  {}", property.closed_form());
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = properties
                .iter()
                .map(|p| {
                    json!({
                        "property": p,
                        "closed_form": p.closed_form(),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
    }
    Ok(())
}
