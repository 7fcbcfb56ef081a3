//! Argument parsing and selection helpers shared by the subcommands.

use miette::IntoDiagnostic;
use rpcheck_engine::{standard_properties, standard_property, CheckerChoice, Property};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => miette::bail!("Unknown output format: {other}. Use 'text' or 'json'."),
    }
}

pub(crate) fn parse_checker(raw: &str) -> miette::Result<CheckerChoice> {
    raw.parse::<CheckerChoice>().map_err(|e| miette::miette!("{e}"))
}

/// Standard properties named by `ids`, in the given order; all of them when
/// `ids` is empty.
pub(crate) fn select_properties(ids: &[String]) -> miette::Result<Vec<Property>> {
    if ids.is_empty() {
        return Ok(standard_properties());
    }
    ids.iter()
        .map(|id| {
            standard_property(id).ok_or_else(|| {
                let known: Vec<String> = standard_properties()
                    .iter()
                    .map(|p| p.id.to_string())
                    .collect();
                miette::miette!("Unknown property: {id}. Known: {}", known.join(", "))
            })
        })
        .collect()
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> miette::Result<()> {
    let rendered = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_accepts_text_and_json_only() {
        assert_eq!(parse_output_format("text").unwrap(), OutputFormat::Text);
        assert_eq!(parse_output_format("json").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("yaml").is_err());
    }

    #[test]
    fn checker_names_round_trip() {
        assert_eq!(parse_checker("cvc5").unwrap(), CheckerChoice::Cvc5);
        assert_eq!(parse_checker("Sampling").unwrap(), CheckerChoice::Sampling);
        let err = parse_checker("yices").unwrap_err();
        assert!(err.to_string().contains("yices"));
    }

    #[test]
    fn property_selection_keeps_requested_order() {
        assert_eq!(select_properties(&[]).unwrap().len(), 5);
        let picked =
            select_properties(&["split-bounds".to_string(), "reporting-incentive".to_string()])
                .unwrap();
        let ids: Vec<&str> = picked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["split-bounds", "reporting-incentive"]);

        let err = select_properties(&["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("split-monotonicity"), "{err}");
    }
}
