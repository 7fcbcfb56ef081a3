use std::path::Path;

use miette::IntoDiagnostic;
use rpcheck_engine::symbolic::scripts;
use rpcheck_engine::verifier::dump_smt_scripts;
use tracing::info;

use super::helpers::select_properties;

/// Print or write the SMT-LIB2 scripts of the selected properties.
pub(crate) fn run_smt_command(ids: &[String], out: Option<&Path>) -> miette::Result<()> {
    let properties = select_properties(ids)?;
    match out {
        Some(dir) => {
            let mut written = 0usize;
            for property in &properties {
                written += dump_smt_scripts(property, dir).into_diagnostic()?.len();
            }
            info!("{written} SMT-LIB2 scripts written to {}", dir.display());
        }
        None => {
            for property in &properties {
                for (label, script) in scripts(property).into_diagnostic()? {
                    println!("; ===== {label} =====");
                    println!("{script}");
                }
            }
        }
    }
    Ok(())
}
