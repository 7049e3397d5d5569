//! Check command - syntax sanity check for one file

use super::{dataset_note, read_source};
use crate::config::EngineConfig;
use crate::features::syntax;
use crate::models::Language;
use anyhow::{bail, Result};
use console::style;
use std::path::Path;

/// Run the check command. Fails (non-zero exit) when problems are found.
/// Also reports on stderr when the dataset method is switched off.
pub fn run(config: &EngineConfig, file: &Path, language: &str, json: bool) -> Result<()> {
    let code = read_source(file)?;
    let declared = if Language::is_auto_tag(language) {
        None
    } else {
        match Language::from_tag(language) {
            Some(lang) => Some(lang),
            None => bail!("Unsupported language '{}'", language),
        }
    };

    let report = syntax::check(&code, declared);
    if let Some(note) = dataset_note(config) {
        eprintln!("{note}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let how = if report.sniffed { "sniffed" } else { "declared" };
        println!(
            "{} {} ({how})",
            style(file.display()).cyan(),
            style(report.language).bold()
        );
        if report.ok {
            println!("{} No syntax problems found", style("✓").green());
        }
        for err in &report.errors {
            println!("  {} {}", style("✗").red(), err);
        }
        if let Some(suspected) = report.suspected_language {
            println!(
                "  {} Code looks like {}",
                style("!").yellow(),
                style(suspected).yellow()
            );
        }
    }

    if !report.ok {
        bail!("{} syntax problem(s) in {}", report.errors.len(), file.display());
    }
    Ok(())
}
