//! Analyze command - classify files or stdin

use super::read_source;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::models::{AnalysisRequest, DetectionResult, Method};
use crate::reporters::{self, OutputFormat};
use anyhow::{Context, Result};
use console::style;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

fn error_json(err: &EngineError) -> serde_json::Value {
    json!({ "error": err.report() })
}

fn to_json(value: &serde_json::Value, compact: bool) -> Result<String> {
    Ok(if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    })
}

fn render_one(
    file: &Path,
    outcome: &Result<DetectionResult, EngineError>,
    format: OutputFormat,
    many: bool,
    compact: bool,
) -> Result<String> {
    match (format, outcome) {
        (OutputFormat::Json, Ok(result)) if many => to_json(
            &json!({ "file": file.display().to_string(), "result": result }),
            compact,
        ),
        (OutputFormat::Json, Err(e)) if many => to_json(
            &json!({ "file": file.display().to_string(), "error": e.report() }),
            compact,
        ),
        (OutputFormat::Json, Ok(result)) if compact => reporters::render_compact(result),
        (OutputFormat::Json, Ok(result)) => reporters::report(result, format),
        (OutputFormat::Json, Err(e)) => to_json(&error_json(e), compact),
        (OutputFormat::Text, Ok(result)) => {
            let body = reporters::report(result, format)?;
            if many {
                Ok(format!("{} {}\n{body}", style("==>").dim(), style(file.display()).cyan()))
            } else {
                Ok(body)
            }
        }
        (OutputFormat::Text, Err(e)) => Ok(format!(
            "{} {}: {}\n",
            style("✗").red(),
            style(file.display()).cyan(),
            e
        )),
    }
}

/// Run the analyze command
pub fn run(
    config: &EngineConfig,
    files: &[PathBuf],
    language: &str,
    methods: Option<Vec<Method>>,
    format: &str,
    compact: bool,
    output: Option<&Path>,
) -> Result<()> {
    let format = OutputFormat::from_str(format)?;
    let start = Instant::now();
    let engine = Engine::from_config(config).context("Failed to initialize engine")?;
    let wants_dataset = methods
        .as_ref()
        .is_none_or(|m| m.contains(&Method::Dataset));
    if wants_dataset {
        if let Some(note) = super::dataset_note(config) {
            eprintln!("{note}");
        }
    }

    let stdin = [PathBuf::from("-")];
    let files = if files.is_empty() { &stdin[..] } else { files };

    let mut requests = Vec::with_capacity(files.len());
    for file in files {
        let mut request = AnalysisRequest::new(read_source(file)?).with_language(language);
        if let Some(methods) = &methods {
            request = request.with_methods(methods.iter().copied());
        }
        requests.push(request);
    }

    let outcomes = engine.analyze_batch(&requests);
    tracing::info!(
        "Analyzed {} input(s) in {:.2?}",
        outcomes.len(),
        start.elapsed()
    );

    let many = files.len() > 1;
    let rendered = files
        .iter()
        .zip(&outcomes)
        .map(|(file, outcome)| render_one(file, outcome, format, many, compact))
        .collect::<Result<Vec<_>>>()?;
    let text = match (format, many) {
        (OutputFormat::Json, true) if compact => format!("[{}]", rendered.join(",")),
        (OutputFormat::Json, true) => format!("[\n{}\n]", rendered.join(",\n")),
        _ => rendered.join("\n"),
    };

    match output {
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", style("✓").green(), style(path.display()).cyan());
        }
        None => println!("{text}"),
    }

    let failures: Vec<&EngineError> = outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
    match failures.as_slice() {
        [] => Ok(()),
        [only] if !many => anyhow::bail!("{}", only),
        _ => anyhow::bail!("{} of {} inputs failed", failures.len(), outcomes.len()),
    }
}
